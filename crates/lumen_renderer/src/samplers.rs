//! Point and direction samplers.
//!
//! Each sampler draws one value and reports the density it was drawn with:
//! a pdf for continuous distributions, a probability mass for discrete ones.
//! Hemispheres are around local +Y.

use std::f32::consts::PI;

use crate::random::{coin_flip, gen_f32};
use lumen_core::HdrImage;
use lumen_math::{Vec2, Vec3};
use rand::RngCore;

/// Uniform points in `[0, size.x) x [0, size.y)`.
#[derive(Debug, Clone, Copy)]
pub struct RectUniform {
    pub size: Vec2,
}

impl RectUniform {
    pub fn new(size: Vec2) -> Self {
        Self { size }
    }

    pub fn sample(&self, rng: &mut dyn RngCore) -> (Vec2, f32) {
        let p = Vec2::new(gen_f32(rng) * self.size.x, gen_f32(rng) * self.size.y);
        (p, 1.0 / (self.size.x * self.size.y))
    }
}

impl Default for RectUniform {
    /// The unit square.
    fn default() -> Self {
        Self::new(Vec2::ONE)
    }
}

/// Uniform directions on the upper hemisphere.
#[derive(Debug, Clone, Copy, Default)]
pub struct HemisphereUniform;

impl HemisphereUniform {
    pub fn sample(&self, rng: &mut dyn RngCore) -> (Vec3, f32) {
        // cos(theta) is uniform for equal-area bands
        let cos_theta = gen_f32(rng);
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let phi = 2.0 * PI * gen_f32(rng);

        let dir = Vec3::new(sin_theta * phi.cos(), cos_theta, sin_theta * phi.sin());
        (dir, 1.0 / (2.0 * PI))
    }
}

/// Cosine-weighted directions on the upper hemisphere.
///
/// Malley's method: uniform points on the unit disk projected up.
#[derive(Debug, Clone, Copy, Default)]
pub struct HemisphereCosine;

impl HemisphereCosine {
    pub fn sample(&self, rng: &mut dyn RngCore) -> (Vec3, f32) {
        let xi = gen_f32(rng);
        let r = xi.sqrt();
        let phi = 2.0 * PI * gen_f32(rng);

        let y = (1.0 - xi).max(0.0).sqrt();
        let dir = Vec3::new(r * phi.cos(), y, r * phi.sin());
        (dir, y / PI)
    }
}

/// Uniform directions on the whole sphere.
#[derive(Debug, Clone, Copy, Default)]
pub struct SphereUniform {
    hemi: HemisphereUniform,
}

impl SphereUniform {
    pub fn sample(&self, rng: &mut dyn RngCore) -> (Vec3, f32) {
        let (mut dir, pdf) = self.hemi.sample(rng);
        if coin_flip(rng, 0.5) {
            dir.y = -dir.y;
        }
        (dir, pdf / 2.0)
    }
}

/// Directions drawn in proportion to the brightness of an equirectangular
/// image.
///
/// Pixel `(x, y)` covers polar angles `π(h - y - 1)/h ..= π(h - y)/h` (row 0
/// is straight down) and azimuths starting at `2π((x + w/2) mod w)/w`.
#[derive(Debug, Clone)]
pub struct SphereImage {
    width: usize,
    height: usize,
    pdf: Vec<f32>,
    cdf: Vec<f32>,
}

impl SphereImage {
    /// Build the pixel distribution. `None` if the image has no energy.
    pub fn new(image: &HdrImage) -> Option<Self> {
        let (w, h) = image.dimension();
        let (width, height) = (w as usize, h as usize);

        let mut pdf = Vec::with_capacity(width * height);
        for y in 0..h {
            // Pixels near the poles cover less solid angle
            let sin_theta = (PI * (h as f32 - (y as f32 + 0.5)) / h as f32).sin();
            for x in 0..w {
                pdf.push(image.at(x, y).luma().max(0.0) * sin_theta);
            }
        }

        let total: f32 = pdf.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return None;
        }

        let mut cdf = Vec::with_capacity(pdf.len());
        let mut running = 0.0;
        for p in &mut pdf {
            *p /= total;
            running += *p;
            cdf.push(running);
        }

        Some(Self {
            width,
            height,
            pdf,
            cdf,
        })
    }

    pub fn sample(&self, rng: &mut dyn RngCore) -> (Vec3, f32) {
        // First entry strictly greater than xi
        let xi = gen_f32(rng);
        let idx = self
            .cdf
            .partition_point(|&c| c <= xi)
            .min(self.cdf.len() - 1);

        let (w, h) = (self.width as f32, self.height as f32);
        let x = (idx % self.width) as f32;
        let y = (idx / self.width) as f32;

        // Uniform position inside the pixel
        let theta = PI * (h - y - gen_f32(rng)) / h;
        let phi = 2.0 * PI * ((x + gen_f32(rng) + w / 2.0) % w) / w;

        let sin_theta = theta.sin();
        let dir = Vec3::new(sin_theta * phi.cos(), theta.cos(), sin_theta * phi.sin());

        // Pixel mass over pixel solid angle (2π/w)(π/h)sin(θ)
        let pdf = self.pdf[idx] * w * h / (2.0 * PI * PI * sin_theta.max(1e-6));
        (dir, pdf)
    }
}

/// A single fixed point.
#[derive(Debug, Clone, Copy)]
pub struct Point {
    pub point: Vec3,
}

impl Point {
    pub fn new(point: Vec3) -> Self {
        Self { point }
    }

    /// Always the same point, with mass 1.
    pub fn sample(&self) -> (Vec3, f32) {
        (self.point, 1.0)
    }
}

/// One of two points, `p1` with probability `prob`.
#[derive(Debug, Clone, Copy)]
pub struct TwoPoints {
    pub p1: Vec3,
    pub p2: Vec3,
    pub prob: f32,
}

impl TwoPoints {
    pub fn new(p1: Vec3, p2: Vec3, prob: f32) -> Self {
        Self { p1, p2, prob }
    }

    pub fn sample(&self, rng: &mut dyn RngCore) -> (Vec3, f32) {
        if coin_flip(rng, self.prob) {
            (self.p1, self.prob)
        } else {
            (self.p2, 1.0 - self.prob)
        }
    }
}
