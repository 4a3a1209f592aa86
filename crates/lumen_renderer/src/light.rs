//! Light sources for next-event estimation.
//!
//! Scene lights (point, directional, spot, rectangle) sit at a finite distance
//! or a fixed direction and are only reached by sampling them. Environment
//! lights surround the scene at infinite distance and are also what escaping
//! rays see.

use std::f32::consts::PI;

use crate::samplers::{HemisphereUniform, Point, RectUniform, SphereImage, SphereUniform};
use lumen_core::HdrImage;
use lumen_math::{Spectrum, Vec3};
use rand::RngCore;

/// A sampled direction towards a light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    /// Unit direction from the shading point towards the light (world space)
    pub direction: Vec3,
    /// Radiance arriving along `direction`
    pub radiance: Spectrum,
    /// Distance to the light; infinite for directional and environment lights
    pub distance: f32,
    /// Solid-angle density of `direction`, or 1 for delta lights
    pub pdf: f32,
}

/// Common interface of everything the integrator can sample light from.
pub trait LightSource: Send + Sync {
    /// Sample incoming light at `point`.
    fn sample(&self, point: Vec3, rng: &mut dyn RngCore) -> LightSample;

    /// Radiance arriving from infinitely far away along `-dir`, i.e. what a
    /// ray travelling in `dir` sees when it escapes.
    fn sample_direction(&self, _dir: Vec3) -> Spectrum {
        Spectrum::ZERO
    }

    /// Delta lights need only one sample per shading point.
    fn is_discrete(&self) -> bool;
}

// =============================================================================
// Scene lights
// =============================================================================

/// Isotropic point emitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    /// Radiant intensity
    pub intensity: Spectrum,
}

impl PointLight {
    pub fn new(position: Vec3, intensity: Spectrum) -> Self {
        Self {
            position,
            intensity,
        }
    }
}

impl LightSource for PointLight {
    fn sample(&self, point: Vec3, _rng: &mut dyn RngCore) -> LightSample {
        let (position, pmf) = Point::new(self.position).sample();
        towards(point, position, self.intensity, pmf)
    }

    fn is_discrete(&self) -> bool {
        true
    }
}

/// Parallel light arriving from one direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Direction the light travels in (unit)
    pub direction: Vec3,
    pub intensity: Spectrum,
}

impl DirectionalLight {
    pub fn new(direction: Vec3, intensity: Spectrum) -> Self {
        Self {
            direction: direction.normalize_or_zero(),
            intensity,
        }
    }
}

impl LightSource for DirectionalLight {
    fn sample(&self, _point: Vec3, _rng: &mut dyn RngCore) -> LightSample {
        LightSample {
            direction: -self.direction,
            radiance: self.intensity,
            distance: f32::INFINITY,
            pdf: 1.0,
        }
    }

    fn is_discrete(&self) -> bool {
        true
    }
}

/// Point emitter restricted to a cone, fading out smoothly at its edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    /// Cone axis (unit)
    pub direction: Vec3,
    /// Full intensity inside this cosine
    cos_inner: f32,
    /// Zero intensity outside this cosine
    cos_outer: f32,
    pub intensity: Spectrum,
}

impl SpotLight {
    /// Fraction of the cone angle over which intensity fades out.
    const FALLOFF: f32 = 0.1;

    /// `angle` is the cone's half-angle in radians.
    pub fn new(position: Vec3, direction: Vec3, angle: f32, intensity: Spectrum) -> Self {
        let angle = angle.clamp(0.0, PI);
        Self {
            position,
            direction: direction.normalize_or_zero(),
            cos_inner: (angle * (1.0 - Self::FALLOFF)).cos(),
            cos_outer: angle.cos(),
            intensity,
        }
    }

    fn falloff(&self, to_point: Vec3) -> f32 {
        let cos = self.direction.dot(to_point);
        smoothstep(self.cos_outer, self.cos_inner, cos)
    }
}

impl LightSource for SpotLight {
    fn sample(&self, point: Vec3, _rng: &mut dyn RngCore) -> LightSample {
        let mut sample = towards(point, self.position, self.intensity, 1.0);
        sample.radiance *= self.falloff(-sample.direction);
        sample
    }

    fn is_discrete(&self) -> bool {
        true
    }
}

/// One-sided parallelogram emitter. Emits towards `edge_u x edge_v`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectLight {
    pub corner: Vec3,
    pub edge_u: Vec3,
    pub edge_v: Vec3,
    pub radiance: Spectrum,
    normal: Vec3,
    area: f32,
}

impl RectLight {
    pub fn new(corner: Vec3, edge_u: Vec3, edge_v: Vec3, radiance: Spectrum) -> Self {
        let cross = edge_u.cross(edge_v);
        Self {
            corner,
            edge_u,
            edge_v,
            radiance,
            normal: cross.normalize_or_zero(),
            area: cross.length(),
        }
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn area(&self) -> f32 {
        self.area
    }
}

impl LightSource for RectLight {
    fn sample(&self, point: Vec3, rng: &mut dyn RngCore) -> LightSample {
        let (st, _) = RectUniform::default().sample(rng);
        let on_light = self.corner + st.x * self.edge_u + st.y * self.edge_v;

        let offset = on_light - point;
        let distance = offset.length();
        let direction = offset / distance;
        let cos_light = -direction.dot(self.normal);

        if self.area <= 0.0 || distance <= 0.0 || cos_light <= 0.0 {
            // Back side or degenerate: no light
            return LightSample {
                direction,
                radiance: Spectrum::ZERO,
                distance,
                pdf: 1.0,
            };
        }

        // Area density 1/A converted to solid angle
        LightSample {
            direction,
            radiance: self.radiance,
            distance,
            pdf: distance * distance / (cos_light * self.area),
        }
    }

    fn is_discrete(&self) -> bool {
        false
    }
}

/// Any scene light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Point(PointLight),
    Directional(DirectionalLight),
    Spot(SpotLight),
    Rect(RectLight),
}

impl LightSource for Light {
    fn sample(&self, point: Vec3, rng: &mut dyn RngCore) -> LightSample {
        match self {
            Light::Point(l) => l.sample(point, rng),
            Light::Directional(l) => l.sample(point, rng),
            Light::Spot(l) => l.sample(point, rng),
            Light::Rect(l) => l.sample(point, rng),
        }
    }

    fn is_discrete(&self) -> bool {
        match self {
            Light::Point(l) => l.is_discrete(),
            Light::Directional(l) => l.is_discrete(),
            Light::Spot(l) => l.is_discrete(),
            Light::Rect(l) => l.is_discrete(),
        }
    }
}

// =============================================================================
// Environment lights
// =============================================================================

/// Constant radiance from every direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvSphere {
    pub radiance: Spectrum,
}

impl LightSource for EnvSphere {
    fn sample(&self, _point: Vec3, rng: &mut dyn RngCore) -> LightSample {
        let (direction, pdf) = SphereUniform::default().sample(rng);
        at_infinity(direction, self.radiance, pdf)
    }

    fn sample_direction(&self, _dir: Vec3) -> Spectrum {
        self.radiance
    }

    fn is_discrete(&self) -> bool {
        false
    }
}

/// Constant radiance from the upper (+Y) hemisphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvHemisphere {
    pub radiance: Spectrum,
}

impl LightSource for EnvHemisphere {
    fn sample(&self, _point: Vec3, rng: &mut dyn RngCore) -> LightSample {
        let (direction, pdf) = HemisphereUniform.sample(rng);
        at_infinity(direction, self.radiance, pdf)
    }

    fn sample_direction(&self, dir: Vec3) -> Spectrum {
        if dir.y > 0.0 {
            self.radiance
        } else {
            Spectrum::ZERO
        }
    }

    fn is_discrete(&self) -> bool {
        false
    }
}

/// Equirectangular environment image, importance sampled by brightness.
///
/// Row 0 of the image is straight down (-Y); azimuth 0 (+X) is at the
/// horizontal centre of the image.
#[derive(Debug, Clone)]
pub struct EnvMap {
    image: HdrImage,
    /// `None` when the image carries no energy; sampling falls back to uniform
    sampler: Option<SphereImage>,
}

impl EnvMap {
    pub fn new(image: HdrImage) -> Self {
        let sampler = SphereImage::new(&image);
        if sampler.is_none() {
            log::warn!(
                "Environment map ({}x{}) has no energy; sampling it uniformly",
                image.width(),
                image.height()
            );
        }
        Self { image, sampler }
    }

    pub fn image(&self) -> &HdrImage {
        &self.image
    }

    /// Bilinear lookup with texel centres at half-integer coordinates,
    /// wrapping in azimuth and clamping at the poles.
    fn lookup(&self, u: f32, v: f32) -> Spectrum {
        let (w, h) = self.image.dimension();

        let fx = u - 0.5;
        let x0f = fx.floor();
        let tx = fx - x0f;
        let x0 = (x0f as i64).rem_euclid(w as i64) as u32;
        let x1 = (x0 + 1) % w;

        let fy = (v - 0.5).clamp(0.0, (h - 1) as f32);
        let y0 = fy.floor() as u32;
        let y1 = (y0 + 1).min(h - 1);
        let ty = fy - y0 as f32;

        let bottom = self.image.at(x0, y0) * (1.0 - tx) + self.image.at(x1, y0) * tx;
        let top = self.image.at(x0, y1) * (1.0 - tx) + self.image.at(x1, y1) * tx;
        bottom * (1.0 - ty) + top * ty
    }
}

impl LightSource for EnvMap {
    fn sample(&self, _point: Vec3, rng: &mut dyn RngCore) -> LightSample {
        let (direction, pdf) = match &self.sampler {
            Some(sampler) => sampler.sample(rng),
            None => SphereUniform::default().sample(rng),
        };
        at_infinity(direction, self.sample_direction(direction), pdf)
    }

    fn sample_direction(&self, dir: Vec3) -> Spectrum {
        if self.image.is_empty() {
            return Spectrum::ZERO;
        }
        let dir = dir.normalize_or_zero();

        let phi = if dir.x == 0.0 && dir.z == 0.0 {
            0.0
        } else {
            let phi = dir.z.atan2(dir.x);
            if phi < 0.0 {
                phi + 2.0 * PI
            } else {
                phi
            }
        };
        let theta = dir.y.clamp(-1.0, 1.0).acos();

        let (w, h) = (self.image.width() as f32, self.image.height() as f32);
        let u = (w / 2.0 + w * phi / (2.0 * PI)) % w;
        let v = h * (PI - theta) / PI;
        self.lookup(u, v)
    }

    fn is_discrete(&self) -> bool {
        false
    }
}

/// Any environment light.
#[derive(Debug, Clone)]
pub enum EnvLight {
    Sphere(EnvSphere),
    Hemisphere(EnvHemisphere),
    Map(EnvMap),
}

impl LightSource for EnvLight {
    fn sample(&self, point: Vec3, rng: &mut dyn RngCore) -> LightSample {
        match self {
            EnvLight::Sphere(l) => l.sample(point, rng),
            EnvLight::Hemisphere(l) => l.sample(point, rng),
            EnvLight::Map(l) => l.sample(point, rng),
        }
    }

    fn sample_direction(&self, dir: Vec3) -> Spectrum {
        match self {
            EnvLight::Sphere(l) => l.sample_direction(dir),
            EnvLight::Hemisphere(l) => l.sample_direction(dir),
            EnvLight::Map(l) => l.sample_direction(dir),
        }
    }

    fn is_discrete(&self) -> bool {
        false
    }
}

// =============================================================================
// Helper functions
// =============================================================================

/// Inverse-square sample towards a point emitter.
fn towards(point: Vec3, position: Vec3, intensity: Spectrum, pmf: f32) -> LightSample {
    let offset = position - point;
    let distance = offset.length();
    LightSample {
        direction: offset.normalize_or_zero(),
        radiance: intensity / (distance * distance).max(f32::MIN_POSITIVE),
        distance,
        pdf: pmf,
    }
}

fn at_infinity(direction: Vec3, radiance: Spectrum, pdf: f32) -> LightSample {
    LightSample {
        direction,
        radiance,
        distance: f32::INFINITY,
        pdf,
    }
}

/// Hermite interpolation between 0 at `edge0` and 1 at `edge1`.
#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 == edge0 {
        return if x >= edge1 { 1.0 } else { 0.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_point_light_inverse_square() {
        let light = PointLight::new(Vec3::new(0.0, 4.0, 0.0), Spectrum::splat(16.0));
        let mut rng = StdRng::seed_from_u64(42);
        let s = light.sample(Vec3::new(0.0, 2.0, 0.0), &mut rng);

        assert!((s.direction - Vec3::Y).length() < 1e-6);
        assert!((s.distance - 2.0).abs() < 1e-6);
        assert_eq!(s.radiance, Spectrum::splat(4.0));
        assert_eq!(s.pdf, 1.0);
        assert!(light.is_discrete());
        assert_eq!(light.sample_direction(Vec3::Y), Spectrum::ZERO);
    }

    #[test]
    fn test_directional_light() {
        let light = DirectionalLight::new(Vec3::new(0.0, -2.0, 0.0), Spectrum::ONE);
        let mut rng = StdRng::seed_from_u64(42);
        let s = light.sample(Vec3::ZERO, &mut rng);
        assert!((s.direction - Vec3::Y).length() < 1e-6);
        assert_eq!(s.distance, f32::INFINITY);
    }

    #[test]
    fn test_spot_light_cone() {
        let light = SpotLight::new(
            Vec3::new(0.0, 5.0, 0.0),
            -Vec3::Y,
            30f32.to_radians(),
            Spectrum::splat(25.0),
        );
        let mut rng = StdRng::seed_from_u64(42);

        // Straight below: full intensity
        let s = light.sample(Vec3::ZERO, &mut rng);
        assert!((s.radiance.r - 1.0).abs() < 1e-5);

        // Well outside the cone: nothing
        let s = light.sample(Vec3::new(10.0, 4.0, 0.0), &mut rng);
        assert_eq!(s.radiance, Spectrum::ZERO);

        // Inside the falloff band: partial
        let edge = 5.0 * 28.5f32.to_radians().tan();
        let s = light.sample(Vec3::new(edge, 0.0, 0.0), &mut rng);
        let full = 25.0 / (25.0 + edge * edge);
        assert!(s.radiance.r > 0.0 && s.radiance.r < full);
    }

    #[test]
    fn test_rect_light_is_one_sided() {
        // Unit square at y = 2 facing down
        let light = RectLight::new(
            Vec3::new(-0.5, 2.0, -0.5),
            Vec3::X,
            Vec3::Z,
            Spectrum::splat(3.0),
        );
        assert!((light.normal() - -Vec3::Y).length() < 1e-6);
        assert!((light.area() - 1.0).abs() < 1e-6);

        let mut rng = StdRng::seed_from_u64(42);
        let below = light.sample(Vec3::ZERO, &mut rng);
        assert_eq!(below.radiance, Spectrum::splat(3.0));
        assert!(below.direction.y > 0.0);
        assert!(below.distance > 1.9 && below.distance < 2.2);

        let above = light.sample(Vec3::new(0.0, 4.0, 0.0), &mut rng);
        assert_eq!(above.radiance, Spectrum::ZERO);
        assert!(!light.is_discrete());
    }

    #[test]
    fn test_rect_light_irradiance() {
        // Small light far away behaves like a point source: E = L A / d^2
        let light = RectLight::new(
            Vec3::new(-0.05, 10.0, -0.05),
            Vec3::X * 0.1,
            Vec3::Z * 0.1,
            Spectrum::ONE,
        );
        let mut rng = StdRng::seed_from_u64(42);
        let n = 1000;
        let mut e = 0.0f64;
        for _ in 0..n {
            let s = light.sample(Vec3::ZERO, &mut rng);
            e += (s.radiance.r * s.direction.y / s.pdf) as f64;
        }
        let e = e / n as f64;
        assert!((e - 0.01 / 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_env_hemisphere() {
        let env = EnvHemisphere {
            radiance: Spectrum::ONE,
        };
        assert_eq!(env.sample_direction(Vec3::Y), Spectrum::ONE);
        assert_eq!(env.sample_direction(-Vec3::Y), Spectrum::ZERO);

        let mut rng = StdRng::seed_from_u64(42);
        let s = env.sample(Vec3::ZERO, &mut rng);
        assert!(s.direction.y >= 0.0);
        assert_eq!(s.distance, f32::INFINITY);
        assert!((s.pdf - 1.0 / (2.0 * PI)).abs() < 1e-6);
    }

    #[test]
    fn test_env_map_lookup_orientation() {
        // Bright upper half
        let image = HdrImage::from_fn(32, 16, |_, y| {
            if y >= 8 {
                Spectrum::ONE
            } else {
                Spectrum::ZERO
            }
        });
        let env = EnvMap::new(image);
        assert!((env.sample_direction(Vec3::Y).r - 1.0).abs() < 1e-5);
        assert_eq!(env.sample_direction(-Vec3::Y), Spectrum::ZERO);
        assert!((env.sample_direction(Vec3::new(1.0, 0.5, 0.0)).g - 1.0).abs() < 1e-5);
        assert!(env.sample_direction(Vec3::new(1.0, -0.5, 0.0)).is_black());
    }

    #[test]
    fn test_env_map_lookup_azimuth() {
        // Column 24 of 32 is azimuth pi/2 (+Z) after the half-width shift
        let image = HdrImage::from_fn(32, 16, |x, _| {
            if x == 24 {
                Spectrum::ONE
            } else {
                Spectrum::ZERO
            }
        });
        let env = EnvMap::new(image);
        // Centre of column 24 is at azimuth 2*pi*(24.5 - 16)/32
        let phi = 2.0 * PI * (24.5 - 16.0) / 32.0;
        let dir = Vec3::new(phi.cos(), 0.0, phi.sin());
        assert!((env.sample_direction(dir).r - 1.0).abs() < 1e-3);
        assert_eq!(env.sample_direction(-Vec3::Z), Spectrum::ZERO);
    }

    #[test]
    fn test_env_map_estimator_is_unbiased() {
        // Integral of the bright upper half is 2*pi
        let image = HdrImage::from_fn(64, 32, |_, y| {
            if y >= 16 {
                Spectrum::ONE
            } else {
                Spectrum::splat(0.01)
            }
        });
        let env = EnvMap::new(image);
        let mut rng = StdRng::seed_from_u64(42);

        let n = 50_000;
        let mut sum = 0.0f64;
        for _ in 0..n {
            let s = env.sample(Vec3::ZERO, &mut rng);
            sum += (s.radiance.luma() / s.pdf) as f64;
        }
        let expected = 2.0 * PI as f64 * (1.0 + 0.01);
        assert!((sum / n as f64 - expected).abs() / expected < 0.05);
    }

    #[test]
    fn test_black_env_map_falls_back_to_uniform() {
        let env = EnvMap::new(HdrImage::from_fn(4, 2, |_, _| Spectrum::ZERO));
        let mut rng = StdRng::seed_from_u64(42);
        let s = env.sample(Vec3::ZERO, &mut rng);
        assert!((s.pdf - 1.0 / (4.0 * PI)).abs() < 1e-6);
        assert_eq!(s.radiance, Spectrum::ZERO);
    }

    #[test]
    fn test_smoothstep() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }
}
