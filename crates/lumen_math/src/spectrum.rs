//! RGB radiance / reflectance triples.

use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub};

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Linear RGB radiance or reflectance.
///
/// All arithmetic is componentwise. `luma` gives the scalar brightness used
/// for Russian roulette and importance weights.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Spectrum {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Spectrum {
    pub const ZERO: Spectrum = Spectrum::new(0.0, 0.0, 0.0);
    pub const ONE: Spectrum = Spectrum::new(1.0, 1.0, 1.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    #[inline]
    pub fn from_vec3(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    #[inline]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }

    /// Rec. 709 relative luminance.
    #[inline]
    pub fn luma(&self) -> f32 {
        0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b
    }

    #[inline]
    pub fn is_black(&self) -> bool {
        self.r == 0.0 && self.g == 0.0 && self.b == 0.0
    }

    /// True if every channel is a finite number.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }

    #[inline]
    pub fn max_component(&self) -> f32 {
        self.r.max(self.g).max(self.b)
    }

    /// Map a unit direction into a displayable color (for debugging normals).
    pub fn direction(dir: Vec3) -> Self {
        let d = dir.normalize_or_zero();
        Self::new(d.x.abs(), d.y.abs(), d.z.abs())
    }
}

impl From<[f32; 3]> for Spectrum {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl Add for Spectrum {
    type Output = Spectrum;
    #[inline]
    fn add(self, rhs: Spectrum) -> Spectrum {
        Spectrum::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl AddAssign for Spectrum {
    #[inline]
    fn add_assign(&mut self, rhs: Spectrum) {
        *self = *self + rhs;
    }
}

impl Sub for Spectrum {
    type Output = Spectrum;
    #[inline]
    fn sub(self, rhs: Spectrum) -> Spectrum {
        Spectrum::new(self.r - rhs.r, self.g - rhs.g, self.b - rhs.b)
    }
}

impl Mul for Spectrum {
    type Output = Spectrum;
    #[inline]
    fn mul(self, rhs: Spectrum) -> Spectrum {
        Spectrum::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b)
    }
}

impl MulAssign for Spectrum {
    #[inline]
    fn mul_assign(&mut self, rhs: Spectrum) {
        *self = *self * rhs;
    }
}

impl Mul<f32> for Spectrum {
    type Output = Spectrum;
    #[inline]
    fn mul(self, rhs: f32) -> Spectrum {
        Spectrum::new(self.r * rhs, self.g * rhs, self.b * rhs)
    }
}

impl Mul<Spectrum> for f32 {
    type Output = Spectrum;
    #[inline]
    fn mul(self, rhs: Spectrum) -> Spectrum {
        rhs * self
    }
}

impl MulAssign<f32> for Spectrum {
    #[inline]
    fn mul_assign(&mut self, rhs: f32) {
        *self = *self * rhs;
    }
}

impl Div<f32> for Spectrum {
    type Output = Spectrum;
    #[inline]
    fn div(self, rhs: f32) -> Spectrum {
        Spectrum::new(self.r / rhs, self.g / rhs, self.b / rhs)
    }
}

impl DivAssign<f32> for Spectrum {
    #[inline]
    fn div_assign(&mut self, rhs: f32) {
        *self = *self / rhs;
    }
}

impl std::iter::Sum for Spectrum {
    fn sum<I: Iterator<Item = Spectrum>>(iter: I) -> Spectrum {
        iter.fold(Spectrum::ZERO, |acc, s| acc + s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_componentwise_ops() {
        let a = Spectrum::new(1.0, 2.0, 3.0);
        let b = Spectrum::new(0.5, 0.5, 2.0);

        assert_eq!(a + b, Spectrum::new(1.5, 2.5, 5.0));
        assert_eq!(a * b, Spectrum::new(0.5, 1.0, 6.0));
        assert_eq!(a * 2.0, Spectrum::new(2.0, 4.0, 6.0));
        assert_eq!(2.0 * a, a * 2.0);
        assert_eq!(a / 2.0, Spectrum::new(0.5, 1.0, 1.5));
    }

    #[test]
    fn test_luma_of_white_is_one() {
        assert!((Spectrum::ONE.luma() - 1.0).abs() < 1e-6);
        assert_eq!(Spectrum::ZERO.luma(), 0.0);
    }

    #[test]
    fn test_is_black() {
        assert!(Spectrum::ZERO.is_black());
        assert!(!Spectrum::new(0.0, 1e-6, 0.0).is_black());
    }

    #[test]
    fn test_pod_layout() {
        let s = Spectrum::new(1.0, 2.0, 3.0);
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&s));
        assert_eq!(floats, &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_sum() {
        let total: Spectrum = vec![Spectrum::ONE; 4].into_iter().sum();
        assert_eq!(total, Spectrum::splat(4.0));
    }
}
