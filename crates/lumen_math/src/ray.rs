use glam::{Mat4, Vec3};

use crate::{Interval, Spectrum};

/// A ray in 3D space used for path tracing.
///
/// Besides origin and direction the ray carries the interval of distances
/// within which a hit is accepted. Intersection routines shrink
/// `dist_bounds.max` whenever they accept a hit, so later tests in the same
/// traversal automatically reject anything farther away.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    /// Componentwise reciprocal of `direction` (infinite for zero components).
    pub inv_direction: Vec3,
    pub dist_bounds: Interval,
    /// Number of bounces taken to reach this ray.
    pub depth: u32,
    /// Product of path weights accumulated along earlier bounces.
    pub throughput: Spectrum,
}

impl Ray {
    /// Create a new ray accepting hits at any non-negative distance.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            inv_direction: direction.recip(),
            dist_bounds: Interval::FORWARD,
            depth: 0,
            throughput: Spectrum::ONE,
        }
    }

    /// Replace the accepted distance interval.
    pub fn with_bounds(mut self, min: f32, max: f32) -> Self {
        self.dist_bounds = Interval::new(min, max);
        self
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Transform the ray by an affine matrix.
    ///
    /// The direction is intentionally left unnormalized so that a distance
    /// `t` means the same point in both spaces.
    pub fn transformed(&self, m: &Mat4) -> Ray {
        let direction = m.transform_vector3(self.direction);
        Ray {
            origin: m.transform_point3(self.origin),
            direction,
            inv_direction: direction.recip(),
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);

        assert_eq!(ray.at(0.0), Vec3::ZERO);
        assert_eq!(ray.at(2.0), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(ray.at(-1.0), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_inverse_direction_handles_zero() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 2.0, -4.0));
        assert!(ray.inv_direction.x.is_infinite());
        assert_eq!(ray.inv_direction.y, 0.5);
        assert_eq!(ray.inv_direction.z, -0.25);
    }

    #[test]
    fn test_defaults() {
        let ray = Ray::new(Vec3::ZERO, Vec3::Y);
        assert_eq!(ray.depth, 0);
        assert_eq!(ray.throughput, Spectrum::ONE);
        assert_eq!(ray.dist_bounds.min, 0.0);
        assert_eq!(ray.dist_bounds.max, f32::INFINITY);
    }

    #[test]
    fn test_transformed_preserves_distance() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0)).with_bounds(0.1, 3.0);
        let m = Mat4::from_scale(Vec3::splat(2.0));
        let moved = ray.transformed(&m);

        assert_eq!(moved.dist_bounds, ray.dist_bounds);
        assert!((m.transform_point3(ray.at(1.5)) - moved.at(1.5)).length() < 1e-5);
    }
}
