//! Primitive trait and Trace record for ray-object intersection.

use lumen_math::{Aabb, Ray, Vec3};

/// Index into the scene's material table.
pub type MaterialId = usize;

/// Record of a ray-object intersection.
///
/// A miss carries `hit == false` and zeroed geometry; callers must not read
/// geometry from a miss.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trace {
    /// Whether anything was hit
    pub hit: bool,
    /// Parameter t along the ray where the intersection occurs
    pub distance: f32,
    /// Origin of the ray that produced this record
    pub origin: Vec3,
    /// Point of intersection
    pub position: Vec3,
    /// Outward surface normal (unit length)
    pub normal: Vec3,
    /// Material at the intersection point, set by scene objects
    pub material: Option<MaterialId>,
}

impl Trace {
    /// A record for a ray that hit nothing.
    pub fn miss(origin: Vec3) -> Self {
        Self {
            hit: false,
            distance: 0.0,
            origin,
            position: Vec3::ZERO,
            normal: Vec3::ZERO,
            material: None,
        }
    }

    /// The nearer of two records. Misses lose; on equal distance `a` wins.
    pub fn closest(a: Trace, b: Trace) -> Trace {
        match (a.hit, b.hit) {
            (false, _) => b,
            (true, false) => a,
            (true, true) if b.distance < a.distance => b,
            _ => a,
        }
    }
}

/// Anything that can be placed in a BVH.
///
/// `hit` must only accept intersections inside `ray.dist_bounds`, and on
/// acceptance shrink `ray.dist_bounds.max` to the hit distance so later
/// tests in the same traversal cannot report a farther hit.
pub trait Primitive: Send + Sync {
    /// Get the axis-aligned bounding box of this primitive.
    fn bbox(&self) -> Aabb;

    /// Closest intersection within the ray's bounds.
    fn hit(&self, ray: &mut Ray) -> Trace;
}

impl<P: Primitive + ?Sized> Primitive for Box<P> {
    fn bbox(&self) -> Aabb {
        (**self).bbox()
    }

    fn hit(&self, ray: &mut Ray) -> Trace {
        (**self).hit(ray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit_at(distance: f32) -> Trace {
        Trace {
            hit: true,
            distance,
            ..Trace::miss(Vec3::ZERO)
        }
    }

    #[test]
    fn test_miss_is_zeroed() {
        let t = Trace::miss(Vec3::ONE);
        assert!(!t.hit);
        assert_eq!(t.distance, 0.0);
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.normal, Vec3::ZERO);
        assert_eq!(t.material, None);
        assert_eq!(t.origin, Vec3::ONE);
    }

    #[test]
    fn test_closest() {
        let near = hit_at(1.0);
        let far = hit_at(2.0);
        let miss = Trace::miss(Vec3::ZERO);

        assert_eq!(Trace::closest(near, far).distance, 1.0);
        assert_eq!(Trace::closest(far, near).distance, 1.0);
        assert_eq!(Trace::closest(miss, far).distance, 2.0);
        assert_eq!(Trace::closest(far, miss).distance, 2.0);
        assert!(!Trace::closest(miss, miss).hit);
    }

    #[test]
    fn test_closest_tie_keeps_first() {
        let a = Trace {
            material: Some(1),
            ..hit_at(1.0)
        };
        let b = Trace {
            material: Some(2),
            ..hit_at(1.0)
        };
        assert_eq!(Trace::closest(a, b).material, Some(1));
    }
}
