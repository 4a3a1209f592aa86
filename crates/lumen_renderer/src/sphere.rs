//! Sphere primitive for ray tracing.
//!
//! Spheres live at the object-space origin; scene objects place them with a
//! transform.

use crate::primitive::{Primitive, Trace};
use lumen_math::{Aabb, Ray, Vec3};

/// An origin-centred sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    radius: f32,
}

impl Sphere {
    /// Create a new sphere. Negative radii are clamped to zero.
    pub fn new(radius: f32) -> Self {
        Self {
            radius: radius.max(0.0),
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl Primitive for Sphere {
    fn bbox(&self) -> Aabb {
        let r = Vec3::splat(self.radius);
        Aabb::from_points(-r, r)
    }

    fn hit(&self, ray: &mut Ray) -> Trace {
        let miss = Trace::miss(ray.origin);
        if self.radius <= 0.0 {
            return miss;
        }

        // |o + t d|^2 = r^2  =>  a t^2 + 2 b t + c = 0
        let a = ray.direction.length_squared();
        let b = ray.origin.dot(ray.direction);
        let c = ray.origin.length_squared() - self.radius * self.radius;
        if a == 0.0 {
            return miss;
        }

        let discriminant = b * b - a * c;
        if discriminant < 0.0 {
            return miss;
        }
        let sqrtd = discriminant.sqrt();

        // Nearest root in the acceptable range
        let mut t = (-b - sqrtd) / a;
        if !ray.dist_bounds.contains(t) {
            t = (-b + sqrtd) / a;
            if !ray.dist_bounds.contains(t) {
                return miss;
            }
        }

        ray.dist_bounds.max = t;
        let position = ray.at(t);
        Trace {
            hit: true,
            distance: t,
            origin: ray.origin,
            position,
            normal: position / self.radius,
            material: None,
        }
    }
}
