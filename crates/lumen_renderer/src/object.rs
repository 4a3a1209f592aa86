//! Scene objects: a shape placed in the world with a material.
//!
//! Shapes stay in object space. Rays are moved into object space with the
//! inverse transform, so a mesh loaded once can be placed many times by
//! sharing its BVH behind an `Arc`.

use std::sync::Arc;

use crate::primitive::{MaterialId, Primitive, Trace};
use crate::sphere::Sphere;
use crate::triangle::TriMesh;
use lumen_math::{Aabb, Mat3, Mat4, Mat4Ext, Ray};

/// Geometry of an object in its own space.
#[derive(Debug, Clone)]
pub enum Shape {
    Sphere(Sphere),
    Mesh(Arc<TriMesh>),
}

impl Primitive for Shape {
    fn bbox(&self) -> Aabb {
        match self {
            Shape::Sphere(s) => s.bbox(),
            Shape::Mesh(m) => m.bbox(),
        }
    }

    fn hit(&self, ray: &mut Ray) -> Trace {
        match self {
            Shape::Sphere(s) => s.hit(ray),
            Shape::Mesh(m) => m.hit(ray),
        }
    }
}

/// A shape with an object-to-world transform and a material.
#[derive(Debug, Clone)]
pub struct Object {
    shape: Shape,
    transform: Mat4,
    inverse: Mat4,
    normal_matrix: Mat3,
    material: MaterialId,
    /// World-space bounds, cached for the scene BVH build
    bbox: Aabb,
}

impl Object {
    pub fn new(shape: Shape, transform: Mat4, material: MaterialId) -> Self {
        let bbox = transform.transform_aabb(&shape.bbox());
        Self {
            shape,
            transform,
            inverse: transform.inverse(),
            normal_matrix: transform.normal_matrix(),
            material,
            bbox,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }

    pub fn transform(&self) -> &Mat4 {
        &self.transform
    }
}

impl Primitive for Object {
    fn bbox(&self) -> Aabb {
        self.bbox
    }

    /// Intersect in object space and bring the hit back to world space.
    ///
    /// The direction is not renormalized, so distances agree between spaces
    /// and the ray's bounds carry over unchanged.
    fn hit(&self, ray: &mut Ray) -> Trace {
        let mut local = ray.transformed(&self.inverse);
        let trace = self.shape.hit(&mut local);
        if !trace.hit {
            return Trace::miss(ray.origin);
        }

        ray.dist_bounds.max = local.dist_bounds.max;
        Trace {
            hit: true,
            distance: trace.distance,
            origin: ray.origin,
            position: ray.at(trace.distance),
            normal: (self.normal_matrix * trace.normal).normalize_or_zero(),
            material: Some(self.material),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_math::{Quat, Vec3};

    #[test]
    fn test_translated_sphere() {
        let object = Object::new(
            Shape::Sphere(Sphere::new(1.0)),
            Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)),
            3,
        );

        let mut ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        let trace = object.hit(&mut ray);
        assert!(trace.hit);
        assert!((trace.distance - 4.0).abs() < 1e-4);
        assert!((trace.position - Vec3::new(0.0, 0.0, -4.0)).length() < 1e-4);
        assert!((trace.normal - Vec3::Z).length() < 1e-4);
        assert_eq!(trace.material, Some(3));
        assert!((ray.dist_bounds.max - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_scaled_sphere_keeps_world_distance() {
        let object = Object::new(
            Shape::Sphere(Sphere::new(1.0)),
            Mat4::from_scale(Vec3::splat(2.0)),
            0,
        );

        let mut ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), -Vec3::Z);
        let trace = object.hit(&mut ray);
        assert!(trace.hit);
        assert!((trace.distance - 8.0).abs() < 1e-4);
        assert!((trace.normal.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_squashed_sphere_normal() {
        // Squash a unit sphere along X into an ellipsoid
        let transform = Mat4::from_scale(Vec3::new(0.5, 1.0, 1.0));
        let object = Object::new(Shape::Sphere(Sphere::new(1.0)), transform, 0);

        let dir = Vec3::new(-1.0, -1.0, 0.0).normalize();
        let mut ray = Ray::new(Vec3::new(2.0, 2.0, 0.0), dir);
        let trace = object.hit(&mut ray);
        assert!(trace.hit);
        assert!((trace.normal.length() - 1.0).abs() < 1e-5);

        // Gradient of (2x)^2 + y^2 + z^2 at the hit point
        let p = trace.position;
        let expected = Vec3::new(4.0 * p.x, p.y, p.z).normalize();
        assert!((trace.normal - expected).length() < 1e-4, "{:?}", trace.normal);
    }

    #[test]
    fn test_world_bbox() {
        let object = Object::new(
            Shape::Sphere(Sphere::new(1.0)),
            Mat4::from_scale_rotation_translation(
                Vec3::new(1.0, 3.0, 1.0),
                Quat::IDENTITY,
                Vec3::new(5.0, 0.0, 0.0),
            ),
            0,
        );
        let bbox = object.bbox();
        assert!((bbox.min() - Vec3::new(4.0, -3.0, -1.0)).length() < 1e-3);
        assert!((bbox.max() - Vec3::new(6.0, 3.0, 1.0)).length() < 1e-3);
    }

    #[test]
    fn test_miss_leaves_bounds() {
        let object = Object::new(
            Shape::Sphere(Sphere::new(1.0)),
            Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)),
            0,
        );
        let mut ray = Ray::new(Vec3::ZERO, Vec3::X);
        let trace = object.hit(&mut ray);
        assert!(!trace.hit);
        assert_eq!(ray.dist_bounds.max, f32::INFINITY);
    }
}
