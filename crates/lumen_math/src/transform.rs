// Transform utilities for Mat4
//
// Object placement in the scene is an affine Mat4. glam already provides
// transform_point3(), transform_vector3() and inverse(); the helpers here cover
// what ray tracing additionally needs.

use glam::{Mat3, Mat4, Vec3};

use crate::Aabb;

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;

    /// Matrix that carries surface normals: the inverse transpose of the
    /// linear part. Results need renormalizing.
    fn normal_matrix(&self) -> Mat3;
}

impl Mat4Ext for Mat4 {
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_empty() {
            return Aabb::empty();
        }

        let lo = aabb.min();
        let hi = aabb.max();
        let mut result = Aabb::empty();
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { lo.x } else { hi.x },
                if i & 2 == 0 { lo.y } else { hi.y },
                if i & 4 == 0 { lo.z } else { hi.z },
            );
            result.enclose_point(self.transform_point3(corner));
        }
        Aabb::from_points(result.min(), result.max())
    }

    fn normal_matrix(&self) -> Mat3 {
        Mat3::from_mat4(*self).inverse().transpose()
    }
}
