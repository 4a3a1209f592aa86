//! Local shading frames.
//!
//! BSDFs and samplers work in a frame where the surface normal is +Y, so
//! `cos θ` is simply the `y` component of a direction.

use glam::Vec3;

/// Orthonormal basis with `normal` as the local up (+Y) axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub tangent: Vec3,
    pub normal: Vec3,
    pub bitangent: Vec3,
}

impl Frame {
    /// Build a right-handed frame around a unit normal.
    pub fn from_normal(normal: Vec3) -> Self {
        let normal = normal.normalize();
        // b1 x b2 = n, so (b2, n, b1) is right-handed with n as +Y
        let (b1, b2) = normal.any_orthonormal_pair();
        Self {
            tangent: b2,
            normal,
            bitangent: b1,
        }
    }

    /// World-space vector into the local frame.
    #[inline]
    pub fn to_local(&self, v: Vec3) -> Vec3 {
        Vec3::new(v.dot(self.tangent), v.dot(self.normal), v.dot(self.bitangent))
    }

    /// Local-frame vector back into world space.
    #[inline]
    pub fn to_world(&self, v: Vec3) -> Vec3 {
        self.tangent * v.x + self.normal * v.y + self.bitangent * v.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_maps_to_up() {
        for n in [Vec3::X, Vec3::Y, -Vec3::Y, Vec3::Z, Vec3::new(1.0, -2.0, 0.5).normalize()] {
            let frame = Frame::from_normal(n);
            let up = frame.to_local(n);
            assert!((up - Vec3::Y).length() < 1e-5, "normal {n:?} -> {up:?}");
        }
    }

    #[test]
    fn test_round_trip() {
        let frame = Frame::from_normal(Vec3::new(0.3, 0.9, -0.2));
        let v = Vec3::new(0.25, -0.5, 0.8);
        let back = frame.to_world(frame.to_local(v));
        assert!((back - v).length() < 1e-5);
    }

    #[test]
    fn test_right_handed() {
        let frame = Frame::from_normal(Vec3::new(-0.4, 0.1, 0.7));
        let z = frame.tangent.cross(frame.normal);
        assert!((z - frame.bitangent).length() < 1e-5);
    }
}
