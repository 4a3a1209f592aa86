//! Camera for ray generation.

use crate::samplers::RectUniform;
use lumen_core::CameraDesc;
use lumen_math::{Mat4, Ray, Vec2, Vec3};
use rand::RngCore;

/// Pinhole camera with an optional square aperture.
///
/// In camera space the pinhole sits at the origin looking down -Z and the
/// sensor plane is at `z = -focal_distance`, which is also the plane in
/// perfect focus when the aperture is open.
#[derive(Debug, Clone)]
pub struct Camera {
    // Placement
    position: Vec3,
    target: Vec3,
    up: Vec3,

    // Lens settings
    vfov: f32,           // Vertical field of view in degrees
    aspect_ratio: f32,   // Width over height
    focal_distance: f32, // Distance to the sensor / focus plane
    aperture: f32,       // Side length of the square aperture

    // Cached by update()
    half_width: f32,
    half_height: f32,
    camera_to_world: Mat4,
}

impl Camera {
    /// Create a camera at the origin looking down -Z.
    pub fn new() -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            target: -Vec3::Z,
            up: Vec3::Y,
            vfov: 90.0,
            aspect_ratio: 1.0,
            focal_distance: 1.0,
            aperture: 0.0,
            half_width: 0.0,
            half_height: 0.0,
            camera_to_world: Mat4::IDENTITY,
        };
        camera.update();
        camera
    }

    /// Build from a scene description for an image of the given aspect ratio.
    pub fn from_desc(desc: &CameraDesc, aspect_ratio: f32) -> Self {
        Self::new()
            .with_position(
                Vec3::from(desc.position),
                Vec3::from(desc.target),
                Vec3::from(desc.up),
            )
            .with_lens(desc.vertical_fov, desc.focal_distance, desc.aperture)
            .with_aspect_ratio(aspect_ratio)
    }

    /// Set camera placement.
    pub fn with_position(mut self, position: Vec3, target: Vec3, up: Vec3) -> Self {
        self.position = position;
        self.target = target;
        self.up = up;
        self.update();
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, focal_distance: f32, aperture: f32) -> Self {
        self.vfov = vfov;
        self.focal_distance = focal_distance.max(f32::EPSILON);
        self.aperture = aperture.max(0.0);
        self.update();
        self
    }

    /// Set the sensor's width over height.
    pub fn with_aspect_ratio(mut self, aspect_ratio: f32) -> Self {
        self.aspect_ratio = aspect_ratio;
        self.update();
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn aperture(&self) -> f32 {
        self.aperture
    }

    /// Recompute the sensor size and the camera-to-world matrix.
    fn update(&mut self) {
        self.half_height = (self.vfov.to_radians() / 2.0).tan() * self.focal_distance;
        self.half_width = self.half_height * self.aspect_ratio;

        // look_at_rh degenerates when up is parallel to the view direction
        let forward = self.target - self.position;
        let up = if forward.cross(self.up).length_squared() > 1e-12 {
            self.up
        } else if forward.cross(Vec3::Z).length_squared() > 1e-12 {
            Vec3::Z
        } else {
            Vec3::X
        };
        self.camera_to_world = Mat4::look_at_rh(self.position, self.target, up).inverse();
    }

    /// World-space ray through a point on the sensor.
    ///
    /// `screen` is in `[0, 1]^2` with `(0, 0)` at the bottom-left corner.
    pub fn generate_ray(&self, screen: Vec2, rng: &mut dyn RngCore) -> Ray {
        let sensor = Vec3::new(
            -self.half_width + screen.x * 2.0 * self.half_width,
            -self.half_height + screen.y * 2.0 * self.half_height,
            -self.focal_distance,
        );

        let origin = if self.aperture > 0.0 {
            let (offset, _) = RectUniform::new(Vec2::splat(self.aperture)).sample(rng);
            let offset = offset - Vec2::splat(self.aperture / 2.0);
            Vec3::new(offset.x, offset.y, 0.0)
        } else {
            Vec3::ZERO
        };

        // Every aperture point sees the same sensor point in focus
        let direction = (sensor - origin).normalize();
        Ray::new(
            self.camera_to_world.transform_point3(origin),
            self.camera_to_world.transform_vector3(direction),
        )
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_center_ray_points_at_target() {
        let camera = Camera::new().with_position(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::Y,
        );
        let mut rng = StdRng::seed_from_u64(42);

        let ray = camera.generate_ray(Vec2::splat(0.5), &mut rng);
        assert!((ray.origin - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-5);
        assert!((ray.direction - -Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_corner_rays_span_field_of_view() {
        let camera = Camera::new()
            .with_lens(90.0, 1.0, 0.0)
            .with_aspect_ratio(2.0);
        let mut rng = StdRng::seed_from_u64(42);

        // 90 degree vertical fov: the top edge is 45 degrees up
        let top = camera.generate_ray(Vec2::new(0.5, 1.0), &mut rng);
        assert!((top.direction.y - top.direction.z.abs()).abs() < 1e-5);

        // Aspect 2: the right edge is at x = 2 on a sensor at z = -1
        let right = camera.generate_ray(Vec2::new(1.0, 0.5), &mut rng);
        assert!((right.direction.x / -right.direction.z - 2.0).abs() < 1e-4);

        // Bottom-left corner
        let corner = camera.generate_ray(Vec2::ZERO, &mut rng);
        assert!(corner.direction.x < 0.0 && corner.direction.y < 0.0);
    }

    #[test]
    fn test_aperture_rays_converge_at_focus() {
        let camera = Camera::new()
            .with_position(Vec3::ZERO, -Vec3::Z, Vec3::Y)
            .with_lens(60.0, 4.0, 0.5);
        let mut rng = StdRng::seed_from_u64(42);

        let screen = Vec2::new(0.3, 0.7);
        let reference = camera.generate_ray(screen, &mut rng);
        let focus = reference.at(-4.0 / reference.direction.z);

        for _ in 0..16 {
            let ray = camera.generate_ray(screen, &mut rng);
            assert!(ray.origin.x.abs() <= 0.25 && ray.origin.y.abs() <= 0.25);
            let p = ray.at(-4.0 / ray.direction.z);
            assert!((p - focus).length() < 1e-4);
        }
    }

    #[test]
    fn test_from_desc_and_vertical_up() {
        let desc = CameraDesc {
            position: [0.0, 10.0, 0.0],
            target: [0.0, 0.0, 0.0],
            ..CameraDesc::default()
        };
        let camera = Camera::from_desc(&desc, 1.5);
        let mut rng = StdRng::seed_from_u64(42);

        let ray = camera.generate_ray(Vec2::splat(0.5), &mut rng);
        assert!(ray.direction.is_finite());
        assert!((ray.direction - -Vec3::Y).length() < 1e-5);
    }
}
