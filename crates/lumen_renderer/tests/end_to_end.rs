//! A white sphere under one point light, loaded from JSON and rendered.

use std::f32::consts::PI;

use lumen_core::SceneDesc;
use lumen_renderer::{render, Camera, Pathtracer, Ray, Scene, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;

const ALBEDO: f32 = 0.8;
const INTENSITY: f32 = 9.0;
const LIGHT_HEIGHT: f32 = 4.0;

const SCENE: &str = r#"{
    "render": { "width": 9, "height": 9, "samples_per_pixel": 16, "max_depth": 1, "bucket_size": 4 },
    "camera": { "position": [0, 6, 0], "target": [0, 0, 0], "up": [0, 0, -1], "vertical_fov": 5 },
    "materials": { "white": { "type": "lambertian", "albedo": [0.8, 0.8, 0.8] } },
    "objects": [
        { "name": "ball", "material": "white", "shape": { "type": "sphere", "radius": 1.0 } }
    ],
    "lights": [ { "type": "point", "position": [0, 4, 0], "intensity": [9, 9, 9] } ]
}"#;

fn tracer() -> Pathtracer {
    let desc = SceneDesc::from_json(SCENE).unwrap();
    let scene = Scene::from_desc(&desc).unwrap();
    let camera = Camera::from_desc(&desc.camera, desc.render.aspect_ratio());
    Pathtracer::new(scene, camera, desc.render.clone())
}

/// Radiance leaving the sphere at unit normal `n` towards the viewer.
fn expected_radiance(n: Vec3) -> f32 {
    let to_light = Vec3::new(0.0, LIGHT_HEIGHT, 0.0) - n;
    let cos_theta = n.dot(to_light.normalize()).max(0.0);
    ALBEDO / PI * cos_theta * INTENSITY / to_light.length_squared()
}

#[test]
fn point_directly_below_light() {
    let tracer = tracer();
    let mut rng = StdRng::seed_from_u64(42);

    let ray = Ray::new(Vec3::new(0.0, 3.0, 0.0), -Vec3::Y);
    let radiance = tracer.trace_ray(&ray, &mut rng);
    let expected = expected_radiance(Vec3::Y);

    assert!((expected - ALBEDO / PI).abs() < 1e-6);
    assert!((radiance.r - expected).abs() < 1e-4, "{radiance:?} vs {expected}");
    assert_eq!(radiance.r, radiance.g);
}

#[test]
fn oblique_point_follows_cosine_and_inverse_square() {
    let tracer = tracer();
    let mut rng = StdRng::seed_from_u64(42);

    for degrees in [20.0f32, 45.0, 60.0] {
        let angle = degrees.to_radians();
        let n = Vec3::new(angle.sin(), angle.cos(), 0.0);
        let ray = Ray::new(n * 3.0, -n);

        let radiance = tracer.trace_ray(&ray, &mut rng);
        let expected = expected_radiance(n);
        assert!(
            (radiance.r - expected).abs() < 1e-4,
            "{degrees} degrees: {radiance:?} vs {expected}"
        );
    }
}

#[test]
fn underside_is_black() {
    let tracer = tracer();
    let mut rng = StdRng::seed_from_u64(42);

    let ray = Ray::new(Vec3::new(0.0, -3.0, 0.0), Vec3::Y);
    assert!(tracer.trace_ray(&ray, &mut rng).is_black());
}

#[test]
fn rendered_center_pixel_converges() {
    let image = render(&tracer());
    let center = image.get(4, 4);
    let expected = ALBEDO / PI;

    // The pixel footprint is a tiny cap around the top of the sphere
    assert!((center.r - expected).abs() / expected < 0.01, "{center:?}");

    // Corners still see the sphere but further from the pole, so darker
    assert!(image.get(0, 0).r < center.r);
}
