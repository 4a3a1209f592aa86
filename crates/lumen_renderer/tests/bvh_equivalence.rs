//! The BVH must report the same closest hit as testing every primitive.

use std::sync::Arc;

use lumen_math::Mat4;
use lumen_renderer::{Bvh, Object, Primitive, Ray, Shape, Sphere, Trace, Triangle, Vec3, Vertex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_point(rng: &mut StdRng, extent: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
    )
}

fn random_ray(rng: &mut StdRng) -> Ray {
    let origin = random_point(rng, 15.0);
    // Aim near the populated region so most rays hit something
    let target = random_point(rng, 5.0);
    Ray::new(origin, (target - origin).normalize())
}

fn linear_scan<P: Primitive>(primitives: &[P], ray: &Ray) -> Trace {
    primitives.iter().fold(Trace::miss(ray.origin), |closest, p| {
        let mut fresh = *ray;
        Trace::closest(closest, p.hit(&mut fresh))
    })
}

fn assert_same(bvh_trace: Trace, scan: Trace) {
    assert_eq!(bvh_trace.hit, scan.hit, "bvh {bvh_trace:?} vs scan {scan:?}");
    if scan.hit {
        assert!(
            (bvh_trace.distance - scan.distance).abs() < 1e-4,
            "bvh {bvh_trace:?} vs scan {scan:?}"
        );
        assert!((bvh_trace.position - scan.position).length() < 1e-3);
        assert_eq!(bvh_trace.material, scan.material);
    }
}

fn random_triangles(rng: &mut StdRng, count: usize) -> Vec<Triangle> {
    (0..count)
        .map(|_| {
            let center = random_point(rng, 5.0);
            let vertices: Arc<[Vertex]> = (0..3)
                .map(|_| Vertex {
                    position: center + random_point(rng, 0.8),
                    normal: Vec3::Y,
                })
                .collect();
            Triangle::new(vertices, 0, 1, 2)
        })
        .collect()
}

#[test]
fn triangles_match_linear_scan() {
    let mut rng = StdRng::seed_from_u64(42);
    let triangles = random_triangles(&mut rng, 300);

    for max_leaf in [0, 1, 4, 16] {
        let bvh = Bvh::new(triangles.clone(), max_leaf);
        assert_eq!(bvh.len(), triangles.len());

        let mut hits = 0;
        for _ in 0..500 {
            let ray = random_ray(&mut rng);
            let scan = linear_scan(&triangles, &ray);
            let mut traced = ray;
            let trace = bvh.hit(&mut traced);
            assert_same(trace, scan);

            if scan.hit {
                hits += 1;
                assert!((traced.dist_bounds.max - scan.distance).abs() < 1e-4);
            }
        }
        assert!(hits > 50, "only {hits} rays hit anything");
    }
}

#[test]
fn objects_match_linear_scan() {
    let mut rng = StdRng::seed_from_u64(7);
    let objects: Vec<Object> = (0..120)
        .map(|i| {
            let radius = rng.gen_range(0.1..0.7);
            let transform = Mat4::from_translation(random_point(&mut rng, 5.0));
            Object::new(Shape::Sphere(Sphere::new(radius)), transform, i)
        })
        .collect();

    let bvh = Bvh::new(objects.clone(), 2);
    for _ in 0..1000 {
        let ray = random_ray(&mut rng);
        let mut traced = ray;
        assert_same(bvh.hit(&mut traced), linear_scan(&objects, &ray));
    }
}

#[test]
fn repeated_queries_are_identical() {
    let mut rng = StdRng::seed_from_u64(3);
    let triangles = random_triangles(&mut rng, 100);
    let bvh = Bvh::new(triangles, 4);

    for _ in 0..100 {
        let ray = random_ray(&mut rng);
        let (mut a, mut b) = (ray, ray);
        let first = bvh.hit(&mut a);
        let second = bvh.hit(&mut b);
        assert_eq!(first, second);
    }
}

#[test]
fn bounded_rays_ignore_far_hits() {
    let mut rng = StdRng::seed_from_u64(11);
    let triangles = random_triangles(&mut rng, 200);
    let bvh = Bvh::new(triangles.clone(), 4);

    for _ in 0..300 {
        let ray = random_ray(&mut rng);
        let scan = linear_scan(&triangles, &ray);
        if !scan.hit {
            continue;
        }
        // Stop just short of the closest hit
        let mut short = ray.with_bounds(0.0, scan.distance * 0.999);
        assert!(!bvh.hit(&mut short).hit);
    }
}
