//! lumen renderer - CPU path tracing
//!
//! A Monte Carlo path tracer with next-event estimation. Scenes are built
//! from a [`lumen_core::SceneDesc`]; geometry lives in a generic BVH that
//! also nests (per-mesh BVHs inside the scene BVH), and frames are rendered
//! in spiral-ordered buckets across rayon's thread pool.

mod bsdf;
mod bucket;
mod bvh;
mod camera;
mod light;
mod object;
mod pathtracer;
mod primitive;
mod random;
mod renderer;
mod samplers;
mod scene;
mod sphere;
mod triangle;

pub use bsdf::{reflect, refract, Bsdf, BsdfSample};
pub use bucket::{generate_buckets, render_bucket, Bucket, BucketResult};
pub use bvh::Bvh;
pub use camera::Camera;
pub use light::{
    DirectionalLight, EnvHemisphere, EnvLight, EnvMap, EnvSphere, Light, LightSample,
    LightSource, PointLight, RectLight, SpotLight,
};
pub use object::{Object, Shape};
pub use pathtracer::Pathtracer;
pub use primitive::{MaterialId, Primitive, Trace};
pub use random::{coin_flip, gen_f32};
pub use renderer::{color_to_rgba, linear_to_gamma, render, ImageBuffer};
pub use samplers::{
    HemisphereCosine, HemisphereUniform, Point, RectUniform, SphereImage, SphereUniform,
    TwoPoints,
};
pub use scene::Scene;
pub use sphere::Sphere;
pub use triangle::{TriMesh, Triangle, Vertex};

/// Re-export common math types from lumen_math
pub use lumen_math::{Aabb, Interval, Ray, Spectrum, Vec2, Vec3};
