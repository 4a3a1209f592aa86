//! Math types shared by the lumen crates.
//!
//! Re-exports glam and adds the ray tracing primitives built on top of it:
//! distance intervals, bounding boxes, rays, RGB spectra and shading frames.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod frame;
mod interval;
mod ray;
mod spectrum;
mod transform;

pub use aabb::Aabb;
pub use frame::Frame;
pub use interval::Interval;
pub use ray::Ray;
pub use spectrum::Spectrum;
pub use transform::Mat4Ext;

/// Small distance used to offset rays from the surface they leave.
pub const EPS_F: f32 = 1e-4;
