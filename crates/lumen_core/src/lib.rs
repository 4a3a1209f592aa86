//! Lumen Core - Scene description, meshes and images for the lumen renderer.
//!
//! This crate provides:
//!
//! - **Scene description**: `SceneDesc` and friends, parsed from JSON
//! - **Render settings**: `RenderConfig`
//! - **Geometry**: `Mesh`, inline or loaded from OBJ
//! - **Images**: `HdrImage` for environment maps
//!
//! # Example
//!
//! ```ignore
//! use lumen_core::SceneDesc;
//!
//! let scene = SceneDesc::load("scenes/cornell.json")?;
//! println!("{} objects, {} lights", scene.objects.len(), scene.lights.len());
//! ```

pub mod config;
pub mod error;
pub mod hdr_image;
pub mod mesh;
pub mod scene;

// Re-export commonly used types
pub use config::RenderConfig;
pub use error::{Result, SceneError};
pub use hdr_image::HdrImage;
pub use mesh::Mesh;
pub use scene::{
    CameraDesc, EnvironmentDesc, LightDesc, MaterialDesc, ObjectDesc, SceneDesc, ShapeDesc,
    TransformDesc,
};
