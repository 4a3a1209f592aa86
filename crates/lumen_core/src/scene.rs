//! Scene description types.
//!
//! A scene file is JSON. It names materials, places objects (spheres and
//! triangle meshes) with a transform, lists light sources and an optional
//! environment. The description is renderer-agnostic: the renderer turns it
//! into BSDFs, lights and acceleration structures.
//!
//! ```json
//! {
//!   "render": { "width": 320, "height": 240, "samples_per_pixel": 64 },
//!   "camera": { "position": [0, 1, 5], "target": [0, 1, 0], "vertical_fov": 40 },
//!   "materials": { "white": { "type": "lambertian", "albedo": [0.8, 0.8, 0.8] } },
//!   "objects": [
//!     { "name": "ball", "material": "white",
//!       "shape": { "type": "sphere", "radius": 1.0 },
//!       "transform": { "translation": [0, 1, 0] } }
//!   ],
//!   "lights": [ { "type": "point", "position": [0, 4, 0], "intensity": [10, 10, 10] } ],
//!   "environment": { "type": "sphere", "radiance": [0.1, 0.1, 0.1] }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lumen_math::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::RenderConfig;
use crate::error::{Result, SceneError};
use crate::mesh::Mesh;

/// Complete description of a renderable scene.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDesc {
    pub render: RenderConfig,
    pub camera: CameraDesc,
    /// Materials by name. A `BTreeMap` keeps material ids stable between runs.
    pub materials: BTreeMap<String, MaterialDesc>,
    pub objects: Vec<ObjectDesc>,
    pub lights: Vec<LightDesc>,
    pub environment: Option<EnvironmentDesc>,

    /// Directory relative paths (OBJ meshes, environment maps) resolve against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// Pinhole (optionally thin-aperture) camera placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraDesc {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],
    /// Vertical field of view in degrees
    pub vertical_fov: f32,
    /// Distance from the pinhole to the plane in perfect focus
    pub focal_distance: f32,
    /// Side length of the square aperture; 0 gives a pinhole camera
    pub aperture: f32,
}

impl Default for CameraDesc {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 5.0],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
            vertical_fov: 45.0,
            focal_distance: 1.0,
            aperture: 0.0,
        }
    }
}

/// Surface response models.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MaterialDesc {
    Lambertian {
        albedo: [f32; 3],
    },
    Mirror {
        #[serde(default = "white")]
        reflectance: [f32; 3],
    },
    Glass {
        #[serde(default = "white")]
        reflectance: [f32; 3],
        #[serde(default = "white")]
        transmittance: [f32; 3],
        #[serde(default = "default_ior")]
        ior: f32,
    },
    Refract {
        #[serde(default = "white")]
        transmittance: [f32; 3],
        #[serde(default = "default_ior")]
        ior: f32,
    },
    DiffuseLight {
        radiance: [f32; 3],
    },
}

fn white() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_ior() -> f32 {
    1.5
}

fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn one() -> f32 {
    1.0
}

/// Geometry of a scene object, in object space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeDesc {
    /// Sphere centred at the object-space origin
    Sphere { radius: f32 },
    /// Inline triangle mesh
    Mesh {
        positions: Vec<[f32; 3]>,
        indices: Vec<u32>,
        #[serde(default)]
        normals: Option<Vec<[f32; 3]>>,
    },
    /// Triangle mesh loaded from a Wavefront OBJ file
    Obj { path: PathBuf },
}

/// Translation, rotation (Euler XYZ, degrees) and scale applied in SRT order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformDesc {
    pub translation: [f32; 3],
    pub rotation: [f32; 3],
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
}

impl Default for TransformDesc {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: [0.0; 3],
            scale: unit_scale(),
        }
    }
}

impl TransformDesc {
    /// Object-to-world matrix. Order: Scale -> Rotate -> Translate (SRT)
    pub fn to_matrix(&self) -> Mat4 {
        let [rx, ry, rz] = self.rotation.map(f32::to_radians);
        Mat4::from_scale_rotation_translation(
            Vec3::from(self.scale),
            Quat::from_euler(EulerRot::XYZ, rx, ry, rz),
            Vec3::from(self.translation),
        )
    }
}

/// A placed piece of geometry with a material.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectDesc {
    #[serde(default)]
    pub name: String,
    pub shape: ShapeDesc,
    pub material: String,
    #[serde(default)]
    pub transform: TransformDesc,
}

/// Light sources that can be sampled directly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LightDesc {
    /// Isotropic point emitter; `intensity` is radiant intensity
    Point {
        position: [f32; 3],
        intensity: [f32; 3],
    },
    /// Light arriving from infinitely far away, travelling along `direction`
    Directional {
        direction: [f32; 3],
        intensity: [f32; 3],
    },
    /// Point emitter restricted to a cone of half-angle `angle` degrees
    Spot {
        position: [f32; 3],
        direction: [f32; 3],
        angle: f32,
        intensity: [f32; 3],
    },
    /// One-sided parallelogram emitter spanned by two edges from `corner`.
    /// It emits towards `edge_u x edge_v`.
    Rect {
        corner: [f32; 3],
        edge_u: [f32; 3],
        edge_v: [f32; 3],
        radiance: [f32; 3],
    },
}

/// Light arriving from infinitely far away in every direction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EnvironmentDesc {
    /// Constant radiance from every direction
    Sphere { radiance: [f32; 3] },
    /// Constant radiance from the upper (+Y) hemisphere only
    Hemisphere { radiance: [f32; 3] },
    /// Equirectangular image, importance sampled
    Map {
        path: PathBuf,
        #[serde(default = "one")]
        scale: f32,
    },
}

impl SceneDesc {
    /// Read, parse and validate a scene file.
    ///
    /// Relative paths inside the scene resolve against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut scene = Self::from_json(&text)?;
        scene.base_dir = path.parent().map(Path::to_path_buf);

        log::info!(
            "Loaded scene {}: {} materials, {} objects, {} lights{}",
            path.display(),
            scene.materials.len(),
            scene.objects.len(),
            scene.lights.len(),
            if scene.environment.is_some() { ", environment" } else { "" }
        );
        Ok(scene)
    }

    /// Parse and validate a scene from a JSON string.
    pub fn from_json(text: &str) -> Result<Self> {
        let scene: SceneDesc = serde_json::from_str(text)?;
        scene.validate()?;
        Ok(scene)
    }

    /// Check cross references and inline geometry.
    pub fn validate(&self) -> Result<()> {
        self.render.validate()?;

        for object in &self.objects {
            if !self.materials.contains_key(&object.material) {
                return Err(SceneError::UnknownMaterial {
                    object: object.name.clone(),
                    material: object.material.clone(),
                });
            }
            // OBJ files are checked when they are loaded
            if let ShapeDesc::Mesh { .. } = object.shape {
                if let Some(mesh) = self.load_mesh(&object.shape)? {
                    mesh.validate(&object.name)?;
                }
            }
        }
        Ok(())
    }

    /// Resolve a path from the scene file against `base_dir`.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Material index for a name, in the stable order of `materials`.
    pub fn material_index(&self, name: &str) -> Option<usize> {
        self.materials.keys().position(|k| k == name)
    }

    /// Triangle mesh for a mesh-type shape; `None` for analytic shapes.
    pub fn load_mesh(&self, shape: &ShapeDesc) -> Result<Option<Mesh>> {
        match shape {
            ShapeDesc::Sphere { .. } => Ok(None),
            ShapeDesc::Mesh {
                positions,
                indices,
                normals,
            } => {
                let positions = positions.iter().copied().map(Vec3::from).collect();
                let normals = normals
                    .as_ref()
                    .map(|n| n.iter().copied().map(Vec3::from).collect());
                let mut mesh = Mesh::new(positions, indices.clone(), normals);
                if mesh.normals.is_none() {
                    mesh.compute_normals();
                }
                Ok(Some(mesh))
            }
            ShapeDesc::Obj { path } => Mesh::load_obj(self.resolve_path(path)).map(Some),
        }
    }
}
