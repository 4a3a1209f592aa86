//! Render-ready scene: BVH over objects, BSDF table, lights, environment.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::bsdf::Bsdf;
use crate::bvh::Bvh;
use crate::light::{
    DirectionalLight, EnvHemisphere, EnvLight, EnvMap, EnvSphere, Light, PointLight, RectLight,
    SpotLight,
};
use crate::object::{Object, Shape};
use crate::primitive::{MaterialId, Trace};
use crate::sphere::Sphere;
use crate::triangle::TriMesh;
use lumen_core::{
    EnvironmentDesc, HdrImage, LightDesc, Result, SceneDesc, SceneError, ShapeDesc,
};
use lumen_math::{Ray, Spectrum, Vec3};

/// Everything the integrator reads while tracing. Immutable once built.
#[derive(Debug)]
pub struct Scene {
    objects: Bvh<Object>,
    materials: Vec<Bsdf>,
    lights: Vec<Light>,
    environment: Option<EnvLight>,
}

impl Scene {
    /// Assemble a scene from prepared parts.
    ///
    /// Every object's material id must index into `materials`.
    pub fn new(
        objects: Vec<Object>,
        materials: Vec<Bsdf>,
        lights: Vec<Light>,
        environment: Option<EnvLight>,
        max_leaf_size: usize,
    ) -> Self {
        debug_assert!(objects.iter().all(|o| o.material() < materials.len()));
        Self {
            objects: Bvh::new(objects, max_leaf_size),
            materials,
            lights,
            environment,
        }
    }

    /// Build BSDFs, geometry, lights and environment from a description.
    ///
    /// OBJ files and environment maps are loaded here; an OBJ referenced by
    /// several objects is loaded and built once.
    pub fn from_desc(desc: &SceneDesc) -> Result<Self> {
        let materials: Vec<Bsdf> = desc.materials.values().map(Bsdf::from_desc).collect();

        let mut meshes: HashMap<PathBuf, Arc<TriMesh>> = HashMap::new();
        let mut objects = Vec::with_capacity(desc.objects.len());
        for object in &desc.objects {
            let material = desc.material_index(&object.material).ok_or_else(|| {
                SceneError::UnknownMaterial {
                    object: object.name.clone(),
                    material: object.material.clone(),
                }
            })?;

            let shape = match &object.shape {
                ShapeDesc::Sphere { radius } => Shape::Sphere(Sphere::new(*radius)),
                ShapeDesc::Obj { path } => {
                    let path = desc.resolve_path(path);
                    match meshes.get(&path) {
                        Some(mesh) => Shape::Mesh(Arc::clone(mesh)),
                        None => {
                            let mesh = Arc::new(build_mesh(desc, &object.shape, &object.name)?);
                            meshes.insert(path, Arc::clone(&mesh));
                            Shape::Mesh(mesh)
                        }
                    }
                }
                ShapeDesc::Mesh { .. } => {
                    Shape::Mesh(Arc::new(build_mesh(desc, &object.shape, &object.name)?))
                }
            };

            objects.push(Object::new(shape, object.transform.to_matrix(), material));
        }

        let lights = desc.lights.iter().map(light_from_desc).collect();
        let environment = desc
            .environment
            .as_ref()
            .map(|env| environment_from_desc(desc, env))
            .transpose()?;

        let scene = Self::new(
            objects,
            materials,
            lights,
            environment,
            desc.render.max_leaf_size,
        );
        log::info!(
            "Built scene: {} objects ({} BVH nodes, depth {}), {} materials, {} lights",
            scene.objects.len(),
            scene.objects.node_count(),
            scene.objects.depth(),
            scene.materials.len(),
            scene.lights.len()
        );
        Ok(scene)
    }

    /// Closest hit along the ray; shrinks `ray.dist_bounds` like any primitive.
    pub fn hit(&self, ray: &mut Ray) -> Trace {
        self.objects.hit(ray)
    }

    /// BSDF for a material id.
    ///
    /// # Panics
    /// If `id` was not produced by this scene.
    pub fn material(&self, id: MaterialId) -> &Bsdf {
        &self.materials[id]
    }

    pub fn objects(&self) -> &Bvh<Object> {
        &self.objects
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn environment(&self) -> Option<&EnvLight> {
        self.environment.as_ref()
    }
}

fn build_mesh(desc: &SceneDesc, shape: &ShapeDesc, name: &str) -> Result<TriMesh> {
    let mesh = desc
        .load_mesh(shape)?
        .ok_or_else(|| SceneError::InvalidMesh {
            name: name.to_string(),
            reason: "shape is not a mesh".to_string(),
        })?;
    mesh.validate(name)?;
    log::debug!(
        "Mesh '{}': {} vertices, {} triangles",
        name,
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(TriMesh::from_mesh(&mesh))
}

fn light_from_desc(desc: &LightDesc) -> Light {
    match *desc {
        LightDesc::Point {
            position,
            intensity,
        } => Light::Point(PointLight::new(Vec3::from(position), Spectrum::from(intensity))),
        LightDesc::Directional {
            direction,
            intensity,
        } => Light::Directional(DirectionalLight::new(
            Vec3::from(direction),
            Spectrum::from(intensity),
        )),
        LightDesc::Spot {
            position,
            direction,
            angle,
            intensity,
        } => Light::Spot(SpotLight::new(
            Vec3::from(position),
            Vec3::from(direction),
            angle.to_radians(),
            Spectrum::from(intensity),
        )),
        LightDesc::Rect {
            corner,
            edge_u,
            edge_v,
            radiance,
        } => Light::Rect(RectLight::new(
            Vec3::from(corner),
            Vec3::from(edge_u),
            Vec3::from(edge_v),
            Spectrum::from(radiance),
        )),
    }
}

fn environment_from_desc(desc: &SceneDesc, env: &EnvironmentDesc) -> Result<EnvLight> {
    Ok(match env {
        EnvironmentDesc::Sphere { radiance } => EnvLight::Sphere(EnvSphere {
            radiance: Spectrum::from(*radiance),
        }),
        EnvironmentDesc::Hemisphere { radiance } => EnvLight::Hemisphere(EnvHemisphere {
            radiance: Spectrum::from(*radiance),
        }),
        EnvironmentDesc::Map { path, scale } => {
            let mut image = HdrImage::load(desc.resolve_path(path))?;
            image.scale(*scale);
            EnvLight::Map(EnvMap::new(image))
        }
    })
}
