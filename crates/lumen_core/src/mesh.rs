//! Triangle mesh geometry.
//!
//! Meshes come either inline from the scene file or from Wavefront OBJ files
//! and are handed to the renderer, which builds a per-mesh BVH over them.

use std::path::Path;

use lumen_math::{Aabb, Vec3};

use crate::error::{Result, SceneError};

/// A mesh consisting of vertex positions, optional normals, and triangle indices.
///
/// Triangles use counter-clockwise winding: the face normal of `(a, b, c)`
/// is `(b - a) x (c - a)`.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Vertex normals (optional - computed on demand with `ensure_normals`)
    pub normals: Option<Vec<Vec3>>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Axis-aligned bounding box
    pub bounds: Aabb,
}

impl Mesh {
    /// Create a new mesh from positions and indices, optionally with normals.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>, normals: Option<Vec<Vec3>>) -> Self {
        let mut bounds = Aabb::empty();
        for p in &positions {
            bounds.enclose_point(*p);
        }
        let bounds = if bounds.is_empty() {
            bounds
        } else {
            Aabb::from_points(bounds.min(), bounds.max())
        };

        Self {
            positions,
            normals,
            indices,
            bounds,
        }
    }

    /// Load every model in an OBJ file into one mesh.
    pub fn load_obj(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let options = tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        };
        let (models, _materials) = tobj::load_obj(path, &options).map_err(|source| SceneError::Obj {
            path: path.to_path_buf(),
            source,
        })?;

        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut indices = Vec::new();
        let mut all_have_normals = true;

        for model in &models {
            let mesh = &model.mesh;
            let base = positions.len() as u32;

            positions.extend(
                mesh.positions
                    .chunks_exact(3)
                    .map(|p| Vec3::new(p[0], p[1], p[2])),
            );
            if mesh.normals.len() == mesh.positions.len() {
                normals.extend(
                    mesh.normals
                        .chunks_exact(3)
                        .map(|n| Vec3::new(n[0], n[1], n[2])),
                );
            } else {
                all_have_normals = false;
            }
            indices.extend(mesh.indices.iter().map(|i| base + i));
        }

        log::debug!(
            "Loaded OBJ {}: {} models, {} vertices, {} triangles",
            path.display(),
            models.len(),
            positions.len(),
            indices.len() / 3
        );

        let normals = all_have_normals.then_some(normals);
        let mut mesh = Mesh::new(positions, indices, normals);
        mesh.ensure_normals();
        Ok(mesh)
    }

    /// Check that the mesh can be turned into triangles.
    pub fn validate(&self, name: &str) -> Result<()> {
        let invalid = |reason: String| SceneError::InvalidMesh {
            name: name.to_string(),
            reason,
        };

        if self.indices.is_empty() {
            return Err(invalid("mesh has no triangles".to_string()));
        }
        if self.indices.len() % 3 != 0 {
            return Err(invalid(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        if let Some(&bad) = self
            .indices
            .iter()
            .find(|&&i| i as usize >= self.positions.len())
        {
            return Err(invalid(format!(
                "index {} out of range for {} vertices",
                bad,
                self.positions.len()
            )));
        }
        if let Some(normals) = &self.normals {
            if normals.len() != self.positions.len() {
                return Err(invalid(format!(
                    "{} normals for {} vertices",
                    normals.len(),
                    self.positions.len()
                )));
            }
        }
        Ok(())
    }

    /// Compute smooth vertex normals by averaging area-weighted face normals.
    pub fn compute_normals(&mut self) {
        let vertex_count = self.positions.len();
        let mut normals = vec![Vec3::ZERO; vertex_count];

        for face in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [face[0] as usize, face[1] as usize, face[2] as usize];
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }

            let p0 = self.positions[i0];
            let face_normal = (self.positions[i1] - p0).cross(self.positions[i2] - p0);

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for normal in &mut normals {
            // Unreferenced or degenerate vertices fall back to +Y
            *normal = normal.try_normalize().unwrap_or(Vec3::Y);
        }

        self.normals = Some(normals);
    }

    /// Ensure the mesh has one normal per vertex, computing them if necessary.
    pub fn ensure_normals(&mut self) {
        let matches = self
            .normals
            .as_ref()
            .is_some_and(|n| n.len() == self.positions.len());
        if !matches {
            self.compute_normals();
        }
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}
