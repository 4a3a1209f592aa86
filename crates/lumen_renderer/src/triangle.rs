//! Triangle primitive and triangle meshes.
//!
//! Triangles index into a vertex array shared by the whole mesh; a mesh is a
//! BVH over its triangles.

use std::sync::Arc;

use crate::bvh::Bvh;
use crate::primitive::{Primitive, Trace};
use lumen_core::Mesh;
use lumen_math::{Aabb, Ray, Vec3};

/// Leaf size used for per-mesh BVHs.
const MESH_LEAF_SIZE: usize = 4;

/// A mesh vertex with a shading normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
}

/// A triangle primitive referencing three vertices of a shared array.
#[derive(Debug, Clone)]
pub struct Triangle {
    vertices: Arc<[Vertex]>,
    v: [u32; 3],
}

impl Triangle {
    /// Create a triangle from three indices into `vertices`.
    ///
    /// # Panics
    /// If an index is out of range for `vertices`.
    pub fn new(vertices: Arc<[Vertex]>, v0: u32, v1: u32, v2: u32) -> Self {
        assert!(
            [v0, v1, v2].iter().all(|&i| (i as usize) < vertices.len()),
            "triangle index out of range"
        );
        Self {
            vertices,
            v: [v0, v1, v2],
        }
    }

    #[inline]
    fn vertex(&self, i: usize) -> &Vertex {
        &self.vertices[self.v[i] as usize]
    }
}

impl Primitive for Triangle {
    fn bbox(&self) -> Aabb {
        let (a, b, c) = (
            self.vertex(0).position,
            self.vertex(1).position,
            self.vertex(2).position,
        );
        // from_points pads thin dimensions
        Aabb::from_points(a.min(b).min(c), a.max(b).max(c))
    }

    /// Barycentric solve by Cramer's rule on the edge vectors.
    fn hit(&self, ray: &mut Ray) -> Trace {
        let miss = Trace::miss(ray.origin);
        let (v0, v1, v2) = (self.vertex(0), self.vertex(1), self.vertex(2));

        let e1 = v1.position - v0.position;
        let e2 = v2.position - v0.position;
        let s = ray.origin - v0.position;
        let d = ray.direction;

        // Ray is parallel to triangle
        let e1_x_d = e1.cross(d);
        let denom = e1_x_d.dot(e2);
        if denom == 0.0 {
            return miss;
        }

        let s_x_e2 = s.cross(e2);
        let t = -s_x_e2.dot(e1) / denom;
        let u = -s_x_e2.dot(d) / denom;
        let v = e1_x_d.dot(s) / denom;
        let w = 1.0 - u - v;

        if !ray.dist_bounds.contains(t) || u < 0.0 || v < 0.0 || w < 0.0 {
            return miss;
        }

        ray.dist_bounds.max = t;
        let normal = (w * v0.normal + u * v1.normal + v * v2.normal)
            .try_normalize()
            .unwrap_or_else(|| e1.cross(e2).normalize_or_zero());

        Trace {
            hit: true,
            distance: t,
            origin: ray.origin,
            position: ray.at(t),
            normal,
            material: None,
        }
    }
}

/// A triangle mesh with its own BVH.
#[derive(Debug, Clone)]
pub struct TriMesh {
    bvh: Bvh<Triangle>,
}

impl TriMesh {
    /// Build from a validated mesh. Missing normals are computed.
    pub fn from_mesh(mesh: &Mesh) -> Self {
        let mut mesh = mesh.clone();
        mesh.ensure_normals();
        let normals = mesh.normals.as_deref().unwrap_or_default();

        let vertices: Arc<[Vertex]> = mesh
            .positions
            .iter()
            .zip(normals)
            .map(|(&position, &normal)| Vertex { position, normal })
            .collect();

        let triangles = mesh
            .indices
            .chunks_exact(3)
            .map(|f| Triangle::new(Arc::clone(&vertices), f[0], f[1], f[2]))
            .collect();

        Self {
            bvh: Bvh::new(triangles, MESH_LEAF_SIZE),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.bvh.len()
    }

    pub fn bvh(&self) -> &Bvh<Triangle> {
        &self.bvh
    }
}

impl Primitive for TriMesh {
    fn bbox(&self) -> Aabb {
        self.bvh.bbox()
    }

    fn hit(&self, ray: &mut Ray) -> Trace {
        self.bvh.hit(ray)
    }
}
