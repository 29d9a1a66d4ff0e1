//! Mesh geometry produced by an LDraw import.
//!
//! This is the GPU-agnostic output handed to a geometry consumer: a flat
//! vertex list, one index buffer, and per-material index ranges.

use brick_math::{Aabb, Vec3};

use crate::ldraw::MaterialId;

/// A contiguous range of `Mesh::indices` drawn with one material.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubMesh {
    pub material: MaterialId,

    /// First index in `Mesh::indices`
    pub index_start: u32,

    /// Number of indices (a multiple of 3)
    pub index_count: u32,
}

impl SubMesh {
    pub fn triangle_count(&self) -> usize {
        self.index_count as usize / 3
    }
}

/// A mesh consisting of vertex positions, optional normals, and triangle indices
/// partitioned by material.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Vertex normals (optional - see `compute_normals()`)
    pub normals: Option<Vec<Vec3>>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Per-material index ranges, in first-use order
    pub submeshes: Vec<SubMesh>,

    /// Axis-aligned bounding box
    pub bounds: Aabb,

    /// Hint for the consumer that the buffers will not be modified after
    /// upload, so they may be batched
    pub read_only: bool,
}

impl Mesh {
    /// Create a new mesh. Bounds are computed; normals are not.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>, submeshes: Vec<SubMesh>) -> Self {
        let bounds = Aabb::from_positions(&positions);
        Self {
            positions,
            normals: None,
            indices,
            submeshes,
            bounds,
            read_only: false,
        }
    }

    /// Compute vertex normals by averaging face normals.
    ///
    /// Imported vertices are never shared between triangles, so this yields
    /// flat shading.
    pub fn compute_normals(&mut self) {
        let vertex_count = self.positions.len();
        let mut normals = vec![Vec3::ZERO; vertex_count];

        // Accumulate face normals at each vertex
        for face in self.indices.chunks_exact(3) {
            let i0 = face[0] as usize;
            let i1 = face[1] as usize;
            let i2 = face[2] as usize;

            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }

            let p0 = self.positions[i0];
            let edge1 = self.positions[i1] - p0;
            let edge2 = self.positions[i2] - p0;
            let face_normal = edge1.cross(edge2); // CCW winding

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        // Normalize accumulated normals
        for normal in &mut normals {
            *normal = normal.try_normalize().unwrap_or(Vec3::NEG_Y); // LDraw up is -Y
        }

        self.normals = Some(normals);
    }

    /// Check if the mesh has normals.
    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    /// Indices of one submesh.
    pub fn submesh_indices(&self, submesh: &SubMesh) -> &[u32] {
        let start = submesh.index_start as usize;
        let end = start + submesh.index_count as usize;
        &self.indices[start..end]
    }

    /// Submesh drawn with `material`, if any triangle uses it.
    pub fn submesh_for(&self, material: MaterialId) -> Option<&SubMesh> {
        self.submeshes.iter().find(|s| s.material == material)
    }

    /// Raw position buffer for upload.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Raw index buffer for upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Get the mesh center (center of bounding box).
    pub fn center(&self) -> Vec3 {
        self.bounds.centroid()
    }

    /// Get the mesh size (diagonal length of bounding box).
    pub fn size(&self) -> f32 {
        self.bounds.size()
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_material_mesh() -> Mesh {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::new(1.0, 0.0, 2.0),
            Vec3::new(0.0, 1.0, 2.0),
        ];
        let submeshes = vec![
            SubMesh { material: MaterialId(4), index_start: 0, index_count: 3 },
            SubMesh { material: MaterialId(1), index_start: 3, index_count: 3 },
        ];
        Mesh::new(positions, vec![0, 1, 2, 3, 4, 5], submeshes)
    }

    #[test]
    fn test_mesh_creation() {
        let mesh = two_material_mesh();

        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(!mesh.has_normals());
        assert!(!mesh.read_only);
    }

    #[test]
    fn test_bounds_computation() {
        let mesh = two_material_mesh();

        assert_eq!(mesh.bounds.min, Vec3::ZERO);
        assert_eq!(mesh.bounds.max, Vec3::new(1.0, 1.0, 2.0));
        assert_eq!(mesh.center(), Vec3::new(0.5, 0.5, 1.0));
    }

    #[test]
    fn test_compute_normals() {
        let mut mesh = two_material_mesh();
        mesh.compute_normals();

        // CCW triangles in the XY plane face +Z
        for normal in mesh.normals.as_ref().unwrap() {
            assert!((normal.z - 1.0).abs() < 0.001);
        }
    }

    #[test]
    fn test_submesh_access() {
        let mesh = two_material_mesh();

        let blue = mesh.submesh_for(MaterialId(1)).unwrap();
        assert_eq!(mesh.submesh_indices(blue), &[3, 4, 5]);
        assert_eq!(blue.triangle_count(), 1);
        assert!(mesh.submesh_for(MaterialId(99)).is_none());
    }

    #[test]
    fn test_byte_views() {
        let mesh = two_material_mesh();

        assert_eq!(mesh.position_bytes().len(), 6 * 12);
        assert_eq!(mesh.index_bytes().len(), 6 * 4);
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = Mesh::new(Vec::new(), Vec::new(), Vec::new());
        assert!(mesh.is_empty());
        assert_eq!(mesh.size(), 0.0);
    }
}
