//! Geometry accumulation for the instancing walk.
//!
//! Every triangle gets three fresh vertices; coincident vertices are never
//! shared. Indices are kept in one run per material, in the order materials
//! were first used, so the result is reproducible for identical input.

use std::collections::{HashMap, HashSet};

use brick_math::{Mat4, Vec3};

use super::color::MaterialId;
use super::command::{normalize_name, ColorSpec};
use super::model::{Model, ParseWarning};
use crate::mesh::{Mesh, SubMesh};

/// Triangle indices that share one material.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialRun {
    pub material: MaterialId,
    pub indices: Vec<u32>,
}

/// One instanced sub-file reference, in walk order.
///
/// This is what a host scene graph needs to attach a node per part instead of
/// (or as well as) using the flattened mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    /// Referenced file name as written
    pub name: String,

    /// Composed transform from the import root
    pub transform: Mat4,

    /// Effective color of the subtree
    pub color: ColorSpec,

    /// Resolved material, `None` for container formats
    pub material: Option<MaterialId>,
}

/// Append-only sink for instanced triangles.
#[derive(Clone, Debug, Default)]
pub struct MeshAccumulator {
    positions: Vec<Vec3>,
    runs: Vec<MaterialRun>,
    run_lookup: HashMap<MaterialId, usize>,
    placements: Vec<Placement>,
    missing: Vec<String>,
    visited: HashSet<String>,
    warnings: Vec<ParseWarning>,
}

impl MeshAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a triangle in the given vertex order.
    pub fn push_triangle(&mut self, vertices: [Vec3; 3], material: MaterialId) {
        let base = self.positions.len() as u32;
        self.positions.extend_from_slice(&vertices);
        self.run_mut(material).extend([base, base + 1, base + 2]);
    }

    /// Append a quad as `[a, b, c]` and `[a, c, d]`.
    pub fn push_quad(&mut self, vertices: [Vec3; 4], material: MaterialId) {
        let [a, b, c, d] = vertices;
        self.push_triangle([a, b, c], material);
        self.push_triangle([a, c, d], material);
    }

    pub fn push_placement(&mut self, placement: Placement) {
        self.placements.push(placement);
    }

    /// Record a reference that contributed nothing because its model is missing.
    pub fn push_missing(&mut self, name: String) {
        if !self.missing.contains(&name) {
            self.missing.push(name);
        }
    }

    /// Record that the walk entered `model`. Its parse warnings are kept the
    /// first time only.
    pub fn visit_model(&mut self, model: &Model) {
        if self.visited.insert(normalize_name(model.name())) {
            self.warnings.extend(model.warnings().iter().cloned());
        }
    }

    /// Append everything from `other`, re-basing its indices.
    pub fn append(&mut self, other: MeshAccumulator) {
        let base = self.positions.len() as u32;
        self.positions.extend(other.positions);
        for run in other.runs {
            self.run_mut(run.material)
                .extend(run.indices.into_iter().map(|i| i + base));
        }
        self.placements.extend(other.placements);
        for name in other.missing {
            self.push_missing(name);
        }
        for warning in other.warnings {
            if !self.visited.contains(&normalize_name(&warning.model)) {
                self.warnings.push(warning);
            }
        }
        self.visited.extend(other.visited);
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn runs(&self) -> &[MaterialRun] {
        &self.runs
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn missing_parts(&self) -> &[String] {
        &self.missing
    }

    /// Parse warnings of every model the walk entered, in first-visit order.
    pub fn parse_warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Build the output mesh and hand back the placements and missing parts.
    ///
    /// Indices are concatenated run by run; each run becomes one submesh.
    pub fn finish(self) -> (Mesh, Vec<Placement>, Vec<String>) {
        let mut indices = Vec::with_capacity(self.positions.len());
        let mut submeshes = Vec::with_capacity(self.runs.len());

        for run in self.runs {
            submeshes.push(SubMesh {
                material: run.material,
                index_start: indices.len() as u32,
                index_count: run.indices.len() as u32,
            });
            indices.extend(run.indices);
        }

        let mesh = Mesh::new(self.positions, indices, submeshes);
        (mesh, self.placements, self.missing)
    }

    fn run_mut(&mut self, material: MaterialId) -> &mut Vec<u32> {
        let index = *self.run_lookup.entry(material).or_insert_with(|| {
            self.runs.push(MaterialRun {
                material,
                indices: Vec::new(),
            });
            self.runs.len() - 1
        });
        &mut self.runs[index].indices
    }
}
