//! Wavefront OBJ export of imported geometry.
//!
//! One `g`/`usemtl` group per submesh; materials go to a sibling `.mtl` file.
//! Placements are listed as comments with their LDraw transform parameters.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use brick_core::{ColorTable, GeometryConsumer, ImportedGeometry, MaterialId};
use brick_math::Mat4Ext;

/// Writes imported geometry to an OBJ file and its MTL library.
pub struct ObjWriter {
    path: PathBuf,
    palette: Arc<ColorTable>,
}

impl ObjWriter {
    pub fn new(path: impl AsRef<Path>, palette: Arc<ColorTable>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            palette,
        }
    }

    fn material_name(&self, id: MaterialId) -> String {
        match self.palette.material(id) {
            Some(material) => format!("{}_{}", material.name, id.0),
            None => format!("material_{}", id.0),
        }
    }

    fn write_obj(&self, out: &mut impl Write, geometry: &ImportedGeometry, mtl_name: &str) -> Result<()> {
        let mesh = &geometry.mesh;
        writeln!(out, "# {}", geometry.name)?;
        writeln!(out, "mtllib {}", mtl_name)?;

        for placement in &geometry.placements {
            let params: Vec<String> = placement
                .transform
                .ldraw_params()
                .iter()
                .map(|v| format!("{}", v))
                .collect();
            writeln!(out, "# part {} {}", placement.name, params.join(" "))?;
        }

        for p in &mesh.positions {
            writeln!(out, "v {} {} {}", p.x, p.y, p.z)?;
        }
        if let Some(normals) = &mesh.normals {
            for n in normals {
                writeln!(out, "vn {} {} {}", n.x, n.y, n.z)?;
            }
        }

        for submesh in &mesh.submeshes {
            let name = self.material_name(submesh.material);
            writeln!(out, "g {}", name)?;
            writeln!(out, "usemtl {}", name)?;
            for face in mesh.submesh_indices(submesh).chunks_exact(3) {
                // OBJ indices are 1-based
                let [a, b, c] = [face[0] + 1, face[1] + 1, face[2] + 1];
                if mesh.has_normals() {
                    writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}")?;
                } else {
                    writeln!(out, "f {} {} {}", a, b, c)?;
                }
            }
        }
        Ok(())
    }

    fn write_mtl(&self, out: &mut impl Write, geometry: &ImportedGeometry) -> Result<()> {
        for submesh in &geometry.mesh.submeshes {
            let Some(material) = self.palette.material(submesh.material) else {
                continue;
            };
            let kd = material.diffuse_color;
            writeln!(out, "newmtl {}", self.material_name(submesh.material))?;
            writeln!(out, "Kd {} {} {}", kd.x, kd.y, kd.z)?;
            writeln!(out, "d {}", material.opacity)?;
            if material.is_emissive() {
                let ke = material.emissive_color;
                writeln!(out, "Ke {} {} {}", ke.x, ke.y, ke.z)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

impl GeometryConsumer for ObjWriter {
    type Output = PathBuf;
    type Error = anyhow::Error;

    fn consume(&mut self, geometry: ImportedGeometry) -> Result<PathBuf> {
        let mtl_path = self.path.with_extension("mtl");
        let mtl_name = mtl_path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("materials.mtl")
            .to_string();

        let file = File::create(&self.path)
            .with_context(|| format!("Failed to create {}", self.path.display()))?;
        let mut out = BufWriter::new(file);
        self.write_obj(&mut out, &geometry, &mtl_name)?;
        out.flush()?;

        let file = File::create(&mtl_path)
            .with_context(|| format!("Failed to create {}", mtl_path.display()))?;
        let mut out = BufWriter::new(file);
        self.write_mtl(&mut out, &geometry)?;
        out.flush()?;

        log::info!(
            "Wrote {} triangles to {}",
            geometry.mesh.triangle_count(),
            self.path.display()
        );
        Ok(self.path.clone())
    }
}
