//! Import sessions.
//!
//! An [`ImportSession`] is the explicit context of one import: the part
//! source, the palette, the configuration and a fresh [`ModelCache`]. Sessions
//! share nothing, so several imports can run side by side.

use brick_math::Mat4;
use rayon::prelude::*;

use crate::config::ImportConfig;
use crate::ldraw::{
    normalize_name, walk_command, ColorResolver, ColorSpec, MeshAccumulator, Model, ModelCache,
    Palette, ParseWarning, PartSource, Placement, ResolveError, WalkContext,
};
use crate::mesh::Mesh;

pub use crate::ldraw::ImportError;

/// Result of importing one model.
#[derive(Clone, Debug)]
pub struct ImportedGeometry {
    /// Name the import was requested with
    pub name: String,

    pub mesh: Mesh,

    /// Every instanced sub-file reference, in walk order
    pub placements: Vec<Placement>,

    /// References that contributed nothing because the part was not found
    pub missing_parts: Vec<String>,

    /// Color tokens the palette did not know
    pub unknown_colors: Vec<String>,

    /// Bad numeric parameters in the models this import walked through
    pub parse_warnings: Vec<ParseWarning>,
}

/// Turns imported geometry into a host-side object (a scene node, a file, a
/// GPU buffer set).
pub trait GeometryConsumer {
    type Output;
    type Error;

    fn consume(&mut self, geometry: ImportedGeometry) -> Result<Self::Output, Self::Error>;
}

/// Context for importing LDraw models.
pub struct ImportSession {
    source: Box<dyn PartSource>,
    colors: ColorResolver,
    config: ImportConfig,
    cache: ModelCache,
}

impl ImportSession {
    pub fn new(
        source: impl PartSource + 'static,
        palette: impl Palette + 'static,
        config: ImportConfig,
    ) -> Self {
        Self {
            source: Box::new(source),
            colors: ColorResolver::new(palette, config.default_color_code),
            config,
            cache: ModelCache::new(),
        }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }

    pub fn colors(&self) -> &ColorResolver {
        &self.colors
    }

    pub fn context(&self) -> WalkContext<'_> {
        WalkContext {
            cache: &self.cache,
            source: self.source.as_ref(),
            colors: &self.colors,
            config: &self.config,
        }
    }

    /// Import `name` at the origin with no color override.
    pub fn import_root(&self, name: &str) -> Result<ImportedGeometry, ImportError> {
        self.import(name, Mat4::IDENTITY, ColorSpec::Inherit)
    }

    /// Instantiate `name` under `transform` and `color` on the calling thread.
    pub fn import(
        &self,
        name: &str,
        transform: Mat4,
        color: ColorSpec,
    ) -> Result<ImportedGeometry, ImportError> {
        let model = self.resolve_root(name)?;

        let mut sink = MeshAccumulator::new();
        model.instantiate(&self.context(), transform, &color, &mut sink)?;

        Ok(self.finish(name, sink))
    }

    /// Like [`ImportSession::import`], with the root model's commands walked
    /// in parallel.
    ///
    /// Each chunk of commands fills its own accumulator; the chunks are merged
    /// in command order, so the output matches the sequential import.
    pub fn import_parallel(
        &self,
        name: &str,
        transform: Mat4,
        color: ColorSpec,
    ) -> Result<ImportedGeometry, ImportError> {
        let model = self.resolve_root(name)?;
        let ctx = self.context();
        let root_key = normalize_name(model.name());

        let commands = model.commands();
        let chunk_size = (commands.len() / (rayon::current_num_threads() * 4)).max(1);

        let chunks: Vec<Result<MeshAccumulator, ImportError>> = commands
            .par_chunks(chunk_size)
            .map(|chunk| {
                let mut sink = MeshAccumulator::new();
                let mut stack = vec![root_key.clone()];
                for command in chunk {
                    walk_command(command, &ctx, transform, &color, &mut sink, &mut stack)?;
                }
                Ok(sink)
            })
            .collect();

        let mut sink = MeshAccumulator::new();
        sink.visit_model(&model);
        for chunk in chunks {
            sink.append(chunk?);
        }

        Ok(self.finish(name, sink))
    }

    /// Import `name` and hand the result to `consumer`.
    pub fn import_into<C>(&self, name: &str, consumer: &mut C) -> Result<C::Output, C::Error>
    where
        C: GeometryConsumer,
        C::Error: From<ImportError>,
    {
        let geometry = self.import_root(name)?;
        consumer.consume(geometry)
    }

    fn resolve_root(&self, name: &str) -> Result<std::sync::Arc<Model>, ImportError> {
        match self.cache.resolve(name, self.source.as_ref()) {
            Ok(model) => Ok(model),
            Err(ResolveError::Missing(_)) => Err(ImportError::RootMissing(name.to_string())),
            Err(ResolveError::Source(e)) => Err(e.into()),
        }
    }

    fn finish(&self, name: &str, sink: MeshAccumulator) -> ImportedGeometry {
        let parse_warnings = sink.parse_warnings().to_vec();
        let (mut mesh, placements, missing_parts) = sink.finish();
        mesh.read_only = self.config.read_only_meshes;
        if self.config.compute_normals {
            mesh.compute_normals();
        }

        log::info!(
            "Imported '{}': {} triangles in {} submeshes, {} placements, {} cached models",
            name,
            mesh.triangle_count(),
            mesh.submeshes.len(),
            placements.len(),
            self.cache.len()
        );
        if !missing_parts.is_empty() {
            log::warn!("'{}' has {} missing parts", name, missing_parts.len());
        }

        ImportedGeometry {
            name: name.to_string(),
            mesh,
            placements,
            missing_parts,
            unknown_colors: self.colors.unknown_colors(),
            parse_warnings,
        }
    }
}
