//! Brick Core - LDraw import for the brick toolchain.
//!
//! This crate provides:
//!
//! - **LDraw support**: line parsing, sub-model resolution with a shared
//!   model cache, and the instancing walk that flattens a model into geometry
//! - **Mesh types**: `Mesh` with per-material submeshes, ready for upload
//! - **Import sessions**: explicit context (part source, palette, config)
//!   threaded through every resolve
//!
//! # Example
//!
//! ```ignore
//! use brick_core::{ColorTable, DirectorySource, ImportConfig, ImportSession};
//!
//! let source = DirectorySource::new(["/usr/share/ldraw"]);
//! let palette = ColorTable::with_defaults();
//! let session = ImportSession::new(source, palette, ImportConfig::default());
//!
//! let geometry = session.import_root("car.ldr")?;
//! println!("{} triangles in {} submeshes",
//!     geometry.mesh.triangle_count(),
//!     geometry.mesh.submeshes.len());
//! ```

pub mod config;
pub mod ldraw;
pub mod mesh;
pub mod session;

// Re-export commonly used types
pub use config::{ConfigError, ImportConfig};
pub use ldraw::{
    parse_line, ColorResolver, ColorSpec, ColorTable, Command, DirectorySource, Material,
    MaterialId, MemorySource, MeshAccumulator, Model, ModelCache, Palette, PartSource, Placement,
    ResolveError, SourceError,
};
pub use mesh::{Mesh, SubMesh};
pub use session::{GeometryConsumer, ImportError, ImportSession, ImportedGeometry};
