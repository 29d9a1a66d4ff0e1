//! Load an LDraw model, print what it contains, optionally export OBJ.
//!
//! Run with:
//!   cargo run --release --bin brick_inspect -- model.ldr -L /usr/share/ldraw --obj model.obj

mod obj;

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};

use brick_core::{
    ColorTable, DirectorySource, GeometryConsumer, ImportConfig, ImportSession, ImportedGeometry,
    Model,
};
use brick_math::{Mat4, Mat4Ext, Vec3};

use crate::obj::ObjWriter;

const USAGE: &str = "\
Usage: brick_inspect <model> [options]

Options:
  -L, --library <dir>   LDraw library root (repeatable)
  --ldconfig <file>     Color definitions (default: <library>/LDConfig.ldr)
  --config <file>       Import configuration (JSON)
  --obj <file>          Write the flattened mesh as OBJ (+ MTL)
  --parallel            Walk top-level references in parallel
  --placements          List every placed part";

#[derive(Debug, Default)]
struct Args {
    model: PathBuf,
    libraries: Vec<PathBuf>,
    ldconfig: Option<PathBuf>,
    config: Option<PathBuf>,
    obj: Option<PathBuf>,
    parallel: bool,
    placements: bool,
}

fn parse_args(raw: &[String]) -> Result<Args> {
    let mut args = Args::default();
    let mut model = None;
    let mut iter = raw.iter();

    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .map(PathBuf::from)
                .with_context(|| format!("{} needs a value", flag))
        };
        match arg.as_str() {
            "-L" | "--library" => args.libraries.push(value(arg)?),
            "--ldconfig" => args.ldconfig = Some(value(arg)?),
            "--config" => args.config = Some(value(arg)?),
            "--obj" => args.obj = Some(value(arg)?),
            "--parallel" => args.parallel = true,
            "--placements" => args.placements = true,
            flag if flag.starts_with('-') => bail!("Unknown option: {}", flag),
            path => {
                if model.replace(PathBuf::from(path)).is_some() {
                    bail!("Only one model can be inspected at a time");
                }
            }
        }
    }

    args.model = model.context("No model given")?;
    Ok(args)
}

fn load_palette(args: &Args) -> Result<ColorTable> {
    let path = match &args.ldconfig {
        Some(path) => Some(path.clone()),
        None => args
            .libraries
            .iter()
            .map(|lib| lib.join("LDConfig.ldr"))
            .find(|p| p.is_file()),
    };

    match path {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            log::info!("Using colors from {}", path.display());
            Ok(ColorTable::from_ldconfig(&text))
        }
        None => {
            log::info!("No LDConfig.ldr found, using built-in colors");
            Ok(ColorTable::with_defaults())
        }
    }
}

fn print_summary(
    geometry: &ImportedGeometry,
    root: Option<&Model>,
    palette: &ColorTable,
    list_placements: bool,
) {
    let mesh = &geometry.mesh;
    println!("\n=== Model: {} ===", geometry.name);
    if let Some(root) = root {
        println!(
            "Root model '{}': {} references, {} local triangles",
            root.name(),
            root.subfile_count(),
            root.local_triangle_count()
        );
    }
    println!("Vertices: {}", mesh.vertex_count());
    println!("Triangles: {}", mesh.triangle_count());
    println!(
        "Buffers: {:.1} KB positions, {:.1} KB indices",
        mesh.position_bytes().len() as f64 / 1024.0,
        mesh.index_bytes().len() as f64 / 1024.0
    );
    println!("Placed parts: {}", geometry.placements.len());
    println!(
        "Mirrored placements: {}",
        geometry.placements.iter().filter(|p| p.transform.is_mirroring()).count()
    );

    println!("\n--- Materials ---");
    for submesh in &mesh.submeshes {
        let name = palette
            .material(submesh.material)
            .map(|m| m.name.clone())
            .unwrap_or_else(|| format!("#{}", submesh.material.0));
        println!("  {:<24} {} triangles", name, submesh.triangle_count());
    }

    if !mesh.is_empty() {
        println!("\n--- Bounds ---");
        let (min, max) = (mesh.bounds.min, mesh.bounds.max);
        println!("  Min: ({:.2}, {:.2}, {:.2})", min.x, min.y, min.z);
        println!("  Max: ({:.2}, {:.2}, {:.2})", max.x, max.y, max.z);
        let center = mesh.center();
        println!("  Center: ({:.2}, {:.2}, {:.2})", center.x, center.y, center.z);
        println!("  Diagonal: {:.2}", mesh.size());
    }

    if list_placements {
        println!("\n--- Placements ---");
        for (i, placement) in geometry.placements.iter().enumerate() {
            let pos = placement.transform.transform_point3(Vec3::ZERO);
            println!(
                "  [{}] {} color {} at ({:.2}, {:.2}, {:.2})",
                i, placement.name, placement.color, pos.x, pos.y, pos.z
            );
        }
    }

    if !geometry.missing_parts.is_empty() {
        println!("\n--- Missing parts ---");
        for name in &geometry.missing_parts {
            println!("  {}", name);
        }
    }
    if !geometry.unknown_colors.is_empty() {
        println!("\nUnknown colors: {}", geometry.unknown_colors.join(", "));
    }
    if !geometry.parse_warnings.is_empty() {
        println!("\n--- Parse warnings ---");
        for warning in &geometry.parse_warnings {
            println!("  {}", warning);
        }
    }
}

fn model_name(path: &Path) -> Result<(String, PathBuf)> {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .with_context(|| format!("Invalid model path: {}", path.display()))?
        .to_string();
    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((name, dir))
}

fn main() -> Result<()> {
    env_logger::init();

    let raw: Vec<String> = env::args().skip(1).collect();
    if raw.is_empty() || raw.iter().any(|a| a == "-h" || a == "--help") {
        println!("{}", USAGE);
        return Ok(());
    }
    let args = parse_args(&raw)?;

    let config = match &args.config {
        Some(path) => ImportConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ImportConfig::default(),
    };
    let palette = Arc::new(load_palette(&args)?);

    let (name, model_dir) = model_name(&args.model)?;
    let source = DirectorySource::new(&args.libraries).with_root_first(model_dir);
    let session = ImportSession::new(source, palette.clone(), config);

    println!("Loading LDraw model: {}", args.model.display());
    let start = Instant::now();
    let geometry = if args.parallel {
        session.import_parallel(&name, Mat4::IDENTITY, Default::default())?
    } else {
        session.import_root(&name)?
    };
    println!(
        "Imported in {:.1} ms ({} models parsed)",
        start.elapsed().as_secs_f64() * 1000.0,
        session.cache().len()
    );

    let root = session.cache().get(&name);
    print_summary(&geometry, root.as_deref(), &palette, args.placements);

    if let Some(path) = &args.obj {
        let mut writer = ObjWriter::new(path, palette.clone());
        let written = writer.consume(geometry)?;
        println!("\nWrote {}", written.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let args = parse_args(&strings(&[
            "car.ldr", "-L", "/ldraw", "--library", "/unofficial", "--obj", "car.obj", "--parallel",
        ]))
        .unwrap();

        assert_eq!(args.model, PathBuf::from("car.ldr"));
        assert_eq!(args.libraries.len(), 2);
        assert_eq!(args.obj, Some(PathBuf::from("car.obj")));
        assert!(args.parallel);
        assert!(!args.placements);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(&strings(&["--obj"])).is_err());
        assert!(parse_args(&strings(&["a.ldr", "b.ldr"])).is_err());
        assert!(parse_args(&strings(&["a.ldr", "--bogus"])).is_err());
        assert!(parse_args(&strings(&["--parallel"])).is_err());
    }

    #[test]
    fn test_model_name_splits_directory() {
        let (name, dir) = model_name(Path::new("models/car.mpd")).unwrap();
        assert_eq!(name, "car.mpd");
        assert_eq!(dir, PathBuf::from("models"));
    }
}
