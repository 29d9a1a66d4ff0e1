//! Parsed LDraw models and the instancing walk.
//!
//! A [`Model`] is the immutable command list of one file (or one block of a
//! multi-part document). Instancing a model walks its commands in order:
//! triangles and quads are transformed into the accumulator, sub-file
//! references recurse into the referenced model under the composed transform
//! and effective color.

use brick_math::{Mat4, Vec3};
use thiserror::Error;

use super::accumulator::{MeshAccumulator, Placement};
use super::cache::{ModelCache, ResolveError};
use super::color::ColorResolver;
use super::command::{normalize_name, parse_line, ColorSpec, Command};
use super::source::{PartSource, SourceError};
use crate::config::ImportConfig;

/// Errors that abort an instancing walk.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImportError {
    #[error("Cyclic sub-file reference: {}", .chain.join(" -> "))]
    Cycle { chain: Vec<String> },

    #[error("Sub-file nesting deeper than {limit} levels at '{name}'")]
    DepthExceeded { name: String, limit: usize },

    #[error("Root model '{0}' not found")]
    RootMissing(String),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// A numeric parameter of a command that could not be parsed.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseWarning {
    pub model: String,

    /// 1-based line number in the source text
    pub line: usize,

    /// Token index within the line
    pub param: usize,

    pub token: String,
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: bad numeric parameter {} ('{}')",
            self.model, self.line, self.param, self.token
        )
    }
}

/// An immutable, parsed LDraw model.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Model {
    name: String,
    commands: Vec<Command>,
    warnings: Vec<ParseWarning>,
}

impl Model {
    /// Parse model text. Lines that are not commands are skipped; bad numeric
    /// parameters are logged and kept as warnings.
    pub fn parse(name: &str, text: &str) -> Self {
        Self::from_lines(name, text.lines().enumerate().map(|(i, l)| (i + 1, l)))
    }

    fn from_lines<'a>(name: &str, lines: impl IntoIterator<Item = (usize, &'a str)>) -> Self {
        let mut commands = Vec::new();
        let mut warnings = Vec::new();

        for (line_number, line) in lines {
            let Some(parsed) = parse_line(line) else {
                continue;
            };
            for bad in parsed.bad_params {
                let warning = ParseWarning {
                    model: name.to_string(),
                    line: line_number,
                    param: bad.index,
                    token: bad.token,
                };
                log::warn!("{}", warning);
                warnings.push(warning);
            }
            commands.push(parsed.command);
        }

        Self {
            name: name.to_string(),
            commands,
            warnings,
        }
    }

    /// Parse a document that may contain `0 FILE` blocks.
    ///
    /// Returns one model per block in file order, or a single model named
    /// `name` if the text has no blocks.
    pub fn parse_document(name: &str, text: &str) -> Vec<Model> {
        let blocks = split_mpd(text);
        if blocks.is_empty() {
            return vec![Self::parse(name, text)];
        }
        blocks
            .into_iter()
            .map(|block| Self::from_lines(block.name, block.lines))
            .collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// Number of sub-file references in this model (not recursive).
    pub fn subfile_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::SubFile(_)))
            .count()
    }

    /// Triangles contributed directly by this model, quads counting as two.
    pub fn local_triangle_count(&self) -> usize {
        self.commands
            .iter()
            .map(|c| match c {
                Command::SubFile(_) => 0,
                Command::Triangle(_) => 1,
                Command::Quad(_) => 2,
            })
            .sum()
    }

    /// Flatten this model into `sink` under `transform` and `color`.
    pub fn instantiate(
        &self,
        ctx: &WalkContext<'_>,
        transform: Mat4,
        color: &ColorSpec,
        sink: &mut MeshAccumulator,
    ) -> Result<(), ImportError> {
        let mut stack = vec![normalize_name(&self.name)];
        sink.visit_model(self);
        self.walk(ctx, transform, color, sink, &mut stack)
    }

    fn walk(
        &self,
        ctx: &WalkContext<'_>,
        transform: Mat4,
        color: &ColorSpec,
        sink: &mut MeshAccumulator,
        stack: &mut Vec<String>,
    ) -> Result<(), ImportError> {
        for command in &self.commands {
            walk_command(command, ctx, transform, color, sink, stack)?;
        }
        Ok(())
    }
}

/// Everything an instancing walk reads besides the model itself.
#[derive(Clone, Copy)]
pub struct WalkContext<'a> {
    pub cache: &'a ModelCache,
    pub source: &'a dyn PartSource,
    pub colors: &'a ColorResolver,
    pub config: &'a ImportConfig,
}

/// Instance a single command. `stack` holds the cache keys of the models
/// currently being walked, outermost first.
pub(crate) fn walk_command(
    command: &Command,
    ctx: &WalkContext<'_>,
    transform: Mat4,
    color: &ColorSpec,
    sink: &mut MeshAccumulator,
    stack: &mut Vec<String>,
) -> Result<(), ImportError> {
    match command {
        Command::SubFile(sub) => {
            let key = sub.key();
            if stack.contains(&key) {
                let mut chain = stack.clone();
                chain.push(key);
                return Err(ImportError::Cycle { chain });
            }
            if stack.len() >= ctx.config.max_depth {
                return Err(ImportError::DepthExceeded {
                    name: key,
                    limit: ctx.config.max_depth,
                });
            }

            let file_name = sub.file_name();
            let model = match ctx.cache.resolve(&file_name, ctx.source) {
                Ok(model) => model,
                Err(ResolveError::Missing(name)) => {
                    sink.push_missing(name);
                    return Ok(());
                }
                Err(ResolveError::Source(e)) => return Err(e.into()),
            };
            sink.visit_model(&model);

            let effective = sub.color.effective(color);
            let composed = transform * sub.transform;
            // Containers only place other models; their descendants pick colors
            let material = if ctx.config.is_container(&sub.extension) {
                None
            } else {
                Some(ctx.colors.resolve(&effective))
            };
            sink.push_placement(Placement {
                name: file_name,
                transform: composed,
                color: effective.clone(),
                material,
            });

            stack.push(key);
            let result = model.walk(ctx, composed, &effective, sink, stack);
            stack.pop();
            result
        }
        Command::Triangle(tri) => {
            let material = ctx.colors.resolve(&tri.color.effective(color));
            sink.push_triangle(transform_all(&transform, tri.vertices), material);
            Ok(())
        }
        Command::Quad(quad) => {
            let material = ctx.colors.resolve(&quad.color.effective(color));
            sink.push_quad(transform_all(&transform, quad.vertices), material);
            Ok(())
        }
    }
}

fn transform_all<const N: usize>(transform: &Mat4, vertices: [Vec3; N]) -> [Vec3; N] {
    vertices.map(|v| transform.transform_point3(v))
}

/// One `0 FILE` block of a multi-part document.
#[derive(Clone, Debug, PartialEq)]
pub struct MpdBlock<'a> {
    pub name: &'a str,

    /// Lines of the block with their 1-based line numbers
    pub lines: Vec<(usize, &'a str)>,
}

/// Split multi-part document text into its `0 FILE` blocks.
///
/// A block runs until the next `0 FILE` or `0 NOFILE`. Lines outside any block
/// are dropped. Returns an empty list for plain single-model text.
pub fn split_mpd(text: &str) -> Vec<MpdBlock<'_>> {
    let mut blocks: Vec<MpdBlock<'_>> = Vec::new();
    let mut open = false;

    for (i, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix('0') {
            let rest = rest.trim_start();
            if let Some(name) = rest.strip_prefix("FILE ") {
                blocks.push(MpdBlock {
                    name: name.trim(),
                    lines: Vec::new(),
                });
                open = true;
                continue;
            }
            if rest == "NOFILE" {
                open = false;
                continue;
            }
        }
        if open {
            if let Some(block) = blocks.last_mut() {
                block.lines.push((i + 1, line));
            }
        }
    }

    blocks
}
