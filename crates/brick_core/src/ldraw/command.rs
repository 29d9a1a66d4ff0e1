//! LDraw line parser.
//!
//! Each line is one command. Tokens are separated by single spaces, so two
//! adjacent spaces make an empty token, and the first token selects the line
//! type. Only the geometry-bearing types are turned into
//! [`Command`]s; everything else parses to `None`.
//!
//! A numeric token that fails to parse does not reject the line: the slot is
//! filled with `0.0` and reported as a [`BadParam`] so the caller can log it
//! against the model and line it came from.

use brick_math::{ldraw_matrix, Mat4, Vec3};

/// Color token of a command, resolved against the instancing color later.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorSpec {
    /// No override: take the color of the enclosing instance.
    #[default]
    Inherit,

    /// Numeric palette code.
    Code(u32),

    /// Non-numeric token (direct colors, named markers).
    Named(String),
}

impl ColorSpec {
    /// Parse the color token of a line.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some(t) => match t.parse::<u32>() {
                Ok(code) => ColorSpec::Code(code),
                Err(_) if !t.is_empty() => ColorSpec::Named(t.to_string()),
                Err(_) => ColorSpec::Inherit,
            },
            None => ColorSpec::Inherit,
        }
    }

    pub fn is_inherit(&self) -> bool {
        matches!(self, ColorSpec::Inherit)
    }

    /// The color that applies below this command: its own unless it inherits.
    pub fn effective(&self, incoming: &ColorSpec) -> ColorSpec {
        if self.is_inherit() {
            incoming.clone()
        } else {
            self.clone()
        }
    }
}

impl std::fmt::Display for ColorSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorSpec::Inherit => write!(f, "inherit"),
            ColorSpec::Code(code) => write!(f, "{}", code),
            ColorSpec::Named(name) => write!(f, "{}", name),
        }
    }
}

/// Line type 1: place another model.
#[derive(Clone, Debug, PartialEq)]
pub struct SubFileCmd {
    /// Placement relative to the referencing model
    pub transform: Mat4,

    pub color: ColorSpec,

    /// File name without extension, as written (e.g. `s\3001s01`)
    pub name: String,

    /// Extension including the dot (e.g. `.dat`), empty if none
    pub extension: String,
}

impl SubFileCmd {
    /// The referenced file name as written in the line.
    pub fn file_name(&self) -> String {
        format!("{}{}", self.name, self.extension)
    }

    /// Cache key of the referenced model.
    pub fn key(&self) -> String {
        normalize_name(&self.file_name())
    }
}

/// Line type 3.
#[derive(Clone, Debug, PartialEq)]
pub struct TriangleCmd {
    pub vertices: [Vec3; 3],
    pub color: ColorSpec,
}

/// Line type 4.
#[derive(Clone, Debug, PartialEq)]
pub struct QuadCmd {
    pub vertices: [Vec3; 4],
    pub color: ColorSpec,
}

impl QuadCmd {
    /// Fan split along the 0-2 diagonal: `[0, 1, 2]` then `[0, 2, 3]`.
    pub fn triangles(&self) -> [[Vec3; 3]; 2] {
        let [a, b, c, d] = self.vertices;
        [[a, b, c], [a, c, d]]
    }
}

/// A geometry-bearing LDraw command.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    SubFile(SubFileCmd),
    Triangle(TriangleCmd),
    Quad(QuadCmd),
}

impl Command {
    pub fn color(&self) -> &ColorSpec {
        match self {
            Command::SubFile(cmd) => &cmd.color,
            Command::Triangle(cmd) => &cmd.color,
            Command::Quad(cmd) => &cmd.color,
        }
    }
}

/// A numeric token that could not be parsed.
#[derive(Clone, Debug, PartialEq)]
pub struct BadParam {
    /// Token index within the line (0 is the line type)
    pub index: usize,

    /// The offending token, empty if it was missing
    pub token: String,
}

/// Result of parsing one line.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedLine {
    pub command: Command,

    /// Numeric slots that fell back to zero
    pub bad_params: Vec<BadParam>,
}

/// Parse one LDraw line.
///
/// Returns `None` for every line that is not a sub-file reference, triangle or
/// quad, including comments, meta commands and blank lines.
pub fn parse_line(line: &str) -> Option<ParsedLine> {
    let tokens: Vec<&str> = line.trim().split(' ').collect();
    let kind = tokens.first()?.parse::<u32>().ok()?;

    let mut reader = TokenReader {
        tokens: &tokens,
        bad_params: Vec::new(),
    };
    let color = ColorSpec::from_token(tokens.get(1).copied());

    let command = match kind {
        1 => {
            let mut params = [0.0f32; 12];
            for (i, slot) in params.iter_mut().enumerate() {
                *slot = reader.float(2 + i);
            }
            let file = tokens.get(14..).map(|t| t.join(" ")).unwrap_or_default();
            if file.is_empty() {
                reader.bad(14);
            }
            let (name, extension) = split_file_name(&file);
            Command::SubFile(SubFileCmd {
                transform: ldraw_matrix(params),
                color,
                name: name.to_string(),
                extension: extension.to_string(),
            })
        }
        3 => Command::Triangle(TriangleCmd {
            vertices: [reader.vec3(2), reader.vec3(5), reader.vec3(8)],
            color,
        }),
        4 => Command::Quad(QuadCmd {
            vertices: [
                reader.vec3(2),
                reader.vec3(5),
                reader.vec3(8),
                reader.vec3(11),
            ],
            color,
        }),
        _ => return None,
    };

    Some(ParsedLine {
        command,
        bad_params: reader.bad_params,
    })
}

/// Split a file reference into base name and extension (dot included).
///
/// Only a dot in the last path component counts, so `s\3001s01.dat` gives
/// `("s\3001s01", ".dat")` and `48\4-4disc` gives `("48\4-4disc", "")`.
pub fn split_file_name(file: &str) -> (&str, &str) {
    let last_sep = file.rfind(['/', '\\']).map(|i| i + 1).unwrap_or(0);
    match file[last_sep..].rfind('.') {
        Some(dot) if dot > 0 => file.split_at(last_sep + dot),
        _ => (file, ""),
    }
}

/// Normalize a model name for cache lookup.
///
/// LDraw file names are case-insensitive and may use either path separator.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase().replace('\\', "/")
}

struct TokenReader<'a> {
    tokens: &'a [&'a str],
    bad_params: Vec<BadParam>,
}

impl TokenReader<'_> {
    fn float(&mut self, index: usize) -> f32 {
        match self.tokens.get(index).map(|t| t.parse::<f32>()) {
            Some(Ok(value)) => value,
            _ => {
                self.bad(index);
                0.0
            }
        }
    }

    fn vec3(&mut self, index: usize) -> Vec3 {
        Vec3::new(
            self.float(index),
            self.float(index + 1),
            self.float(index + 2),
        )
    }

    fn bad(&mut self, index: usize) {
        self.bad_params.push(BadParam {
            index,
            token: self.tokens.get(index).unwrap_or(&"").to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subfile_reference() {
        let parsed = parse_line("1 16 0 0 0 1 0 0 0 1 0 0 0 1 3001.dat").unwrap();
        assert!(parsed.bad_params.is_empty());

        let Command::SubFile(cmd) = parsed.command else {
            panic!("expected sub-file reference");
        };
        assert_eq!(cmd.color, ColorSpec::Code(16));
        assert_eq!(cmd.transform, Mat4::IDENTITY);
        assert_eq!(cmd.name, "3001");
        assert_eq!(cmd.extension, ".dat");
        assert_eq!(cmd.key(), "3001.dat");
    }

    #[test]
    fn test_subfile_name_with_spaces_and_folder() {
        let parsed = parse_line("1 4 10 20 30 1 0 0 0 1 0 0 0 1 S\\My Part.DAT").unwrap();
        let Command::SubFile(cmd) = parsed.command else {
            panic!("expected sub-file reference");
        };
        assert_eq!(cmd.name, "S\\My Part");
        assert_eq!(cmd.extension, ".DAT");
        assert_eq!(cmd.key(), "s/my part.dat");
        assert_eq!(
            cmd.transform.transform_point3(Vec3::ZERO),
            Vec3::new(10.0, 20.0, 30.0)
        );
    }

    #[test]
    fn test_parse_triangle() {
        let parsed = parse_line("3 4 0 0 0 1 0 0 0 1 0").unwrap();
        let Command::Triangle(tri) = parsed.command else {
            panic!("expected triangle");
        };
        assert_eq!(tri.color, ColorSpec::Code(4));
        assert_eq!(tri.vertices, [Vec3::ZERO, Vec3::X, Vec3::Y]);
    }

    #[test]
    fn test_malformed_coordinate_still_produces_triangle() {
        let parsed = parse_line("3 5 0 0 notanumber 1 0 0 0 1 0").unwrap();

        assert!(matches!(parsed.command, Command::Triangle(_)));
        assert_eq!(
            parsed.bad_params,
            vec![BadParam {
                index: 4,
                token: "notanumber".to_string()
            }]
        );
    }

    #[test]
    fn test_quad_split_order() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(1.0, 0.0, 0.0);
        let c = Vec3::new(1.0, 1.0, 0.0);
        let d = Vec3::new(0.0, 1.0, 0.0);
        let parsed = parse_line("4 1 0 0 0 1 0 0 1 1 0 0 1 0").unwrap();
        let Command::Quad(quad) = parsed.command else {
            panic!("expected quad");
        };
        assert_eq!(quad.vertices, [a, b, c, d]);
        assert_eq!(quad.triangles(), [[a, b, c], [a, c, d]]);
    }

    #[test]
    fn test_short_quad_reports_missing_params() {
        let parsed = parse_line("4 1 0 0 0 1 0 0 1 1 0").unwrap();
        assert_eq!(parsed.bad_params.len(), 3);
        assert!(parsed.bad_params.iter().all(|p| p.token.is_empty()));
    }

    #[test]
    fn test_non_geometry_lines_are_skipped() {
        assert!(parse_line("0 // a comment").is_none());
        assert!(parse_line("0 FILE main.ldr").is_none());
        assert!(parse_line("2 24 0 0 0 1 1 1").is_none());
        assert!(parse_line("5 24 0 0 0 1 1 1 0 1 0 1 0 0").is_none());
        assert!(parse_line("").is_none());
        assert!(parse_line("   ").is_none());
        assert!(parse_line("hello world").is_none());
    }

    #[test]
    fn test_empty_color_token_inherits() {
        let parsed = parse_line("3  0 0 0 1 0 0 0 1 0").unwrap();
        assert!(parsed.bad_params.is_empty());
        assert_eq!(parsed.command.color(), &ColorSpec::Inherit);
    }

    #[test]
    fn test_trailing_whitespace_ignored() {
        let parsed = parse_line("3 4 0 0 0 1 0 0 0 1 0 \r").unwrap();
        assert!(parsed.bad_params.is_empty());
    }

    #[test]
    fn test_color_tokens() {
        assert_eq!(ColorSpec::from_token(Some("16")), ColorSpec::Code(16));
        assert_eq!(
            ColorSpec::from_token(Some("0x2FF0000")),
            ColorSpec::Named("0x2FF0000".to_string())
        );
        assert_eq!(ColorSpec::from_token(Some("")), ColorSpec::Inherit);
        assert_eq!(ColorSpec::from_token(None), ColorSpec::Inherit);
    }

    #[test]
    fn test_effective_color() {
        let incoming = ColorSpec::Code(4);
        assert_eq!(ColorSpec::Inherit.effective(&incoming), ColorSpec::Code(4));
        assert_eq!(ColorSpec::Code(7).effective(&incoming), ColorSpec::Code(7));
    }

    #[test]
    fn test_split_file_name() {
        assert_eq!(split_file_name("3001.dat"), ("3001", ".dat"));
        assert_eq!(split_file_name("48\\4-4disc"), ("48\\4-4disc", ""));
        assert_eq!(split_file_name("sub.model/part"), ("sub.model/part", ""));
        assert_eq!(split_file_name("car.v2.ldr"), ("car.v2", ".ldr"));
        assert_eq!(split_file_name(".hidden"), (".hidden", ""));
    }
}
