//! LDraw color table.
//!
//! [`ColorTable`] is a [`Palette`] built from LDConfig `!COLOUR` definitions:
//!
//! ```text
//! 0 !COLOUR Black CODE 0 VALUE #1B2A34 EDGE #2B4354
//! 0 !COLOUR Trans_Clear CODE 47 VALUE #FCFCFC EDGE #C3C3C3 ALPHA 128
//! 0 !COLOUR Chrome_Gold CODE 334 VALUE #BBA53D EDGE #BBB23D CHROME
//! ```
//!
//! Direct colors written as `0x2RRGGBB` are accepted as names and get a
//! material the first time they are seen.

use std::collections::HashMap;
use std::sync::Arc;

use brick_math::Vec3;
use parking_lot::RwLock;

use super::color::{MaterialId, Palette};

/// Surface finish keyword of a `!COLOUR` definition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Finish {
    #[default]
    Solid,
    Chrome,
    Pearlescent,
    Rubber,
    MatteMetallic,
    Metal,
    /// `MATERIAL ...` (glitter, speckle, ...); parameters are not kept
    Material,
}

impl Finish {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "CHROME" => Some(Finish::Chrome),
            "PEARLESCENT" => Some(Finish::Pearlescent),
            "RUBBER" => Some(Finish::Rubber),
            "MATTE_METALLIC" => Some(Finish::MatteMetallic),
            "METAL" => Some(Finish::Metal),
            "MATERIAL" => Some(Finish::Material),
            _ => None,
        }
    }

    /// (metallic, roughness) approximation of the finish.
    fn pbr(self) -> (f32, f32) {
        match self {
            Finish::Solid | Finish::Material => (0.0, 0.3),
            Finish::Chrome => (1.0, 0.05),
            Finish::Pearlescent => (0.3, 0.25),
            Finish::Rubber => (0.0, 0.9),
            Finish::MatteMetallic => (0.8, 0.6),
            Finish::Metal => (1.0, 0.3),
        }
    }
}

/// A PBR-ish material for one LDraw color.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    /// Color name (e.g. `Light_Bluish_Grey`)
    pub name: String,

    /// LDraw color code, `None` for direct colors and the fallback
    pub code: Option<u32>,

    /// Diffuse/albedo color (sRGB, 0-1)
    pub diffuse_color: Vec3,

    /// Edge line color (sRGB, 0-1)
    pub edge_color: Vec3,

    /// Opacity (0=transparent, 1=opaque)
    pub opacity: f32,

    /// Emissive color for glowing colors
    pub emissive_color: Vec3,

    pub metallic: f32,

    pub roughness: f32,

    pub finish: Finish,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            code: None,
            diffuse_color: Vec3::new(0.5, 0.5, 0.5), // Grey default
            edge_color: Vec3::ZERO,
            opacity: 1.0,
            emissive_color: Vec3::ZERO,
            metallic: 0.0,
            roughness: 0.3,
            finish: Finish::Solid,
        }
    }
}

impl Material {
    /// Create a new material with just a name and diffuse color.
    pub fn new(name: impl Into<String>, diffuse_color: Vec3) -> Self {
        Self {
            name: name.into(),
            diffuse_color,
            ..Default::default()
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }

    pub fn is_emissive(&self) -> bool {
        self.emissive_color.length_squared() > 0.0
    }

    /// Parse a `0 !COLOUR ...` line. Returns `None` for any other line.
    pub fn from_colour_line(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        if tokens.next()? != "0" || tokens.next()? != "!COLOUR" {
            return None;
        }
        let name = tokens.next()?.to_string();

        let mut material = Material {
            name,
            ..Default::default()
        };
        let mut luminance = 0u8;

        while let Some(keyword) = tokens.next() {
            match keyword {
                "CODE" => material.code = tokens.next().and_then(|t| t.parse().ok()),
                "VALUE" => {
                    if let Some(rgb) = tokens.next().and_then(parse_hex_rgb) {
                        material.diffuse_color = rgb;
                    }
                }
                "EDGE" => {
                    if let Some(rgb) = tokens.next().and_then(parse_hex_rgb) {
                        material.edge_color = rgb;
                    }
                }
                "ALPHA" => {
                    if let Some(alpha) = tokens.next().and_then(|t| t.parse::<u8>().ok()) {
                        material.opacity = alpha as f32 / 255.0;
                    }
                }
                "LUMINANCE" => {
                    luminance = tokens.next().and_then(|t| t.parse().ok()).unwrap_or(0);
                }
                other => {
                    if let Some(finish) = Finish::from_keyword(other) {
                        material.finish = finish;
                        // MATERIAL parameters run to the end of the line
                        if finish == Finish::Material {
                            break;
                        }
                    }
                }
            }
        }

        material.code?;
        let (metallic, roughness) = material.finish.pbr();
        material.metallic = metallic;
        material.roughness = roughness;
        if luminance > 0 {
            material.emissive_color = material.diffuse_color * (luminance as f32 / 255.0);
        }
        Some(material)
    }

    /// Material for a direct color token (`0x2RRGGBB`).
    pub fn from_direct_color(token: &str) -> Option<Self> {
        let hex = token
            .strip_prefix("0x2")
            .or_else(|| token.strip_prefix("0X2"))?;
        if hex.len() != 6 {
            return None;
        }
        let rgb = parse_hex_rgb(&format!("#{}", hex))?;
        Some(Material::new(token, rgb))
    }
}

fn parse_hex_rgb(token: &str) -> Option<Vec3> {
    let hex = token.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let value = u32::from_str_radix(hex, 16).ok()?;
    let channel = |shift: u32| ((value >> shift) & 0xFF) as f32 / 255.0;
    Some(Vec3::new(channel(16), channel(8), channel(0)))
}

#[derive(Default)]
struct TableInner {
    materials: Vec<Arc<Material>>,
    by_code: HashMap<u32, MaterialId>,
    by_name: HashMap<String, MaterialId>,
}

impl TableInner {
    fn insert(&mut self, material: Material) -> MaterialId {
        let id = MaterialId(self.materials.len() as u32);
        if let Some(code) = material.code {
            self.by_code.insert(code, id);
        }
        self.by_name.insert(material.name.to_lowercase(), id);
        self.materials.push(Arc::new(material));
        id
    }
}

/// Palette of LDraw colors. Material ids index into the table; id 0 is a
/// neutral grey fallback.
pub struct ColorTable {
    inner: RwLock<TableInner>,
}

impl Default for ColorTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorTable {
    /// A table containing only the fallback material.
    pub fn new() -> Self {
        let mut inner = TableInner::default();
        inner.insert(Material::new("Fallback", Vec3::new(0.5, 0.5, 0.5)));
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Build a table from LDConfig text. Lines other than `!COLOUR` are ignored.
    pub fn from_ldconfig(text: &str) -> Self {
        let table = Self::new();
        let mut count = 0;
        for line in text.lines() {
            if let Some(material) = Material::from_colour_line(line) {
                table.add(material);
                count += 1;
            }
        }
        log::debug!("Loaded {} colors from LDConfig", count);
        table
    }

    /// A small table of common colors, for use without an LDConfig file.
    pub fn with_defaults() -> Self {
        Self::from_ldconfig(DEFAULT_LDCONFIG)
    }

    /// Add a material, replacing earlier definitions of the same code or name.
    pub fn add(&self, material: Material) -> MaterialId {
        self.inner.write().insert(material)
    }

    pub fn material(&self, id: MaterialId) -> Option<Arc<Material>> {
        self.inner.read().materials.get(id.index()).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Palette for ColorTable {
    fn material_for_code(&self, code: u32) -> Option<MaterialId> {
        self.inner.read().by_code.get(&code).copied()
    }

    fn material_for_name(&self, name: &str) -> Option<MaterialId> {
        let key = name.to_lowercase();
        if let Some(id) = self.inner.read().by_name.get(&key) {
            return Some(*id);
        }

        let material = Material::from_direct_color(name)?;
        let mut inner = self.inner.write();
        // Another thread may have registered it between the locks
        if let Some(id) = inner.by_name.get(&key) {
            return Some(*id);
        }
        Some(inner.insert(material))
    }
}

const DEFAULT_LDCONFIG: &str = "\
0 !COLOUR Black CODE 0 VALUE #1B2A34 EDGE #2B4354
0 !COLOUR Blue CODE 1 VALUE #1E5AA8 EDGE #0D325B
0 !COLOUR Green CODE 2 VALUE #00852B EDGE #00451A
0 !COLOUR Red CODE 4 VALUE #B40000 EDGE #770000
0 !COLOUR Light_Grey CODE 7 VALUE #8A928D EDGE #575857
0 !COLOUR Dark_Grey CODE 8 VALUE #545955 EDGE #333333
0 !COLOUR Yellow CODE 14 VALUE #FAC80A EDGE #B28A00
0 !COLOUR White CODE 15 VALUE #F4F4F4 EDGE #909090
0 !COLOUR Main_Colour CODE 16 VALUE #7F7F7F EDGE #333333
0 !COLOUR Edge_Colour CODE 24 VALUE #7F7F7F EDGE #333333
0 !COLOUR Trans_Clear CODE 47 VALUE #FCFCFC EDGE #C3C3C3 ALPHA 128
0 !COLOUR Light_Bluish_Grey CODE 71 VALUE #A0A5A9 EDGE #6C6E68
0 !COLOUR Dark_Bluish_Grey CODE 72 VALUE #6C6E68 EDGE #333333
0 !COLOUR Chrome_Silver CODE 383 VALUE #E0E0E0 EDGE #A4A4A4 CHROME
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_colour_line() {
        let m = Material::from_colour_line(
            "0 !COLOUR Trans_Clear CODE 47 VALUE #FCFCFC EDGE #C3C3C3 ALPHA 128",
        )
        .unwrap();

        assert_eq!(m.name, "Trans_Clear");
        assert_eq!(m.code, Some(47));
        assert!((m.diffuse_color.x - 252.0 / 255.0).abs() < 0.001);
        assert!((m.opacity - 128.0 / 255.0).abs() < 0.001);
        assert!(m.is_transparent());
    }

    #[test]
    fn test_parse_finish_and_luminance() {
        let chrome =
            Material::from_colour_line("0 !COLOUR Chrome_Gold CODE 334 VALUE #BBA53D EDGE #BBB23D CHROME")
                .unwrap();
        assert_eq!(chrome.finish, Finish::Chrome);
        assert_eq!(chrome.metallic, 1.0);

        let glow = Material::from_colour_line(
            "0 !COLOUR Glow CODE 21 VALUE #E0FFB0 EDGE #A4C2BB ALPHA 240 LUMINANCE 15",
        )
        .unwrap();
        assert!(glow.is_emissive());

        let glitter = Material::from_colour_line(
            "0 !COLOUR Glitter CODE 117 VALUE #FFFFFF EDGE #C3C3C3 ALPHA 128 MATERIAL GLITTER VALUE #000000 FRACTION 0.17",
        )
        .unwrap();
        assert_eq!(glitter.finish, Finish::Material);
        assert_eq!(glitter.diffuse_color, Vec3::ONE);
    }

    #[test]
    fn test_non_colour_lines_ignored() {
        assert!(Material::from_colour_line("0 // comment").is_none());
        assert!(Material::from_colour_line("0 !COLOUR NoCode VALUE #000000").is_none());
    }

    #[test]
    fn test_table_lookup() {
        let table = ColorTable::with_defaults();

        let red = table.material_for_code(4).unwrap();
        assert_eq!(table.material(red).unwrap().name, "Red");
        assert_eq!(table.material_for_name("main_colour"), table.material_for_code(16));
        assert!(table.material_for_code(9999).is_none());
        assert_eq!(table.fallback_material(), MaterialId::NEUTRAL);
        assert_eq!(table.material(MaterialId::NEUTRAL).unwrap().name, "Fallback");
    }

    #[test]
    fn test_direct_colors_registered_once() {
        let table = ColorTable::new();
        let before = table.len();

        let a = table.material_for_name("0x2FF0000").unwrap();
        let b = table.material_for_name("0x2ff0000").unwrap();
        assert_eq!(a, b);
        assert_eq!(table.len(), before + 1);
        assert_eq!(table.material(a).unwrap().diffuse_color, Vec3::new(1.0, 0.0, 0.0));

        assert!(table.material_for_name("not_a_color").is_none());
    }
}
