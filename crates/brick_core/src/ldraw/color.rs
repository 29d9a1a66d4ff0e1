//! Color token resolution.
//!
//! Commands carry a [`ColorSpec`]; the renderer wants a material handle. The
//! mapping itself lives behind the [`Palette`] trait. [`ColorResolver`] adds
//! the selection rule and the fallback for unknown colors.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;

use super::command::ColorSpec;

/// Renderer-side material handle produced by a [`Palette`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaterialId(pub u32);

impl MaterialId {
    /// Neutral material used when a palette has nothing better.
    pub const NEUTRAL: MaterialId = MaterialId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Source of materials for color codes and names.
pub trait Palette: Send + Sync {
    fn material_for_code(&self, code: u32) -> Option<MaterialId>;

    fn material_for_name(&self, name: &str) -> Option<MaterialId>;

    /// Material returned for colors the palette does not know.
    fn fallback_material(&self) -> MaterialId {
        MaterialId::NEUTRAL
    }
}

impl<T: Palette + ?Sized> Palette for Arc<T> {
    fn material_for_code(&self, code: u32) -> Option<MaterialId> {
        (**self).material_for_code(code)
    }

    fn material_for_name(&self, name: &str) -> Option<MaterialId> {
        (**self).material_for_name(name)
    }

    fn fallback_material(&self) -> MaterialId {
        (**self).fallback_material()
    }
}

/// Resolves effective colors to materials, falling back on unknown colors.
///
/// Each unknown code or name is logged once per resolver.
pub struct ColorResolver {
    palette: Box<dyn Palette>,
    default_code: u32,
    unknown: Mutex<BTreeSet<String>>,
}

impl ColorResolver {
    pub fn new(palette: impl Palette + 'static, default_code: u32) -> Self {
        Self {
            palette: Box::new(palette),
            default_code,
            unknown: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn palette(&self) -> &dyn Palette {
        self.palette.as_ref()
    }

    /// Material for an effective color.
    ///
    /// A positive code resolves by code, a named token by name, and anything
    /// else (inherit, code 0) by the default code.
    pub fn resolve(&self, color: &ColorSpec) -> MaterialId {
        match color {
            ColorSpec::Code(code) if *code > 0 => self.resolve_by_code(*code),
            ColorSpec::Named(name) => self.resolve_by_name(name),
            _ => self.resolve_by_code(self.default_code),
        }
    }

    pub fn resolve_by_code(&self, code: u32) -> MaterialId {
        self.palette
            .material_for_code(code)
            .unwrap_or_else(|| self.fallback(code.to_string()))
    }

    pub fn resolve_by_name(&self, name: &str) -> MaterialId {
        self.palette
            .material_for_name(name)
            .unwrap_or_else(|| self.fallback(name.to_string()))
    }

    /// Unknown color tokens seen so far, sorted.
    pub fn unknown_colors(&self) -> Vec<String> {
        self.unknown.lock().iter().cloned().collect()
    }

    fn fallback(&self, token: String) -> MaterialId {
        let mut unknown = self.unknown.lock();
        if !unknown.contains(&token) {
            log::warn!("Unknown color '{}', using fallback material", token);
            unknown.insert(token);
        }
        self.palette.fallback_material()
    }
}
