// Re-export glam for convenience
pub use glam::*;

// Brick math types
mod aabb;
mod transform;
pub use aabb::Aabb;
pub use transform::{ldraw_matrix, Mat4Ext};
