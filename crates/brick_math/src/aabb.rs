use glam::Vec3;

/// Axis-Aligned Bounding Box of imported geometry.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    /// Create an empty AABB (contains nothing).
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    /// Smallest AABB containing every point, or `empty()` for no points.
    pub fn from_positions(points: &[Vec3]) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.grow(*p);
        }
        aabb
    }

    /// Extend the box to contain `point`.
    pub fn grow(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Center point of the box.
    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Diagonal length, 0 for an empty box.
    pub fn size(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            (self.max - self.min).length()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_from_positions() {
        let aabb = Aabb::from_positions(&[Vec3::new(1.0, -2.0, 3.0), Vec3::new(-1.0, 2.0, 0.0)]);
        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_empty_aabb() {
        let aabb = Aabb::from_positions(&[]);
        assert!(aabb.is_empty());
        assert_eq!(aabb.size(), 0.0);
    }

    #[test]
    fn test_aabb_grow() {
        let mut aabb = Aabb::empty();
        aabb.grow(Vec3::ONE);
        assert!(!aabb.is_empty());
        aabb.grow(Vec3::splat(3.0));
        assert_eq!(aabb.min, Vec3::ONE);
        assert_eq!(aabb.max, Vec3::splat(3.0));
    }

    #[test]
    fn test_aabb_centroid() {
        let aabb = Aabb::from_positions(&[Vec3::ZERO, Vec3::new(2.0, 4.0, 6.0)]);
        assert_eq!(aabb.centroid(), Vec3::new(1.0, 2.0, 3.0));
    }
}
