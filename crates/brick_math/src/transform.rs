// Transform utilities for LDraw sub-file placement
//
// LDraw stores a placement as `x y z a b c d e f g h i`: a translation followed
// by the rows of a 3x3 linear map. glam matrices are column-major.

use glam::{Mat4, Vec4};

/// Build the 4x4 affine matrix for an LDraw parameter block.
///
/// `params` is `[x, y, z, a, b, c, d, e, f, g, h, i]`. The rows `a b c`,
/// `d e f`, `g h i` become the columns `(a, d, g)`, `(b, e, h)`, `(c, f, i)`
/// and the translation column is `(x, y, z, 1)`.
///
/// No orthogonality check is made: scale, skew and mirroring are kept as-is.
pub fn ldraw_matrix(params: [f32; 12]) -> Mat4 {
    let [x, y, z, a, b, c, d, e, f, g, h, i] = params;
    Mat4::from_cols(
        Vec4::new(a, d, g, 0.0),
        Vec4::new(b, e, h, 0.0),
        Vec4::new(c, f, i, 0.0),
        Vec4::new(x, y, z, 1.0),
    )
}

/// Extension trait for Mat4 with LDraw-specific helpers.
pub trait Mat4Ext {
    /// Inverse of [`ldraw_matrix`]: the 12 parameters in file order.
    fn ldraw_params(&self) -> [f32; 12];

    /// True if the linear part flips handedness (negative determinant).
    fn is_mirroring(&self) -> bool;
}

impl Mat4Ext for Mat4 {
    fn ldraw_params(&self) -> [f32; 12] {
        let [c0, c1, c2, c3] = self.to_cols_array_2d();
        [
            c3[0], c3[1], c3[2], // translation
            c0[0], c1[0], c2[0],
            c0[1], c1[1], c2[1],
            c0[2], c1[2], c2[2],
        ]
    }

    fn is_mirroring(&self) -> bool {
        self.determinant() < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_identity_rotation_with_translation() {
        let m = ldraw_matrix([1.0, 2.0, 3.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);

        assert_eq!(m.w_axis, Vec4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(m.x_axis, Vec4::new(1.0, 0.0, 0.0, 0.0));
        assert_eq!(m.y_axis, Vec4::new(0.0, 1.0, 0.0, 0.0));
        assert_eq!(m.z_axis, Vec4::new(0.0, 0.0, 1.0, 0.0));
    }

    #[test]
    fn test_rows_become_columns() {
        let m = ldraw_matrix([
            10.0, 20.0, 30.0, // x y z
            1.0, 2.0, 3.0, // a b c
            4.0, 5.0, 6.0, // d e f
            7.0, 8.0, 9.0, // g h i
        ]);

        assert_eq!(m.x_axis, Vec4::new(1.0, 4.0, 7.0, 0.0));
        assert_eq!(m.y_axis, Vec4::new(2.0, 5.0, 8.0, 0.0));
        assert_eq!(m.z_axis, Vec4::new(3.0, 6.0, 9.0, 0.0));
        assert_eq!(m.w_axis, Vec4::new(10.0, 20.0, 30.0, 1.0));

        // Applying the matrix is the row-major product from the file format
        let p = m.transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(p, Vec3::new(11.0, 24.0, 37.0));
    }

    #[test]
    fn test_non_uniform_scale_preserved() {
        let m = ldraw_matrix([0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, -1.0]);
        let p = m.transform_point3(Vec3::ONE);

        assert_eq!(p, Vec3::new(2.0, 0.5, -1.0));
        assert!(m.is_mirroring());
    }

    #[test]
    fn test_ldraw_params_roundtrip() {
        let params = [5.0, -8.0, 0.0, 0.0, 0.0, -1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        assert_eq!(ldraw_matrix(params).ldraw_params(), params);
    }

    #[test]
    fn test_identity_is_not_mirroring() {
        assert!(!Mat4::IDENTITY.is_mirroring());
    }
}
