//! Voxel-to-world affine transforms.
//!
//! An [`Affine`] maps homogeneous voxel indices `(i, j, k, 1)` to physical
//! coordinates `(x, y, z, 1)`. The upper-left 3×3 block holds rotation,
//! zoom and shear; the last column holds the translation.

use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};

use crate::error::{PerfCoreError, Result};

/// Homogeneous 4×4 voxel-to-world transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    matrix: Matrix4<f64>,
}

impl Default for Affine {
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine {
    /// Identity transform (unit spacing, origin at voxel 0).
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Wrap an existing homogeneous matrix.
    pub fn from_matrix(matrix: Matrix4<f64>) -> Self {
        Self { matrix }
    }

    /// Build an axis-aligned affine from per-axis spacing and an origin.
    pub fn from_zooms(zooms: [f64; 3], origin: [f64; 3]) -> Self {
        let mut matrix = Matrix4::identity();
        for axis in 0..3 {
            matrix[(axis, axis)] = zooms[axis];
            matrix[(axis, 3)] = origin[axis];
        }
        Self { matrix }
    }

    /// Build from a 3×3 rotation/zoom block and a translation.
    pub fn from_matvec(rzs: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        let mut matrix = Matrix4::identity();
        matrix.fixed_view_mut::<3, 3>(0, 0).copy_from(&rzs);
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(&translation);
        Self { matrix }
    }

    /// The underlying homogeneous matrix.
    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    /// Rotation/zoom/shear block.
    pub fn rzs(&self) -> Matrix3<f64> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// Translation column.
    pub fn translation(&self) -> Vector3<f64> {
        self.matrix.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Physical voxel size along each voxel axis (column norms of the
    /// rotation/zoom block).
    pub fn voxel_sizes(&self) -> [f64; 3] {
        let rzs = self.rzs();
        [
            rzs.column(0).norm(),
            rzs.column(1).norm(),
            rzs.column(2).norm(),
        ]
    }

    /// Map a (possibly fractional) voxel index to world coordinates.
    #[inline]
    pub fn apply(&self, ijk: [f64; 3]) -> [f64; 3] {
        let out = self.matrix * Vector4::new(ijk[0], ijk[1], ijk[2], 1.0);
        [out.x, out.y, out.z]
    }

    /// Inverse transform (world to voxel).
    pub fn inverse(&self) -> Result<Self> {
        self.matrix
            .try_inverse()
            .map(Self::from_matrix)
            .ok_or(PerfCoreError::SingularAffine)
    }

    /// Composition `self ∘ other`: applies `other` first, then `self`.
    pub fn compose(&self, other: &Self) -> Self {
        Self::from_matrix(self.matrix * other.matrix)
    }

    /// Rescale this affine for a grid of `new_shape` voxels of size `zooms`.
    ///
    /// Each column of the rotation/zoom block is rescaled so that its norm
    /// becomes the matching entry of `zooms`; the direction cosines are kept.
    /// The translation is chosen so that the central voxel `(shape - 1) / 2`
    /// (integer division) of the old grid and the central voxel of the new
    /// grid land on the same world coordinate.
    pub fn rescale(&self, shape: [usize; 3], zooms: [f64; 3], new_shape: [usize; 3]) -> Result<Self> {
        let sizes = self.voxel_sizes();
        if sizes.iter().any(|&s| s == 0.0) {
            return Err(PerfCoreError::SingularAffine);
        }

        let mut rzs = self.rzs();
        for axis in 0..3 {
            let scale = zooms[axis] / sizes[axis];
            rzs.column_mut(axis).scale_mut(scale);
        }

        let centre = |dims: [usize; 3]| {
            Vector3::new(
                (dims[0].saturating_sub(1) / 2) as f64,
                (dims[1].saturating_sub(1) / 2) as f64,
                (dims[2].saturating_sub(1) / 2) as f64,
            )
        };

        let old_centre = centre(shape);
        let centroid = Vector3::from(self.apply([old_centre.x, old_centre.y, old_centre.z]));
        let translation = centroid - rzs * centre(new_shape);

        Ok(Self::from_matvec(rzs, translation))
    }
}

/// Affine for resampling a `shape` grid to `new_shape` voxels of size
/// `new_zooms`. See [`Affine::rescale`].
pub fn rescale_affine(
    affine: &Affine,
    shape: [usize; 3],
    new_zooms: [f64; 3],
    new_shape: [usize; 3],
) -> Result<Affine> {
    affine.rescale(shape, new_zooms, new_shape)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_voxel_sizes_axis_aligned() {
        let affine = Affine::from_zooms([1.5, 2.0, 3.0], [10.0, -5.0, 0.0]);
        let sizes = affine.voxel_sizes();
        assert!(approx_eq(sizes[0], 1.5));
        assert!(approx_eq(sizes[1], 2.0));
        assert!(approx_eq(sizes[2], 3.0));
    }

    #[test]
    fn test_voxel_sizes_rotated() {
        // 90 degree rotation about z with 2mm voxels
        let rzs = Matrix3::new(0.0, -2.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 2.0);
        let affine = Affine::from_matvec(rzs, Vector3::zeros());
        for size in affine.voxel_sizes() {
            assert!(approx_eq(size, 2.0));
        }
    }

    #[test]
    fn test_inverse_roundtrip() {
        let affine = Affine::from_zooms([2.0, 2.0, 4.0], [1.0, 2.0, 3.0]);
        let inverse = affine.inverse().unwrap();
        let world = affine.apply([3.0, 4.0, 5.0]);
        let back = inverse.apply(world);
        assert!(approx_eq(back[0], 3.0));
        assert!(approx_eq(back[1], 4.0));
        assert!(approx_eq(back[2], 5.0));
    }

    #[test]
    fn test_singular_inverse() {
        let affine = Affine::from_zooms([1.0, 0.0, 1.0], [0.0; 3]);
        assert_eq!(affine.inverse().unwrap_err(), PerfCoreError::SingularAffine);
    }

    #[test]
    fn test_rescale_halving_resolution() {
        let affine = Affine::identity();
        let rescaled = affine.rescale([64, 64, 64], [2.0, 2.0, 2.0], [32, 32, 32]).unwrap();

        for size in rescaled.voxel_sizes() {
            assert!(approx_eq(size, 2.0));
        }
        // centre voxel 31 of the old grid equals centre voxel 15 of the new one
        let old_centre = affine.apply([31.0, 31.0, 31.0]);
        let new_centre = rescaled.apply([15.0, 15.0, 15.0]);
        for axis in 0..3 {
            assert!(approx_eq(old_centre[axis], new_centre[axis]));
        }
        assert!(approx_eq(rescaled.translation().x, 1.0));
    }

    #[test]
    fn test_rescale_keeps_direction() {
        let rzs = Matrix3::new(-1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
        let affine = Affine::from_matvec(rzs, Vector3::new(90.0, -126.0, -72.0));
        let rescaled = affine.rescale([10, 10, 10], [2.0, 1.0, 0.5], [5, 10, 20]).unwrap();
        let out = rescaled.rzs();
        assert!(approx_eq(out[(0, 0)], -2.0));
        assert!(approx_eq(out[(1, 1)], 1.0));
        assert!(approx_eq(out[(2, 2)], 0.5));
    }

    #[test]
    fn test_rescale_affine_keeps_centre() {
        let affine = Affine::from_zooms([1.0, 1.0, 1.0], [-20.0, 4.0, 0.0]);
        let rescaled = rescale_affine(&affine, [10, 10, 10], [2.0, 2.0, 2.0], [5, 5, 5]).unwrap();
        let before = affine.apply([4.0, 4.0, 4.0]);
        let after = rescaled.apply([2.0, 2.0, 2.0]);
        for axis in 0..3 {
            assert!(approx_eq(before[axis], after[axis]));
        }
        assert!(rescaled.voxel_sizes().iter().all(|&s| approx_eq(s, 2.0)));
    }
}
