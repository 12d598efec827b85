//! Volumetric images with spatial metadata.

use ndarray::{Array3, Array4, ArrayD, ArrayView3, Ix3};

use crate::affine::Affine;
use crate::error::{PerfCoreError, Result};

/// Shape and placement of a 3D voxel grid, without any voxel data.
///
/// This is the resampling target: values are computed on this grid by
/// [`resample_from_to`](crate::resample::resample_from_to).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    /// Number of voxels along each spatial axis.
    pub shape: [usize; 3],
    /// Voxel-to-world transform of the grid.
    pub affine: Affine,
}

impl GridSpec {
    /// Create a grid, rejecting zero-length axes.
    pub fn new(shape: [usize; 3], affine: Affine) -> Result<Self> {
        if shape.contains(&0) {
            return Err(PerfCoreError::InvalidShape {
                shape: shape.to_vec(),
            });
        }
        Ok(Self { shape, affine })
    }

    /// Total number of voxels.
    #[inline]
    pub fn num_voxels(&self) -> usize {
        self.shape.iter().product()
    }
}

/// A 3D volume, or a 4D stack of 3D volumes along a trailing
/// channel/time axis, carrying its affine and voxel spacing.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    data: ArrayD<f32>,
    affine: Affine,
    zooms: Vec<f64>,
}

impl Volume {
    /// Create a volume from rank-3 or rank-4 data.
    ///
    /// Spatial zooms are derived from the affine's column norms; any
    /// trailing axis gets a unit zoom. Use [`Volume::with_zooms`] to attach
    /// header spacing that differs from the affine.
    pub fn new(data: ArrayD<f32>, affine: Affine) -> Result<Self> {
        let rank = data.ndim();
        if rank != 3 && rank != 4 {
            return Err(PerfCoreError::UnsupportedRank { rank });
        }

        let mut zooms = affine.voxel_sizes().to_vec();
        zooms.resize(rank, 1.0);

        Ok(Self {
            data,
            affine,
            zooms,
        })
    }

    /// Create a 3D volume.
    pub fn from_array3(data: Array3<f32>, affine: Affine) -> Self {
        let zooms = affine.voxel_sizes().to_vec();
        Self {
            data: data.into_dyn(),
            affine,
            zooms,
        }
    }

    /// Create a 4D volume whose last axis indexes independent 3D volumes.
    pub fn from_array4(data: Array4<f32>, affine: Affine) -> Self {
        let mut zooms = affine.voxel_sizes().to_vec();
        zooms.push(1.0);
        Self {
            data: data.into_dyn(),
            affine,
            zooms,
        }
    }

    /// Replace the voxel spacing.
    ///
    /// One entry per data axis is required and every entry must be
    /// positive and finite.
    pub fn with_zooms(mut self, zooms: Vec<f64>) -> Result<Self> {
        let valid = zooms.len() == self.data.ndim()
            && zooms.iter().all(|z| z.is_finite() && *z > 0.0);
        if !valid {
            return Err(PerfCoreError::InvalidZooms {
                zooms,
                rank: self.data.ndim(),
            });
        }
        self.zooms = zooms;
        Ok(self)
    }

    /// Voxel data.
    pub fn data(&self) -> &ArrayD<f32> {
        &self.data
    }

    /// Consume the volume, returning its data.
    pub fn into_data(self) -> ArrayD<f32> {
        self.data
    }

    /// Voxel-to-world transform.
    pub fn affine(&self) -> &Affine {
        &self.affine
    }

    /// Voxel spacing, one entry per data axis.
    pub fn zooms(&self) -> &[f64] {
        &self.zooms
    }

    /// Spacing along the three spatial axes.
    pub fn spatial_zooms(&self) -> [f64; 3] {
        [self.zooms[0], self.zooms[1], self.zooms[2]]
    }

    /// Full data shape.
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Number of data axes (3 or 4).
    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    /// Shape of the three spatial axes.
    pub fn spatial_shape(&self) -> [usize; 3] {
        let shape = self.data.shape();
        [shape[0], shape[1], shape[2]]
    }

    /// Number of 3D volumes stacked along the trailing axis (1 for 3D data).
    pub fn num_frames(&self) -> usize {
        if self.ndim() == 4 {
            self.data.shape()[3]
        } else {
            1
        }
    }

    /// The grid this volume lives on.
    pub fn grid(&self) -> GridSpec {
        GridSpec {
            shape: self.spatial_shape(),
            affine: self.affine,
        }
    }

    /// View of one 3D frame. For 3D data only frame 0 exists.
    pub fn frame(&self, index: usize) -> Option<ArrayView3<'_, f32>> {
        match self.ndim() {
            3 if index == 0 => self.data.view().into_dimensionality::<Ix3>().ok(),
            4 if index < self.num_frames() => self
                .data
                .index_axis(ndarray::Axis(3), index)
                .into_dimensionality::<Ix3>()
                .ok(),
            _ => None,
        }
    }
}

impl TryFrom<(ArrayD<f32>, Affine)> for Volume {
    type Error = PerfCoreError;

    fn try_from((data, affine): (ArrayD<f32>, Affine)) -> Result<Self> {
        Self::new(data, affine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    #[test]
    fn test_zooms_from_affine() {
        let data = ArrayD::zeros(IxDyn(&[4, 4, 4]));
        let volume = Volume::new(data, Affine::from_zooms([1.0, 2.0, 3.0], [0.0; 3])).unwrap();
        assert_eq!(volume.zooms(), &[1.0, 2.0, 3.0]);
        assert_eq!(volume.num_frames(), 1);
    }

    #[test]
    fn test_4d_gets_unit_trailing_zoom() {
        let volume = Volume::from_array4(Array4::zeros((2, 3, 4, 5)), Affine::identity());
        assert_eq!(volume.zooms(), &[1.0, 1.0, 1.0, 1.0]);
        assert_eq!(volume.spatial_shape(), [2, 3, 4]);
        assert_eq!(volume.num_frames(), 5);
        assert_eq!(volume.frame(4).unwrap().dim(), (2, 3, 4));
        assert!(volume.frame(5).is_none());
    }

    #[test]
    fn test_rejects_other_ranks() {
        let data = ArrayD::zeros(IxDyn(&[4, 4]));
        assert_eq!(
            Volume::new(data, Affine::identity()).unwrap_err(),
            PerfCoreError::UnsupportedRank { rank: 2 }
        );
    }

    #[test]
    fn test_with_zooms_validation() {
        let volume = Volume::from_array3(Array3::zeros((2, 2, 2)), Affine::identity());
        assert!(volume.clone().with_zooms(vec![1.0, 1.0]).is_err());
        assert!(volume.clone().with_zooms(vec![1.0, -1.0, 1.0]).is_err());
        let volume = volume.with_zooms(vec![0.5, 0.5, 2.0]).unwrap();
        assert_eq!(volume.spatial_zooms(), [0.5, 0.5, 2.0]);
    }

    #[test]
    fn test_grid_spec_rejects_zero_axis() {
        assert!(GridSpec::new([4, 0, 4], Affine::identity()).is_err());
        let grid = GridSpec::new([4, 5, 6], Affine::identity()).unwrap();
        assert_eq!(grid.num_voxels(), 120);
    }
}
