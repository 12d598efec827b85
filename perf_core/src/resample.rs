//! Resampling volumes onto new voxel grids.
//!
//! [`resize_img`] changes the voxel grid shape of a volume while keeping its
//! physical field of view: the spacing grows by the same factor the shape
//! shrinks, and the affine is recentred with [`Affine::rescale`]. The values
//! on the new grid come from [`resample_from_to`], which maps every target
//! voxel into source voxel space and interpolates there.
//!
//! Samples falling outside the source volume take the value 0. The default
//! [`Interpolation::CubicSpline`] prefilters each frame into cubic B-spline
//! coefficients with mirror-symmetric boundaries, then evaluates the spline
//! at every sample point.

use ndarray::{Array3, Array4, ArrayView3, ArrayViewMut1, ArrayViewMut3, Axis, Ix3, Ix4};

use crate::affine::Affine;
use crate::error::{PerfCoreError, Result};
use crate::volume::{GridSpec, Volume};

/// Tolerance (in source voxels) for samples landing just outside the grid.
const EDGE_EPSILON: f64 = 1e-6;

/// Pole of the cubic B-spline interpolation filter, `sqrt(3) - 2`.
const SPLINE_POLE: f64 = -0.267_949_192_431_122_7;

/// Interpolation used when sampling the source volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Value of the closest source voxel.
    Nearest,
    /// Trilinear blend of the eight surrounding source voxels.
    Trilinear,
    /// Cubic B-spline through the source voxels (third-order spline
    /// interpolation), reading the 4x4x4 surrounding coefficients.
    #[default]
    CubicSpline,
}

/// Resize `volume` to `new_shape` voxels, preserving its field of view.
///
/// Rank-3 volumes are resampled once. Rank-4 volumes are resampled frame by
/// frame along the trailing axis; the frame count and trailing spacing are
/// kept.
///
/// # Errors
/// * [`PerfCoreError::InvalidShape`] if any target axis is zero.
/// * [`PerfCoreError::SingularAffine`] if the volume's affine is degenerate.
pub fn resize_img(volume: &Volume, new_shape: [usize; 3]) -> Result<Volume> {
    resize_img_with(volume, new_shape, Interpolation::default())
}

/// [`resize_img`] with an explicit interpolation mode.
pub fn resize_img_with(
    volume: &Volume,
    new_shape: [usize; 3],
    interpolation: Interpolation,
) -> Result<Volume> {
    if new_shape.contains(&0) {
        return Err(PerfCoreError::InvalidShape {
            shape: new_shape.to_vec(),
        });
    }

    let old_shape = volume.spatial_shape();
    let old_zooms = volume.spatial_zooms();
    let zooms: [f64; 3] =
        std::array::from_fn(|axis| old_zooms[axis] * old_shape[axis] as f64 / new_shape[axis] as f64);

    let affine = volume.affine().rescale(old_shape, zooms, new_shape)?;
    let target = GridSpec::new(new_shape, affine)?;

    log::debug!(
        "resizing {:?} (zooms {:?}) to {:?} (zooms {:?}), {} frame(s)",
        old_shape,
        old_zooms,
        new_shape,
        zooms,
        volume.num_frames()
    );

    let resampled = resample_from_to(volume, &target, interpolation)?;

    let mut out_zooms = zooms.to_vec();
    if volume.ndim() == 4 {
        out_zooms.push(volume.zooms()[3]);
    }
    resampled.with_zooms(out_zooms)
}

/// Resample `source` onto `target`.
///
/// Every target voxel `ijk` is mapped to source voxel coordinates by
/// `inv(A_source) · A_target · ijk` and sampled with `interpolation`.
/// The result carries the target affine. A rank-4 source yields a rank-4
/// result with the same number of frames, each resampled independently.
pub fn resample_from_to(
    source: &Volume,
    target: &GridSpec,
    interpolation: Interpolation,
) -> Result<Volume> {
    let voxel_map = source.affine().inverse()?.compose(&target.affine);
    let [x, y, z] = target.shape;

    match source.ndim() {
        3 => {
            let frame = source
                .data()
                .view()
                .into_dimensionality::<Ix3>()
                .map_err(|_| PerfCoreError::UnsupportedRank { rank: source.ndim() })?;
            let mut out = Array3::<f32>::zeros((x, y, z));
            resample_frame(frame, &voxel_map, out.view_mut(), interpolation);
            Ok(Volume::from_array3(out, target.affine))
        }
        4 => {
            let frames = source
                .data()
                .view()
                .into_dimensionality::<Ix4>()
                .map_err(|_| PerfCoreError::UnsupportedRank { rank: source.ndim() })?;
            let mut out = Array4::<f32>::zeros((x, y, z, frames.len_of(Axis(3))));
            for (frame, slot) in frames.axis_iter(Axis(3)).zip(out.axis_iter_mut(Axis(3))) {
                resample_frame(frame, &voxel_map, slot, interpolation);
            }
            let trailing_zoom = source.zooms()[3];
            let affine_zooms = target.affine.voxel_sizes();
            Volume::from_array4(out, target.affine).with_zooms(vec![
                affine_zooms[0],
                affine_zooms[1],
                affine_zooms[2],
                trailing_zoom,
            ])
        }
        rank => Err(PerfCoreError::UnsupportedRank { rank }),
    }
}

/// Fill `out` by sampling `frame` at `voxel_map · ijk` for every output voxel.
fn resample_frame(
    frame: ArrayView3<'_, f32>,
    voxel_map: &Affine,
    mut out: ArrayViewMut3<'_, f32>,
    interpolation: Interpolation,
) {
    let sampler = Sampler::new(frame, interpolation);
    let sample = |(i, j, k): (usize, usize, usize)| {
        sampler.sample(voxel_map.apply([i as f64, j as f64, k as f64]))
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        let (_, ny, nz) = out.dim();
        let values: Vec<f32> = (0..out.len())
            .into_par_iter()
            .map(|flat| sample((flat / (ny * nz), (flat / nz) % ny, flat % nz)))
            .collect();
        for (slot, value) in out.iter_mut().zip(values) {
            *slot = value;
        }
    }

    #[cfg(not(feature = "parallel"))]
    ndarray::Zip::indexed(&mut out).for_each(|idx, value| *value = sample(idx));
}

/// Per-frame sampling state. The spline variant owns its prefiltered
/// coefficients so they are computed once per frame.
enum Sampler<'a> {
    Nearest(ArrayView3<'a, f32>),
    Trilinear(ArrayView3<'a, f32>),
    CubicSpline(Array3<f64>),
}

impl<'a> Sampler<'a> {
    fn new(frame: ArrayView3<'a, f32>, interpolation: Interpolation) -> Self {
        match interpolation {
            Interpolation::Nearest => Sampler::Nearest(frame),
            Interpolation::Trilinear => Sampler::Trilinear(frame),
            Interpolation::CubicSpline => Sampler::CubicSpline(spline_coefficients(frame)),
        }
    }

    fn sample(&self, p: [f64; 3]) -> f32 {
        match self {
            Sampler::Nearest(frame) => sample_nearest(frame, p),
            Sampler::Trilinear(frame) => sample_trilinear(frame, p),
            Sampler::CubicSpline(coeffs) => sample_cubic(coeffs, p),
        }
    }
}

/// Lower neighbour, upper neighbour and blend weight along one axis.
#[inline]
fn axis_neighbours(p: f64, len: usize) -> Option<(usize, usize, f64)> {
    if len == 0 {
        return None;
    }
    let last = (len - 1) as f64;
    if p < -EDGE_EPSILON || p > last + EDGE_EPSILON {
        return None;
    }
    let p = p.clamp(0.0, last);
    let lo = (p.floor() as usize).min(len.saturating_sub(2));
    let hi = (lo + 1).min(len - 1);
    Some((lo, hi, p - lo as f64))
}

fn sample_trilinear(frame: &ArrayView3<'_, f32>, p: [f64; 3]) -> f32 {
    let (nx, ny, nz) = frame.dim();
    let (Some((x0, x1, tx)), Some((y0, y1, ty)), Some((z0, z1, tz))) = (
        axis_neighbours(p[0], nx),
        axis_neighbours(p[1], ny),
        axis_neighbours(p[2], nz),
    ) else {
        return 0.0;
    };

    let v = |x: usize, y: usize, z: usize| f64::from(frame[[x, y, z]]);
    let lerp = |a: f64, b: f64, t: f64| a + (b - a) * t;

    let c00 = lerp(v(x0, y0, z0), v(x1, y0, z0), tx);
    let c10 = lerp(v(x0, y1, z0), v(x1, y1, z0), tx);
    let c01 = lerp(v(x0, y0, z1), v(x1, y0, z1), tx);
    let c11 = lerp(v(x0, y1, z1), v(x1, y1, z1), tx);

    let c0 = lerp(c00, c10, ty);
    let c1 = lerp(c01, c11, ty);

    lerp(c0, c1, tz) as f32
}

fn sample_nearest(frame: &ArrayView3<'_, f32>, p: [f64; 3]) -> f32 {
    let (nx, ny, nz) = frame.dim();
    let index = |coord: f64, len: usize| {
        let rounded = coord.round();
        (rounded >= 0.0 && rounded < len as f64).then_some(rounded as usize)
    };
    match (index(p[0], nx), index(p[1], ny), index(p[2], nz)) {
        (Some(x), Some(y), Some(z)) => frame[[x, y, z]],
        _ => 0.0,
    }
}

/// Cubic B-spline coefficients of `frame`, filtered separably along each axis.
fn spline_coefficients(frame: ArrayView3<'_, f32>) -> Array3<f64> {
    let mut coeffs = frame.mapv(f64::from);
    for axis in 0..3 {
        for mut line in coeffs.lanes_mut(Axis(axis)) {
            prefilter_line(&mut line);
        }
    }
    coeffs
}

/// In-place recursive cubic B-spline prefilter with mirror boundaries.
fn prefilter_line(c: &mut ArrayViewMut1<'_, f64>) {
    let n = c.len();
    if n < 2 {
        return;
    }
    let z = SPLINE_POLE;
    // overall gain (1 - z)(1 - 1/z)
    c.mapv_inplace(|v| v * 6.0);

    let first = causal_init(c, z);
    c[0] = first;
    for k in 1..n {
        let prev = c[k - 1];
        c[k] += z * prev;
    }

    let last = (z / (z * z - 1.0)) * (z * c[n - 2] + c[n - 1]);
    c[n - 1] = last;
    for k in (0..n - 1).rev() {
        let next = c[k + 1];
        c[k] = z * (next - c[k]);
    }
}

/// First causal coefficient of a mirror-extended line.
fn causal_init(c: &ArrayViewMut1<'_, f64>, z: f64) -> f64 {
    let n = c.len();
    let horizon = (f64::EPSILON.ln() / z.abs().ln()).ceil() as usize;

    if horizon < n {
        let mut zn = z;
        let mut sum = c[0];
        for k in 1..horizon {
            sum += zn * c[k];
            zn *= z;
        }
        return sum;
    }

    let mut zn = z;
    let iz = 1.0 / z;
    let mut z2n = z.powi(n as i32 - 1);
    let mut sum = c[0] + z2n * c[n - 1];
    z2n *= z2n * iz;
    for k in 1..n - 1 {
        sum += (zn + z2n) * c[k];
        zn *= z;
        z2n *= iz;
    }
    sum / (1.0 - zn * zn)
}

/// Neighbour indices and cubic B-spline weights along one axis.
///
/// Neighbours beyond the grid are mirrored back inside it; points beyond
/// the grid itself yield `None`.
#[inline]
fn cubic_stencil(p: f64, len: usize) -> Option<[(usize, f64); 4]> {
    if len == 0 {
        return None;
    }
    let last = (len - 1) as f64;
    if p < -EDGE_EPSILON || p > last + EDGE_EPSILON {
        return None;
    }
    let p = p.clamp(0.0, last);
    let base = p.floor();
    let t = p - base;
    let u = 1.0 - t;
    let weights = [
        u * u * u / 6.0,
        (3.0 * t * t * t - 6.0 * t * t + 4.0) / 6.0,
        (-3.0 * t * t * t + 3.0 * t * t + 3.0 * t + 1.0) / 6.0,
        t * t * t / 6.0,
    ];
    let base = base as isize;
    Some(std::array::from_fn(|i| {
        (mirror_index(base - 1 + i as isize, len), weights[i])
    }))
}

/// Reflect `i` into `0..len` about the first and last samples.
#[inline]
fn mirror_index(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let i = i.rem_euclid(period);
    if i >= len as isize {
        (period - i) as usize
    } else {
        i as usize
    }
}

fn sample_cubic(coeffs: &Array3<f64>, p: [f64; 3]) -> f32 {
    let (nx, ny, nz) = coeffs.dim();
    let (Some(sx), Some(sy), Some(sz)) = (
        cubic_stencil(p[0], nx),
        cubic_stencil(p[1], ny),
        cubic_stencil(p[2], nz),
    ) else {
        return 0.0;
    };

    let mut acc = 0.0;
    for &(x, wx) in &sx {
        for &(y, wy) in &sy {
            let wxy = wx * wy;
            for &(z, wz) in &sz {
                acc += wxy * wz * coeffs[[x, y, z]];
            }
        }
    }
    acc as f32
}
