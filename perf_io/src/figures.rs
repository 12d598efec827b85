//! Diagnostic figures of generated versus target images.
//!
//! One call to [`save_figs`] writes three files next to a path prefix:
//!
//! - `<prefix><epoch>.png`: image panels of the current epoch
//! - `<prefix>losses.png`: discriminator, generator and validation loss curves
//! - `<prefix>losses.npz`: the raw loss sequences (see [`crate::archive`])
//!
//! Each bitmap canvas lives in its own scope and is released when the scope
//! exits, whether rendering succeeded or not.

use std::ffi::OsString;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use ndarray::{s, Array2, ArrayView2, ArrayView4};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::archive::{save_losses, LossHistory};
use crate::colormap::Colormap;
use crate::config::FigureConfig;
use crate::error::{render_err, PerfIoError, Result};

const FONT: &str = "sans-serif";
/// DejaVu Sans, registered under [`FONT`] before the first figure is drawn.
static FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Column titles in single-sample mode.
const SINGLE_TITLES: [&str; 3] = ["Input", "Generated", "Target"];
/// Column titles in batch mode.
const BATCH_TITLES: [&str; 4] = ["Input", "Generated", "Target", "Error"];

type Canvas<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Input, target and generated images of one evaluation step.
#[derive(Debug, Clone, Copy)]
pub enum ImageTriplet<'a> {
    /// One 2D slice per image, rendered as a single row without error map.
    Single {
        /// Network input.
        input: ArrayView2<'a, f32>,
        /// Ground truth.
        target: ArrayView2<'a, f32>,
        /// Network output.
        generated: ArrayView2<'a, f32>,
    },
    /// Batches shaped `(batch, channel, height, width)`. Channel 0 of the
    /// first `nr_imgs_gen` samples is rendered, with an absolute error map.
    Batch {
        /// Network input.
        input: ArrayView4<'a, f32>,
        /// Ground truth.
        target: ArrayView4<'a, f32>,
        /// Network output.
        generated: ArrayView4<'a, f32>,
    },
}

impl<'a> ImageTriplet<'a> {
    /// Build a single-sample triplet.
    pub fn single(
        input: ArrayView2<'a, f32>,
        target: ArrayView2<'a, f32>,
        generated: ArrayView2<'a, f32>,
    ) -> Self {
        ImageTriplet::Single {
            input,
            target,
            generated,
        }
    }

    /// Build a batch triplet.
    pub fn batch(
        input: ArrayView4<'a, f32>,
        target: ArrayView4<'a, f32>,
        generated: ArrayView4<'a, f32>,
    ) -> Self {
        ImageTriplet::Batch {
            input,
            target,
            generated,
        }
    }

    fn shapes(&self) -> [&[usize]; 3] {
        match self {
            ImageTriplet::Single {
                input,
                target,
                generated,
            } => [input.shape(), target.shape(), generated.shape()],
            ImageTriplet::Batch {
                input,
                target,
                generated,
            } => [input.shape(), target.shape(), generated.shape()],
        }
    }

    /// Check that all three images share a shape and hold data.
    pub fn validate(&self) -> Result<()> {
        let [input, target, generated] = self.shapes();
        for (what, shape) in [("target", target), ("generated", generated)] {
            if shape != input {
                return Err(PerfIoError::ShapeMismatch {
                    what,
                    expected: input.to_vec(),
                    got: shape.to_vec(),
                });
            }
        }
        if input.contains(&0) {
            return Err(PerfIoError::InvalidInput(format!(
                "cannot render images of shape {input:?}"
            )));
        }
        Ok(())
    }
}

/// Paths written by one [`save_figs`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FigurePaths {
    /// Image panel figure.
    pub panels: PathBuf,
    /// Loss curve figure.
    pub losses: PathBuf,
    /// Compressed loss archive.
    pub archive: PathBuf,
}

/// Writes evaluation figures with a fixed layout.
#[derive(Debug, Clone, Default)]
pub struct FigureWriter {
    config: FigureConfig,
}

impl FigureWriter {
    /// Create a writer, validating the layout.
    pub fn new(config: FigureConfig) -> Result<Self> {
        config.validate().map_err(PerfIoError::InvalidInput)?;
        register_fonts()?;
        Ok(Self { config })
    }

    /// Layout in use.
    pub fn config(&self) -> &FigureConfig {
        &self.config
    }

    /// Write the panel figure, loss curves and loss archive for `epoch`.
    pub fn save_figs(
        &self,
        epoch: usize,
        images: &ImageTriplet<'_>,
        losses: &LossHistory,
        prefix: impl AsRef<Path>,
    ) -> Result<FigurePaths> {
        let prefix = prefix.as_ref();
        images.validate()?;
        ensure_parent(prefix)?;

        let panels = prefixed(prefix, &format!("{epoch}.png"));
        match images {
            ImageTriplet::Single {
                input,
                target,
                generated,
            } => self.render_single(&panels, *input, *target, *generated)?,
            ImageTriplet::Batch {
                input,
                target,
                generated,
            } => self.render_batch(&panels, *input, *target, *generated)?,
        }
        log::info!("epoch {epoch}: wrote image panels to {}", panels.display());

        let loss_figure = prefixed(prefix, "losses.png");
        self.render_losses(&loss_figure, losses)?;
        let archive = save_losses(prefix, losses)?;

        Ok(FigurePaths {
            panels,
            losses: loss_figure,
            archive,
        })
    }

    fn render_single<'a>(
        &self,
        path: &Path,
        input: ArrayView2<'a, f32>,
        target: ArrayView2<'a, f32>,
        generated: ArrayView2<'a, f32>,
    ) -> Result<()> {
        let error = perf_core::mae(&target, &generated)?;
        log::debug!("single-sample mae {error:.6}");

        let cell = self.config.panel_size + self.config.title_height;
        let size = (3 * self.config.panel_size, cell);
        {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            root.fill(&WHITE).map_err(render_err)?;
            let cells = root.split_evenly((1, 3));
            for ((area, title), image) in cells
                .iter()
                .zip(SINGLE_TITLES)
                .zip([input, generated, target])
            {
                self.draw_cell(area, Some(title), image, Colormap::Viridis)?;
            }
            root.present().map_err(render_err)?;
        }
        Ok(())
    }

    fn render_batch(
        &self,
        path: &Path,
        input: ArrayView4<'_, f32>,
        target: ArrayView4<'_, f32>,
        generated: ArrayView4<'_, f32>,
    ) -> Result<()> {
        let rows = self.config.nr_imgs_gen;
        let available = input.shape()[0];
        if available < rows {
            return Err(PerfIoError::InvalidInput(format!(
                "batch holds {available} samples but {rows} rows were requested"
            )));
        }

        let cell = self.config.panel_size + self.config.title_height;
        let size = (4 * self.config.panel_size, rows as u32 * cell);
        {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            root.fill(&WHITE).map_err(render_err)?;
            let cells = root.split_evenly((rows, 4));

            for (i, row) in cells.chunks(4).enumerate() {
                let input = input.slice(s![i, 0, .., ..]);
                let target = target.slice(s![i, 0, .., ..]);
                let generated = generated.slice(s![i, 0, .., ..]);
                let error_map = error_map(target, generated);

                log::debug!(
                    "sample {i}: mae {:.6}",
                    perf_core::mae(&target, &generated)?
                );

                let images = [input, generated, target, error_map.view()];
                for (j, (area, image)) in row.iter().zip(images).enumerate() {
                    let title = (i == 0).then_some(BATCH_TITLES[j]);
                    self.draw_cell(area, title, image, Colormap::Rainbow)?;
                }
            }
            root.present().map_err(render_err)?;
        }
        Ok(())
    }

    /// Draw one panel below a title strip. Rows without titles keep an
    /// empty strip so every panel has the same size.
    fn draw_cell(
        &self,
        area: &Canvas<'_>,
        title: Option<&str>,
        image: ArrayView2<'_, f32>,
        colormap: Colormap,
    ) -> Result<()> {
        let (header, body) = area.split_vertically(self.config.title_height);
        if let Some(title) = title {
            let (width, height) = header.dim_in_pixel();
            let style = TextStyle::from((FONT, 16.0).into_font())
                .pos(Pos::new(HPos::Center, VPos::Center));
            header
                .draw_text(title, &style, (width as i32 / 2, height as i32 / 2))
                .map_err(render_err)?;
        }
        draw_image(&body, image, colormap)
    }

    fn render_losses(&self, path: &Path, losses: &LossHistory) -> Result<()> {
        {
            let root = BitMapBackend::new(path, self.config.loss_plot_size).into_drawing_area();
            root.fill(&WHITE).map_err(render_err)?;
            let areas = root.split_evenly((3, 1));

            for (area, (caption, values)) in areas.iter().zip(losses.series()) {
                let mut chart = ChartBuilder::on(area)
                    .margin(10)
                    .caption(caption, (FONT, 18.0))
                    .x_label_area_size(30)
                    .y_label_area_size(50)
                    .build_cartesian_2d(epoch_range(values.len()), value_range(values))
                    .map_err(render_err)?;

                chart
                    .configure_mesh()
                    .x_desc("epoch")
                    .y_desc("loss")
                    .draw()
                    .map_err(render_err)?;

                chart
                    .draw_series(LineSeries::new(
                        values
                            .iter()
                            .enumerate()
                            .map(|(i, &v)| ((i + 1) as f64, v)),
                        &BLUE,
                    ))
                    .map_err(render_err)?;
            }
            root.present().map_err(render_err)?;
        }
        log::info!("wrote loss curves to {}", path.display());
        Ok(())
    }
}

/// Write the figures for `epoch` with `config`.
///
/// See [`FigureWriter::save_figs`].
pub fn save_figs(
    epoch: usize,
    images: &ImageTriplet<'_>,
    losses: &LossHistory,
    prefix: impl AsRef<Path>,
    config: &FigureConfig,
) -> Result<FigurePaths> {
    FigureWriter::new(*config)?.save_figs(epoch, images, losses, prefix)
}

/// Register the bundled font with plotters once per process.
///
/// Text drawn under an unregistered family fails at render time, so every
/// [`FigureWriter`] goes through here first.
fn register_fonts() -> Result<()> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let ok = *REGISTERED.get_or_init(|| {
        let ok = plotters::style::register_font(FONT, FontStyle::Normal, FONT_DATA).is_ok();
        if ok {
            log::debug!("registered bundled font as {FONT:?}");
        }
        ok
    });
    if ok {
        Ok(())
    } else {
        Err(PerfIoError::Render(format!(
            "bundled font could not be registered as {FONT:?}"
        )))
    }
}

/// `prefix` with `suffix` appended to its final component.
pub(crate) fn prefixed(prefix: &Path, suffix: &str) -> PathBuf {
    let mut path = OsString::from(prefix.as_os_str());
    path.push(suffix);
    PathBuf::from(path)
}

fn ensure_parent(prefix: &Path) -> Result<()> {
    match prefix.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(std::fs::create_dir_all(parent)?),
        _ => Ok(()),
    }
}

/// Pixel-wise `|target - generated|`.
fn error_map(target: ArrayView2<'_, f32>, generated: ArrayView2<'_, f32>) -> Array2<f32> {
    (&target - &generated).mapv(f32::abs)
}

/// Fill `area` with `image`, scaled by nearest neighbour and centred.
/// Values are normalised to the image's own finite range.
fn draw_image(area: &Canvas<'_>, image: ArrayView2<'_, f32>, colormap: Colormap) -> Result<()> {
    let (rows, cols) = image.dim();
    let (width, height) = area.dim_in_pixel();
    if rows == 0 || cols == 0 || width == 0 || height == 0 {
        return Ok(());
    }

    let scale = (width as f64 / cols as f64).min(height as f64 / rows as f64);
    let draw_w = ((cols as f64 * scale) as u32).max(1);
    let draw_h = ((rows as f64 * scale) as u32).max(1);
    let off_x = (width.saturating_sub(draw_w) / 2) as i32;
    let off_y = (height.saturating_sub(draw_h) / 2) as i32;

    let (lo, hi) = finite_range(image.iter().map(|&v| f64::from(v))).unwrap_or((0.0, 0.0));
    let span = hi - lo;

    for py in 0..draw_h {
        let r = ((py as f64 / scale) as usize).min(rows - 1);
        for px in 0..draw_w {
            let c = ((px as f64 / scale) as usize).min(cols - 1);
            let v = f64::from(image[[r, c]]);
            let t = if span > 0.0 { (v - lo) / span } else { 0.0 };
            area.draw_pixel((off_x + px as i32, off_y + py as i32), &colormap.color(t))
                .map_err(render_err)?;
        }
    }
    Ok(())
}

fn finite_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.filter(|v| v.is_finite()).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// x axis spanning the 1-based epochs.
fn epoch_range(len: usize) -> Range<f64> {
    if len <= 1 {
        0.0..2.0
    } else {
        1.0..len as f64
    }
}

/// y axis covering the finite losses, padded so flat curves stay visible.
fn value_range(values: &[f64]) -> Range<f64> {
    match finite_range(values.iter().copied()) {
        None => 0.0..1.0,
        Some((lo, hi)) if hi - lo <= f64::EPSILON * hi.abs().max(1.0) => {
            let pad = (lo.abs() * 0.1).max(0.5);
            (lo - pad)..(hi + pad)
        }
        Some((lo, hi)) => {
            let pad = (hi - lo) * 0.05;
            (lo - pad)..(hi + pad)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array4};

    #[test]
    fn test_prefixed_appends_to_file_name() {
        assert_eq!(
            prefixed(Path::new("out/trial3_"), "12.png"),
            PathBuf::from("out/trial3_12.png")
        );
        assert_eq!(prefixed(Path::new("out/"), "losses.png"), PathBuf::from("out/losses.png"));
    }

    #[test]
    fn test_error_map_is_absolute_difference() {
        let target = array![[1.0f32, 2.0], [3.0, 4.0]];
        let generated = array![[2.0f32, 2.0], [1.0, 5.5]];
        let map = error_map(target.view(), generated.view());
        assert_eq!(map, array![[1.0, 0.0], [2.0, 1.5]]);
    }

    #[test]
    fn test_value_range_pads_flat_series() {
        let range = value_range(&[0.3, 0.3, 0.3]);
        assert!(range.start < 0.3 && range.end > 0.3);
        let range = value_range(&[]);
        assert_eq!(range, 0.0..1.0);
        let range = value_range(&[f64::NAN, 1.0, 3.0]);
        assert!(range.start < 1.0 && range.end > 3.0);
    }

    #[test]
    fn test_epoch_range() {
        assert_eq!(epoch_range(0), 0.0..2.0);
        assert_eq!(epoch_range(1), 0.0..2.0);
        assert_eq!(epoch_range(10), 1.0..10.0);
    }

    #[test]
    fn test_triplet_shape_mismatch() {
        let a = Array4::<f32>::zeros((2, 1, 8, 8));
        let b = Array4::<f32>::zeros((2, 1, 8, 4));
        let triplet = ImageTriplet::batch(a.view(), a.view(), b.view());
        assert!(matches!(
            triplet.validate(),
            Err(PerfIoError::ShapeMismatch {
                what: "generated",
                ..
            })
        ));
    }

    #[test]
    fn test_triplet_rejects_empty_images() {
        let a = Array2::<f32>::zeros((0, 8));
        let triplet = ImageTriplet::single(a.view(), a.view(), a.view());
        assert!(matches!(triplet.validate(), Err(PerfIoError::InvalidInput(_))));
    }

    #[test]
    fn test_bundled_font_registers() {
        register_fonts().unwrap();
        // second call hits the cached registration
        register_fonts().unwrap();
    }

    #[test]
    fn test_writer_rejects_invalid_config() {
        assert!(FigureWriter::new(FigureConfig::new(0)).is_err());
    }
}
