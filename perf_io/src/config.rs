//! Figure writer configuration.

use serde::{Deserialize, Serialize};

/// Layout parameters for [`FigureWriter`](crate::figures::FigureWriter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureConfig {
    /// Number of batch samples shown, one row each, in batch mode.
    pub nr_imgs_gen: usize,
    /// Side length of one image panel in pixels.
    pub panel_size: u32,
    /// Height of the title strip above each panel row in pixels.
    pub title_height: u32,
    /// Width and height of the loss-curve figure in pixels.
    pub loss_plot_size: (u32, u32),
}

impl FigureConfig {
    /// Create a configuration showing `nr_imgs_gen` batch samples.
    pub fn new(nr_imgs_gen: usize) -> Self {
        Self {
            nr_imgs_gen,
            ..Self::default()
        }
    }

    /// Set the panel side length.
    pub fn with_panel_size(mut self, panel_size: u32) -> Self {
        self.panel_size = panel_size;
        self
    }

    /// Set the title strip height.
    pub fn with_title_height(mut self, title_height: u32) -> Self {
        self.title_height = title_height;
        self
    }

    /// Set the loss figure size.
    pub fn with_loss_plot_size(mut self, width: u32, height: u32) -> Self {
        self.loss_plot_size = (width, height);
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.nr_imgs_gen == 0 {
            return Err("nr_imgs_gen must be positive".to_string());
        }
        if self.panel_size == 0 {
            return Err("panel_size must be positive".to_string());
        }
        let (width, height) = self.loss_plot_size;
        // three stacked charts need room for captions and axis labels
        if width < 64 || height < 192 {
            return Err(format!(
                "loss_plot_size {width}x{height} is too small (minimum 64x192)"
            ));
        }
        Ok(())
    }
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            nr_imgs_gen: 4,
            panel_size: 128,
            title_height: 24,
            loss_plot_size: (640, 720),
        }
    }
}
