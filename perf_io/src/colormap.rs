//! Colormaps for rendering scalar images.

use plotters::style::colors::colormaps::ViridisRGB;
use plotters::style::RGBColor;

/// Mapping from a normalised scalar in `[0, 1]` to a colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Colormap {
    /// Dark purple through teal to yellow, perceptually uniform.
    #[default]
    Viridis,
    /// Purple through blue, green and yellow to red.
    Rainbow,
}

impl Colormap {
    /// Colour of `t`, clamped to `[0, 1]`. NaN maps to the low end.
    pub fn color(self, t: f64) -> RGBColor {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Colormap::Viridis => ViridisRGB::get_color(t),
            Colormap::Rainbow => {
                let r = (2.0 * t - 0.5).abs();
                let g = (std::f64::consts::PI * t).sin();
                let b = (std::f64::consts::FRAC_PI_2 * t).cos();
                RGBColor(to_byte(r), to_byte(g), to_byte(b))
            }
        }
    }
}

#[inline]
fn to_byte(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
