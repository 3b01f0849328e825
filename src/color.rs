use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// First hue of the palette, so the leading channel (usually `u_rne`) is blue.
const START_HUE: f32 = 210.0;

/// `n` distinct colours with evenly spaced hues starting at [`START_HUE`].
pub fn generate_palette(n: usize) -> Vec<Color32> {
    let step = 360.0 / n.max(1) as f32;
    (0..n)
        .map(|i| {
            let hsl = Hsl::new(START_HUE + i as f32 * step, 0.7, 0.55);
            let rgb: Srgb = hsl.into_color();
            let rgb: Srgb<u8> = rgb.into_format();
            Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Channel → Color32
// ---------------------------------------------------------------------------

/// Fixed colour per channel name, so a channel keeps its colour across the
/// time-series and phase views.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    pub fn new(channels: &[String]) -> Self {
        let palette = generate_palette(channels.len());
        let mapping = channels
            .iter()
            .cloned()
            .zip(palette)
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    pub fn color_for(&self, channel: &str) -> Color32 {
        self.mapping
            .get(channel)
            .copied()
            .unwrap_or(self.default_color)
    }
}
