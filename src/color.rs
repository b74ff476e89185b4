use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};
use plotters::style::RGBColor;

use crate::data::model::Category;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues, as
/// 8-bit RGB triples.
pub fn generate_palette(n: usize) -> Vec<(u8, u8, u8)> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            // Start at blue so the first series reads as a control colour.
            let hue = 210.0 + (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.65, 0.50);
            let rgb: Srgb = hsl.into_color();
            (
                (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
                (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
                (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Category → colour
// ---------------------------------------------------------------------------

/// Fixed colour per category, shared by the PNG renderer and the viewer so
/// both show the same legend.
pub fn category_rgb(category: Category) -> (u8, u8, u8) {
    let palette = generate_palette(Category::ALL.len());
    let idx = Category::ALL
        .iter()
        .position(|c| *c == category)
        .unwrap_or(0);
    palette[idx]
}

pub fn category_plotters(category: Category) -> RGBColor {
    let (r, g, b) = category_rgb(category);
    RGBColor(r, g, b)
}

pub fn category_egui(category: Category) -> Color32 {
    let (r, g, b) = category_rgb(category);
    Color32::from_rgb(r, g, b)
}
