use std::error::Error;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontTransform;

use crate::chart::spec::{AxisScale, ChartSpec, LegendPlacement};
use crate::color::category_plotters;
use crate::error::{AssayError, AssayResult};

// ---------------------------------------------------------------------------
// Output naming
// ---------------------------------------------------------------------------

/// PNG file name for a chart title: spaces and characters that are not
/// allowed in file names become underscores.
///
/// `"Disinfectant Residue Assay - Trial-A"` →
/// `"Disinfectant_Residue_Assay_-_Trial-A.png"`
pub fn output_file_name(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{stem}.png")
}

// ---------------------------------------------------------------------------
// PNG renderer
// ---------------------------------------------------------------------------

/// Share of the image width given to the plot; the rest holds the legend.
const PLOT_FRACTION: f64 = 0.74;
const ALPHA: f64 = 0.7;
const CAP_WIDTH: u32 = 8;

/// Output side of the pipeline: turns a finished [`ChartSpec`] into a file.
pub trait ChartRenderer {
    /// Write `spec` to `path`.  Must not depend on anything but `spec`.
    fn persist_to(&self, spec: &ChartSpec, path: &Path) -> AssayResult<()>;
}

/// Bitmap renderer backed by plotters.
pub struct PngRenderer {
    size: (u32, u32),
}

impl PngRenderer {
    pub fn new(size: (u32, u32)) -> Self {
        Self { size }
    }
}

impl ChartRenderer for PngRenderer {
    /// Draw `spec` into a PNG at `path`, replacing any existing file.
    fn persist_to(&self, spec: &ChartSpec, path: &Path) -> AssayResult<()> {
        check_layout(spec)?;
        let root = BitMapBackend::new(path, self.size).into_drawing_area();
        draw_chart(&root, spec).map_err(|e| AssayError::Render(format!("{}: {e}", path.display())))?;
        root.present()
            .map_err(|e| AssayError::Render(format!("{}: {e}", path.display())))?;
        log::info!("wrote {}", path.display());
        Ok(())
    }
}

/// The bitmap layout draws a linear x axis, a log10 y axis and the legend
/// right of the plot.
fn check_layout(spec: &ChartSpec) -> AssayResult<()> {
    if spec.x_axis.scale != AxisScale::Linear || spec.y_axis.scale != AxisScale::Log10 {
        return Err(AssayError::Render(format!(
            "{}: unsupported axis scales {:?}/{:?}",
            spec.title, spec.x_axis.scale, spec.y_axis.scale
        )));
    }
    Ok(())
}

fn draw_chart(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    spec: &ChartSpec,
) -> Result<(), Box<dyn Error>> {
    root.fill(&WHITE)?;
    let (width, _) = root.dim_in_pixel();
    let (plot_area, side_area) = match spec.legend {
        LegendPlacement::OutsideRight => {
            root.split_horizontally((width as f64 * PLOT_FRACTION) as u32)
        }
    };

    let (x0, x1) = spec.x_axis.range;
    let (y0, y1) = spec.y_axis.range;
    let y_keys: Vec<f64> = spec.y_axis.ticks.iter().map(|(v, _)| *v).collect();

    let mut chart = ChartBuilder::on(&plot_area)
        .caption(&spec.title, ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(
            x0..x1,
            (y0..y1).log_scale().with_key_points(y_keys),
        )?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(spec.x_axis.ticks.len() * 2 + 1)
        .x_desc(spec.x_axis.label.as_str())
        .y_desc(spec.y_axis.label.as_str())
        .x_label_formatter(&|v: &f64| tick_label(&spec.x_axis.ticks, *v))
        .y_label_formatter(&|v: &f64| tick_label(&spec.y_axis.ticks, *v))
        .draw()?;

    let half = spec.bar_width / 2.0;

    for series in &spec.series {
        let color = category_plotters(series.category);

        chart.draw_series(series.bars.iter().map(|bar| {
            Rectangle::new(
                [(bar.x - half, y0), (bar.x + half, bar.height)],
                color.mix(ALPHA).filled(),
            )
        }))?;

        // The lower whisker may reach below the axis floor; clamp it there.
        chart.draw_series(series.bars.iter().filter(|b| b.error > 0.0).map(|bar| {
            ErrorBar::new_vertical(
                bar.x,
                (bar.height - bar.error).max(y0),
                bar.height,
                bar.height + bar.error,
                BLACK.stroke_width(1),
                CAP_WIDTH,
            )
        }))?;
    }

    let marker_style = ("sans-serif", 30)
        .into_font()
        .color(&RED)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    let std_style = ("sans-serif", 11)
        .into_font()
        .color(&BLACK)
        .transform(FontTransform::Rotate270)
        .pos(Pos::new(HPos::Left, VPos::Center));

    for (_, bar) in spec.bars() {
        if bar.annotation.marker {
            chart.draw_series(std::iter::once(Text::new(
                "*",
                (bar.x, bar.height * 1.1),
                marker_style.clone(),
            )))?;
        }
        if let Some(label) = &bar.annotation.std_label {
            chart.draw_series(std::iter::once(Text::new(
                label.clone(),
                (bar.x - half / 2.0, bar.height * 1.05),
                std_style.clone(),
            )))?;
        }
    }

    draw_legend(&side_area, spec)?;
    Ok(())
}

/// Legend and footnote in the area right of the plot.
fn draw_legend(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    spec: &ChartSpec,
) -> Result<(), Box<dyn Error>> {
    const ROW: i32 = 24;
    const SWATCH: i32 = 14;

    let (width, height) = area.dim_in_pixel();
    let rows = spec.series.len() as i32;
    let top = height as i32 / 2 - rows * ROW / 2;

    area.draw(&Rectangle::new(
        [(4, top - 8), (width as i32 - 8, top + rows * ROW)],
        BLACK.mix(0.3).stroke_width(1),
    ))?;

    for (i, series) in spec.series.iter().enumerate() {
        let y = top + i as i32 * ROW;
        area.draw(&Rectangle::new(
            [(12, y), (12 + SWATCH * 2, y + SWATCH)],
            category_plotters(series.category).mix(ALPHA).filled(),
        ))?;
        area.draw(&Text::new(
            series.label.clone(),
            (20 + SWATCH * 2, y),
            ("sans-serif", 15).into_font(),
        ))?;
    }

    if let Some(notes) = &spec.notes {
        let chars_per_line = ((width as usize).saturating_sub(16) / 7).max(10);
        let mut y = top + rows * ROW + 20;
        for line in wrap_words(notes, chars_per_line) {
            area.draw(&Text::new(line, (8, y), ("sans-serif", 12).into_font()))?;
            y += 15;
        }
    }
    Ok(())
}

/// Text of the tick at `value`; positions between ticks stay unlabelled.
fn tick_label(ticks: &[(f64, String)], value: f64) -> String {
    ticks
        .iter()
        .find(|(t, _)| (t - value).abs() <= 1e-9 * t.abs().max(1.0))
        .map(|(_, label)| label.clone())
        .unwrap_or_default()
}

fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
