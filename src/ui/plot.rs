use eframe::egui::{Align2, Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, Corner, Legend, Line, Plot, PlotPoint, PlotPoints, Text};

use crate::chart::spec::ChartSpec;
use crate::color::category_egui;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Chart plot (central panel)
// ---------------------------------------------------------------------------

/// Render the selected chart.  The y axis is drawn in log10 space, so a
/// value of `3.0` on screen is labelled `1e3`.
pub fn chart_plot(ui: &mut Ui, state: &AppState) {
    let chart = match state.current() {
        Some(c) => c,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("No charts to show");
            });
            return;
        }
    };
    let spec = &chart.spec;

    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading(&spec.title);
    });

    let (y_lo, y_hi) = (spec.y_axis.range.0.log10(), spec.y_axis.range.1.log10());
    let (x_lo, x_hi) = spec.x_axis.range;
    let x_ticks = spec.x_axis.ticks.clone();

    Plot::new(("chart_plot", chart.sheet.as_str()))
        .legend(Legend::default().position(Corner::RightTop))
        .x_axis_label(spec.x_axis.label.as_str())
        .y_axis_label(spec.y_axis.label.as_str())
        .x_axis_formatter(move |mark, _range| {
            x_ticks
                .iter()
                .find(|(t, _)| (t - mark.value).abs() < 1e-9)
                .map(|(_, label)| label.clone())
                .unwrap_or_default()
        })
        .y_axis_formatter(|mark, _range| {
            let rounded = mark.value.round();
            if (mark.value - rounded).abs() < 1e-9 {
                format!("1e{}", rounded as i32)
            } else {
                String::new()
            }
        })
        .include_x(x_lo)
        .include_x(x_hi)
        .include_y(y_lo)
        .include_y(y_hi)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for chart in bar_charts(spec, y_lo) {
                plot_ui.bar_chart(chart);
            }
            for line in whiskers(spec, y_lo) {
                plot_ui.line(line);
            }
            for (_, bar) in spec.bars() {
                let top = bar.height.log10();
                if state.show_markers && bar.annotation.marker {
                    plot_ui.text(
                        Text::new(
                            PlotPoint::new(bar.x, top),
                            RichText::new("*").color(Color32::RED).size(22.0),
                        )
                        .anchor(Align2::CENTER_BOTTOM),
                    );
                }
                if state.show_std_labels {
                    if let Some(label) = &bar.annotation.std_label {
                        plot_ui.text(
                            Text::new(
                                PlotPoint::new(bar.x, top + 0.35),
                                RichText::new(label).size(10.0),
                            )
                            .anchor(Align2::CENTER_BOTTOM),
                        );
                    }
                }
            }
        });
}

/// One egui bar chart per series, bars rising from the axis floor.
fn bar_charts(spec: &ChartSpec, floor: f64) -> Vec<BarChart> {
    spec.series
        .iter()
        .map(|series| {
            let color = category_egui(series.category);
            let bars: Vec<Bar> = series
                .bars
                .iter()
                .map(|b| {
                    Bar::new(b.x, b.height.log10() - floor)
                        .base_offset(floor)
                        .width(spec.bar_width)
                        .fill(color.gamma_multiply(0.7))
                })
                .collect();
            BarChart::new(bars).name(&series.label).color(color)
        })
        .collect()
}

/// Vertical whisker plus caps for every bar with a non-zero error.
fn whiskers(spec: &ChartSpec, floor: f64) -> Vec<Line<'_>> {
    let cap = spec.bar_width / 4.0;
    let mut lines = Vec::new();
    for (_, bar) in spec.bars().filter(|(_, b)| b.error > 0.0) {
        let hi = (bar.height + bar.error).log10();
        let lo = if bar.height > bar.error {
            (bar.height - bar.error).log10().max(floor)
        } else {
            floor
        };
        for points in [
            vec![[bar.x, lo], [bar.x, hi]],
            vec![[bar.x - cap, hi], [bar.x + cap, hi]],
            vec![[bar.x - cap, lo], [bar.x + cap, lo]],
        ] {
            lines.push(Line::new(PlotPoints::from(points)).color(Color32::BLACK).width(1.0));
        }
    }
    lines
}
