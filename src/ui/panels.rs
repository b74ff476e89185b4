use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::color::category_egui;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – sheet list
// ---------------------------------------------------------------------------

/// Render the left panel: one selectable entry (with thumbnail) per sheet.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Sheets");
    ui.separator();

    if state.charts.is_empty() {
        ui.label("No charts were produced.");
        return;
    }

    let mut clicked = None;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (idx, chart) in state.charts.iter().enumerate() {
                let is_selected = idx == state.selected;
                if ui
                    .selectable_label(is_selected, RichText::new(&chart.sheet).strong())
                    .clicked()
                {
                    clicked = Some(idx);
                }

                if state.show_thumbnails {
                    let thumb = egui::Image::new(AppState::image_uri(chart))
                        .max_width(ui.available_width() * 0.9)
                        .max_height(120.0)
                        .corner_radius(4.0)
                        .sense(egui::Sense::click());
                    if ui.add(thumb).clicked() {
                        clicked = Some(idx);
                    }
                }
                ui.add_space(6.0);
            }

            // ---- Legend (same for every chart) ----
            if let Some(chart) = state.current() {
                ui.separator();
                ui.strong("Legend");
                for series in &chart.spec.series {
                    ui.label(RichText::new(format!("■ {}", series.label)).color(category_egui(series.category)));
                }
                if let Some(notes) = &chart.spec.notes {
                    ui.add_space(4.0);
                    ui.small(notes);
                }
            }
        });

    if let Some(idx) = clicked {
        state.select(idx);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        if let Some(chart) = state.current() {
            ui.label(format!(
                "{} ({}/{})",
                chart.path.display(),
                state.selected + 1,
                state.charts.len()
            ));
        }

        ui.separator();

        if ui.selectable_label(state.show_markers, "Threshold markers").clicked() {
            state.show_markers = !state.show_markers;
        }
        if ui.selectable_label(state.show_std_labels, "Std dev labels").clicked() {
            state.show_std_labels = !state.show_std_labels;
        }
        if ui.selectable_label(state.show_thumbnails, "Thumbnails").clicked() {
            state.show_thumbnails = !state.show_thumbnails;
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}
