use eframe::egui;

use crate::pipeline::RenderedChart;
use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct BarlogApp {
    pub state: AppState,
}

impl BarlogApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for BarlogApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Keyboard: page through sheets ----
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowRight)) {
            self.state.select_next();
        }
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowLeft)) {
            self.state.select_previous();
        }

        // ---- Top panel: toggles and status ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: one entry per sheet ----
        egui::SidePanel::left("sheet_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: chart ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::chart_plot(ui, &self.state);
        });
    }
}

/// Open the interactive view over every chart of the run.  Blocks until the
/// window is closed.
pub fn show_charts(charts: Vec<RenderedChart>, skipped: Vec<String>) -> eframe::Result {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Barlog – Chart Viewer",
        options,
        Box::new(move |cc| {
            // Install image loaders so egui can show the written PNGs.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(BarlogApp::new(AppState::new(charts, skipped))))
        }),
    )
}
