use std::path::PathBuf;

use crate::pipeline::RenderedChart;

// ---------------------------------------------------------------------------
// Viewer state
// ---------------------------------------------------------------------------

/// Everything the chart viewer shows, independent of rendering.
pub struct AppState {
    /// Charts written during the run, in sheet order.
    pub charts: Vec<RenderedChart>,

    /// Index into `charts` of the chart in the central panel.
    pub selected: usize,

    /// View-only toggles; the chart specs themselves are never changed.
    pub show_markers: bool,
    pub show_std_labels: bool,

    /// Show PNG thumbnails in the side panel.
    pub show_thumbnails: bool,

    /// Sheets that were skipped, shown in the top bar.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            charts: Vec::new(),
            selected: 0,
            show_markers: true,
            show_std_labels: true,
            show_thumbnails: true,
            status_message: None,
        }
    }
}

impl AppState {
    pub fn new(charts: Vec<RenderedChart>, skipped: Vec<String>) -> Self {
        let status_message = (!skipped.is_empty())
            .then(|| format!("Skipped: {}", skipped.join(", ")));
        Self {
            charts,
            status_message,
            ..Self::default()
        }
    }

    pub fn current(&self) -> Option<&RenderedChart> {
        self.charts.get(self.selected)
    }

    pub fn select(&mut self, index: usize) {
        if index < self.charts.len() {
            self.selected = index;
        }
    }

    pub fn select_next(&mut self) {
        if !self.charts.is_empty() {
            self.selected = (self.selected + 1) % self.charts.len();
        }
    }

    pub fn select_previous(&mut self) {
        if !self.charts.is_empty() {
            self.selected = (self.selected + self.charts.len() - 1) % self.charts.len();
        }
    }

    /// `file://` URI of a chart's PNG for the egui image loaders.
    pub fn image_uri(chart: &RenderedChart) -> String {
        let path: PathBuf = std::fs::canonicalize(&chart.path).unwrap_or_else(|_| chart.path.clone());
        format!("file://{}", path.display())
    }
}
