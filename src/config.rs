use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chart::annotate::DEFAULT_THRESHOLD;
use crate::data::model::Category;
use crate::error::{AssayError, AssayResult};

/// Legend text per category.  Keys in a config file are `input`,
/// `pre_exposure`, `post_exposure` and `post_exposure_liquid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryLabels {
    pub input: String,
    pub pre_exposure: String,
    pub post_exposure: String,
    pub post_exposure_liquid: String,
}

impl CategoryLabels {
    pub fn label(&self, category: Category) -> &str {
        match category {
            Category::Input => &self.input,
            Category::PreExposure => &self.pre_exposure,
            Category::PostExposure => &self.post_exposure,
            Category::PostExposureLiquid => &self.post_exposure_liquid,
        }
    }
}

impl Default for CategoryLabels {
    fn default() -> Self {
        Self {
            input: Category::Input.header().to_string(),
            pre_exposure: Category::PreExposure.header().to_string(),
            post_exposure: Category::PostExposure.header().to_string(),
            post_exposure_liquid: Category::PostExposureLiquid.header().to_string(),
        }
    }
}

/// Everything one run needs besides the input itself.
///
/// Built once at start-up (defaults, then an optional JSON file, then CLI
/// flags) and passed by reference into the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssayConfig {
    /// Chart titles read `"<assay_name> - <sheet>"`.
    pub assay_name: String,
    pub labels: CategoryLabels,
    /// Bars at or below this mean get a marker.
    pub threshold: f64,
    pub show_std_dev: bool,
    pub show_markers: bool,
    /// Footnote explaining the marker; only drawn when markers are on.
    pub show_notes: bool,
    /// Day of each data row.
    pub timepoints: Vec<f64>,
    pub x_label: String,
    pub y_label: String,
    /// Input discovery looks for `<file_prefix>*.xlsx`.
    pub file_prefix: String,
    /// Width of one bar as a fraction of a timepoint slot.
    pub bar_width: f64,
    /// PNG size in pixels.
    pub image_size: (u32, u32),
    /// Report a sheet with a sheet-local error and move on, instead of
    /// aborting the run.
    pub skip_incomplete_sheets: bool,
}

impl Default for AssayConfig {
    fn default() -> Self {
        Self {
            assay_name: "Disinfectant Residue Assay".to_string(),
            labels: CategoryLabels::default(),
            threshold: DEFAULT_THRESHOLD,
            show_std_dev: false,
            show_markers: true,
            show_notes: true,
            timepoints: vec![1.0, 7.0, 14.0, 21.0],
            x_label: "Number of Day(s)".to_string(),
            y_label: "Mean CFU/ml".to_string(),
            file_prefix: "barlog".to_string(),
            bar_width: 0.2,
            image_size: (1000, 600),
            skip_incomplete_sheets: true,
        }
    }
}

impl AssayConfig {
    /// Read a JSON config file; keys not present keep their defaults.
    pub fn load(path: &Path) -> AssayResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: AssayConfig = serde_json::from_str(&text)
            .map_err(|e| AssayError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AssayResult<()> {
        if self.timepoints.is_empty() {
            return Err(AssayError::Config("timepoints must not be empty".into()));
        }
        if !self.threshold.is_finite() {
            return Err(AssayError::Config(format!(
                "threshold must be a finite number, got {}",
                self.threshold
            )));
        }
        let slots = Category::ALL.len() as f64;
        if !(self.bar_width > 0.0 && self.bar_width * slots <= 1.0) {
            return Err(AssayError::Config(format!(
                "bar_width must be in (0, {}], got {}",
                1.0 / slots,
                self.bar_width
            )));
        }
        if self.image_size.0 == 0 || self.image_size.1 == 0 {
            return Err(AssayError::Config("image_size must be non-zero".into()));
        }
        Ok(())
    }

    /// `"<assay name> - <sheet name>"`.
    pub fn title_for(&self, sheet: &str) -> String {
        format!("{} - {sheet}", self.assay_name)
    }

    /// Footnote text for the marker, e.g. "... less than or equal to 2,000 CFU/ml."
    pub fn notes_text(&self) -> String {
        format!(
            "Notes: Bars marked with an asterisk (*) are less than or equal to {} CFU/ml.",
            thousands(self.threshold)
        )
    }
}

/// Whole-number formatting with comma grouping; fractional thresholds keep
/// their decimals.
fn thousands(value: f64) -> String {
    if value.fract() != 0.0 {
        return value.to_string();
    }
    let digits = format!("{}", value.abs() as u64);
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if value < 0.0 {
        out.insert(0, '-');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_assay_conventions() {
        let config = AssayConfig::default();
        assert_eq!(config.threshold, 2000.0);
        assert_eq!(config.timepoints, vec![1.0, 7.0, 14.0, 21.0]);
        assert!(!config.show_std_dev);
        assert!(config.show_markers);
        assert_eq!(config.labels.label(Category::PreExposure), "Pre-exposure");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_overrides_only_named_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("barlog.json");
        std::fs::write(
            &path,
            r#"{ "threshold": 500, "labels": { "input": "Positive Control" } }"#,
        )
        .unwrap();

        let config = AssayConfig::load(&path).unwrap();
        assert_eq!(config.threshold, 500.0);
        assert_eq!(config.labels.label(Category::Input), "Positive Control");
        assert_eq!(config.labels.label(Category::PostExposure), "Post-exposure");
        assert_eq!(config.assay_name, "Disinfectant Residue Assay");
    }

    #[test]
    fn bundled_demo_config_parses() {
        let config: AssayConfig =
            serde_json::from_str(include_str!("../demos/barlog.config.json")).unwrap();
        assert_eq!(config.labels.label(Category::PostExposure), "Sample (Dry)");
        assert_eq!(config.x_label, "Number of Day(s)");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = AssayConfig::default();
        config.timepoints.clear();
        assert!(matches!(config.validate(), Err(AssayError::Config(_))));

        let mut config = AssayConfig::default();
        config.bar_width = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn notes_use_grouped_threshold() {
        let config = AssayConfig::default();
        assert!(config.notes_text().contains("2,000 CFU/ml"));
        assert_eq!(thousands(1234567.0), "1,234,567");
        assert_eq!(thousands(999.0), "999");
        assert_eq!(thousands(12.5), "12.5");
    }

    #[test]
    fn title_joins_assay_and_sheet() {
        let config = AssayConfig::default();
        assert_eq!(config.title_for("Trial-A"), "Disinfectant Residue Assay - Trial-A");
    }
}
