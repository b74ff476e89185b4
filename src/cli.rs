use std::path::PathBuf;

use clap::Parser;

use crate::config::AssayConfig;
use crate::error::AssayResult;

/// Grouped log-scale bar charts of CFU replicates, one PNG per sheet.
#[derive(Debug, Parser)]
#[command(name = "barlog")]
#[command(version)]
pub struct Cli {
    /// Directory searched for `barlog*.xlsx` when --input is not given
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Explicit input workbook or CSV file (skips discovery)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// JSON config file; keys that are left out keep their defaults
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Where the PNG files are written
    #[arg(short, long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Mark bars whose mean is at or below this value
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Print each bar's standard deviation above it
    #[arg(long)]
    pub show_std_dev: bool,

    /// Do not mark bars at or below the threshold
    #[arg(long)]
    pub no_markers: bool,

    /// Assay name used in chart titles
    #[arg(long)]
    pub assay_name: Option<String>,

    /// Also write the computed statistics to this CSV file
    #[arg(long)]
    pub stats_csv: Option<PathBuf>,

    /// Abort on the first sheet that cannot be charted
    #[arg(long)]
    pub fail_fast: bool,

    /// Open an interactive window with all charts after writing them
    #[arg(long)]
    pub show: bool,
}

impl Cli {
    /// Defaults, then the config file, then command-line flags.
    pub fn resolve_config(&self) -> AssayResult<AssayConfig> {
        let mut config = match &self.config {
            Some(path) => AssayConfig::load(path)?,
            None => AssayConfig::default(),
        };
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(name) = &self.assay_name {
            config.assay_name = name.clone();
        }
        if self.show_std_dev {
            config.show_std_dev = true;
        }
        if self.no_markers {
            config.show_markers = false;
        }
        if self.fail_fast {
            config.skip_incomplete_sheets = false;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "barlog",
            "--threshold",
            "150",
            "--show-std-dev",
            "--no-markers",
            "--assay-name",
            "Residue Check",
            "--fail-fast",
        ])
        .unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.threshold, 150.0);
        assert!(config.show_std_dev);
        assert!(!config.show_markers);
        assert!(!config.skip_incomplete_sheets);
        assert_eq!(config.title_for("S"), "Residue Check - S");
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assay.json");
        std::fs::write(&path, r#"{ "threshold": 10, "assay_name": "From File" }"#).unwrap();

        let cli = Cli::try_parse_from([
            "barlog",
            "--config",
            path.to_str().unwrap(),
            "--threshold",
            "20",
        ])
        .unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.threshold, 20.0);
        assert_eq!(config.assay_name, "From File");
    }

    #[test]
    fn defaults_are_headless() {
        let cli = Cli::try_parse_from(["barlog"]).unwrap();
        assert!(!cli.show);
        assert!(cli.input.is_none());
        assert_eq!(cli.dir, PathBuf::from("."));
    }
}
