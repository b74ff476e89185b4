mod app;
mod chart;
mod cli;
mod color;
mod config;
mod data;
mod error;
mod export;
mod pipeline;
mod render;
mod state;
mod ui;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use cli::Cli;
use data::loader::{discover_input, open_source};
use render::PngRenderer;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when some sheets were skipped.
fn run(cli: Cli) -> Result<bool> {
    let config = cli.resolve_config().context("loading configuration")?;

    let input = match &cli.input {
        Some(path) => path.clone(),
        None => discover_input(&cli.dir, &config.file_prefix)?,
    };
    log::info!("reading {}", input.display());

    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("creating {}", cli.out_dir.display()))?;

    let report = {
        let mut source =
            open_source(&input).with_context(|| format!("opening {}", input.display()))?;
        let renderer = PngRenderer::new(config.image_size);
        pipeline::run(source.as_mut(), &config, &renderer, &cli.out_dir)
            .with_context(|| format!("processing {}", input.display()))?
    };

    for failure in &report.failures {
        log::error!("sheet '{}' skipped: {}", failure.sheet, failure.error);
    }
    log::info!(
        "{} chart(s) written, {} sheet(s) skipped",
        report.charts.len(),
        report.failures.len()
    );

    if let Some(path) = &cli.stats_csv {
        export::write_stats_csv(path, &report.stats, &config.timepoints)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    let clean = report.is_clean();
    if cli.show {
        let skipped = report.failures.iter().map(|f| f.sheet.clone()).collect();
        app::show_charts(report.charts, skipped)
            .map_err(|e| anyhow::anyhow!("chart viewer: {e}"))?;
    }
    Ok(clean)
}
