use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::chart::spec::{self, ChartSpec};
use crate::config::AssayConfig;
use crate::data::loader::TabularSource;
use crate::data::model::SheetStats;
use crate::data::stats;
use crate::error::{AssayError, AssayResult};
use crate::render::{output_file_name, ChartRenderer};

// ---------------------------------------------------------------------------
// Run results
// ---------------------------------------------------------------------------

/// A chart that made it to disk.
#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub sheet: String,
    pub spec: ChartSpec,
    pub path: PathBuf,
}

/// A sheet that was reported and skipped.
#[derive(Debug)]
pub struct SheetFailure {
    pub sheet: String,
    pub error: AssayError,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub charts: Vec<RenderedChart>,
    pub stats: Vec<SheetStats>,
    pub failures: Vec<SheetFailure>,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Load, aggregate and lay out one sheet.  Nothing is rendered; a failure at
/// any stage leaves no partial chart behind.
pub fn prepare_sheet(
    source: &mut dyn TabularSource,
    sheet: &str,
    config: &AssayConfig,
) -> AssayResult<(SheetStats, ChartSpec)> {
    let table = source.load_sheet(sheet)?;
    let sheet_stats = stats::compute(&table)?;
    log::debug!("sheet '{sheet}': {:?}", sheet_stats.by_category);
    let chart = spec::build(
        &sheet_stats,
        &config.timepoints,
        config,
        config.title_for(sheet),
    )?;
    Ok((sheet_stats, chart))
}

/// Process every sheet of `source` in order and render one chart per sheet
/// into `out_dir`.
///
/// Sheets share nothing but the configuration.  A sheet-local error
/// (missing category, value a log axis cannot show) is recorded in the
/// report and the run continues when `config.skip_incomplete_sheets` is set;
/// any other error ends the run.
pub fn run(
    source: &mut dyn TabularSource,
    config: &AssayConfig,
    renderer: &dyn ChartRenderer,
    out_dir: &Path,
) -> AssayResult<RunReport> {
    config.validate()?;

    let sheets = source.list_sheets();
    log::info!("{}: {} sheet(s)", source.name(), sheets.len());

    let mut report = RunReport::default();
    let mut used_names = HashSet::new();

    for sheet in sheets {
        let (sheet_stats, chart) = match prepare_sheet(source, &sheet, config) {
            Ok(prepared) => prepared,
            Err(error) if error.is_sheet_local() && config.skip_incomplete_sheets => {
                log::warn!("skipping sheet '{sheet}': {error}");
                report.failures.push(SheetFailure { sheet, error });
                continue;
            }
            Err(error) => return Err(error),
        };

        let path = out_dir.join(unique_name(&mut used_names, output_file_name(&chart.title)));
        renderer.persist_to(&chart, &path)?;
        log::info!("sheet '{sheet}' → {}", path.display());

        report.stats.push(sheet_stats);
        report.charts.push(RenderedChart {
            sheet,
            spec: chart,
            path,
        });
    }

    Ok(report)
}

/// `name`, or `name` with a `_2`, `_3`, … suffix before the extension if an
/// earlier sheet already claimed it.
fn unique_name(used: &mut HashSet<String>, name: String) -> String {
    if used.insert(name.clone()) {
        return name;
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem.to_string(), format!(".{ext}")),
        None => (name.clone(), String::new()),
    };
    let mut n = 2;
    loop {
        let candidate = format!("{stem}_{n}{ext}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
