use std::path::Path;

use serde::Serialize;

use crate::data::model::{Category, SheetStats};
use crate::error::AssayResult;

/// One row of the summary CSV.
#[derive(Debug, Serialize)]
struct StatsRecord<'a> {
    sheet: &'a str,
    category: &'a str,
    timepoint: f64,
    mean: f64,
    std_dev: f64,
    replicates: usize,
}

/// Write every sheet's per-category statistics to a single CSV, one row per
/// (sheet, category, timepoint).
pub fn write_stats_csv(path: &Path, sheets: &[SheetStats], timepoints: &[f64]) -> AssayResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for stats in sheets {
        for category in Category::ALL {
            let Some(cat) = stats.get(category) else {
                continue;
            };
            for (i, &timepoint) in timepoints.iter().enumerate().take(cat.len()) {
                writer.serialize(StatsRecord {
                    sheet: &stats.sheet,
                    category: category.header(),
                    timepoint,
                    mean: cat.means[i],
                    std_dev: cat.std_devs[i],
                    replicates: cat.replicates[i],
                })?;
            }
        }
    }
    writer.flush()?;
    log::info!("wrote statistics for {} sheet(s) to {}", sheets.len(), path.display());
    Ok(())
}
