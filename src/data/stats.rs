use std::collections::BTreeMap;

use super::model::{Category, CategoryStats, Column, RawTable, SheetStats};
use crate::error::{AssayError, AssayResult};

// ---------------------------------------------------------------------------
// Grouped statistics
// ---------------------------------------------------------------------------

/// Mean and sample standard deviation per row, across each category's
/// replicate columns.
///
/// Every category of the vocabulary must be present; columns with other outer
/// labels are ignored.  Blank cells are skipped, so a row's statistics use
/// only the replicates that were actually measured.
pub fn compute(table: &RawTable) -> AssayResult<SheetStats> {
    let ignored = table.unrecognized_labels();
    if !ignored.is_empty() {
        log::debug!("sheet '{}': ignoring columns {ignored:?}", table.sheet);
    }

    let mut by_category = BTreeMap::new();
    for category in Category::ALL {
        let columns: Vec<&Column> = table.replicates(category).collect();
        if columns.is_empty() {
            return Err(AssayError::MissingCategory {
                sheet: table.sheet.clone(),
                category,
            });
        }
        let stats = category_stats(&columns, table.rows);
        for (row, _) in stats.replicates.iter().enumerate().filter(|(_, n)| **n == 1) {
            log::debug!(
                "sheet '{}': {category} row {row} has a single replicate, std dev 0",
                table.sheet
            );
        }
        by_category.insert(category, stats);
    }

    Ok(SheetStats {
        sheet: table.sheet.clone(),
        rows: table.rows,
        by_category,
    })
}

fn category_stats(columns: &[&Column], rows: usize) -> CategoryStats {
    let mut means = Vec::with_capacity(rows);
    let mut std_devs = Vec::with_capacity(rows);
    let mut replicates = Vec::with_capacity(rows);

    for row in 0..rows {
        let values: Vec<f64> = columns
            .iter()
            .filter_map(|c| c.values.get(row).copied().flatten())
            .collect();
        means.push(mean(&values));
        std_devs.push(sample_std_dev(&values));
        replicates.push(values.len());
    }

    CategoryStats {
        means,
        std_devs,
        replicates,
    }
}

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1 denominator).
///
/// A single replicate has no spread to estimate and yields `0.0`, so the bar
/// is drawn without a whisker.  An empty slice yields NaN.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    match values.len() {
        0 => f64::NAN,
        1 => 0.0,
        n => {
            let m = mean(values);
            let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        }
    }
}
