use crate::chart::annotate::{annotate, format_exponential};
use crate::config::AssayConfig;
use crate::data::model::{Category, SheetStats};
use crate::error::{AssayError, AssayResult};

// ---------------------------------------------------------------------------
// ChartSpec – backend-independent grouped bar chart
// ---------------------------------------------------------------------------

/// Extras drawn on top of one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct BarAnnotation {
    /// Threshold marker (asterisk).
    pub marker: bool,
    /// Standard deviation in exponential notation.
    pub std_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarSpec {
    /// Bar centre on the category axis.
    pub x: f64,
    pub height: f64,
    /// Symmetric whisker half-length.
    pub error: f64,
    pub annotation: BarAnnotation,
}

/// One category's bars across all timepoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub category: Category,
    /// Legend text.
    pub label: String,
    /// Shift of this series from each timepoint tick.
    pub offset: f64,
    pub bars: Vec<BarSpec>,
}

impl Series {
    pub fn heights(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.height).collect()
    }

    pub fn errors(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.error).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisScale {
    Linear,
    Log10,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisConfig {
    pub label: String,
    pub scale: AxisScale,
    pub range: (f64, f64),
    /// Tick positions with their printed text.
    pub ticks: Vec<(f64, String)>,
}

/// Where the legend goes relative to the plot area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendPlacement {
    /// Right of the plot area, vertically centred.
    OutsideRight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub series: Vec<Series>,
    pub bar_width: f64,
    pub x_axis: AxisConfig,
    pub y_axis: AxisConfig,
    pub legend: LegendPlacement,
    /// Footnote under the legend.
    pub notes: Option<String>,
}

impl ChartSpec {
    pub fn bars(&self) -> impl Iterator<Item = (&Series, &BarSpec)> {
        self.series
            .iter()
            .flat_map(|s| s.bars.iter().map(move |b| (s, b)))
    }
}

/// Fixed decade ticks of the y axis, 10⁰ through 10⁷.
pub const Y_TICK_DECADES: std::ops::RangeInclusive<i32> = 0..=7;

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Lay out one sheet's statistics as a grouped bar chart.
///
/// Series follow [`Category::ALL`] order.  Within a timepoint slot the bars
/// sit side by side, `config.bar_width` wide, centred on the tick.  Every
/// mean must be positive since the y axis is logarithmic; the first
/// offending value aborts the build.
pub fn build(
    stats: &SheetStats,
    timepoints: &[f64],
    config: &AssayConfig,
    title: impl Into<String>,
) -> AssayResult<ChartSpec> {
    if stats.rows != timepoints.len() {
        return Err(AssayError::TimepointMismatch {
            sheet: stats.sheet.clone(),
            rows: stats.rows,
            expected: timepoints.len(),
        });
    }

    let width = config.bar_width;
    let n_series = Category::ALL.len();
    let mut series = Vec::with_capacity(n_series);
    let mut lowest = f64::INFINITY;
    let mut highest: f64 = 0.0;

    for (k, category) in Category::ALL.into_iter().enumerate() {
        let cat_stats = stats.get(category).ok_or_else(|| AssayError::MissingCategory {
            sheet: stats.sheet.clone(),
            category,
        })?;
        if cat_stats.len() != timepoints.len() || cat_stats.std_devs.len() != timepoints.len() {
            return Err(AssayError::TimepointMismatch {
                sheet: stats.sheet.clone(),
                rows: cat_stats.len(),
                expected: timepoints.len(),
            });
        }

        let offset = (k as f64 - (n_series as f64 - 1.0) / 2.0) * width;
        let mut bars = Vec::with_capacity(timepoints.len());

        for (slot, (&height, &std_dev)) in cat_stats
            .means
            .iter()
            .zip(&cat_stats.std_devs)
            .enumerate()
        {
            // NaN fails this comparison too.
            if !(height > 0.0) {
                return Err(AssayError::NonPositiveValue {
                    sheet: stats.sheet.clone(),
                    category,
                    timepoint: timepoints[slot],
                    value: height,
                });
            }
            let error = if std_dev.is_finite() { std_dev.abs() } else { 0.0 };
            lowest = lowest.min(height);
            highest = highest.max(height + error);

            bars.push(BarSpec {
                x: slot as f64 + offset,
                height,
                error,
                annotation: BarAnnotation {
                    marker: config.show_markers && annotate(height, config.threshold),
                    std_label: config.show_std_dev.then(|| format_exponential(std_dev)),
                },
            });
        }

        series.push(Series {
            category,
            label: config.labels.label(category).to_string(),
            offset,
            bars,
        });
    }

    let x_axis = AxisConfig {
        label: config.x_label.clone(),
        scale: AxisScale::Linear,
        range: (-0.5, timepoints.len() as f64 - 0.5),
        ticks: timepoints
            .iter()
            .enumerate()
            .map(|(i, &t)| (i as f64, format_timepoint(t)))
            .collect(),
    };

    let y_axis = AxisConfig {
        label: config.y_label.clone(),
        scale: AxisScale::Log10,
        range: log_range(lowest, highest),
        ticks: Y_TICK_DECADES
            .map(|d| (10f64.powi(d), format!("1e{d}")))
            .collect(),
    };

    let any_marker = series
        .iter()
        .flat_map(|s| &s.bars)
        .any(|b| b.annotation.marker);
    let notes = (config.show_markers && config.show_notes && any_marker)
        .then(|| config.notes_text());

    Ok(ChartSpec {
        title: title.into(),
        series,
        bar_width: width,
        x_axis,
        y_axis,
        legend: LegendPlacement::OutsideRight,
        notes,
    })
}

/// Whole decades covering the fixed tick set plus every bar and whisker.
fn log_range(lowest: f64, highest: f64) -> (f64, f64) {
    let first = *Y_TICK_DECADES.start();
    let last = *Y_TICK_DECADES.end();
    let lo = if lowest.is_finite() {
        (lowest.log10().floor() as i32).min(first)
    } else {
        first
    };
    let hi = if highest > 0.0 {
        (highest.log10().ceil() as i32).max(last)
    } else {
        last
    };
    (10f64.powi(lo), 10f64.powi(hi))
}

fn format_timepoint(t: f64) -> String {
    if t.fract() == 0.0 {
        format!("{}", t as i64)
    } else {
        t.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::data::model::CategoryStats;

    fn stats_with(means: [[f64; 4]; 4]) -> SheetStats {
        let mut by_category = BTreeMap::new();
        for (category, row) in Category::ALL.into_iter().zip(means) {
            by_category.insert(
                category,
                CategoryStats {
                    means: row.to_vec(),
                    std_devs: row.iter().map(|m| m * 0.1).collect(),
                    replicates: vec![3; 4],
                },
            );
        }
        SheetStats {
            sheet: "Trial-A".into(),
            rows: 4,
            by_category,
        }
    }

    fn typical() -> SheetStats {
        stats_with([
            [1.0e6, 2.0e6, 3.0e6, 4.0e6],
            [1.0e5, 2.0e5, 3.0e5, 4.0e5],
            [1500.0, 2000.0, 2500.0, 1.0e4],
            [10.0, 100.0, 1000.0, 1.0e4],
        ])
    }

    fn days() -> Vec<f64> {
        vec![1.0, 7.0, 14.0, 21.0]
    }

    #[test]
    fn series_follow_fixed_category_order() {
        let spec = build(&typical(), &days(), &AssayConfig::default(), "t").unwrap();
        let order: Vec<Category> = spec.series.iter().map(|s| s.category).collect();
        assert_eq!(order, Category::ALL.to_vec());
        assert_eq!(spec.series[3].label, "Post-exposure-Liquid");
    }

    #[test]
    fn shuffled_table_columns_still_chart_in_fixed_order() {
        use crate::data::model::{Column, RawTable};
        use crate::data::stats::compute;

        let authored = [
            Category::PostExposureLiquid,
            Category::PreExposure,
            Category::Input,
            Category::PostExposure,
        ];
        let columns = authored
            .iter()
            .enumerate()
            .flat_map(|(i, &category)| {
                (1..=2).map(move |rep| Column {
                    outer: category.header().to_string(),
                    inner: rep.to_string(),
                    category: Some(category),
                    values: vec![Some(10f64.powi(i as i32 + 2) * rep as f64); 4],
                })
            })
            .collect();
        let table = RawTable {
            sheet: "Trial-A".into(),
            columns,
            rows: 4,
        };

        let stats = compute(&table).unwrap();
        let spec = build(&stats, &days(), &AssayConfig::default(), "t").unwrap();

        let order: Vec<Category> = spec.series.iter().map(|s| s.category).collect();
        assert_eq!(order, Category::ALL.to_vec());
        // Input was authored third: replicates 1e4 and 2e4.
        assert!((spec.series[0].bars[0].height - 1.5e4).abs() < 1e-9);
        // Post-exposure-Liquid was authored first: 1e2 and 2e2.
        assert!((spec.series[3].bars[0].height - 150.0).abs() < 1e-9);
        assert!(spec.series[0].offset < spec.series[3].offset);
    }

    #[test]
    fn bars_are_centred_on_each_tick() {
        let spec = build(&typical(), &days(), &AssayConfig::default(), "t").unwrap();
        let offsets: Vec<f64> = spec.series.iter().map(|s| s.offset).collect();
        let expected = [-0.3, -0.1, 0.1, 0.3];
        for (o, e) in offsets.iter().zip(expected) {
            assert!((o - e).abs() < 1e-12);
        }
        assert!(offsets.iter().sum::<f64>().abs() < 1e-12);
        assert!((spec.series[0].bars[2].x - 1.7).abs() < 1e-12);
    }

    #[test]
    fn heights_and_errors_come_from_stats() {
        let spec = build(&typical(), &days(), &AssayConfig::default(), "t").unwrap();
        assert_eq!(spec.series[1].heights(), vec![1.0e5, 2.0e5, 3.0e5, 4.0e5]);
        assert!((spec.series[1].errors()[0] - 1.0e4).abs() < 1e-6);
    }

    #[test]
    fn markers_follow_threshold() {
        let spec = build(&typical(), &days(), &AssayConfig::default(), "t").unwrap();
        let marked: Vec<bool> = spec.series[2]
            .bars
            .iter()
            .map(|b| b.annotation.marker)
            .collect();
        assert_eq!(marked, vec![true, true, false, false]);
        assert!(spec.notes.as_deref().unwrap().contains("2,000"));
    }

    #[test]
    fn markers_and_std_labels_toggle_independently() {
        let config = AssayConfig {
            show_markers: false,
            show_std_dev: true,
            ..AssayConfig::default()
        };
        let spec = build(&typical(), &days(), &config, "t").unwrap();
        assert!(spec.bars().all(|(_, b)| !b.annotation.marker));
        assert!(spec.bars().all(|(_, b)| b.annotation.std_label.is_some()));
        assert_eq!(spec.notes, None);
        assert_eq!(
            spec.series[0].bars[0].annotation.std_label.as_deref(),
            Some("1.00e+05")
        );

        let both = AssayConfig {
            show_std_dev: true,
            ..AssayConfig::default()
        };
        let spec = build(&typical(), &days(), &both, "t").unwrap();
        let bar = &spec.series[3].bars[0];
        assert!(bar.annotation.marker);
        assert!(bar.annotation.std_label.is_some());
    }

    #[test]
    fn zero_mean_fails_before_any_chart_exists() {
        let mut stats = typical();
        stats
            .by_category
            .get_mut(&Category::PostExposure)
            .unwrap()
            .means[1] = 0.0;

        match build(&stats, &days(), &AssayConfig::default(), "t") {
            Err(AssayError::NonPositiveValue {
                sheet,
                category,
                timepoint,
                value,
            }) => {
                assert_eq!(sheet, "Trial-A");
                assert_eq!(category, Category::PostExposure);
                assert_eq!(timepoint, 7.0);
                assert_eq!(value, 0.0);
            }
            other => panic!("expected NonPositiveValue, got {other:?}"),
        }
    }

    #[test]
    fn nan_mean_is_rejected() {
        let mut stats = typical();
        stats.by_category.get_mut(&Category::Input).unwrap().means[0] = f64::NAN;
        let err = build(&stats, &days(), &AssayConfig::default(), "t").unwrap_err();
        assert!(matches!(err, AssayError::NonPositiveValue { .. }));
    }

    #[test]
    fn timepoint_count_must_match_rows() {
        let err = build(&typical(), &[1.0, 7.0, 14.0], &AssayConfig::default(), "t").unwrap_err();
        assert!(matches!(
            err,
            AssayError::TimepointMismatch {
                rows: 4,
                expected: 3,
                ..
            }
        ));
    }

    #[test]
    fn axes_use_log_scale_and_timepoint_labels() {
        let spec = build(&typical(), &days(), &AssayConfig::default(), "Assay - S").unwrap();
        assert_eq!(spec.title, "Assay - S");
        assert_eq!(spec.y_axis.scale, AxisScale::Log10);
        assert_eq!(spec.y_axis.ticks.len(), 8);
        assert_eq!(spec.y_axis.ticks[7].0, 1.0e7);
        assert_eq!(spec.y_axis.range, (1.0, 1.0e7));
        let labels: Vec<&str> = spec.x_axis.ticks.iter().map(|(_, l)| l.as_str()).collect();
        assert_eq!(labels, vec!["1", "7", "14", "21"]);
        assert_eq!(spec.legend, LegendPlacement::OutsideRight);
    }

    #[test]
    fn y_range_grows_by_whole_decades() {
        let mut stats = typical();
        stats.by_category.get_mut(&Category::Input).unwrap().means[3] = 5.0e7;
        stats.by_category.get_mut(&Category::PostExposureLiquid).unwrap().means[0] = 0.5;
        let spec = build(&stats, &days(), &AssayConfig::default(), "t").unwrap();
        let (lo, hi) = spec.y_axis.range;
        assert!((lo - 0.1).abs() < 1e-12);
        assert_eq!(hi, 1.0e8);
    }
}
