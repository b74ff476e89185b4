use std::path::PathBuf;

use thiserror::Error;

use crate::data::model::Category;

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Every failure the assay pipeline can report.
///
/// Messages always name the offending file or sheet so they can be shown to
/// the user verbatim.
#[derive(Debug, Error)]
pub enum AssayError {
    #[error("no spreadsheet matching '{prefix}*.xlsx' found in {}", .dir.display())]
    NoInputFile { dir: PathBuf, prefix: String },

    #[error("unsupported input file {}: expected .xlsx, .xls, .ods or .csv", .0.display())]
    UnsupportedInput(PathBuf),

    #[error("{source_name}, sheet '{sheet}': unexpected table layout: {reason}")]
    SourceFormat {
        source_name: String,
        sheet: String,
        reason: String,
    },

    #[error("sheet '{sheet}' has no '{category}' columns")]
    MissingCategory { sheet: String, category: Category },

    #[error(
        "sheet '{sheet}': {category} at day {timepoint} has mean {value}, which a log axis cannot show"
    )]
    NonPositiveValue {
        sheet: String,
        category: Category,
        timepoint: f64,
        value: f64,
    },

    #[error("sheet '{sheet}' has {rows} data rows but {expected} timepoints are configured")]
    TimepointMismatch {
        sheet: String,
        rows: usize,
        expected: usize,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("rendering failed: {0}")]
    Render(String),

    #[error("reading workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("reading CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AssayError {
    /// Errors that invalidate a single sheet's chart but leave the rest of
    /// the workbook usable.
    pub fn is_sheet_local(&self) -> bool {
        matches!(
            self,
            AssayError::MissingCategory { .. } | AssayError::NonPositiveValue { .. }
        )
    }
}

pub type AssayResult<T> = Result<T, AssayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_category_message_names_sheet_and_label() {
        let err = AssayError::MissingCategory {
            sheet: "Trial-A".into(),
            category: Category::PostExposureLiquid,
        };
        let msg = err.to_string();
        assert!(msg.contains("Trial-A"));
        assert!(msg.contains("Post-exposure-Liquid"));
        assert!(err.is_sheet_local());
    }

    #[test]
    fn format_errors_are_not_sheet_local() {
        let err = AssayError::SourceFormat {
            source_name: "barlog.xlsx".into(),
            sheet: "Sheet1".into(),
            reason: "only one header row".into(),
        };
        assert!(!err.is_sheet_local());
        assert!(err.to_string().contains("barlog.xlsx"));
    }
}
