use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Category – the fixed vocabulary of outer header labels
// ---------------------------------------------------------------------------

/// Experimental condition a group of replicate columns belongs to.
///
/// Declaration order is the series order on every chart, so `Ord` and
/// [`Category::ALL`] agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Input,
    PreExposure,
    PostExposure,
    PostExposureLiquid,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Input,
        Category::PreExposure,
        Category::PostExposure,
        Category::PostExposureLiquid,
    ];

    /// The outer header text as it appears in the workbook.
    pub fn header(self) -> &'static str {
        match self {
            Category::Input => "Input",
            Category::PreExposure => "Pre-exposure",
            Category::PostExposure => "Post-exposure",
            Category::PostExposureLiquid => "Post-exposure-Liquid",
        }
    }

    /// Look up a category by its outer header text. Surrounding whitespace is
    /// ignored, case is not.
    pub fn from_header(text: &str) -> Option<Category> {
        let text = text.trim();
        Category::ALL.into_iter().find(|c| c.header() == text)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

// ---------------------------------------------------------------------------
// Cell – one spreadsheet cell, independent of the source format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Header text of the cell; numbers are printed the way a spreadsheet
    /// shows whole replicate indices (`1`, not `1.0`).
    pub fn as_label(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Number(v) if v.fract() == 0.0 => Some(format!("{}", *v as i64)),
            Cell::Number(v) => Some(v.to_string()),
            Cell::Text(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// RawTable – a sheet with a two-level column header
// ---------------------------------------------------------------------------

/// One replicate column: `(outer, inner)` header pair plus one value per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Outer header text (condition).
    pub outer: String,
    /// Inner header text (replicate id).
    pub inner: String,
    /// Parsed category, `None` for annotation columns outside the vocabulary.
    pub category: Option<Category>,
    /// Cell values; `None` where the cell is blank.
    pub values: Vec<Option<f64>>,
}

/// A sheet's measurements addressed by `(outer, inner)` column pairs and a
/// row index (one row per timepoint).
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub sheet: String,
    pub columns: Vec<Column>,
    pub rows: usize,
}

impl RawTable {
    /// Columns belonging to `category`, in authored order.
    pub fn replicates(&self, category: Category) -> impl Iterator<Item = &Column> {
        self.columns
            .iter()
            .filter(move |c| c.category == Some(category))
    }

    /// Outer labels of columns that are not part of the vocabulary.
    pub fn unrecognized_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self
            .columns
            .iter()
            .filter(|c| c.category.is_none())
            .map(|c| c.outer.as_str())
            .collect();
        labels.dedup();
        labels
    }
}

// ---------------------------------------------------------------------------
// Aggregated statistics
// ---------------------------------------------------------------------------

/// Per-timepoint summary of one category's replicate columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStats {
    pub means: Vec<f64>,
    pub std_devs: Vec<f64>,
    /// Non-blank replicate count behind each row.
    pub replicates: Vec<usize>,
}

impl CategoryStats {
    pub fn len(&self) -> usize {
        self.means.len()
    }
}

/// All four categories' statistics for one sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetStats {
    pub sheet: String,
    pub rows: usize,
    pub by_category: BTreeMap<Category, CategoryStats>,
}

impl SheetStats {
    pub fn get(&self, category: Category) -> Option<&CategoryStats> {
        self.by_category.get(&category)
    }
}
