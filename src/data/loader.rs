use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader, Sheets};

use super::model::{Category, Cell, Column, RawTable};
use crate::error::{AssayError, AssayResult};

// ---------------------------------------------------------------------------
// TabularSource – one opened multi-sheet input
// ---------------------------------------------------------------------------

/// A multi-sheet tabular input whose sheets carry a two-row header.
pub trait TabularSource {
    /// Display name used in error messages (usually the file name).
    fn name(&self) -> &str;

    /// Sheet names in workbook order.
    fn list_sheets(&self) -> Vec<String>;

    /// Read one sheet, preserving its `(outer, inner)` column structure.
    fn load_sheet(&mut self, sheet: &str) -> AssayResult<RawTable>;
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Find the input workbook in `dir`: the lexicographically first file named
/// `<prefix>*.xlsx`.
pub fn discover_input(dir: &Path, prefix: &str) -> AssayResult<PathBuf> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with(prefix) && name.to_ascii_lowercase().ends_with(".xlsx")
        })
        .map(|entry| entry.path())
        .collect();
    candidates.sort();

    let Some(first) = candidates.first().cloned() else {
        return Err(AssayError::NoInputFile {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
        });
    };
    if candidates.len() > 1 {
        log::warn!(
            "{} files match '{prefix}*.xlsx', using {}; ignored: {:?}",
            candidates.len(),
            first.display(),
            &candidates[1..]
        );
    }
    Ok(first)
}

/// Open a tabular source.  Dispatch by extension.
///
/// * `.xlsx` / `.xlsm` / `.xls` / `.ods` – one chart per worksheet
/// * `.csv` – a single sheet named after the file stem
pub fn open_source(path: &Path) -> AssayResult<Box<dyn TabularSource>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => Ok(Box::new(XlsxSource::open(path)?)),
        "csv" => Ok(Box::new(CsvSource::open(path)?)),
        _ => Err(AssayError::UnsupportedInput(path.to_path_buf())),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// Workbook source
// ---------------------------------------------------------------------------

pub struct XlsxSource {
    name: String,
    workbook: Sheets<BufReader<File>>,
}

impl XlsxSource {
    pub fn open(path: &Path) -> AssayResult<Self> {
        let workbook = open_workbook_auto(path)?;
        Ok(Self {
            name: display_name(path),
            workbook,
        })
    }
}

impl TabularSource for XlsxSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_sheets(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    fn load_sheet(&mut self, sheet: &str) -> AssayResult<RawTable> {
        let range = self.workbook.worksheet_range(sheet)?;
        let grid: Vec<Vec<Cell>> = range
            .rows()
            .map(|row| row.iter().map(cell_from_data).collect())
            .collect();
        parse_two_level_table(&self.name, sheet, grid)
    }
}

fn cell_from_data(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Text(b.to_string()),
        other => Cell::Text(format!("{other:?}")),
    }
}

// ---------------------------------------------------------------------------
// CSV source
// ---------------------------------------------------------------------------

/// CSV layout: the same two header rows as a worksheet, e.g.
///
/// ```text
/// Input,,Pre-exposure,,Post-exposure,,Post-exposure-Liquid,
/// 1,2,1,2,1,2,1,2
/// 10000,12000,...
/// ```
pub struct CsvSource {
    name: String,
    sheet: String,
    grid: Vec<Vec<Cell>>,
}

impl CsvSource {
    pub fn open(path: &Path) -> AssayResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        let mut grid: Vec<Vec<Cell>> = Vec::new();
        for record in reader.records() {
            let record = record?;
            grid.push(record.iter().map(cell_from_text).collect());
        }

        let sheet = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Sheet1".to_string());

        Ok(Self {
            name: display_name(path),
            sheet,
            grid,
        })
    }
}

impl TabularSource for CsvSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_sheets(&self) -> Vec<String> {
        vec![self.sheet.clone()]
    }

    fn load_sheet(&mut self, sheet: &str) -> AssayResult<RawTable> {
        if sheet != self.sheet {
            return Err(AssayError::SourceFormat {
                source_name: self.name.clone(),
                sheet: sheet.to_string(),
                reason: format!("a CSV file only has the sheet '{}'", self.sheet),
            });
        }
        parse_two_level_table(&self.name, sheet, self.grid.clone())
    }
}

fn cell_from_text(s: &str) -> Cell {
    let s = s.trim();
    if s.is_empty() {
        return Cell::Empty;
    }
    match s.parse::<f64>() {
        Ok(v) => Cell::Number(v),
        Err(_) => Cell::Text(s.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Two-level header parsing
// ---------------------------------------------------------------------------

static EMPTY: Cell = Cell::Empty;

/// Turn a raw cell grid into a [`RawTable`].
///
/// Row 0 holds the outer labels, row 1 the inner labels, everything below is
/// data.  A blank outer cell inherits the label to its left (merged header
/// cells come through as blanks).  Columns whose outer label is outside the
/// category vocabulary are kept but never parsed strictly.
pub fn parse_two_level_table(
    source_name: &str,
    sheet: &str,
    mut grid: Vec<Vec<Cell>>,
) -> AssayResult<RawTable> {
    let format_err = |reason: String| AssayError::SourceFormat {
        source_name: source_name.to_string(),
        sheet: sheet.to_string(),
        reason,
    };

    while grid
        .last()
        .is_some_and(|row| row.iter().all(Cell::is_empty))
    {
        grid.pop();
    }
    if grid.len() < 2 {
        return Err(format_err(format!(
            "expected two header rows, found {} row(s)",
            grid.len()
        )));
    }

    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    let cell = |row: usize, col: usize| grid[row].get(col).unwrap_or(&EMPTY);

    if (0..width).all(|c| cell(0, c).is_empty()) {
        return Err(format_err("first header row is empty".into()));
    }
    if (0..width).all(|c| cell(1, c).is_empty()) {
        return Err(format_err("second header row is empty".into()));
    }

    let rows = grid.len() - 2;
    let mut columns = Vec::with_capacity(width);
    let mut current_outer: Option<String> = None;

    for col in 0..width {
        if let Some(label) = cell(0, col).as_label() {
            current_outer = Some(label);
        }
        let outer = current_outer.clone().unwrap_or_default();
        let inner = cell(1, col).as_label();
        let category = Category::from_header(&outer);

        let blank_column = inner.is_none() && (2..grid.len()).all(|r| cell(r, col).is_empty());
        if blank_column {
            continue;
        }

        let Some(category) = category else {
            let values = (2..grid.len())
                .map(|r| match cell(r, col) {
                    Cell::Number(v) => Some(*v),
                    _ => None,
                })
                .collect();
            columns.push(Column {
                outer,
                inner: inner.unwrap_or_default(),
                category: None,
                values,
            });
            continue;
        };

        let inner = inner.ok_or_else(|| {
            format_err(format!(
                "column {} under '{category}' has no replicate label",
                col + 1
            ))
        })?;

        let mut values = Vec::with_capacity(rows);
        for r in 2..grid.len() {
            let value = match cell(r, col) {
                Cell::Number(v) => Some(*v),
                Cell::Empty => None,
                Cell::Text(s) if s.trim().is_empty() => None,
                Cell::Text(s) => Some(s.trim().parse::<f64>().map_err(|_| {
                    format_err(format!(
                        "row {}, column '{category}/{inner}': '{s}' is not a number",
                        r + 1
                    ))
                })?),
            };
            values.push(value);
        }

        columns.push(Column {
            outer,
            inner,
            category: Some(category),
            values,
        });
    }

    log::debug!(
        "{source_name} / {sheet}: {} columns, {rows} data rows",
        columns.len()
    );

    Ok(RawTable {
        sheet: sheet.to_string(),
        columns,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn num(v: f64) -> Cell {
        Cell::Number(v)
    }

    #[test]
    fn merged_outer_labels_are_forward_filled() {
        let grid = vec![
            vec![text("Input"), Cell::Empty, text("Pre-exposure"), Cell::Empty],
            vec![num(1.0), num(2.0), num(1.0), num(2.0)],
            vec![num(10.0), num(12.0), num(20.0), num(22.0)],
        ];
        let table = parse_two_level_table("t.xlsx", "S", grid).unwrap();

        assert_eq!(table.rows, 1);
        assert_eq!(table.replicates(Category::Input).count(), 2);
        let pre: Vec<&Column> = table.replicates(Category::PreExposure).collect();
        assert_eq!(pre[1].inner, "2");
        assert_eq!(pre[1].values, vec![Some(22.0)]);
    }

    #[test]
    fn annotation_columns_are_kept_but_unrecognized() {
        let grid = vec![
            vec![text("Day"), text("Input"), text("Notes")],
            vec![text("d"), num(1.0), text("n")],
            vec![num(1.0), num(5.0), text("plate cracked")],
        ];
        let table = parse_two_level_table("t.xlsx", "S", grid).unwrap();
        assert_eq!(table.unrecognized_labels(), vec!["Day", "Notes"]);
        assert_eq!(table.columns[2].values, vec![None]);
    }

    #[test]
    fn single_header_row_is_a_format_error() {
        let grid = vec![vec![text("Input"), text("Input")]];
        let err = parse_two_level_table("barlog.xlsx", "Trial-A", grid).unwrap_err();
        assert!(matches!(err, AssayError::SourceFormat { .. }));
        assert!(err.to_string().contains("Trial-A"));
    }

    #[test]
    fn text_in_measurement_cell_is_a_format_error() {
        let grid = vec![
            vec![text("Input"), Cell::Empty],
            vec![num(1.0), num(2.0)],
            vec![num(10.0), text("lots")],
        ];
        let err = parse_two_level_table("barlog.xlsx", "S", grid).unwrap_err();
        assert!(err.to_string().contains("'lots' is not a number"));
    }

    #[test]
    fn trailing_blank_rows_are_dropped() {
        let grid = vec![
            vec![text("Input")],
            vec![num(1.0)],
            vec![num(3.0)],
            vec![Cell::Empty],
            vec![],
        ];
        let table = parse_two_level_table("t.csv", "S", grid).unwrap();
        assert_eq!(table.rows, 1);
    }

    #[test]
    fn discovery_picks_lexicographically_first_match() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["barlog_z.xlsx", "barlog_a.xlsx", "other.xlsx", "barlog_b.csv"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let found = discover_input(dir.path(), "barlog").unwrap();
        assert_eq!(found.file_name().unwrap(), "barlog_a.xlsx");
    }

    #[test]
    fn discovery_without_match_reports_no_input() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.xlsx"), b"").unwrap();
        let err = discover_input(dir.path(), "barlog").unwrap_err();
        assert!(matches!(err, AssayError::NoInputFile { .. }));
    }

    #[test]
    fn csv_source_exposes_one_sheet_named_after_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("barlog_run.csv");
        std::fs::write(
            &path,
            "Input,,Pre-exposure\n1,2,1\n10000,12000,5000\n",
        )
        .unwrap();

        let mut source = open_source(&path).unwrap();
        assert_eq!(source.list_sheets(), vec!["barlog_run".to_string()]);
        let table = source.load_sheet("barlog_run").unwrap();
        assert_eq!(table.rows, 1);
        assert_eq!(table.replicates(Category::Input).count(), 2);
    }

    #[test]
    fn csv_sheet_flows_through_statistics() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("barlog_run.csv");
        std::fs::write(
            &path,
            "Input,,Pre-exposure,,Post-exposure,,Post-exposure-Liquid,\n\
             1,2,1,2,1,2,1,2\n\
             10000,12000,5000,5000,100,300,40,\n\
             9000,11000,4000,6000,50,150,20,60\n",
        )
        .unwrap();

        let mut source = open_source(&path).unwrap();
        let table = source.load_sheet("barlog_run").unwrap();
        let stats = crate::data::stats::compute(&table).unwrap();

        let input = stats.get(Category::Input).unwrap();
        assert_eq!(input.means, vec![11000.0, 10000.0]);
        assert!((input.std_devs[0] - 2f64.sqrt() * 1000.0).abs() < 1e-6);

        let liquid = stats.get(Category::PostExposureLiquid).unwrap();
        assert_eq!(liquid.replicates, vec![1, 2]);
        assert_eq!(liquid.means[0], 40.0);
        assert_eq!(liquid.std_devs[0], 0.0);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = open_source(Path::new("barlog.txt")).err().unwrap();
        assert!(matches!(err, AssayError::UnsupportedInput(_)));
    }
}
