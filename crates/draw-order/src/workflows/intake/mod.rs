//! Adapters that turn uploaded files or extracted grids into a `RawTable`.

mod grid;
mod normalizer;
mod parser;
mod table;
mod workbook;

pub use table::{CellValue, RawRow, RawTable};
pub use workbook::SheetSelection;

use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Failure reported by a table-extraction backend (OCR service, document reader, ...).
#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    #[error("extraction service unavailable: {0}")]
    Unavailable(String),
    #[error("extraction service rejected the document: {0}")]
    Rejected(String),
}

/// Capability for pulling tables out of an image or scanned document.
pub trait TableExtractor: Send + Sync {
    fn extract_tables(&self, image: &[u8]) -> Result<Vec<RawTable>, AcquisitionError>;
}

/// 1-based choice among several extracted tables or sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSelection(pub usize);

impl Default for TableSelection {
    fn default() -> Self {
        Self(1)
    }
}

#[derive(Debug)]
pub enum TableIntakeError {
    Io(std::io::Error),
    Csv(csv::Error),
    Grid(serde_json::Error),
    Workbook(calamine::Error),
    UnknownSheet {
        requested: String,
        available: Vec<String>,
    },
    NoInput,
    NoTablesDetected,
    TableSelection { requested: usize, available: usize },
    Acquisition(AcquisitionError),
}

impl std::fmt::Display for TableIntakeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableIntakeError::Io(err) => write!(f, "failed to read table: {}", err),
            TableIntakeError::Csv(err) => write!(f, "invalid delimited data: {}", err),
            TableIntakeError::Grid(err) => write!(f, "invalid extracted table grid: {}", err),
            TableIntakeError::Workbook(err) => write!(f, "failed to read spreadsheet: {}", err),
            TableIntakeError::UnknownSheet {
                requested,
                available,
            } => write!(
                f,
                "sheet '{}' not found; available sheets: {}",
                requested,
                available.join(", ")
            ),
            TableIntakeError::NoInput => {
                write!(f, "no table supplied; provide delimited text or extracted tables")
            }
            TableIntakeError::NoTablesDetected => write!(
                f,
                "no tables detected; crop to the table area or upload a spreadsheet export instead"
            ),
            TableIntakeError::TableSelection {
                requested,
                available,
            } => write!(
                f,
                "table {} requested but only {} table(s) were found",
                requested, available
            ),
            TableIntakeError::Acquisition(err) => write!(f, "table extraction failed: {}", err),
        }
    }
}

impl std::error::Error for TableIntakeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TableIntakeError::Io(err) => Some(err),
            TableIntakeError::Csv(err) => Some(err),
            TableIntakeError::Grid(err) => Some(err),
            TableIntakeError::Workbook(err) => Some(err),
            TableIntakeError::Acquisition(err) => Some(err),
            TableIntakeError::UnknownSheet { .. }
            | TableIntakeError::NoInput
            | TableIntakeError::NoTablesDetected
            | TableIntakeError::TableSelection { .. } => None,
        }
    }
}

impl From<std::io::Error> for TableIntakeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for TableIntakeError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<serde_json::Error> for TableIntakeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Grid(err)
    }
}

impl From<calamine::Error> for TableIntakeError {
    fn from(err: calamine::Error) -> Self {
        Self::Workbook(err)
    }
}

impl From<AcquisitionError> for TableIntakeError {
    fn from(err: AcquisitionError) -> Self {
        Self::Acquisition(err)
    }
}

/// JSON shape of extracted grids: one grid or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GridDocument {
    Many(Vec<Vec<Vec<String>>>),
    One(Vec<Vec<String>>),
}

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

pub struct TableImporter;

impl TableImporter {
    /// Opens a spreadsheet (first sheet) or a delimited export, by file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<RawTable, TableIntakeError> {
        let path = path.as_ref();
        if Self::is_workbook(path) {
            return Self::from_workbook(path, &SheetSelection::default());
        }
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn is_workbook(path: &Path) -> bool {
        path.extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| {
                WORKBOOK_EXTENSIONS
                    .iter()
                    .any(|known| extension.eq_ignore_ascii_case(known))
            })
    }

    /// Reads one sheet of a spreadsheet; the sheet's first row holds the column names.
    pub fn from_workbook<P: AsRef<Path>>(
        path: P,
        sheet: &SheetSelection,
    ) -> Result<RawTable, TableIntakeError> {
        let (name, table) = workbook::read_sheet(path.as_ref(), sheet)?;
        debug!(
            sheet = %name,
            columns = table.columns().len(),
            rows = table.row_count(),
            "parsed spreadsheet"
        );
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<RawTable, TableIntakeError> {
        let table = parser::parse_table(reader)?;
        debug!(
            columns = table.columns().len(),
            rows = table.row_count(),
            "parsed delimited table"
        );
        Ok(table)
    }

    /// Builds a table from one extracted text grid.
    pub fn from_grid(grid: Vec<Vec<String>>) -> RawTable {
        grid::table_from_grid(grid)
    }

    /// Picks one of several extracted grids.
    pub fn from_grids(
        grids: Vec<Vec<Vec<String>>>,
        selection: TableSelection,
    ) -> Result<RawTable, TableIntakeError> {
        let tables = grids.into_iter().map(grid::table_from_grid).collect();
        select_table(tables, selection)
    }

    /// Reads extracted grids saved as JSON and picks one of them.
    pub fn from_grid_json<R: Read>(
        reader: R,
        selection: TableSelection,
    ) -> Result<RawTable, TableIntakeError> {
        let grids = match serde_json::from_reader(reader)? {
            GridDocument::Many(grids) => grids,
            GridDocument::One(grid) => vec![grid],
        };
        Self::from_grids(grids, selection)
    }

    pub fn from_extractor<E: TableExtractor + ?Sized>(
        extractor: &E,
        image: &[u8],
        selection: TableSelection,
    ) -> Result<RawTable, TableIntakeError> {
        let tables = extractor.extract_tables(image)?;
        debug!(tables = tables.len(), "extraction service returned tables");
        select_table(tables, selection)
    }
}

fn select_table(
    mut tables: Vec<RawTable>,
    selection: TableSelection,
) -> Result<RawTable, TableIntakeError> {
    if tables.is_empty() {
        return Err(TableIntakeError::NoTablesDetected);
    }

    let available = tables.len();
    let TableSelection(requested) = selection;
    if requested == 0 || requested > available {
        return Err(TableIntakeError::TableSelection {
            requested,
            available,
        });
    }

    Ok(tables.swap_remove(requested - 1))
}
