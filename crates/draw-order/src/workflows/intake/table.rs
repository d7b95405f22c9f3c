use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use tracing::warn;

/// A single scalar cell as delivered by a table source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDateTime),
}

impl CellValue {
    /// Wraps raw text, mapping blank strings to `Empty`.
    pub fn from_text(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Self::Empty
        } else {
            Self::Text(trimmed.to_string())
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(text) => f.write_str(text),
            CellValue::Number(value) => write!(f, "{value}"),
            CellValue::Date(value) => {
                if value.time() == chrono::NaiveTime::MIN {
                    write!(f, "{}", value.date().format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S"))
                }
            }
        }
    }
}

/// Rows of named cells with a fixed column order. Every row has one cell per column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    /// Builds a table, padding short rows with `Empty` and dropping cells past the last column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(index, mut row)| {
                let dropped = row.iter().skip(width).filter(|cell| !cell.is_blank()).count();
                if dropped > 0 {
                    warn!(
                        row = index + 1,
                        dropped,
                        columns = width,
                        "row has more cells than header columns; extra cells dropped"
                    );
                }
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = RawRow<'_>> + '_ {
        self.rows.iter().map(move |cells| RawRow {
            columns: &self.columns,
            cells,
        })
    }

    pub fn row(&self, index: usize) -> Option<RawRow<'_>> {
        self.rows.get(index).map(|cells| RawRow {
            columns: &self.columns,
            cells,
        })
    }
}

static EMPTY_CELL: CellValue = CellValue::Empty;

/// Borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct RawRow<'a> {
    columns: &'a [String],
    cells: &'a [CellValue],
}

impl<'a> RawRow<'a> {
    pub fn get(&self, column: &str) -> &'a CellValue {
        self.columns
            .iter()
            .position(|name| name == column)
            .and_then(|index| self.cells.get(index))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn cells(&self) -> &'a [CellValue] {
        self.cells
    }
}
