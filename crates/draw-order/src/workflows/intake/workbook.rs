use super::normalizer::unique_headers;
use super::table::{CellValue, RawTable};
use super::TableIntakeError;
use calamine::{open_workbook_auto, Data, DataType, Reader};
use std::path::Path;

/// Sheet to read from a workbook: 1-based position or sheet name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelection {
    Position(usize),
    Name(String),
}

impl Default for SheetSelection {
    fn default() -> Self {
        Self::Position(1)
    }
}

impl SheetSelection {
    /// Digits select by position, anything else by name.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<usize>() {
            Ok(position) => Self::Position(position),
            Err(_) => Self::Name(trimmed.to_string()),
        }
    }
}

/// Reads one sheet; its first row holds the column names.
pub(crate) fn read_sheet(
    path: &Path,
    selection: &SheetSelection,
) -> Result<(String, RawTable), TableIntakeError> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet = pick_sheet(workbook.sheet_names(), selection)?;
    let range = workbook.worksheet_range(&sheet)?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok((sheet, RawTable::default()));
    };

    let columns = unique_headers(header.iter().map(header_text));
    let data = rows
        .map(|row| row.iter().map(cell_value).collect::<Vec<_>>())
        .filter(|row| !row.iter().all(CellValue::is_blank))
        .collect();

    Ok((sheet, RawTable::new(columns, data)))
}

fn pick_sheet(names: Vec<String>, selection: &SheetSelection) -> Result<String, TableIntakeError> {
    if names.is_empty() {
        return Err(TableIntakeError::NoTablesDetected);
    }

    match selection {
        SheetSelection::Position(position) => {
            let available = names.len();
            if *position == 0 || *position > available {
                return Err(TableIntakeError::TableSelection {
                    requested: *position,
                    available,
                });
            }
            Ok(names[*position - 1].clone())
        }
        SheetSelection::Name(wanted) => {
            if let Some(exact) = names.iter().find(|name| *name == wanted) {
                return Ok(exact.clone());
            }
            match names.iter().find(|name| name.eq_ignore_ascii_case(wanted)) {
                Some(name) => Ok(name.clone()),
                None => Err(TableIntakeError::UnknownSheet {
                    requested: wanted.clone(),
                    available: names,
                }),
            }
        }
    }
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(text) => CellValue::from_text(text),
        Data::Float(value) => CellValue::Number(*value),
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_datetime() {
            Some(datetime) => CellValue::Date(datetime),
            None => CellValue::from_text(&cell.to_string()),
        },
        other => CellValue::from_text(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["Notes".to_string(), "Lines".to_string()]
    }

    #[test]
    fn sheet_selection_parses_positions_and_names() {
        assert_eq!(SheetSelection::parse(" 2 "), SheetSelection::Position(2));
        assert_eq!(
            SheetSelection::parse("Lines"),
            SheetSelection::Name("Lines".to_string())
        );
        assert_eq!(SheetSelection::default(), SheetSelection::Position(1));
    }

    #[test]
    fn picks_sheet_by_position_or_name() {
        assert_eq!(
            pick_sheet(names(), &SheetSelection::Position(2)).expect("second sheet"),
            "Lines"
        );
        assert_eq!(
            pick_sheet(names(), &SheetSelection::Name("lines".to_string())).expect("by name"),
            "Lines"
        );

        let error = pick_sheet(names(), &SheetSelection::Position(3)).expect_err("out of range");
        assert!(matches!(
            error,
            TableIntakeError::TableSelection {
                requested: 3,
                available: 2
            }
        ));

        let error = pick_sheet(names(), &SheetSelection::Name("Summary".to_string()))
            .expect_err("unknown sheet");
        assert!(error.to_string().contains("Notes, Lines"));
    }

    #[test]
    fn spreadsheet_cells_keep_their_types() {
        assert_eq!(cell_value(&Data::Float(8.25)), CellValue::Number(8.25));
        assert_eq!(cell_value(&Data::Int(90)), CellValue::Number(90.0));
        assert_eq!(
            cell_value(&Data::String("  ST ".to_string())),
            CellValue::Text("ST".to_string())
        );
        assert_eq!(cell_value(&Data::Empty), CellValue::Empty);
        assert_eq!(
            cell_value(&Data::Bool(true)),
            CellValue::Text("true".to_string())
        );
    }
}
