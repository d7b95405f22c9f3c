use super::normalizer::unique_headers;
use super::table::{CellValue, RawTable};

/// Converts an extracted text grid into a table.
///
/// The first row becomes the header only when at least half of its cells
/// (integer division, minimum one) carry text; otherwise every row is data and
/// columns are named `Col1..ColN`.
pub(crate) fn table_from_grid(grid: Vec<Vec<String>>) -> RawTable {
    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return RawTable::default();
    }

    let mut rows = grid.into_iter();
    let first = rows.next().unwrap_or_default();
    let filled = first.iter().filter(|cell| !cell.trim().is_empty()).count();
    let first_is_header = filled >= (width / 2).max(1);

    let (columns, mut data) = if first_is_header {
        let mut header = first;
        header.resize(width, String::new());
        (unique_headers(&header), Vec::new())
    } else {
        let synthetic = (1..=width).map(|n| format!("Col{n}")).collect();
        (synthetic, vec![to_cells(first)])
    };

    data.extend(rows.map(to_cells));
    data.retain(|row: &Vec<CellValue>| !row.iter().all(CellValue::is_blank));

    RawTable::new(columns, data)
}

fn to_cells(row: Vec<String>) -> Vec<CellValue> {
    row.iter().map(|cell| CellValue::from_text(cell)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn detects_header_row() {
        let table = table_from_grid(grid(&[
            &["Availability", "ROI", "", "Amt"],
            &["05/10/2025", "8.1", "x", "100"],
        ]));

        assert_eq!(table.columns(), ["Availability", "ROI", "Col3", "Amt"]);
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn sparse_first_row_becomes_data() {
        let table = table_from_grid(grid(&[
            &["", "", "", "8.1"],
            &["05/10/2025", "ST", "90", "100"],
        ]));

        assert_eq!(table.columns(), ["Col1", "Col2", "Col3", "Col4"]);
        assert_eq!(table.row_count(), 2);
        let first = table.row(0).expect("row");
        assert_eq!(first.get("Col4"), &CellValue::Text("8.1".to_string()));
    }

    #[test]
    fn pads_ragged_rows() {
        let table = table_from_grid(grid(&[&["ROI", "Amount", "Date"], &["7"]]));
        let row = table.row(0).expect("row");
        assert_eq!(row.get("Date"), &CellValue::Empty);
    }

    #[test]
    fn empty_grid_yields_empty_table() {
        assert!(table_from_grid(Vec::new()).is_empty());
    }
}
