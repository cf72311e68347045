use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("cannot read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("workbook has no worksheet")]
    NoWorksheet,

    #[error("worksheet has no header row")]
    NoHeader,
}

/// A raw spreadsheet value, before any trade-schema coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Error(String),
}

impl Cell {
    /// Empty cells and whitespace-only strings carry no value.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text rendering used for headers and text fields.
    pub fn render(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => f.to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Cell::Error(e) => e.clone(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Cell::Empty => Value::Null,
            Cell::Text(s) => Value::String(s.clone()),
            Cell::Int(i) => Value::from(*i),
            Cell::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Cell::Bool(b) => Value::Bool(*b),
            Cell::DateTime(dt) => Value::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            Cell::Error(e) => Value::String(e.clone()),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Int(i) => Cell::Int(*i),
            Data::Float(f) => Cell::Float(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => dt
                .as_datetime()
                .map(Cell::DateTime)
                .unwrap_or(Cell::Float(dt.as_f64())),
            Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .map(Cell::DateTime)
                .unwrap_or_else(|_| Cell::Text(s.clone())),
            Data::Error(e) => Cell::Error(e.to_string()),
            other => Cell::Text(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Sheet
// ---------------------------------------------------------------------------

/// First worksheet of an uploaded workbook: unique headers plus data rows,
/// every row exactly as wide as the header row.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let headers = normalize_headers(headers);
        let width = headers.len();

        let mut rows: Vec<Vec<Cell>> = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();

        while rows.last().is_some_and(|r| r.iter().all(|c| *c == Cell::Empty)) {
            rows.pop();
        }

        Self { headers, rows }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, SheetError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(SheetError::NoWorksheet)??;
        Self::from_range(&range)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SheetError> {
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(SheetError::NoWorksheet)??;
        Self::from_range(&range)
    }

    fn from_range(range: &Range<Data>) -> Result<Self, SheetError> {
        let mut rows = range.rows();
        let headers = rows
            .next()
            .ok_or(SheetError::NoHeader)?
            .iter()
            .map(|d| Cell::from(d).render())
            .collect();
        let data = rows.map(|r| r.iter().map(Cell::from).collect()).collect();

        Ok(Self::new(headers, data))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The first `n` rows as header → value objects.
    pub fn sample_rows(&self, n: usize) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .take(n)
            .map(|row| {
                self.headers
                    .iter()
                    .zip(row)
                    .map(|(h, c)| (h.clone(), c.to_json()))
                    .collect()
            })
            .collect()
    }
}

/// Give blank headers a positional name and suffix repeated ones with
/// `.1`, `.2`, … so every label is unique.
fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());

    for (i, header) in raw.into_iter().enumerate() {
        let base = match header.trim() {
            "" => format!("Unnamed: {i}"),
            trimmed => trimmed.to_string(),
        };

        let mut label = base.clone();
        let mut n = 1;
        while seen.contains(&label) {
            label = format!("{base}.{n}");
            n += 1;
        }

        seen.insert(label.clone());
        out.push(label);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn text(s: &str) -> Cell {
        Cell::Text(s.into())
    }

    #[test]
    fn test_headers_are_made_unique() {
        let sheet = Sheet::new(
            vec!["Pair".into(), "".into(), "Pair".into(), "Pair".into(), " P/L ".into()],
            vec![],
        );
        assert_eq!(
            sheet.headers(),
            &["Pair", "Unnamed: 1", "Pair.1", "Pair.2", "P/L"]
        );
    }

    #[test]
    fn test_rows_are_padded_to_header_width() {
        let sheet = Sheet::new(
            vec!["A".into(), "B".into(), "C".into()],
            vec![vec![text("x")], vec![text("y"), Cell::Int(2), Cell::Bool(true)]],
        );
        assert_eq!(sheet.rows()[0], vec![text("x"), Cell::Empty, Cell::Empty]);
        assert_eq!(sheet.row_count(), 2);
    }

    #[test]
    fn test_trailing_empty_rows_are_dropped_but_interior_kept() {
        let sheet = Sheet::new(
            vec!["A".into()],
            vec![
                vec![text("1")],
                vec![Cell::Empty],
                vec![text("3")],
                vec![Cell::Empty],
                vec![],
            ],
        );
        assert_eq!(sheet.row_count(), 3);
    }

    #[test]
    fn test_sample_rows() {
        let sheet = Sheet::new(
            vec!["Data".into(), "Esito".into()],
            vec![
                vec![text("2024-01-02"), Cell::Float(12.5)],
                vec![text("2024-01-03"), Cell::Empty],
                vec![text("2024-01-04"), Cell::Int(-3)],
                vec![text("2024-01-05"), Cell::Int(7)],
            ],
        );

        let samples = sheet.sample_rows(3);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0]["Data"], "2024-01-02");
        assert_eq!(samples[0]["Esito"], 12.5);
        assert!(samples[1]["Esito"].is_null());
        assert_eq!(samples[2]["Esito"], -3);
    }

    #[test]
    fn test_blank_detection() {
        assert!(Cell::Empty.is_blank());
        assert!(text("   ").is_blank());
        assert!(!text("0").is_blank());
        assert!(!Cell::Int(0).is_blank());
        assert!(!Cell::Bool(false).is_blank());
    }

    #[test]
    fn test_render() {
        assert_eq!(Cell::Float(1.0).render(), "1");
        assert_eq!(Cell::Float(1.25).render(), "1.25");
        assert_eq!(Cell::Bool(true).render(), "true");
        let dt = chrono::NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(Cell::DateTime(dt).render(), "2024-05-06 09:30:00");
    }

    #[test]
    fn test_calamine_values_convert() {
        assert_eq!(Cell::from(&Data::Empty), Cell::Empty);
        assert_eq!(Cell::from(&Data::String("EURUSD".into())), text("EURUSD"));
        assert_eq!(Cell::from(&Data::Int(4)), Cell::Int(4));
        assert_eq!(Cell::from(&Data::Bool(false)), Cell::Bool(false));
        assert_eq!(
            Cell::from(&Data::DateTimeIso("2024-02-03T10:00:00".into())),
            Cell::DateTime(
                chrono::NaiveDate::from_ymd_opt(2024, 2, 3)
                    .unwrap()
                    .and_hms_opt(10, 0, 0)
                    .unwrap()
            )
        );
    }

    #[test]
    fn test_garbage_bytes_are_rejected() {
        let result = Sheet::from_bytes(b"definitely not a workbook".to_vec());
        assert!(result.is_err());
    }

    #[test]
    fn test_garbage_file_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        file.write_all(b"PK\x03\x04 truncated").unwrap();
        assert!(Sheet::from_path(file.path()).is_err());
    }
}
