use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{FieldKind, FieldValue, NewTrade, TradeData, TradeField};

use super::mapper::{ColumnMapper, ColumnMapping, SAMPLE_ROWS};
use super::sheet::{Cell, Sheet};
use super::ImportError;

/// Offset from a data-row index to the row number a spreadsheet shows:
/// one for the header row, one for 1-based numbering.
pub const HEADER_OFFSET: usize = 2;

/// Fields of one source row that could not be populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportIssue {
    pub row: usize,
    pub missing_fields: Vec<TradeField>,
    pub conversion_errors: Vec<TradeField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportOutcome {
    pub trades: Vec<NewTrade>,
    pub issues: Vec<ImportIssue>,
}

/// Turns a spreadsheet into trades, one per data row.
#[derive(Clone)]
pub struct SpreadsheetImporter {
    mapper: ColumnMapper,
}

impl SpreadsheetImporter {
    pub fn new(mapper: ColumnMapper) -> Self {
        Self { mapper }
    }

    /// Infer the column mapping once, then reconcile every row against it.
    /// Any sheet-level failure aborts with no partial result.
    pub async fn import(&self, sheet: &Sheet, owner_id: Uuid) -> Result<ImportOutcome, ImportError> {
        if sheet.row_count() == 0 {
            tracing::info!(%owner_id, "Spreadsheet has no data rows, nothing to import");
            return Ok(ImportOutcome::default());
        }

        let mapping = self
            .mapper
            .map_columns(sheet.headers(), &sheet.sample_rows(SAMPLE_ROWS))
            .await?;

        let outcome = apply_mapping(sheet, &mapping, owner_id);

        tracing::info!(
            %owner_id,
            rows = sheet.row_count(),
            trades = outcome.trades.len(),
            issues = outcome.issues.len(),
            "Spreadsheet reconciled"
        );

        Ok(outcome)
    }
}

/// Decide which column feeds each field. Headers are scanned in sheet order
/// and the first column mapped to a field claims it; later ones are ignored.
pub fn resolve_columns(headers: &[String], mapping: &ColumnMapping) -> HashMap<TradeField, usize> {
    let mut columns = HashMap::new();

    for (index, header) in headers.iter().enumerate() {
        let Some(target) = mapping.target(header) else {
            continue;
        };

        let Some(field) = TradeField::from_name(target) else {
            tracing::warn!(column = %header, mapped_to = target, "Mapping names an unknown trade field, ignoring");
            continue;
        };

        if let Some(&claimed) = columns.get(&field) {
            tracing::debug!(
                column = %header,
                field = %field,
                kept = %headers[claimed],
                "Field already mapped from an earlier column, ignoring"
            );
            continue;
        }

        columns.insert(field, index);
    }

    columns
}

/// Build one trade per row from an already inferred mapping.
pub fn apply_mapping(sheet: &Sheet, mapping: &ColumnMapping, owner_id: Uuid) -> ImportOutcome {
    let columns = resolve_columns(sheet.headers(), mapping);
    let mut outcome = ImportOutcome::default();

    for (index, row) in sheet.rows().iter().enumerate() {
        let mut data = TradeData::default();
        let mut missing_fields = Vec::new();
        let mut conversion_errors = Vec::new();

        for field in TradeField::ALL {
            let Some(cell) = columns.get(&field).and_then(|&col| row.get(col)) else {
                missing_fields.push(field);
                continue;
            };

            if cell.is_blank() {
                missing_fields.push(field);
                continue;
            }

            match coerce(field, cell) {
                Some(value) => data.set(field, value),
                None => conversion_errors.push(field),
            }
        }

        outcome.trades.push(NewTrade { owner_id, data });

        if !missing_fields.is_empty() || !conversion_errors.is_empty() {
            outcome.issues.push(ImportIssue {
                row: index + HEADER_OFFSET,
                missing_fields,
                conversion_errors,
            });
        }
    }

    outcome
}

/// Convert a non-blank cell to the value `field` stores. `None` is a
/// conversion failure.
pub fn coerce(field: TradeField, cell: &Cell) -> Option<FieldValue> {
    match field.kind() {
        FieldKind::Date => coerce_date(cell).map(FieldValue::Date),
        FieldKind::Flag => coerce_flag(cell).map(FieldValue::Flag),
        FieldKind::Number => coerce_number(cell).map(FieldValue::Number),
        FieldKind::Text => coerce_text(cell).map(FieldValue::Text),
    }
}

fn coerce_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::DateTime(dt) => Some(dt.date()),
        Cell::Text(s) => parse_iso_date(s),
        _ => None,
    }
}

/// ISO date, or the date part of an ISO datetime.
fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }

    const DATETIME_FORMATS: [&str; 6] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }

    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Truthiness: non-zero numbers and any text are true. Blank cells are
/// reported as missing before coercion, so they have no flag value here.
fn coerce_flag(cell: &Cell) -> Option<bool> {
    match cell {
        Cell::Bool(b) => Some(*b),
        Cell::Int(i) => Some(*i != 0),
        Cell::Float(f) => Some(*f != 0.0),
        Cell::Text(s) if s.trim().is_empty() => None,
        Cell::Text(_) | Cell::DateTime(_) => Some(true),
        Cell::Empty | Cell::Error(_) => None,
    }
}

fn coerce_number(cell: &Cell) -> Option<Decimal> {
    match cell {
        Cell::Int(i) => Some(Decimal::from(*i)),
        Cell::Float(f) => Decimal::from_f64(*f),
        Cell::Text(s) => parse_decimal(s),
        _ => None,
    }
}

/// Plain or scientific notation; a lone comma is read as the decimal
/// separator.
fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();

    if let Ok(d) = Decimal::from_str(s) {
        return Some(d);
    }
    if s.contains(['e', 'E']) {
        if let Ok(d) = Decimal::from_scientific(s) {
            return Some(d);
        }
    }
    if s.matches(',').count() == 1 && !s.contains('.') {
        return Decimal::from_str(&s.replace(',', ".")).ok();
    }

    None
}

fn coerce_text(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Error(_) => None,
        other => Some(other.render()),
    }
}
