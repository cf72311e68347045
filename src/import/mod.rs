//! Spreadsheet import: read a workbook, let the reasoning service map its
//! columns onto the trade schema, then reconcile every row.

pub mod importer;
pub mod mapper;
pub mod sheet;

use thiserror::Error;

use crate::reasoning::ReasoningError;

pub use importer::{ImportIssue, ImportOutcome, SpreadsheetImporter};
pub use mapper::{ColumnMapper, ColumnMapping, MappingParseError};
pub use sheet::{Cell, Sheet, SheetError};

/// Sheet-level failures. Each one aborts the whole import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("could not parse column mapping: {0}")]
    MappingParse(#[from] MappingParseError),

    #[error("reasoning service unavailable: {0}")]
    ExternalService(#[from] ReasoningError),

    #[error("unreadable spreadsheet: {0}")]
    Spreadsheet(#[from] SheetError),
}
