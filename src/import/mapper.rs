use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::TradeField;
use crate::reasoning::{CompletionRequest, ReasoningService};

use super::ImportError;

/// Number of data rows shown to the model alongside the headers.
pub const SAMPLE_ROWS: usize = 3;

const SYSTEM_ROLE: &str = "You are a professional trader and data analyst.";

#[derive(Debug, Error, PartialEq)]
pub enum MappingParseError {
    #[error("no JSON object found in response")]
    NoJson,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

// ---------------------------------------------------------------------------
// ColumnMapping
// ---------------------------------------------------------------------------

/// Source column → trade field name, `None` meaning "no mapping".
/// Targets are kept as returned; the importer decides which ones it knows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMapping {
    entries: Vec<(String, Option<String>)>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the target for `column`.
    pub fn insert(&mut self, column: impl Into<String>, target: Option<&str>) {
        let column = column.into();
        let target = target.map(str::to_string);
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = target,
            None => self.entries.push((column, target)),
        }
    }

    pub fn target(&self, column: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .and_then(|(_, t)| t.as_deref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Columns that point at some field.
    pub fn mapped_count(&self) -> usize {
        self.entries.iter().filter(|(_, t)| t.is_some()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(c, t)| (c.as_str(), t.as_deref()))
    }
}

impl<const N: usize> From<[(&str, Option<&str>); N]> for ColumnMapping {
    fn from(pairs: [(&str, Option<&str>); N]) -> Self {
        let mut mapping = ColumnMapping::new();
        for (column, target) in pairs {
            mapping.insert(column, target);
        }
        mapping
    }
}

// ---------------------------------------------------------------------------
// ColumnMapper
// ---------------------------------------------------------------------------

/// Asks the reasoning service which trade field each spreadsheet column holds.
#[derive(Clone)]
pub struct ColumnMapper {
    service: Arc<dyn ReasoningService>,
}

impl ColumnMapper {
    pub fn new(service: Arc<dyn ReasoningService>) -> Self {
        Self { service }
    }

    /// One round trip to the service for the whole sheet. Transport failures
    /// and unparseable answers both abort.
    pub async fn map_columns(
        &self,
        headers: &[String],
        sample_rows: &[Map<String, Value>],
    ) -> Result<ColumnMapping, ImportError> {
        let request = CompletionRequest::new(SYSTEM_ROLE, build_prompt(headers, sample_rows));

        let raw = self.service.complete(&request).await?;
        let mapping = parse_mapping(&raw)?;

        tracing::info!(
            service = self.service.name(),
            columns = headers.len(),
            mapped = mapping.mapped_count(),
            "Column mapping inferred"
        );

        Ok(mapping)
    }
}

pub fn build_prompt(headers: &[String], sample_rows: &[Map<String, Value>]) -> String {
    let fields = TradeField::ALL
        .iter()
        .map(|f| format!("- {}", f.as_str()))
        .collect::<Vec<_>>()
        .join("\n");
    let columns = serde_json::to_string(headers).unwrap_or_else(|_| "[]".into());
    let samples = serde_json::to_string_pretty(sample_rows).unwrap_or_else(|_| "[]".into());

    format!(
        r#"I have a trading journal spreadsheet with inconsistent column names.
Your task is to map the spreadsheet columns to this Trade model.

Trade fields:
{fields}

Spreadsheet columns:
{columns}

Sample data (first rows):
{samples}

Rules:
- Return ONLY valid JSON: a single object
- Keys = spreadsheet column names, exactly as listed
- Values = one of the Trade fields above, or null if the column is irrelevant
- Do NOT invent fields
"#
    )
}

/// Pull the JSON object out of a free-text answer: everything from the first
/// `{` to the last `}`. String values are targets, anything else is "no
/// mapping".
pub fn parse_mapping(text: &str) -> Result<ColumnMapping, MappingParseError> {
    let start = text.find('{').ok_or(MappingParseError::NoJson)?;
    let end = text
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or(MappingParseError::NoJson)?;

    let value: Value = serde_json::from_str(&text[start..=end])
        .map_err(|e| MappingParseError::InvalidJson(e.to_string()))?;

    let object = match value {
        Value::Object(object) => object,
        Value::Array(_) => return Err(MappingParseError::NotAnObject("array")),
        _ => return Err(MappingParseError::NotAnObject("scalar")),
    };

    let mut mapping = ColumnMapping::new();
    for (column, target) in &object {
        mapping.insert(column.as_str(), target.as_str());
    }
    Ok(mapping)
}
