//! Tabular documents built from response objects.
//!
//! A response is flattened through its JSON form: top-level fields become
//! columns, each record becomes a row.

mod pdf;
mod xlsx;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot tabulate: {0}")]
    Shape(String),
    #[error("pdf rendering failed: {0}")]
    Pdf(String),
    #[error("xlsx rendering failed: {0}")]
    Xlsx(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Pdf,
    Xlsx,
}

impl ReportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Xlsx => "xlsx",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "xlsx" => Ok(Self::Xlsx),
            other => Err(ReportError::Shape(format!("unknown report format {other}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&Json> for Cell {
    fn from(v: &Json) -> Self {
        match v {
            Json::Null => Self::Empty,
            Json::Bool(b) => Self::Text(b.to_string()),
            Json::Number(n) => n.as_f64().map_or_else(|| Self::Text(n.to_string()), Self::Number),
            Json::String(s) => Self::Text(s.clone()),
            Json::Array(items) => Self::Text(
                items
                    .iter()
                    .map(|i| Cell::from(i).to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Json::Object(_) => Self::Text(v.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReportTable {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

fn as_object(value: Json) -> Result<serde_json::Map<String, Json>, ReportError> {
    match value {
        Json::Object(map) => Ok(map),
        other => Err(ReportError::Shape(format!("expected an object, got {other}"))),
    }
}

impl ReportTable {
    pub fn from_record<T: Serialize>(title: &str, record: &T) -> Result<Self, ReportError> {
        Self::from_records(title, std::slice::from_ref(record))
    }

    /// Columns come from the first record; missing fields in later rows are empty.
    pub fn from_records<T: Serialize>(title: &str, records: &[T]) -> Result<Self, ReportError> {
        let mut columns: Vec<String> = Vec::new();
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let value = serde_json::to_value(record).map_err(|e| ReportError::Shape(e.to_string()))?;
            let map = as_object(value)?;
            if columns.is_empty() {
                columns = map.keys().cloned().collect();
            }
            rows.push(columns.iter().map(|c| map.get(c).map_or(Cell::Empty, Cell::from)).collect());
        }
        Ok(Self { title: title.to_string(), columns, rows })
    }

    pub fn is_single(&self) -> bool {
        self.rows.len() == 1
    }
}

pub fn render(table: &ReportTable, format: ReportFormat) -> Result<Vec<u8>, ReportError> {
    match format {
        ReportFormat::Pdf => pdf::render(table),
        ReportFormat::Xlsx => xlsx::render(table),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Line {
        id: u32,
        name: &'static str,
        note: Option<&'static str>,
        tags: Vec<&'static str>,
    }

    fn lines() -> Vec<Line> {
        vec![
            Line { id: 1, name: "Bolt", note: None, tags: vec!["a", "b"] },
            Line { id: 2, name: "Nut", note: Some("fragile"), tags: vec![] },
        ]
    }

    #[test]
    fn records_flatten_into_rows() -> Result<(), ReportError> {
        let table = ReportTable::from_records("parts", &lines())?;
        assert_eq!(table.columns, vec!["id", "name", "note", "tags"]);
        assert_eq!(table.rows[0][0], Cell::Number(1.0));
        assert_eq!(table.rows[0][2], Cell::Empty);
        assert_eq!(table.rows[0][3], Cell::Text("a, b".into()));
        assert_eq!(table.rows[1][2], Cell::Text("fragile".into()));
        Ok(())
    }

    #[test]
    fn scalars_cannot_be_tabulated() {
        assert!(matches!(ReportTable::from_record("x", &5), Err(ReportError::Shape(_))));
    }

    #[test]
    fn both_formats_produce_documents() -> Result<(), ReportError> {
        let table = ReportTable::from_records("parts", &lines())?;
        let pdf = render(&table, ReportFormat::Pdf)?;
        assert!(pdf.starts_with(b"%PDF"));
        let xlsx = render(&table, ReportFormat::Xlsx)?;
        assert!(xlsx.starts_with(b"PK"));

        let single = ReportTable::from_record("part", &lines()[0])?;
        assert!(single.is_single());
        assert!(render(&single, ReportFormat::Pdf)?.starts_with(b"%PDF"));
        let empty = ReportTable::from_records::<Line>("none", &[])?;
        assert!(render(&empty, ReportFormat::Xlsx)?.starts_with(b"PK"));
        Ok(())
    }

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("PDF".parse::<ReportFormat>().ok(), Some(ReportFormat::Pdf));
        assert!("csv".parse::<ReportFormat>().is_err());
    }
}
