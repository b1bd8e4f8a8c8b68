//! Raw schema document and its JSON ingestion.

use serde::Deserialize;

/// Number of lines shown on each side of a syntax error.
const SNIPPET_CONTEXT: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("File is empty or could not be read")]
    Empty,
    #[error("Error parsing file: {message}\n\n[File content near error (line {line}, column {column})]\n{snippet}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
        snippet: String,
    },
    #[error("Invalid schema: missing \"{0}\" key")]
    MissingKey(&'static str),
    #[error("Invalid schema: {0}")]
    Shape(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawSchema {
    pub tables: Vec<RawTable>,
    pub relationship_index: Vec<RawRelationship>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawTable {
    pub table_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: Vec<RawColumn>,
    /// Per-table copy of the relationships; the index at the top level is authoritative.
    #[serde(default, deserialize_with = "null_as_default")]
    pub relationships: Vec<RawRelationship>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawColumn {
    pub column_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_pk: bool,
    #[serde(default)]
    pub is_fk: FkFlag,
    #[serde(default)]
    pub fk_cardinality: Option<String>,
    #[serde(default)]
    pub references_table: Option<String>,
}

/// Exporters disagree on how they flag foreign keys: some emit a boolean,
/// others the constraint name.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(untagged)]
pub enum FkFlag {
    Bool(bool),
    Name(String),
    #[default]
    Unset,
}

impl FkFlag {
    pub fn is_set(&self) -> bool {
        match self {
            FkFlag::Bool(b) => *b,
            FkFlag::Name(s) => !s.is_empty(),
            FkFlag::Unset => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawRelationship {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Exporters write `null` for values they have no answer for.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl RawSchema {
    pub fn table(&self, name: &str) -> Option<&RawTable> {
        self.tables.iter().find(|t| t.table_name == name)
    }
}

impl RawTable {
    pub fn column(&self, name: &str) -> Option<&RawColumn> {
        self.columns.iter().find(|c| c.column_name == name)
    }

    pub fn first_pk(&self) -> Option<&RawColumn> {
        self.columns.iter().find(|c| c.is_pk)
    }
}

/// Parse a schema document, checking the required top-level keys before the shape.
pub fn parse_schema(text: &str) -> Result<RawSchema, SchemaError> {
    if text.trim().is_empty() {
        return Err(SchemaError::Empty);
    }

    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| {
        let (line, column) = (e.line(), e.column());
        SchemaError::Syntax {
            message: e.to_string(),
            line,
            column,
            snippet: error_snippet(text, line, column),
        }
    })?;

    for key in ["tables", "relationship_index"] {
        if value.get(key).is_none() {
            return Err(SchemaError::MissingKey(key));
        }
    }

    serde_json::from_value(value).map_err(|e| SchemaError::Shape(e.to_string()))
}

/// Render the lines around `line` with a caret under `column` (both 1-based).
fn error_snippet(text: &str, line: usize, column: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() || line == 0 {
        return String::new();
    }

    let error_idx = (line - 1).min(lines.len() - 1);
    let start = error_idx.saturating_sub(SNIPPET_CONTEXT);
    let end = (error_idx + SNIPPET_CONTEXT + 1).min(lines.len());
    let pad = end.to_string().len();

    let mut out = Vec::with_capacity(end - start + 1);
    for (idx, content) in lines[start..end].iter().enumerate() {
        let number = start + idx + 1;
        out.push(format!("{:>pad$} | {}", number, content));
        if start + idx == error_idx {
            let caret_offset = column.saturating_sub(1);
            out.push(format!("{:pad$} | {}^", "", " ".repeat(caret_offset)));
        }
    }
    out.join("\n")
}
