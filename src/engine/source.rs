//! Row-source resolution: turns one input item into the records to write.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, XlrelayError};

/// One logical row: column name to scalar value. Key order is preserved.
pub type Record = Map<String, Value>;

/// How records are obtained from an input item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataMode {
    /// The item's own fields, passed through 1:1.
    AutoMap,
    /// A user-curated column mapping.
    Manual,
    /// A JSON string holding one object or an array of objects.
    Raw,
}

impl FromStr for DataMode {
    type Err = XlrelayError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "autoMap" => Ok(Self::AutoMap),
            "manual" => Ok(Self::Manual),
            "raw" => Ok(Self::Raw),
            other => Err(XlrelayError::validation(format!(
                "Unknown data mode: {other}"
            ))),
        }
    }
}

impl fmt::Display for DataMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AutoMap => "autoMap",
            Self::Manual => "manual",
            Self::Raw => "raw",
        })
    }
}

/// Value of a manual mapping control.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    #[serde(default)]
    pub value: Option<Record>,
    /// Columns used to match existing rows on upsert.
    #[serde(default)]
    pub matching_columns: Vec<String>,
}

/// One host input item together with its per-item parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputItem {
    /// The item's own fields (used by `autoMap`).
    #[serde(default)]
    pub json: Record,
    /// Mapping control value (used by `manual`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<ColumnMapping>,
    /// Raw JSON text (used by `raw`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_data: Option<String>,
}

impl InputItem {
    pub fn from_record(json: Record) -> Self {
        Self {
            json,
            ..Self::default()
        }
    }

    pub fn with_columns(columns: ColumnMapping) -> Self {
        Self {
            columns: Some(columns),
            ..Self::default()
        }
    }

    pub fn with_row_data(row_data: impl Into<String>) -> Self {
        Self {
            row_data: Some(row_data.into()),
            ..Self::default()
        }
    }
}

/// Produce the records an input item contributes under `mode`.
pub fn resolve_records(mode: DataMode, item: &InputItem) -> Result<Vec<Record>> {
    match mode {
        DataMode::AutoMap => Ok(vec![item.json.clone()]),
        DataMode::Manual => resolve_manual(item.columns.as_ref()),
        DataMode::Raw => resolve_raw(item.row_data.as_deref().unwrap_or("")),
    }
}

fn resolve_manual(mapping: Option<&ColumnMapping>) -> Result<Vec<Record>> {
    match mapping.and_then(|m| m.value.as_ref()) {
        Some(value) if !value.is_empty() => Ok(vec![value.clone()]),
        _ => Err(XlrelayError::validation(
            "No column values provided in manual mapping mode",
        )),
    }
}

fn resolve_raw(row_data: &str) -> Result<Vec<Record>> {
    let parsed: Value = serde_json::from_str(row_data)
        .map_err(|e| XlrelayError::validation(format!("Invalid JSON in Row Data: {e}")))?;

    match parsed {
        Value::Array(elements) => elements.into_iter().map(into_record).collect(),
        other => Ok(vec![into_record(other)?]),
    }
}

fn into_record(value: Value) -> Result<Record> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(XlrelayError::validation(
            "Row data must be a JSON object or an array of objects",
        )),
    }
}

/// Determine the key columns for an upsert.
///
/// `manual` takes them from the mapping's matching columns; the other modes
/// use the single `key_column` parameter.
pub fn resolve_key_columns(
    mode: DataMode,
    key_column: Option<&str>,
    mapping: Option<&ColumnMapping>,
) -> Result<Vec<String>> {
    match mode {
        DataMode::Manual => {
            let columns = mapping
                .map(|m| m.matching_columns.clone())
                .unwrap_or_default();
            if columns.is_empty() {
                return Err(XlrelayError::validation(
                    "At least one matching column must be selected in manual mode",
                ));
            }
            Ok(columns)
        }
        DataMode::AutoMap | DataMode::Raw => match key_column.map(str::trim) {
            Some(name) if !name.is_empty() => Ok(vec![name.to_string()]),
            _ => Err(XlrelayError::validation(
                "Key Column is required for upsert operation",
            )),
        },
    }
}
