use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A cell's stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Boolean(bool),
    Number(f64),
    String(String),
    /// Error literal such as `#N/A`, kept verbatim.
    Error(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Whether the value is empty or only whitespace once rendered as text.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// String form of the value, matching how a scripting host coerces
    /// values to strings: `123.0` is `"123"`, booleans are `true`/`false`.
    pub fn to_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Boolean(b) => b.to_string(),
            Self::Number(n) => number_text(*n),
            Self::String(s) | Self::Error(s) => s.clone(),
        }
    }

    /// Convert a record value into a cell value.
    ///
    /// Nested arrays and objects are stored as compact JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::Bool(b) => Self::Boolean(*b),
            Value::Number(n) => n
                .as_f64()
                .map_or_else(|| Self::String(n.to_string()), Self::Number),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(_) | Value::Object(_) => Self::String(value.to_string()),
        }
    }

    /// Convert back into a JSON value for read operations.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Empty => Value::Null,
            Self::Boolean(b) => Value::Bool(*b),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map_or_else(|| Value::String(number_text(*n)), Value::Number),
            Self::String(s) | Self::Error(s) => Value::String(s.clone()),
        }
    }

    /// Detect the value type of free-form text typed into a single cell.
    ///
    /// - Empty string → clears the cell
    /// - "true"/"false" (case-insensitive) → Boolean
    /// - Parseable as f64 → Number
    /// - Otherwise → String
    pub fn detect(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return Self::Boolean(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Self::Boolean(false);
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Number(n),
            _ => Self::String(text.to_string()),
        }
    }
}

/// Render a number the way a scripting host's `String(n)` would.
pub(crate) fn number_text(n: f64) -> String {
    if n.is_nan() {
        return "NaN".into();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity".into() } else { "-Infinity".into() };
    }
    if n == 0.0 {
        return "0".into();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{n:.0}");
    }
    n.to_string()
}

/// A single stored cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    /// Style index into the workbook's `cellXfs`, preserved across edits.
    pub style_idx: Option<u32>,
    /// Formula kept for roundtrip save; dropped when the value is overwritten.
    pub formula: Option<Formula>,
}

/// A formula as found in the worksheet XML.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Formula {
    pub text: String,
    /// Raw attribute text of the `<f>` element (shared/array formula markers).
    pub attrs: String,
}
