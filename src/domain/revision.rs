use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EntityType;

/// Display pattern for datetime field values in change descriptions.
pub const DATETIME_DISPLAY: &str = "%b %-d, %Y at %-I:%M%p";

/// How a revision came to exist.
///
/// Revision logs encode this as `+`, `~` and `-`. Anything else is kept
/// verbatim in `Other` and rendered through the generic fallback.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RevisionType {
    Created,
    Updated,
    Deleted,
    Other(String),
}

impl RevisionType {
    pub fn symbol(&self) -> &str {
        match self {
            Self::Created => "+",
            Self::Updated => "~",
            Self::Deleted => "-",
            Self::Other(raw) => raw,
        }
    }

    /// Capitalized verb used by created/deleted/updated descriptions.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Updated => "Updated",
            Self::Deleted => "Deleted",
            Self::Other(_) => "changed",
        }
    }
}

impl From<String> for RevisionType {
    fn from(value: String) -> Self {
        match value.trim() {
            "+" | "created" => Self::Created,
            "~" | "updated" => Self::Updated,
            "-" | "deleted" => Self::Deleted,
            _ => Self::Other(value),
        }
    }
}

impl From<RevisionType> for String {
    fn from(value: RevisionType) -> Self {
        match value {
            RevisionType::Other(raw) => raw,
            known => known.symbol().to_string(),
        }
    }
}

impl std::fmt::Display for RevisionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A single field value captured in a revision snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FieldValueRepr", into = "FieldValueRepr")]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(DateTime<Utc>),
    /// Foreign key, holding the referenced id.
    Ref(i64),
}

impl FieldValue {
    /// Human-readable rendering used when echoing a new value.
    pub fn display(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(n) => n.to_string(),
            // Whole floats keep their decimal point: 1.0 stays "1.0".
            Self::Float(n) if n.is_finite() && n.fract() == 0.0 => format!("{:.1}", n),
            Self::Float(n) => n.to_string(),
            Self::Text(s) => s.clone(),
            Self::DateTime(dt) => dt.format(DATETIME_DISPLAY).to_string(),
            Self::Ref(id) => id.to_string(),
        }
    }

    /// Flattened JSON projection: references collapse to their id.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::from(*b),
            Self::Int(n) | Self::Ref(n) => serde_json::Value::from(*n),
            Self::Float(n) => serde_json::Value::from(*n),
            Self::Text(s) => serde_json::Value::from(s.as_str()),
            Self::DateTime(dt) => serde_json::Value::from(dt.to_rfc3339()),
        }
    }

    pub fn as_id(&self) -> Option<i64> {
        match self {
            Self::Ref(id) | Self::Int(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FieldValueRepr {
    Ref {
        #[serde(rename = "ref")]
        id: i64,
    },
    DateTime {
        datetime: DateTime<Utc>,
    },
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl From<FieldValueRepr> for FieldValue {
    fn from(repr: FieldValueRepr) -> Self {
        match repr {
            FieldValueRepr::Ref { id } => Self::Ref(id),
            FieldValueRepr::DateTime { datetime } => Self::DateTime(datetime),
            FieldValueRepr::Bool(b) => Self::Bool(b),
            FieldValueRepr::Int(n) => Self::Int(n),
            FieldValueRepr::Float(n) => Self::Float(n),
            FieldValueRepr::Text(s) => Self::Text(s),
            FieldValueRepr::Null => Self::Null,
        }
    }
}

impl From<FieldValue> for FieldValueRepr {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Ref(id) => Self::Ref { id },
            FieldValue::DateTime(datetime) => Self::DateTime { datetime },
            FieldValue::Bool(b) => Self::Bool(b),
            FieldValue::Int(n) => Self::Int(n),
            FieldValue::Float(n) => Self::Float(n),
            FieldValue::Text(s) => Self::Text(s),
            FieldValue::Null => Self::Null,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One immutable snapshot of an entity at a point in its revision log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(rename = "model")]
    pub entity_type: EntityType,
    #[serde(rename = "history_id")]
    pub revision_id: i64,
    #[serde(rename = "history_type")]
    pub revision_type: RevisionType,
    #[serde(rename = "history_date")]
    pub revision_timestamp: DateTime<Utc>,
    #[serde(rename = "id")]
    pub entity_id: i64,
    /// User recorded as having caused the revision, if any.
    #[serde(rename = "history_user", default)]
    pub actor_id: Option<i64>,
    #[serde(rename = "fields", default)]
    pub field_snapshot: BTreeMap<String, FieldValue>,
}

impl HistoryRecord {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.field_snapshot.get(name)
    }

    /// Text content of a field, or an empty string when absent.
    pub fn field_text(&self, name: &str) -> String {
        self.field(name).map(FieldValue::display).unwrap_or_default()
    }
}
