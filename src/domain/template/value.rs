use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A template value as supplied by callers or default schemas.
///
/// Deserialisation is untagged: JSON/YAML scalars land in the narrowest
/// matching variant (integers before floats), sequences become `List`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
}

/// Field name → value, private to one render call.
pub type DeploymentValues = BTreeMap<String, Value>;

impl Value {
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Flattens the value into strings: scalars yield one entry, lists one per
    /// item, `None` nothing.
    pub fn to_string_list(&self) -> Vec<String> {
        match self {
            Value::None => Vec::new(),
            Value::List(items) => items.iter().flat_map(|v| v.to_string_list()).collect(),
            other => vec![other.to_string()],
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => f.write_str(s),
            Value::List(items) => {
                let joined: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                f.write_str(&joined.join(","))
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
