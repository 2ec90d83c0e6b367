//! Common types used throughout pagestream
//!
//! This module contains shared type definitions, type aliases,
//! and the typed parameter values sent to the remote API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Ordered parameter map. BTreeMap iteration order is sorted by key, which is
/// the canonical ordering required for stable cache keys.
pub type Params = BTreeMap<String, ParamValue>;

// ============================================================================
// HTTP Method
// ============================================================================

/// HTTP method accepted by the dispatcher. The remote search API only speaks
/// GET and POST; everything else is rejected before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
}

impl Method {
    /// Lowercase wire name, matching the schema discovery document
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
        })
    }
}

impl std::str::FromStr for Method {
    type Err = crate::error::Error;

    /// Anything other than GET or POST is rejected before any dispatch
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Method::Get),
            "post" => Ok(Method::Post),
            other => Err(crate::error::Error::unsupported_method(other.to_uppercase())),
        }
    }
}

// ============================================================================
// Parameter Values
// ============================================================================

/// A typed query parameter value.
///
/// Filters are an explicit typed mapping rather than an open-ended keyword
/// bag: each value is validated against the declared schema type before it is
/// merged into a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    List(Vec<ParamValue>),
}

impl ParamValue {
    /// Human-readable type name used in validation errors
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Str(_) => "string",
            ParamValue::Bool(_) => "boolean",
            ParamValue::Int(_) | ParamValue::Float(_) => "number",
            ParamValue::List(_) => "list",
        }
    }

    /// Length of the value when it is a list, 1 otherwise
    pub fn list_len(&self) -> usize {
        match self {
            ParamValue::List(items) => items.len(),
            _ => 1,
        }
    }

    /// Render as query string pairs for a GET request. Lists expand into
    /// repeated keys; nested lists are flattened.
    pub fn query_pairs(&self, key: &str) -> Vec<(String, String)> {
        match self {
            ParamValue::List(items) => items
                .iter()
                .flat_map(|item| item.query_pairs(key))
                .collect(),
            other => vec![(key.to_string(), other.render())],
        }
    }

    /// Render a scalar value as its query string form
    fn render(&self) -> String {
        match self {
            ParamValue::Str(s) => s.clone(),
            ParamValue::Bool(b) => b.to_string(),
            ParamValue::Int(i) => i.to_string(),
            ParamValue::Float(f) => f.to_string(),
            ParamValue::List(_) => String::new(),
        }
    }

    /// Convert into the JSON representation used for POST bodies
    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::List(items) => {
                let rendered: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", rendered.join(","))
            }
            other => f.write_str(&other.render()),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        ParamValue::List(values.into_iter().map(Into::into).collect())
    }
}
