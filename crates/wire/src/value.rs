// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed values carried in method arguments, replies and properties.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A dynamically typed value with a wire signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Int64(i64),
    UInt64(u64),
    Double(f64),
    Str(String),
    Array(Vec<Value>),
    Dict(BTreeMap<String, Value>),
    Unit,
}

impl Value {
    /// Wire type tag: `b x t d s`, `a<elem>` / `av` for arrays, `a{s<elem>}` /
    /// `a{sv}` for dicts, `()` for unit. Containers only get a concrete
    /// element type when every element agrees.
    pub fn signature(&self) -> String {
        match self {
            Value::Bool(_) => "b".to_string(),
            Value::Int64(_) => "x".to_string(),
            Value::UInt64(_) => "t".to_string(),
            Value::Double(_) => "d".to_string(),
            Value::Str(_) => "s".to_string(),
            Value::Unit => "()".to_string(),
            Value::Array(items) => format!("a{}", common_signature(items.iter())),
            Value::Dict(map) => format!("a{{s{}}}", common_signature(map.values())),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt64(n) => Some(*n),
            Value::Int64(n) => u64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Dict(map) => Some(map),
            _ => None,
        }
    }

    /// Build an `a{ss}` dict.
    pub fn string_map<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Value::Dict(entries.into_iter().map(|(k, v)| (k.into(), Value::Str(v.into()))).collect())
    }

    /// Read back an `a{ss}` dict. `None` if this is not a dict or any value
    /// is not a string.
    pub fn to_string_map(&self) -> Option<BTreeMap<String, String>> {
        self.as_dict()?
            .iter()
            .map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect()
    }

    /// Convert to plain JSON, dropping wire type tags.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int64(n) => serde_json::Value::from(*n),
            Value::UInt64(n) => serde_json::Value::from(*n),
            Value::Double(n) => serde_json::Value::from(*n),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Unit => serde_json::Value::Null,
            Value::Array(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Dict(map) => serde_json::Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()),
        }
    }
}

fn common_signature<'a>(mut values: impl Iterator<Item = &'a Value>) -> String {
    let Some(first) = values.next().map(Value::signature) else {
        return "v".to_string();
    };
    if values.all(|v| v.signature() == first) {
        first
    } else {
        "v".to_string()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int64(n)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::UInt64(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Dict(map)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Unit,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Value::UInt64(u)
                } else if let Some(i) = n.as_i64() {
                    Value::Int64(i)
                } else {
                    Value::Double(n.as_f64().unwrap_or_default())
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => Value::Dict(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()),
        }
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
