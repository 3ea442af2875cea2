//! Layered parameter sets with a right-biased merge.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{ErrorInfo, SweepError};

fn param_error(code: &str, key: &str, message: impl Into<String>) -> SweepError {
    SweepError::Config(ErrorInfo::new(code, message).with_context("key", key))
}

/// Parameter namespace used for job descriptors and configuration layers.
///
/// Values are JSON values; nested objects act as sub-namespaces. [`unify`]
/// merges namespaces recursively and overwrites every other value, so the
/// right-hand layer always wins for scalar and list keys.
///
/// [`unify`]: Parameters::unify
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(BTreeMap<String, Value>);

impl Parameters {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a parameter set from key value pairs; later pairs win.
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.insert(key, value);
        }
        params
    }

    /// Interprets a JSON value as a parameter set.
    ///
    /// `null` becomes the empty set; anything other than an object is
    /// rejected.
    pub fn from_value(value: Value) -> Result<Self, SweepError> {
        match value {
            Value::Object(map) => Ok(Self(map.into_iter().collect())),
            Value::Null => Ok(Self::new()),
            other => Err(SweepError::Config(
                ErrorInfo::new("params-not-mapping", "parameters must be a mapping")
                    .with_context("found", type_name(&other)),
            )),
        }
    }

    /// Returns the parameters as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone().into_iter().collect::<Map<_, _>>())
    }

    /// Inserts or replaces a single key.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Removes a key, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Looks up a top level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns true when the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns true when no keys are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of top level keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the top level entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Returns a new set with `other` layered on top of `self`.
    pub fn unify(&self, other: &Parameters) -> Parameters {
        let mut merged = self.clone();
        merged.unify_in_place(other);
        merged
    }

    /// Layers `other` on top of `self`.
    pub fn unify_in_place(&mut self, other: &Parameters) {
        for (key, value) in &other.0 {
            match self.0.get_mut(key) {
                Some(existing) => merge_value(existing, value),
                None => {
                    self.0.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// Reads a required string.
    pub fn string(&self, key: &str) -> Result<String, SweepError> {
        match self.0.get(key) {
            Some(Value::String(text)) => Ok(text.clone()),
            Some(other) => Err(param_error(
                "param-not-string",
                key,
                format!("expected a string, found {}", type_name(other)),
            )),
            None => Err(missing(key)),
        }
    }

    /// Reads an optional string.
    pub fn optional_string(&self, key: &str) -> Result<Option<String>, SweepError> {
        if self.0.contains_key(key) {
            self.string(key).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Reads a required path.
    pub fn path(&self, key: &str) -> Result<PathBuf, SweepError> {
        self.string(key).map(PathBuf::from)
    }

    /// Reads a required strictly positive integer.
    pub fn positive_integer(&self, key: &str) -> Result<u64, SweepError> {
        match self.optional_positive_integer(key)? {
            Some(value) => Ok(value),
            None => Err(missing(key)),
        }
    }

    /// Reads an optional strictly positive integer.
    pub fn optional_positive_integer(&self, key: &str) -> Result<Option<u64>, SweepError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(number)) => match number.as_u64() {
                Some(value) if value > 0 => Ok(Some(value)),
                _ => Err(param_error(
                    "param-not-positive",
                    key,
                    format!("expected a positive integer, found {number}"),
                )),
            },
            Some(other) => Err(param_error(
                "param-not-integer",
                key,
                format!("expected a positive integer, found {}", type_name(other)),
            )),
        }
    }

    /// Reads an optional non-negative integer such as a device count.
    pub fn optional_count(&self, key: &str) -> Result<Option<u64>, SweepError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(number)) => number.as_u64().map(Some).ok_or_else(|| {
                param_error(
                    "param-not-integer",
                    key,
                    format!("expected a non-negative integer, found {number}"),
                )
            }),
            Some(other) => Err(param_error(
                "param-not-integer",
                key,
                format!("expected a non-negative integer, found {}", type_name(other)),
            )),
        }
    }
}

impl FromIterator<(String, Value)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

fn merge_value(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(existing), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match existing.get_mut(key) {
                    Some(slot) => merge_value(slot, value),
                    None => {
                        existing.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

fn missing(key: &str) -> SweepError {
    param_error("param-missing", key, "required parameter is missing")
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}
