//! Typed candidate values for sweep axes.

use std::fmt::{self, Display};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

/// Label used in locators and paths for the "use default" sentinel.
pub const DEFAULT_LABEL: &str = "_default";

/// A single candidate value of a parameter axis.
///
/// Configuration files spell the sentinel [`ParamValue::UseDefault`] as the
/// empty string (or `null`). The sentinel is a real choice within a
/// combination but never contributes a parameter to a job.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Keep whatever the base configuration already provides.
    UseDefault,
    /// Boolean candidate.
    Bool(bool),
    /// Integer candidate.
    Int(i64),
    /// Floating point candidate.
    Float(f64),
    /// String candidate.
    Str(String),
}

impl ParamValue {
    /// Returns true when the value is the "use default" sentinel.
    pub fn is_default(&self) -> bool {
        matches!(self, ParamValue::UseDefault)
    }

    /// Converts a JSON scalar into a candidate value.
    ///
    /// Arrays and objects have no scalar interpretation and yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(ParamValue::UseDefault),
            Value::Bool(flag) => Some(ParamValue::Bool(*flag)),
            Value::Number(number) => number
                .as_i64()
                .map(ParamValue::Int)
                .or_else(|| number.as_f64().map(ParamValue::Float)),
            Value::String(text) if text.is_empty() => Some(ParamValue::UseDefault),
            Value::String(text) => Some(ParamValue::Str(text.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Converts the value into a JSON parameter, skipping the sentinel.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            ParamValue::UseDefault => None,
            ParamValue::Bool(flag) => Some(Value::Bool(*flag)),
            ParamValue::Int(number) => Some(Value::Number((*number).into())),
            ParamValue::Float(number) => Number::from_f64(*number).map(Value::Number),
            ParamValue::Str(text) => Some(Value::String(text.clone())),
        }
    }

    /// Label used for locator segments: the sentinel becomes [`DEFAULT_LABEL`].
    pub fn label(&self) -> String {
        match self {
            ParamValue::UseDefault => DEFAULT_LABEL.to_string(),
            other => other.to_string(),
        }
    }
}

impl Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::UseDefault => Ok(()),
            ParamValue::Bool(true) => write!(f, "True"),
            ParamValue::Bool(false) => write!(f, "False"),
            ParamValue::Int(number) => write!(f, "{number}"),
            ParamValue::Float(number) => write!(f, "{}", render_float(*number)),
            ParamValue::Str(text) => write!(f, "{text}"),
        }
    }
}

/// Shortest round-trip digits, positional for decimal exponents in `-4..16`
/// and `d.ddde±XX` otherwise, so `1e-5` renders as `1e-05` and `100.0` keeps
/// its trailing `.0`. Option files written by existing pipelines use these
/// spellings.
fn render_float(number: f64) -> String {
    if number.is_nan() {
        return "nan".to_string();
    }
    if number.is_infinite() {
        return if number > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let scientific = format!("{number:e}");
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    if !(-4..16).contains(&exponent) {
        let exponent_sign = if exponent < 0 { '-' } else { '+' };
        return format!("{sign}{mantissa}e{exponent_sign}{:02}", exponent.unsigned_abs());
    }
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let body = if exponent < 0 {
        format!("0.{}{digits}", "0".repeat(exponent.unsigned_abs() as usize - 1))
    } else {
        let point = exponent as usize + 1;
        if digits.len() <= point {
            format!("{digits}{}.0", "0".repeat(point - digits.len()))
        } else {
            format!("{}.{}", &digits[..point], &digits[point..])
        }
    };
    format!("{sign}{body}")
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            ParamValue::UseDefault
        } else {
            ParamValue::Str(value.to_string())
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParamValue::UseDefault => serializer.serialize_str(""),
            ParamValue::Bool(flag) => serializer.serialize_bool(*flag),
            ParamValue::Int(number) => serializer.serialize_i64(*number),
            ParamValue::Float(number) => serializer.serialize_f64(*number),
            ParamValue::Str(text) => serializer.serialize_str(text),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Null(()),
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl<'de> Deserialize<'de> for ParamValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawValue::deserialize(deserializer)? {
            RawValue::Null(()) => ParamValue::UseDefault,
            RawValue::Bool(flag) => ParamValue::Bool(flag),
            RawValue::Int(number) => ParamValue::Int(number),
            RawValue::Float(number) => ParamValue::Float(number),
            RawValue::Str(text) => ParamValue::from(text.as_str()),
        })
    }
}
