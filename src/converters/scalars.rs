//! Scalar converters
//!
//! One converter per value family. Lexical forms follow XSD: booleans
//! accept `1`/`0`, floats accept `INF`/`-INF`/`NaN`, binary types decode
//! to bytes.

use super::Converter;
use crate::dataobjects::Value;
use crate::error::{Error, Result};
use crate::namespaces::{resolve_prefixed, NamespaceMap};
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::str::FromStr;

lazy_static::lazy_static! {
    static ref HEX_BINARY_REGEX: regex::Regex = regex::Regex::new(r"^([0-9a-fA-F]{2})*$").unwrap();
}

fn invalid(value: &str, what: &str) -> Error {
    Error::Conversion(format!("'{}' is not a valid {}", value, what))
}

fn mismatch(value: &Value, what: &str) -> Error {
    Error::Conversion(format!("{:?} cannot be serialized as {}", value, what))
}

/// Character data, kept verbatim
#[derive(Debug, Default)]
pub struct StringConverter;

impl Converter for StringConverter {
    fn deserialize(&self, value: &str, _ns_map: &NamespaceMap) -> Result<Value> {
        Ok(Value::String(value.to_string()))
    }

    fn serialize(&self, value: &Value, _ns_map: &NamespaceMap) -> Result<String> {
        value
            .as_str()
            .map(String::from)
            .ok_or_else(|| mismatch(value, "string"))
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::String(_))
    }
}

/// xs:boolean
#[derive(Debug, Default)]
pub struct BoolConverter;

impl Converter for BoolConverter {
    fn deserialize(&self, value: &str, _ns_map: &NamespaceMap) -> Result<Value> {
        match value.trim() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(invalid(value, "boolean value")),
        }
    }

    fn serialize(&self, value: &Value, _ns_map: &NamespaceMap) -> Result<String> {
        match value {
            Value::Bool(b) => Ok(if *b { "true" } else { "false" }.to_string()),
            _ => Err(mismatch(value, "boolean")),
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Bool(_))
    }
}

/// xs:integer family, range checked
#[derive(Debug)]
pub struct IntConverter {
    min: i64,
    max: i64,
}

impl IntConverter {
    /// Create a converter accepting `min..=max`
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

impl Converter for IntConverter {
    fn deserialize(&self, value: &str, _ns_map: &NamespaceMap) -> Result<Value> {
        let parsed: i64 = value.trim().parse().map_err(|_| invalid(value, "integer"))?;
        if parsed < self.min || parsed > self.max {
            return Err(Error::Conversion(format!(
                "{} is out of range [{}, {}]",
                parsed, self.min, self.max
            )));
        }
        Ok(Value::Int(parsed))
    }

    fn serialize(&self, value: &Value, _ns_map: &NamespaceMap) -> Result<String> {
        match value {
            Value::Int(i) => Ok(i.to_string()),
            _ => Err(mismatch(value, "integer")),
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Int(i) if *i >= self.min && *i <= self.max)
    }
}

/// xs:decimal
#[derive(Debug, Default)]
pub struct DecimalConverter;

impl Converter for DecimalConverter {
    fn deserialize(&self, value: &str, _ns_map: &NamespaceMap) -> Result<Value> {
        Decimal::from_str(value.trim())
            .map(Value::Decimal)
            .map_err(|_| invalid(value, "decimal"))
    }

    fn serialize(&self, value: &Value, _ns_map: &NamespaceMap) -> Result<String> {
        match value {
            Value::Decimal(d) => Ok(d.to_string()),
            _ => Err(mismatch(value, "decimal")),
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Decimal(_))
    }
}

/// xs:float and xs:double
#[derive(Debug, Default)]
pub struct FloatConverter;

impl Converter for FloatConverter {
    fn deserialize(&self, value: &str, _ns_map: &NamespaceMap) -> Result<Value> {
        match value.trim() {
            "INF" => Ok(Value::Float(f64::INFINITY)),
            "-INF" => Ok(Value::Float(f64::NEG_INFINITY)),
            "NaN" => Ok(Value::Float(f64::NAN)),
            other => other
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::Float)
                .ok_or_else(|| invalid(value, "float")),
        }
    }

    fn serialize(&self, value: &Value, _ns_map: &NamespaceMap) -> Result<String> {
        match value {
            Value::Float(f) if f.is_nan() => Ok("NaN".to_string()),
            Value::Float(f) if *f == f64::INFINITY => Ok("INF".to_string()),
            Value::Float(f) if *f == f64::NEG_INFINITY => Ok("-INF".to_string()),
            Value::Float(f) => Ok(f.to_string()),
            _ => Err(mismatch(value, "float")),
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Float(_))
    }
}

/// xs:date
#[derive(Debug, Default)]
pub struct DateConverter;

impl Converter for DateConverter {
    fn deserialize(&self, value: &str, _ns_map: &NamespaceMap) -> Result<Value> {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .map(Value::Date)
            .map_err(|_| invalid(value, "date"))
    }

    fn serialize(&self, value: &Value, _ns_map: &NamespaceMap) -> Result<String> {
        match value {
            Value::Date(d) => Ok(d.format("%Y-%m-%d").to_string()),
            _ => Err(mismatch(value, "date")),
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Date(_))
    }
}

/// xs:time
#[derive(Debug, Default)]
pub struct TimeConverter;

impl Converter for TimeConverter {
    fn deserialize(&self, value: &str, _ns_map: &NamespaceMap) -> Result<Value> {
        NaiveTime::parse_from_str(value.trim(), "%H:%M:%S%.f")
            .map(Value::Time)
            .map_err(|_| invalid(value, "time"))
    }

    fn serialize(&self, value: &Value, _ns_map: &NamespaceMap) -> Result<String> {
        match value {
            Value::Time(t) => Ok(t.format("%H:%M:%S%.f").to_string()),
            _ => Err(mismatch(value, "time")),
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Time(_))
    }
}

/// xs:dateTime, with or without timezone
#[derive(Debug, Default)]
pub struct DateTimeConverter;

impl Converter for DateTimeConverter {
    fn deserialize(&self, value: &str, _ns_map: &NamespaceMap) -> Result<Value> {
        let trimmed = value.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Value::DateTime {
                value: dt.naive_local(),
                offset: Some(*dt.offset()),
            });
        }
        NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|value| Value::DateTime { value, offset: None })
            .map_err(|_| invalid(value, "dateTime"))
    }

    fn serialize(&self, value: &Value, _ns_map: &NamespaceMap) -> Result<String> {
        match value {
            Value::DateTime { value, offset } => {
                let mut out = value.format("%Y-%m-%dT%H:%M:%S%.f").to_string();
                match offset {
                    Some(offset) if offset.local_minus_utc() == 0 => out.push('Z'),
                    Some(offset) => out.push_str(&offset.to_string()),
                    None => {}
                }
                Ok(out)
            }
            _ => Err(mismatch(value, "dateTime")),
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::DateTime { .. })
    }
}

/// xs:hexBinary
#[derive(Debug, Default)]
pub struct HexBinaryConverter;

impl Converter for HexBinaryConverter {
    fn deserialize(&self, value: &str, _ns_map: &NamespaceMap) -> Result<Value> {
        let value = value.trim();
        if !HEX_BINARY_REGEX.is_match(value) {
            return Err(invalid(value, "hexadecimal encoding"));
        }

        (0..value.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&value[i..i + 2], 16).map_err(|_| invalid(value, "hex byte")))
            .collect::<Result<Vec<u8>>>()
            .map(Value::Bytes)
    }

    fn serialize(&self, value: &Value, _ns_map: &NamespaceMap) -> Result<String> {
        match value {
            Value::Bytes(bytes) => Ok(bytes.iter().map(|b| format!("{:02X}", b)).collect()),
            _ => Err(mismatch(value, "hexBinary")),
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Bytes(_))
    }
}

/// xs:base64Binary
#[derive(Debug, Default)]
pub struct Base64Converter;

impl Converter for Base64Converter {
    fn deserialize(&self, value: &str, _ns_map: &NamespaceMap) -> Result<Value> {
        let cleaned: String = value.split_whitespace().collect();
        base64::engine::general_purpose::STANDARD
            .decode(cleaned.as_bytes())
            .map(Value::Bytes)
            .map_err(|_| invalid(value, "base64 encoding"))
    }

    fn serialize(&self, value: &Value, _ns_map: &NamespaceMap) -> Result<String> {
        match value {
            Value::Bytes(bytes) => Ok(base64::engine::general_purpose::STANDARD.encode(bytes)),
            _ => Err(mismatch(value, "base64Binary")),
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Bytes(_))
    }
}

/// xs:QName, resolved against the in-scope namespaces
#[derive(Debug, Default)]
pub struct QNameConverter;

impl Converter for QNameConverter {
    fn deserialize(&self, value: &str, ns_map: &NamespaceMap) -> Result<Value> {
        resolve_prefixed(ns_map, value).map(Value::QName)
    }

    fn serialize(&self, value: &Value, ns_map: &NamespaceMap) -> Result<String> {
        let Value::QName(qname) = value else {
            return Err(mismatch(value, "QName"));
        };
        let Some(namespace) = qname.namespace() else {
            return Ok(qname.local_name.clone());
        };
        let prefix = ns_map
            .iter()
            .find(|(_, uri)| uri.as_str() == namespace)
            .map(|(prefix, _)| prefix.clone())
            .ok_or_else(|| {
                Error::Conversion(format!("No prefix declared for namespace '{}'", namespace))
            })?;
        Ok(match prefix {
            Some(prefix) => format!("{}:{}", prefix, qname.local_name),
            None => qname.local_name.clone(),
        })
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::QName(_))
    }
}
