//! Scalar value converters
//!
//! This module converts between the lexical text of attributes and
//! simple elements and bound [`Value`]s, driven by the XSD built-in
//! [`DataType`] of the receiving field.
//!
//! Supported families:
//! - Strings and string-derived types (kept verbatim)
//! - Booleans, integers (range checked), decimals, floats
//! - Dates, times and date-times
//! - hexBinary and base64Binary
//! - QNames resolved against the in-scope namespaces

mod datatypes;
mod scalars;

pub use datatypes::DataType;
pub use scalars::{
    Base64Converter, BoolConverter, DateConverter, DateTimeConverter, DecimalConverter,
    FloatConverter, HexBinaryConverter, IntConverter, QNameConverter, StringConverter,
    TimeConverter,
};

use crate::dataobjects::Value;
use crate::error::{Error, Result};
use crate::namespaces::NamespaceMap;

/// Trait for converters between lexical text and bound values
pub trait Converter {
    /// Decode lexical text to a value
    fn deserialize(&self, value: &str, ns_map: &NamespaceMap) -> Result<Value>;

    /// Encode a value to lexical text
    fn serialize(&self, value: &Value, ns_map: &NamespaceMap) -> Result<String>;

    /// Returns true if this converter can encode the value
    fn accepts(&self, value: &Value) -> bool;
}

/// Create the converter for a data type
pub fn converter_for(data_type: DataType) -> Box<dyn Converter> {
    if let Some((min, max)) = data_type.integer_bounds() {
        return Box::new(IntConverter::new(min, max));
    }

    match data_type {
        DataType::Boolean => Box::new(BoolConverter),
        DataType::Decimal => Box::new(DecimalConverter),
        DataType::Float | DataType::Double => Box::new(FloatConverter),
        DataType::Date => Box::new(DateConverter),
        DataType::Time => Box::new(TimeConverter),
        DataType::DateTime => Box::new(DateTimeConverter),
        DataType::HexBinary => Box::new(HexBinaryConverter),
        DataType::Base64Binary => Box::new(Base64Converter),
        DataType::QName | DataType::Notation => Box::new(QNameConverter),
        _ => Box::new(StringConverter),
    }
}

/// Decode text against an ordered list of candidate types.
///
/// The first type that accepts the text wins. When none does, the raw text
/// is kept as a string and a warning is logged, unless `strict` is set.
pub fn deserialize(
    value: &str,
    types: &[DataType],
    ns_map: &NamespaceMap,
    strict: bool,
) -> Result<Value> {
    let mut last_error = None;
    for data_type in types {
        match converter_for(*data_type).deserialize(value, ns_map) {
            Ok(converted) => return Ok(converted),
            Err(e) => last_error = Some(e),
        }
    }

    match last_error {
        Some(e) if strict => Err(e),
        Some(e) => {
            tracing::warn!(value, error = %e, "failed to convert value, keeping raw text");
            Ok(Value::String(value.to_string()))
        }
        None => Ok(Value::String(value.to_string())),
    }
}

/// Encode a value using the first candidate type that accepts it.
///
/// Values no candidate accepts are encoded by their own kind, so a raw
/// string kept by a lenient [`deserialize`] round-trips unchanged.
pub fn serialize(value: &Value, types: &[DataType], ns_map: &NamespaceMap) -> Result<String> {
    for data_type in types {
        let converter = converter_for(*data_type);
        if converter.accepts(value) {
            return converter.serialize(value, ns_map);
        }
    }

    let fallback = match value {
        Value::String(_) => DataType::String,
        Value::Bool(_) => DataType::Boolean,
        Value::Int(_) => DataType::Long,
        Value::Decimal(_) => DataType::Decimal,
        Value::Float(_) => DataType::Double,
        Value::Date(_) => DataType::Date,
        Value::Time(_) => DataType::Time,
        Value::DateTime { .. } => DataType::DateTime,
        Value::Bytes(_) => DataType::Base64Binary,
        Value::QName(_) => DataType::QName,
        other => {
            return Err(Error::Conversion(format!(
                "{:?} is not a scalar value",
                other
            )))
        }
    };
    converter_for(fallback).serialize(value, ns_map)
}
