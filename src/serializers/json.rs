//! JSON rendering of bound objects

use crate::converters;
use crate::dataobjects::{AnyElement, DataObject, Value};
use crate::error::{Error, Result};
use crate::namespaces::NamespaceMap;
use serde_json::{Map, Value as Json};

/// Renders bound objects as JSON
///
/// Objects become JSON objects keyed by field name.
/// Scalars without a JSON counterpart (decimals, dates, binary data) are
/// written in their XML lexical form, and QNames in Clark notation.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    /// Create a compact serializer
    pub fn new() -> Self {
        Self::default()
    }

    /// Indent the output
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// The object as a JSON value
    pub fn to_value(&self, obj: &DataObject) -> Json {
        object_to_json(obj)
    }

    /// The object as JSON text
    pub fn render(&self, obj: &DataObject) -> Result<String> {
        let value = self.to_value(obj);
        let rendered = if self.pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        };
        rendered.map_err(|e| Error::Conversion(format!("Failed to render JSON: {}", e)))
    }
}

fn object_to_json(obj: &DataObject) -> Json {
    let map: Map<String, Json> = obj
        .fields()
        .iter()
        .map(|(name, value)| (name.clone(), value_to_json(value)))
        .collect();
    Json::Object(map)
}

fn any_to_json(any: &AnyElement) -> Json {
    let mut map = Map::new();
    map.insert(
        "qname".to_string(),
        any.qname.as_ref().map_or(Json::Null, |q| Json::String(q.to_string())),
    );
    map.insert("text".to_string(), optional_string(any.text.as_deref()));
    map.insert("tail".to_string(), optional_string(any.tail.as_deref()));
    map.insert(
        "attributes".to_string(),
        Json::Object(
            any.attributes
                .iter()
                .map(|(k, v)| (k.to_string(), Json::String(v.clone())))
                .collect(),
        ),
    );
    map.insert(
        "children".to_string(),
        Json::Array(any.children.iter().map(value_to_json).collect()),
    );
    Json::Object(map)
}

fn optional_string(text: Option<&str>) -> Json {
    text.map_or(Json::Null, |t| Json::String(t.to_string()))
}

fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::String(s) => Json::String(s.clone()),
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .unwrap_or_else(|| Json::String(f.to_string())),
        Value::QName(qname) => Json::String(qname.to_string()),
        Value::List(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Object(obj) => object_to_json(obj),
        Value::Any(any) => any_to_json(any),
        Value::Derived(derived) => {
            let mut map = Map::new();
            map.insert("qname".to_string(), Json::String(derived.qname.to_string()));
            map.insert(
                "type".to_string(),
                derived
                    .xsi_type
                    .as_ref()
                    .map_or(Json::Null, |t| Json::String(t.to_string())),
            );
            map.insert("value".to_string(), value_to_json(&derived.value));
            Json::Object(map)
        }
        Value::Attributes(attributes) => Json::Object(
            attributes
                .iter()
                .map(|(k, v)| (k.to_string(), Json::String(v.clone())))
                .collect(),
        ),
        lexical => match converters::serialize(lexical, &[], &NamespaceMap::new()) {
            Ok(text) => Json::String(text),
            Err(e) => {
                tracing::warn!(error = %e, "value has no JSON form");
                Json::Null
            }
        },
    }
}
