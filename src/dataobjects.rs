//! Bound model instances
//!
//! Model classes are described by data, so instances are dynamic records:
//! a [`DataObject`] holds one [`Value`] per field of its class, in field
//! declaration order.

use crate::models::ClassId;
use crate::namespaces::QName;
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use rust_decimal::Decimal;

/// A bound field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent optional value
    Null,
    /// Character data
    String(String),
    /// xs:boolean
    Bool(bool),
    /// xs:integer and its bounded derivatives
    Int(i64),
    /// xs:decimal
    Decimal(Decimal),
    /// xs:float and xs:double
    Float(f64),
    /// xs:date
    Date(NaiveDate),
    /// xs:time
    Time(NaiveTime),
    /// xs:dateTime, with the timezone if one was given
    DateTime {
        /// Local date and time
        value: NaiveDateTime,
        /// Timezone offset
        offset: Option<FixedOffset>,
    },
    /// xs:hexBinary and xs:base64Binary
    Bytes(Vec<u8>),
    /// xs:QName
    QName(QName),
    /// Sequence field contents, in document order
    List(Vec<Value>),
    /// Nested model instance
    Object(Box<DataObject>),
    /// Wildcard-captured element
    Any(Box<AnyElement>),
    /// Model instance bound through a wildcard by its `xsi:type`
    Derived(Box<DerivedElement>),
    /// Attributes captured by a catch-all attributes field
    Attributes(IndexMap<QName, String>),
}

impl Value {
    /// Whether this is [`Value::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// String contents
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer contents
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float contents
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Boolean contents
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// List contents
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Nested object, looking through derived wrappers
    pub fn as_object(&self) -> Option<&DataObject> {
        match self {
            Value::Object(obj) => Some(obj),
            Value::Derived(derived) => derived.value.as_object(),
            _ => None,
        }
    }

    /// Wildcard element contents
    pub fn as_any(&self) -> Option<&AnyElement> {
        match self {
            Value::Any(any) => Some(any),
            _ => None,
        }
    }

    /// Captured attributes
    pub fn as_attributes(&self) -> Option<&IndexMap<QName, String>> {
        match self {
            Value::Attributes(attrs) => Some(attrs),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<DataObject> for Value {
    fn from(value: DataObject) -> Self {
        Value::Object(Box::new(value))
    }
}

/// An instance of a registered model class
#[derive(Debug, Clone, PartialEq)]
pub struct DataObject {
    class: ClassId,
    class_name: String,
    fields: IndexMap<String, Value>,
}

impl DataObject {
    /// Create an empty instance
    pub fn new(class: ClassId, class_name: impl Into<String>) -> Self {
        Self {
            class,
            class_name: class_name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Set a field value
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// The model class of this instance
    pub fn class(&self) -> ClassId {
        self.class
    }

    /// The model class name
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Get a field value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Set a field value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Field values in declaration order
    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }
}

/// Element content captured by a wildcard field
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnyElement {
    /// Element name
    pub qname: Option<QName>,
    /// Text before the first child
    pub text: Option<String>,
    /// Text after the closing tag
    pub tail: Option<String>,
    /// Child elements
    pub children: Vec<Value>,
    /// Attributes
    pub attributes: IndexMap<QName, String>,
}

impl AnyElement {
    /// Create an element capture
    pub fn new(qname: QName) -> Self {
        Self {
            qname: Some(qname),
            ..Default::default()
        }
    }

    /// Set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Add a child
    pub fn with_child(mut self, child: Value) -> Self {
        self.children.push(child);
        self
    }

    /// Add an attribute
    pub fn with_attribute(mut self, qname: QName, value: impl Into<String>) -> Self {
        self.attributes.insert(qname, value.into());
        self
    }
}

/// A model instance bound through a wildcard by its explicit `xsi:type`
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedElement {
    /// Element name
    pub qname: QName,
    /// Bound value
    pub value: Value,
    /// Declared `xsi:type`
    pub xsi_type: Option<QName>,
}
