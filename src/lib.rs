//! # xmlbind
//!
//! Schema-driven XML data binding.
//!
//! Model classes are described as data ([`models::ClassDescriptor`]) and
//! registered with an [`XmlContext`], which compiles them into cached
//! binding metadata ([`models::XmlMeta`]). An [`XmlParser`] streams a
//! document through an event handler (tree-based or SAX) into a stack of
//! binding nodes, producing a [`DataObject`]. The [`serializers`] render
//! objects back to XML or to JSON, and the [`codegen`] pipeline turns
//! schema-derived classes into descriptors.
//!
//! ## Features
//!
//! - Class metadata with namespace inheritance and naming conventions
//! - `xsi:type` polymorphism resolved through the context
//! - Mixed content and wildcard capture
//! - XInclude processing for the tree-based handler
//! - Protection against oversized or deeply nested documents
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use xmlbind::converters::DataType;
//! use xmlbind::models::{ClassDescriptor, FieldDescriptor};
//! use xmlbind::{HandlerKind, XmlContext, XmlParser};
//!
//! let context = Arc::new(XmlContext::new());
//! let point = context
//!     .register(
//!         ClassDescriptor::new("Point")
//!             .with_local_name("point")
//!             .with_field(FieldDescriptor::attribute("x", DataType::Int))
//!             .with_field(FieldDescriptor::attribute("y", DataType::Int)),
//!     )
//!     .unwrap();
//!
//! let mut parser = XmlParser::new(context).with_handler(HandlerKind::Sax);
//! let obj = parser.from_str(r#"<point x="1" y="2"/>"#, point).unwrap();
//! assert_eq!(obj.get("y").and_then(|v| v.as_i64()), Some(2));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod limits;

pub mod namespaces;
pub mod names;
pub mod locations;

pub mod loaders;
pub mod documents;

pub mod converters;
pub mod dataobjects;

pub mod models;
pub mod context;

pub mod parsers;
pub mod serializers;

pub mod codegen;

pub use context::{ContextConfig, XmlContext};
pub use dataobjects::{AnyElement, DataObject, DerivedElement, Value};
pub use error::{DefinitionError, Error, Result};
pub use limits::Limits;
pub use names::NameConvention;
pub use namespaces::QName;
pub use parsers::{HandlerKind, ParserConfig, XmlParser};
pub use serializers::{JsonSerializer, SerializerConfig, XmlSerializer};

/// Version of the xmlbind library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
