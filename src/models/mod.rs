//! Model classes and their binding metadata
//!
//! - [`descriptors`]: model classes declared as data
//! - [`registry`]: the explicit class registry and [`ClassId`] handles
//! - [`elements`]: per-class [`XmlMeta`] and per-field [`XmlVar`]
//! - [`builders`]: the [`XmlMetaBuilder`] turning descriptors into metadata

pub mod builders;
pub mod descriptors;
pub mod elements;
pub mod registry;

pub use builders::XmlMetaBuilder;
pub use descriptors::{ClassDescriptor, FieldDescriptor, FieldTag, FieldType, Occurs};
pub use elements::{VarType, XmlMeta, XmlVar};
pub use registry::{ClassId, ClassRegistry};
