//! Class transformation pipeline
//!
//! Schema-derived classes are held in an intermediate model
//! ([`Class`], [`Attr`]) inside a [`ClassContainer`]. A
//! [`ClassPipeline`] of [`ClassHandler`]s rewrites them, after which
//! [`ClassContainer::to_descriptors`] produces descriptors ready to be
//! registered with an [`XmlContext`](crate::XmlContext).
//!
//! # Example
//!
//! ```
//! use xmlbind::codegen::{Class, ClassContainer, ClassPipeline, Tag};
//! use xmlbind::namespaces::QName;
//!
//! let para = Class::new(QName::local("para"), Tag::ComplexType).mixed();
//! let mut container: ClassContainer = vec![para].into_iter().collect();
//! container.process(&ClassPipeline::standard());
//!
//! let para = &container.classes()[0];
//! assert_eq!(para.attrs[0].name, "content");
//! ```

pub mod container;
pub mod handlers;
mod lowering;
pub mod models;

pub use container::ClassContainer;
pub use handlers::{AttributeEnumUnionHandler, AttributeImpliedHandler, ClassHandler, ClassPipeline};
pub use models::{Attr, AttrType, Class, Restrictions, Tag};
