//! Class handlers
//!
//! A [`ClassHandler`] is a pure transform: it receives a class and the
//! container it lives in and returns the replacement class. Handlers are
//! chained by a [`ClassPipeline`].

mod attribute_enum_union;
mod attribute_implied;

pub use attribute_enum_union::AttributeEnumUnionHandler;
pub use attribute_implied::AttributeImpliedHandler;

use super::container::ClassContainer;
use super::models::Class;

/// Transform of one class
pub trait ClassHandler: Send + Sync {
    /// Return the replacement for `target`
    fn process(&self, target: &Class, container: &ClassContainer) -> Class;
}

/// Ordered chain of class handlers
#[derive(Default)]
pub struct ClassPipeline {
    handlers: Vec<Box<dyn ClassHandler>>,
}

impl ClassPipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler
    pub fn with_handler(mut self, handler: impl ClassHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Enumeration-union collapsing followed by implied mixed content
    pub fn standard() -> Self {
        Self::new()
            .with_handler(AttributeEnumUnionHandler)
            .with_handler(AttributeImpliedHandler)
    }

    /// Number of handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the pipeline has no handler
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run `target` through every handler in order
    pub fn apply(&self, target: &Class, container: &ClassContainer) -> Class {
        self.handlers
            .iter()
            .fold(target.clone(), |class, handler| handler.process(&class, container))
    }
}

impl std::fmt::Debug for ClassPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassPipeline")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
