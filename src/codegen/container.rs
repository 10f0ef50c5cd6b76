//! Class container

use super::handlers::ClassPipeline;
use super::models::Class;
use crate::namespaces::QName;

/// The set of classes being transformed
#[derive(Debug, Clone, Default)]
pub struct ClassContainer {
    classes: Vec<Class>,
}

impl ClassContainer {
    /// Create an empty container
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class
    pub fn add(&mut self, class: Class) {
        self.classes.push(class);
    }

    /// First class with the given qualified name
    pub fn find(&self, qname: &QName) -> Option<&Class> {
        self.classes.iter().find(|class| class.qname == *qname)
    }

    /// All classes, in insertion order
    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the container is empty
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Run every class, inner classes included, through the pipeline.
    ///
    /// Handlers observe the container as it was before this pass.
    pub fn process(&mut self, pipeline: &ClassPipeline) {
        let processed: Vec<Class> = self
            .classes
            .iter()
            .map(|class| self.apply(pipeline, class))
            .collect();
        tracing::debug!(classes = processed.len(), "processed classes");
        self.classes = processed;
    }

    fn apply(&self, pipeline: &ClassPipeline, class: &Class) -> Class {
        let mut processed = pipeline.apply(class, self);
        processed.inner = processed
            .inner
            .iter()
            .map(|inner| self.apply(pipeline, inner))
            .collect();
        processed
    }
}

impl FromIterator<Class> for ClassContainer {
    fn from_iter<I: IntoIterator<Item = Class>>(iter: I) -> Self {
        Self {
            classes: iter.into_iter().collect(),
        }
    }
}
