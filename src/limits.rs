//! Resource limits for a parse session
//!
//! A [`Limits`] value bounds what one `XmlParser` call may hold in memory:
//! how deep the open object stack grows, how large a loaded document is,
//! how wide a single element is and how deeply `xi:include` targets nest.
//! Every check fails with [`Error::LimitExceeded`].

use serde::Deserialize;

use crate::error::{Error, Result};

/// Parsing limits configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Limits {
    /// Maximum number of simultaneously open elements
    pub max_depth: usize,
    /// Maximum size in bytes of any loaded document, included ones too
    pub max_document_size: usize,
    /// Maximum number of attributes on one element
    pub max_attributes: usize,
    /// Maximum number of prefixes recorded in the session namespace map
    pub max_namespaces: usize,
    /// Maximum nesting of `xi:include` targets
    pub max_include_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: 1000,
            max_document_size: 100 * 1024 * 1024,
            max_attributes: 1000,
            max_namespaces: 1000,
            max_include_depth: 32,
        }
    }
}

impl Limits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits suited to untrusted input
    pub fn strict() -> Self {
        Self {
            max_depth: 100,
            max_document_size: 10 * 1024 * 1024,
            max_attributes: 100,
            max_namespaces: 100,
            max_include_depth: 4,
        }
    }

    /// Limits that effectively never trigger
    pub fn unbounded() -> Self {
        Self {
            max_depth: usize::MAX,
            max_document_size: usize::MAX,
            max_attributes: usize::MAX,
            max_namespaces: usize::MAX,
            max_include_depth: usize::MAX,
        }
    }

    pub fn check_depth(&self, depth: usize) -> Result<()> {
        check("Element depth", depth, self.max_depth)
    }

    pub fn check_document_size(&self, size: usize) -> Result<()> {
        check("Document size in bytes", size, self.max_document_size)
    }

    pub fn check_attributes(&self, count: usize) -> Result<()> {
        check("Attribute count", count, self.max_attributes)
    }

    pub fn check_namespaces(&self, count: usize) -> Result<()> {
        check("Namespace count", count, self.max_namespaces)
    }

    pub fn check_include_depth(&self, depth: usize) -> Result<()> {
        check("xi:include depth", depth, self.max_include_depth)
    }
}

fn check(what: &str, value: usize, max: usize) -> Result<()> {
    if value > max {
        Err(Error::LimitExceeded(format!("{} {} exceeds maximum {}", what, value, max)))
    } else {
        Ok(())
    }
}
