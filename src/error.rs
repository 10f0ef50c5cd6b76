//! Error types for xmlbind
//!
//! This module defines all error types used throughout the library.
//! Definition errors are raised while building class metadata, handler
//! errors when an event source asks for something a handler cannot do,
//! and structure errors when the event stream itself is unbalanced.

use std::fmt;
use thiserror::Error;

/// Result type alias using xmlbind Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for xmlbind operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed model class definition
    #[error("definition error: {0}")]
    Definition(#[from] DefinitionError),

    /// Handler protocol error, displayed verbatim
    #[error("{0}")]
    Handler(String),

    /// Unbalanced or corrupt event stream
    #[error("structure error: {0}")]
    Structure(String),

    /// Required field left unpopulated when its element closed
    #[error("missing required field `{field}` in `{class}`")]
    MissingField {
        /// Class name
        class: String,
        /// Field name
        field: String,
    },

    /// Document does not fit the bound class
    #[error("parser error: {0}")]
    Parser(String),

    /// Scalar conversion error
    #[error("conversion error: {0}")]
    Conversion(String),

    /// Context lookup error (unknown class, unsupported node operation)
    #[error("context error: {0}")]
    Context(String),

    /// Resource loading error
    #[error("resource error: {0}")]
    Resource(String),

    /// Namespace error
    #[error("namespace error: {0}")]
    Namespace(String),

    /// Name error (invalid XML name)
    #[error("name error: {0}")]
    Name(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// URL parsing error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

/// Model class definition error with context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionError {
    /// Error message
    pub message: String,
    /// Class that failed to build
    pub class: Option<String>,
    /// Offending field
    pub field: Option<String>,
}

impl DefinitionError {
    /// Create a new definition error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            class: None,
            field: None,
        }
    }

    /// Set the class name
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Set the field name
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl fmt::Display for DefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref class) = self.class {
            write!(f, " (class `{}`", class)?;
            if let Some(ref field) = self.field {
                write!(f, ", field `{}`", field)?;
            }
            write!(f, ")")?;
        }

        Ok(())
    }
}

impl std::error::Error for DefinitionError {}
