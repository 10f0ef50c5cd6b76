//! Reading documents for a parse session
//!
//! The [`Loader`] is the only place the parsers touch the filesystem. It
//! serves the input document of `XmlParser::from_path` and every
//! `xi:include` target, and applies the session [`Limits`] to each of them.
//! Remote URLs are refused; a `file:` URL is read like a path.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::locations::Location;

#[derive(Debug, Clone, Default)]
pub struct Loader {
    limits: Limits,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Load a resource as UTF-8 text
    pub fn load(&self, location: &Location) -> Result<String> {
        let bytes = self.load_bytes(location)?;
        String::from_utf8(bytes).map_err(|e| {
            Error::Resource(format!("'{}' is not valid UTF-8: {}", location.as_str(), e))
        })
    }

    /// Load a resource as raw bytes
    pub fn load_bytes(&self, location: &Location) -> Result<Vec<u8>> {
        let bytes = match location {
            Location::Path(path) => read_file(path)?,
            Location::Url(url) if url.scheme() == "file" => {
                let path = url.to_file_path().map_err(|_| {
                    Error::Resource(format!("'{}' does not name a local file", url))
                })?;
                read_file(&path)?
            }
            Location::Url(url) => {
                return Err(Error::Resource(format!(
                    "Remote resources are not allowed: {}",
                    url
                )))
            }
            Location::String(s) => s.as_bytes().to_vec(),
        };
        self.limits.check_document_size(bytes.len())?;
        tracing::trace!(location = %location.as_str(), size = bytes.len(), "loaded");
        Ok(bytes)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path)
        .map_err(|e| Error::Resource(format!("Failed to read file '{}': {}", path.display(), e)))
}
