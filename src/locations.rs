//! Resource location resolution
//!
//! This module handles resolution of resource locations (URLs, file paths)
//! for loading documents and the targets of `xi:include` directives.

use crate::error::{Error, Result};
use std::path::PathBuf;
use url::Url;

/// Resource location - can be a URL, file path, or string identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// File system path
    Path(PathBuf),
    /// URL (file, http, https, ...)
    Url(Url),
    /// String identifier (for in-memory resources)
    String(String),
}

impl Location {
    /// Create a location from a string (auto-detect type)
    pub fn parse(s: &str) -> Result<Self> {
        if let Ok(url) = Url::parse(s) {
            if url.scheme() == "file" {
                return url
                    .to_file_path()
                    .map(Location::Path)
                    .map_err(|_| Error::Resource(format!("Invalid file URL: {}", s)));
            }
            // Windows drive letters parse as a one-letter scheme
            if url.scheme().len() > 1 {
                return Ok(Location::Url(url));
            }
        }

        let path = PathBuf::from(s);
        if path.exists() || s.starts_with('/') || s.starts_with('.') {
            return Ok(Location::Path(path));
        }

        Ok(Location::String(s.to_string()))
    }

    /// Get the location as a string
    pub fn as_str(&self) -> String {
        match self {
            Location::Path(p) => p.to_string_lossy().to_string(),
            Location::Url(u) => u.to_string(),
            Location::String(s) => s.clone(),
        }
    }

    /// Resolve a relative reference against this location
    pub fn join(&self, href: &str) -> Result<Location> {
        if let Ok(url) = Url::parse(href) {
            if url.scheme().len() > 1 {
                return Location::parse(url.as_str());
            }
        }

        match self {
            Location::Path(base) => {
                let href_path = PathBuf::from(href);
                if href_path.is_absolute() {
                    return Ok(Location::Path(href_path));
                }
                let dir = if base.is_dir() {
                    base.clone()
                } else {
                    base.parent().map(|p| p.to_path_buf()).unwrap_or_default()
                };
                Ok(Location::Path(dir.join(href_path)))
            }
            Location::Url(base) => Location::parse(base.join(href)?.as_str()),
            Location::String(_) => Location::parse(href),
        }
    }

    /// Check if this is a remote location (URL)
    pub fn is_remote(&self) -> bool {
        matches!(self, Location::Url(_))
    }

    /// Check if this is a local file
    pub fn is_file(&self) -> bool {
        matches!(self, Location::Path(_))
    }
}
