//! Parser configuration

use crate::limits::Limits;
use serde::Deserialize;

/// Options controlling how documents are bound
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ParserConfig {
    /// Base location for resolving `xi:include` targets of in-memory input
    pub base_url: Option<String>,
    /// Expand `xi:include` directives
    pub process_xinclude: bool,
    /// Fail on child elements no field accepts; otherwise skip them
    pub fail_on_unknown_properties: bool,
    /// Fail on attributes no field accepts; otherwise drop them
    pub fail_on_unknown_attributes: bool,
    /// Fail when text converts to none of the candidate types; otherwise
    /// keep the raw text
    pub fail_on_converter_warnings: bool,
    /// Resource limits
    pub limits: Limits,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            process_xinclude: false,
            fail_on_unknown_properties: true,
            fail_on_unknown_attributes: false,
            fail_on_converter_warnings: false,
            limits: Limits::default(),
        }
    }
}

impl ParserConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base location
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Expand `xi:include` directives
    pub fn with_xinclude(mut self, process_xinclude: bool) -> Self {
        self.process_xinclude = process_xinclude;
        self
    }

    /// Set whether unknown child elements fail the parse
    pub fn with_fail_on_unknown_properties(mut self, fail: bool) -> Self {
        self.fail_on_unknown_properties = fail;
        self
    }

    /// Set whether unknown attributes fail the parse
    pub fn with_fail_on_unknown_attributes(mut self, fail: bool) -> Self {
        self.fail_on_unknown_attributes = fail;
        self
    }

    /// Set whether conversion failures fail the parse
    pub fn with_fail_on_converter_warnings(mut self, fail: bool) -> Self {
        self.fail_on_converter_warnings = fail;
        self
    }

    /// Set the resource limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ParserConfig::default();
        assert!(config.fail_on_unknown_properties);
        assert!(!config.fail_on_unknown_attributes);
        assert!(!config.process_xinclude);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ParserConfig =
            serde_json::from_str(r#"{"process_xinclude": true, "base_url": "file:///tmp/"}"#)
                .unwrap();
        assert!(config.process_xinclude);
        assert!(config.fail_on_unknown_properties);
        assert_eq!(config.base_url.as_deref(), Some("file:///tmp/"));
    }
}
