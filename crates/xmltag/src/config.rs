//! Decoder configuration.
//!
//! Settings can be built programmatically, deserialized with serde, or read
//! from the environment.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `XMLTAG_MAX_DEPTH` | 256 | Maximum element nesting below the top-level node |
//! | `XMLTAG_ALLOW_DTD` | false | Accept documents with a DTD |
//! | `XMLTAG_NODES_LIMIT` | 4294967295 | Maximum number of nodes per parsed document |
//!
//! # Example
//!
//! ```rust
//! use xmltag::DecoderConfig;
//!
//! let config = DecoderConfig {
//!     max_depth: 32,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Settings for a [`Decoder`](crate::Decoder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Maximum element nesting the path matcher will walk below the
    /// top-level node.
    pub max_depth: usize,

    /// Whether documents carrying a DTD are accepted by the parser.
    pub allow_dtd: bool,

    /// Maximum number of nodes the parser will allocate for one document.
    pub nodes_limit: u32,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            allow_dtd: false,
            nodes_limit: u32::MAX,
        }
    }
}

impl DecoderConfig {
    /// Creates a configuration from `XMLTAG_*` environment variables.
    ///
    /// Unset variables keep their default; unparsable ones are logged and
    /// ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_depth: env_or("XMLTAG_MAX_DEPTH", defaults.max_depth),
            allow_dtd: env_or("XMLTAG_ALLOW_DTD", defaults.allow_dtd),
            nodes_limit: env_or("XMLTAG_NODES_LIMIT", defaults.nodes_limit),
        }
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.max_depth == 0 {
            errors.push("Max depth cannot be 0".to_string());
        }

        if self.nodes_limit == 0 {
            errors.push("Nodes limit cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub(crate) fn parsing_options(&self) -> roxmltree::ParsingOptions {
        let mut options = roxmltree::ParsingOptions::default();
        options.allow_dtd = self.allow_dtd;
        options.nodes_limit = self.nodes_limit;
        options
    }
}

fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    let Ok(raw) = std::env::var(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable environment override");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DecoderConfig::default();
        assert_eq!(config.max_depth, 256);
        assert!(!config.allow_dtd);
        assert_eq!(config.nodes_limit, u32::MAX);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let config = DecoderConfig {
            max_depth: 0,
            nodes_limit: 0,
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: DecoderConfig = serde_json::from_str(r#"{"max_depth": 12}"#).unwrap();
        assert_eq!(config.max_depth, 12);
        assert_eq!(config.nodes_limit, u32::MAX);
    }

    #[test]
    fn test_env_override() {
        // Only this test touches these variables.
        unsafe {
            std::env::set_var("XMLTAG_MAX_DEPTH", "40");
            std::env::set_var("XMLTAG_ALLOW_DTD", "not-a-bool");
        }
        let config = DecoderConfig::from_env();
        unsafe {
            std::env::remove_var("XMLTAG_MAX_DEPTH");
            std::env::remove_var("XMLTAG_ALLOW_DTD");
        }
        assert_eq!(config.max_depth, 40);
        assert!(!config.allow_dtd);
    }

    #[test]
    fn test_parsing_options() {
        let config = DecoderConfig {
            allow_dtd: true,
            nodes_limit: 10,
            ..Default::default()
        };
        let options = config.parsing_options();
        assert!(options.allow_dtd);
        assert_eq!(options.nodes_limit, 10);
    }
}
