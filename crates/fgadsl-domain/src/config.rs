//! Compiler configuration.

use serde::{Deserialize, Serialize};

use crate::model::DEFAULT_SCHEMA_VERSION;

/// Knobs shared by the parser, compiler and metadata extractor.
///
/// Every field has a serde default so partial YAML or environment overrides
/// deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Schema version given to DSL models without a `schema` line.
    #[serde(default = "default_schema_version")]
    pub default_schema_version: String,

    /// User type offered for relations with no direct user types.
    #[serde(default = "default_fallback_user_type")]
    pub fallback_user_type: String,

    /// Largest input accepted by the compiler, in bytes.
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: usize,
}

fn default_schema_version() -> String {
    DEFAULT_SCHEMA_VERSION.to_string()
}

fn default_fallback_user_type() -> String {
    "user".to_string()
}

fn default_max_input_bytes() -> usize {
    1024 * 1024
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            default_schema_version: default_schema_version(),
            fallback_user_type: default_fallback_user_type(),
            max_input_bytes: default_max_input_bytes(),
        }
    }
}
