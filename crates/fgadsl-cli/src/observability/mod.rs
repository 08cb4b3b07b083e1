//! Observability for the `fgadsl` command.
//!
//! Logging only. Log output goes to stderr so stdout carries nothing but the
//! command's result.

mod logging;

pub use logging::{create_json_layer, init_logging, LoggingConfig};
