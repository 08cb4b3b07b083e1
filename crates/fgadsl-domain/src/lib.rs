//! fgadsl-domain: OpenFGA authorization model compiler
//!
//! This crate converts authorization models between the OpenFGA DSL and the
//! JSON document the OpenFGA API stores, and derives the metadata editors
//! need for relation and user type suggestions:
//! - DSL parsing and canonical DSL rendering
//! - Condition block parsing and expression shape validation
//! - JSON wire format reading and writing
//! - Model validation
//! - Relationship metadata extraction and tuple helpers
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                fgadsl-domain                 │
//! ├─────────────────────────────────────────────┤
//! │  model/      - Types, DSL parser & writer   │
//! │  condition/  - Condition blocks             │
//! │  wire        - OpenFGA JSON documents       │
//! │  validation/ - Model validation             │
//! │  metadata    - Relationship metadata        │
//! │  tuple       - Tuple formatting helpers     │
//! │  compiler    - JSON-or-DSL entry points     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use fgadsl_domain::{compile, extract_metadata, to_dsl};
//!
//! let model = compile(
//!     "model\n  schema 1.1\n\ntype user\n\ntype document\n  relations\n    define viewer: [user, user:*]\n",
//! )
//! .unwrap();
//!
//! let metadata = extract_metadata(&model);
//! assert_eq!(
//!     metadata.user_types_for("document", "viewer").unwrap(),
//!     &["user", "user:*"]
//! );
//! assert!(to_dsl(&model).contains("define viewer: [user, user:*]"));
//! ```

pub mod compiler;
pub mod condition;
pub mod config;
pub mod error;
pub mod metadata;
pub mod model;
pub mod tuple;
pub mod validation;
pub mod wire;

// Re-export commonly used types at the crate root
pub use compiler::{compile, compile_with, parse_source, ModelFormat};
pub use config::CompilerConfig;
pub use error::{DomainError, DomainResult};
pub use metadata::{extract_metadata, extract_metadata_with, RelationshipMetadata, TypeMetadata};
pub use model::{parse, to_dsl, AuthorizationModel};
pub use wire::{model_from_json, model_to_json, model_to_json_string, WireError};
