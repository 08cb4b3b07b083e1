// Allow dead_code because each test file is compiled as a separate crate,
// so not all helper functions are used in every test file.
#![allow(dead_code)]

use anyhow::Result;
use fgadsl_domain::{compile, AuthorizationModel};
use serde_json::{json, Value};

// ============================================================================
// Fixture Models
// ============================================================================

/// A document sharing model in canonical DSL layout.
///
/// Covers every relation shape: direct assignment with plain, userset,
/// wildcard and conditioned user types, computed usersets, tuple to userset
/// and multi-way unions.
pub const SHARING_MODEL: &str = "model
  schema 1.1

condition non_expired_grant(current_time: timestamp, grant_time: timestamp, grant_duration: duration) {
  current_time < grant_time + grant_duration
}

type user

type group
  relations
    define member: [user, group#member]

type folder
  relations
    define owner: [user]
    define viewer: [user, group#member] or owner

type document
  relations
    define parent: [folder]
    define owner: [user]
    define editor: [user with non_expired_grant] or owner
    define viewer: [user, group#member, user:*] or editor or viewer from parent
    define can_view: viewer or owner
";

/// The sharing model as someone would type it: comments, uneven
/// indentation, and a condition block spread over several lines after the
/// types that use it.
pub const HANDWRITTEN_SHARING_MODEL: &str = r#"
# Document sharing
model
    schema 1.1

type user

type group
  relations
    define member: [user, group#member]   # nested groups

type folder
  relations
      define owner: [user]
      define viewer: [user, group#member] or owner

type document
  relations
    define parent: [folder]
    define owner: [user]
    define editor: [user with non_expired_grant] or owner
    define viewer: [user, group#member, user:*] or editor or viewer from parent
    define can_view: viewer or owner

condition non_expired_grant(
    current_time: timestamp,
    grant_time: timestamp,
    grant_duration: duration
) {
  current_time < grant_time + grant_duration
}
"#;

/// The sharing model as stored by the OpenFGA API.
pub fn sharing_model_json() -> Value {
    json!({
        "schema_version": "1.1",
        "type_definitions": [
            { "type": "user" },
            {
                "type": "group",
                "relations": { "member": { "this": {} } },
                "metadata": {
                    "relations": {
                        "member": {
                            "directly_related_user_types": [
                                { "type": "user" },
                                { "type": "group", "relation": "member" }
                            ]
                        }
                    }
                }
            },
            {
                "type": "folder",
                "relations": {
                    "owner": { "this": {} },
                    "viewer": {
                        "union": {
                            "child": [
                                { "this": {} },
                                { "computedUserset": { "relation": "owner" } }
                            ]
                        }
                    }
                },
                "metadata": {
                    "relations": {
                        "owner": { "directly_related_user_types": [{ "type": "user" }] },
                        "viewer": {
                            "directly_related_user_types": [
                                { "type": "user" },
                                { "type": "group", "relation": "member" }
                            ]
                        }
                    }
                }
            },
            {
                "type": "document",
                "relations": {
                    "parent": { "this": {} },
                    "owner": { "this": {} },
                    "editor": {
                        "union": {
                            "child": [
                                { "this": {} },
                                { "computedUserset": { "relation": "owner" } }
                            ]
                        }
                    },
                    "viewer": {
                        "union": {
                            "child": [
                                { "this": {} },
                                { "computedUserset": { "relation": "editor" } },
                                {
                                    "tupleToUserset": {
                                        "tupleset": { "relation": "parent" },
                                        "computedUserset": { "relation": "viewer" }
                                    }
                                }
                            ]
                        }
                    },
                    "can_view": {
                        "union": {
                            "child": [
                                { "computedUserset": { "relation": "viewer" } },
                                { "computedUserset": { "relation": "owner" } }
                            ]
                        }
                    }
                },
                "metadata": {
                    "relations": {
                        "parent": { "directly_related_user_types": [{ "type": "folder" }] },
                        "owner": { "directly_related_user_types": [{ "type": "user" }] },
                        "editor": {
                            "directly_related_user_types": [
                                { "type": "user", "condition": "non_expired_grant" }
                            ]
                        },
                        "viewer": {
                            "directly_related_user_types": [
                                { "type": "user" },
                                { "type": "group", "relation": "member" },
                                { "type": "user", "wildcard": {} }
                            ]
                        },
                        "can_view": { "directly_related_user_types": [] }
                    }
                }
            }
        ],
        "conditions": {
            "non_expired_grant": {
                "name": "non_expired_grant",
                "expression": "current_time < grant_time + grant_duration",
                "parameters": {
                    "current_time": { "type_name": "TYPE_NAME_TIMESTAMP" },
                    "grant_time": { "type_name": "TYPE_NAME_TIMESTAMP" },
                    "grant_duration": { "type_name": "TYPE_NAME_DURATION" }
                }
            }
        }
    })
}

// ============================================================================
// Helpers
// ============================================================================

/// Compiles the canonical sharing model.
pub fn sharing_model() -> Result<AuthorizationModel> {
    Ok(compile(SHARING_MODEL)?)
}

/// Wraps `relations` (already indented `define` lines) in a model with a
/// `user` type and a `document` type.
pub fn model_with_document(relations: &str) -> String {
    format!("model\n  schema 1.1\n\ntype user\n\ntype document\n  relations\n{relations}")
}

/// Wraps a condition block in a model whose only relation is `document#viewer`.
pub fn model_with_condition(condition: &str) -> String {
    format!(
        "model\n  schema 1.1\n\n{condition}\n\ntype user\n\ntype document\n  relations\n    define viewer: [user]\n"
    )
}
