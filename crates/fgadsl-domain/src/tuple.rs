//! Relationship tuple helpers used by tuple forms.
//!
//! These turn loosely typed form input (`alice`, `readme`) into the
//! `type:id` strings OpenFGA stores, and model the tuple document itself.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// User type assumed when none is suggested.
const DEFAULT_USER_TYPE: &str = "user";

/// Formats a tuple user, prefixing `type:` unless the input already names
/// a type (`user:alice`) or a userset (`group:eng#member`).
///
/// ```
/// use fgadsl_domain::tuple::format_tuple_user;
///
/// assert_eq!(format_tuple_user("alice", None), "user:alice");
/// assert_eq!(format_tuple_user("eng", Some("team")), "team:eng");
/// assert_eq!(format_tuple_user("user:*", Some("team")), "user:*");
/// ```
pub fn format_tuple_user(user: &str, suggested_type: Option<&str>) -> String {
    if user.contains(':') || user.contains('#') {
        return user.to_string();
    }
    format!("{}:{}", suggested_type.unwrap_or(DEFAULT_USER_TYPE), user)
}

/// Formats a tuple object, prefixing `object_type:` unless already typed.
pub fn format_tuple_object(object: &str, object_type: &str) -> String {
    if object.contains(':') {
        object.to_string()
    } else {
        format!("{object_type}:{object}")
    }
}

/// An object reference split into type and id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TupleObject {
    /// The type portion (e.g., "document").
    pub object_type: String,
    /// The ID portion (e.g., "readme"); may itself contain `:`.
    pub object_id: String,
}

impl TupleObject {
    /// Creates a new TupleObject from type and ID.
    pub fn new(object_type: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            object_id: object_id.into(),
        }
    }

    /// Splits on the first `:`. Input without a `:` is all type, empty id.
    pub fn parse(value: &str) -> Self {
        match value.split_once(':') {
            Some((object_type, object_id)) => Self::new(object_type, object_id),
            None => Self::new(value, ""),
        }
    }
}

impl fmt::Display for TupleObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_type, self.object_id)
    }
}

/// Condition attached to a written tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleCondition {
    pub name: String,
    /// Parameter values known at write time.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub context: Map<String, Value>,
}

/// A tuple representing a relationship (user, relation, object).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipTuple {
    /// The user (subject) of the relationship.
    pub user: String,
    /// The relation between user and object.
    pub relation: String,
    /// The object of the relationship.
    pub object: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<TupleCondition>,
}

impl RelationshipTuple {
    /// Creates a new unconditioned tuple.
    pub fn new(
        user: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            relation: relation.into(),
            object: object.into(),
            condition: None,
        }
    }

    /// Attaches a condition with its context.
    pub fn with_condition(mut self, name: impl Into<String>, context: Map<String, Value>) -> Self {
        self.condition = Some(TupleCondition {
            name: name.into(),
            context,
        });
        self
    }
}
