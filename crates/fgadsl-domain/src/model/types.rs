//! Core type definitions for the authorization model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Schema version assumed when a model does not declare one.
pub const DEFAULT_SCHEMA_VERSION: &str = "1.1";

/// An authorization model defining types, their relations, and conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationModel {
    /// Schema version (e.g., "1.1").
    pub schema_version: String,
    /// Type definitions in declaration order.
    pub type_definitions: Vec<TypeDefinition>,
    /// Conditions in declaration order, unique by name.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl AuthorizationModel {
    /// Creates an empty model with the given schema version.
    pub fn new(schema_version: impl Into<String>) -> Self {
        Self {
            schema_version: schema_version.into(),
            type_definitions: Vec::new(),
            conditions: Vec::new(),
        }
    }

    /// Creates a model from a list of type definitions.
    pub fn with_types(schema_version: impl Into<String>, types: Vec<TypeDefinition>) -> Self {
        Self {
            schema_version: schema_version.into(),
            type_definitions: types,
            conditions: Vec::new(),
        }
    }

    /// Looks up a type definition by name.
    pub fn type_definition(&self, type_name: &str) -> Option<&TypeDefinition> {
        self.type_definitions
            .iter()
            .find(|td| td.type_name == type_name)
    }

    /// Looks up a condition by name.
    pub fn condition(&self, name: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.name == name)
    }
}

impl Default for AuthorizationModel {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEMA_VERSION)
    }
}

/// A type definition within the authorization model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDefinition {
    /// The type name (e.g., "document", "folder").
    pub type_name: String,
    /// Relations defined on this type, in declaration order.
    #[serde(default)]
    pub relations: Vec<RelationDefinition>,
}

impl TypeDefinition {
    /// Creates a type definition with no relations.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            relations: Vec::new(),
        }
    }

    /// Adds a relation, returning `self` for chaining.
    pub fn with_relation(mut self, relation: RelationDefinition) -> Self {
        self.relations.push(relation);
        self
    }

    /// Looks up a relation by name.
    pub fn relation(&self, name: &str) -> Option<&RelationDefinition> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Returns the relation names in declaration order.
    pub fn relation_names(&self) -> impl Iterator<Item = &str> {
        self.relations.iter().map(|r| r.name.as_str())
    }

    /// Returns the directly related user types declared for `relation`.
    ///
    /// Unknown relations yield an empty slice.
    pub fn directly_related_user_types(&self, relation: &str) -> &[DirectUserType] {
        self.relation(relation)
            .map(|r| r.directly_related_user_types.as_slice())
            .unwrap_or(&[])
    }
}

/// A relation definition on a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDefinition {
    /// The relation name.
    pub name: String,
    /// The userset rewrite for this relation.
    pub rewrite: Userset,
    /// User types that may be written directly for this relation.
    ///
    /// Only meaningful when `rewrite` contains a [`Userset::This`] node.
    #[serde(default)]
    pub directly_related_user_types: Vec<DirectUserType>,
}

impl RelationDefinition {
    /// Creates a relation with the given rewrite and no direct user types.
    pub fn new(name: impl Into<String>, rewrite: Userset) -> Self {
        Self {
            name: name.into(),
            rewrite,
            directly_related_user_types: Vec::new(),
        }
    }

    /// Creates a relation with a rewrite and its direct user types.
    pub fn with_direct_types(
        name: impl Into<String>,
        rewrite: Userset,
        directly_related_user_types: Vec<DirectUserType>,
    ) -> Self {
        Self {
            name: name.into(),
            rewrite,
            directly_related_user_types,
        }
    }
}

/// A userset defines how a relation is computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Userset {
    /// Direct assignment (this).
    This,
    /// Computed userset from another relation on the same object.
    ComputedUserset { relation: String },
    /// Tuple to userset (`computed_userset from tupleset`).
    TupleToUserset {
        tupleset: String,
        computed_userset: String,
    },
    /// Union of two or more usersets, in source order.
    Union { children: Vec<Userset> },
}

impl Userset {
    /// Shorthand for a computed userset.
    pub fn computed(relation: impl Into<String>) -> Self {
        Userset::ComputedUserset {
            relation: relation.into(),
        }
    }

    /// Shorthand for a tuple to userset: `computed from tupleset`.
    pub fn tuple_to_userset(tupleset: impl Into<String>, computed: impl Into<String>) -> Self {
        Userset::TupleToUserset {
            tupleset: tupleset.into(),
            computed_userset: computed.into(),
        }
    }

    /// Builds a union from `children`, in canonical form.
    ///
    /// Nested unions are flattened, a direct assignment moves to the front and
    /// a single remaining child is returned as is.
    pub fn union(children: Vec<Userset>) -> Self {
        let mut flat = Vec::with_capacity(children.len());
        for child in children {
            match child {
                Userset::Union { children } => flat.extend(children),
                other => flat.push(other),
            }
        }
        if let Some(index) = flat.iter().position(|c| *c == Userset::This) {
            let direct = flat.remove(index);
            flat.insert(0, direct);
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Userset::Union { children: flat }
        }
    }

    /// Returns true if this node or any descendant is a direct assignment.
    pub fn has_direct(&self) -> bool {
        self.direct_count() > 0
    }

    /// Counts the direct assignment nodes in this tree.
    pub fn direct_count(&self) -> usize {
        match self {
            Userset::This => 1,
            Userset::Union { children } => children.iter().map(Userset::direct_count).sum(),
            Userset::ComputedUserset { .. } | Userset::TupleToUserset { .. } => 0,
        }
    }
}

/// A user type that may be directly related through a tuple.
///
/// Renders as `type`, `type#relation`, `type:*`, optionally followed by
/// ` with condition`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirectUserType {
    /// The user type name (e.g., "user", "group").
    pub type_name: String,
    /// Relation for userset references (`group#member`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    /// Whether every instance of the type is allowed (`user:*`).
    #[serde(default)]
    pub wildcard: bool,
    /// Condition the tuple must carry (`user with non_expired_grant`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl DirectUserType {
    /// A plain type reference such as `user`.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            relation: None,
            wildcard: false,
            condition: None,
        }
    }

    /// A userset reference such as `group#member`.
    pub fn userset(type_name: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            relation: Some(relation.into()),
            ..Self::new(type_name)
        }
    }

    /// A wildcard such as `user:*`.
    pub fn wildcard(type_name: impl Into<String>) -> Self {
        Self {
            wildcard: true,
            ..Self::new(type_name)
        }
    }

    /// Attaches a condition reference.
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

impl fmt::Display for DirectUserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name)?;
        if let Some(relation) = &self.relation {
            write!(f, "#{relation}")?;
        } else if self.wildcard {
            f.write_str(":*")?;
        }
        if let Some(condition) = &self.condition {
            write!(f, " with {condition}")?;
        }
        Ok(())
    }
}

/// Parameter types a condition may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Timestamp,
    Duration,
    Int,
    Bool,
    String,
}

impl ParamType {
    pub const ALL: [ParamType; 5] = [
        ParamType::Timestamp,
        ParamType::Duration,
        ParamType::Int,
        ParamType::Bool,
        ParamType::String,
    ];

    /// The DSL spelling (`timestamp`, `int`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::Timestamp => "timestamp",
            ParamType::Duration => "duration",
            ParamType::Int => "int",
            ParamType::Bool => "bool",
            ParamType::String => "string",
        }
    }

    /// The OpenFGA API spelling (`TYPE_NAME_TIMESTAMP`, ...).
    pub fn wire_name(&self) -> &'static str {
        match self {
            ParamType::Timestamp => "TYPE_NAME_TIMESTAMP",
            ParamType::Duration => "TYPE_NAME_DURATION",
            ParamType::Int => "TYPE_NAME_INT",
            ParamType::Bool => "TYPE_NAME_BOOL",
            ParamType::String => "TYPE_NAME_STRING",
        }
    }
}

impl FromStr for ParamType {
    type Err = String;

    /// Accepts the DSL spelling case-insensitively, or the `TYPE_NAME_*` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let bare = lowered.strip_prefix("type_name_").unwrap_or(&lowered);
        ParamType::ALL
            .into_iter()
            .find(|t| t.as_str() == bare)
            .ok_or_else(|| s.trim().to_string())
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared condition parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionParameter {
    pub name: String,
    pub param_type: ParamType,
}

impl ConditionParameter {
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
        }
    }
}

/// A named, parameterized boolean expression attachable to direct user types.
///
/// The expression is validated for shape but never evaluated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
    /// Parameters in declaration order.
    pub parameters: Vec<ConditionParameter>,
    pub expression: String,
}

impl Condition {
    /// Looks up a parameter's declared type.
    pub fn parameter(&self, name: &str) -> Option<ParamType> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.param_type)
    }
}
