//! Relationship metadata: per-type relation catalogs and the user types each
//! relation accepts, projected from a model for editor and form assistance.
//!
//! Extraction is a pure function of the model. It never fails; references to
//! conditions the model does not define are skipped.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::CompilerConfig;
use crate::model::{AuthorizationModel, Condition, TypeDefinition};

/// Metadata for every type of a model, plus its condition catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelationshipMetadata {
    pub types: BTreeMap<String, TypeMetadata>,
    pub conditions: BTreeMap<String, Condition>,
}

/// Relation catalog of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeMetadata {
    pub type_name: String,
    /// Relation names in declaration order.
    pub relations: Vec<String>,
    /// Formatted user types accepted by each relation.
    pub user_types: BTreeMap<String, Vec<String>>,
    /// First condition referenced by each relation's direct user types.
    pub conditions: BTreeMap<String, Condition>,
    /// Whether tuples can be written directly against this type.
    pub allow_direct_input: bool,
}

impl TypeMetadata {
    fn from_type(type_def: &TypeDefinition, model: &AuthorizationModel, fallback: &str) -> Self {
        let mut user_types = BTreeMap::new();
        let mut conditions = BTreeMap::new();

        for relation in &type_def.relations {
            let mut formatted: Vec<String> = Vec::new();
            for entry in &relation.directly_related_user_types {
                let text = entry.to_string();
                if !formatted.contains(&text) {
                    formatted.push(text);
                }
            }
            if formatted.is_empty() {
                formatted.push(fallback.to_string());
            }
            user_types.insert(relation.name.clone(), formatted);

            let condition = relation
                .directly_related_user_types
                .iter()
                .filter_map(|entry| entry.condition.as_deref())
                .find_map(|name| model.condition(name));
            if let Some(condition) = condition {
                conditions.insert(relation.name.clone(), condition.clone());
            }
        }

        Self {
            type_name: type_def.type_name.clone(),
            relations: type_def.relation_names().map(str::to_string).collect(),
            user_types,
            conditions,
            allow_direct_input: type_def.relations.iter().any(|r| r.rewrite.has_direct()),
        }
    }
}

/// Extracts metadata with the default fallback user type (`user`).
pub fn extract_metadata(model: &AuthorizationModel) -> RelationshipMetadata {
    extract_metadata_with(model, &CompilerConfig::default())
}

/// Extracts metadata using `config.fallback_user_type` for relations without
/// direct user types.
pub fn extract_metadata_with(
    model: &AuthorizationModel,
    config: &CompilerConfig,
) -> RelationshipMetadata {
    let types = model
        .type_definitions
        .iter()
        .map(|td| {
            (
                td.type_name.clone(),
                TypeMetadata::from_type(td, model, &config.fallback_user_type),
            )
        })
        .collect();
    let conditions = model
        .conditions
        .iter()
        .map(|c| (c.name.clone(), c.clone()))
        .collect();

    RelationshipMetadata { types, conditions }
}

/// The type part of a formatted user type (`group#member` is `group`).
fn base_type(formatted: &str) -> &str {
    formatted
        .split(|c: char| c == '#' || c == ':' || c.is_whitespace())
        .next()
        .unwrap_or(formatted)
}

impl RelationshipMetadata {
    /// User types accepted by `object_type#relation`.
    pub fn user_types_for(&self, object_type: &str, relation: &str) -> Option<&[String]> {
        self.types
            .get(object_type)?
            .user_types
            .get(relation)
            .map(Vec::as_slice)
    }

    /// Relations of `object_type` accepting users of `user_type`, in
    /// declaration order.
    pub fn relations_accepting(&self, object_type: &str, user_type: &str) -> Vec<&str> {
        let Some(meta) = self.types.get(object_type) else {
            return Vec::new();
        };
        meta.relations
            .iter()
            .filter(|relation| {
                meta.user_types
                    .get(relation.as_str())
                    .is_some_and(|types| types.iter().any(|t| base_type(t) == user_type))
            })
            .map(String::as_str)
            .collect()
    }

    /// The condition attached to `object_type#relation`, if any.
    pub fn condition_for(&self, object_type: &str, relation: &str) -> Option<&Condition> {
        self.types.get(object_type)?.conditions.get(relation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse;

    const MODEL: &str = r#"
model
  schema 1.1

type user

type group
  relations
    define member: [user, user:*]

type document
  relations
    define owner: [user with in_office, user]
    define editor: [user, group#member, user:*]
    define viewer: [user, user] or editor
    define can_view: viewer or owner

condition in_office(ip: string) {
  ip == "10.0.0.1"
}
"#;

    fn metadata() -> RelationshipMetadata {
        extract_metadata(&parse(MODEL).unwrap())
    }

    #[test]
    fn test_formats_user_types_in_order() {
        let meta = metadata();
        assert_eq!(
            meta.user_types_for("document", "editor").unwrap(),
            &["user", "group#member", "user:*"]
        );
        assert_eq!(
            meta.user_types_for("document", "owner").unwrap(),
            &["user with in_office", "user"]
        );
    }

    #[test]
    fn test_deduplicates_user_types() {
        let meta = metadata();
        assert_eq!(meta.user_types_for("document", "viewer").unwrap(), &["user"]);
    }

    #[test]
    fn test_falls_back_when_no_direct_types() {
        let meta = metadata();
        assert_eq!(meta.user_types_for("document", "can_view").unwrap(), &["user"]);

        let config = CompilerConfig {
            fallback_user_type: "employee".to_string(),
            ..Default::default()
        };
        let meta = extract_metadata_with(&parse(MODEL).unwrap(), &config);
        assert_eq!(
            meta.user_types_for("document", "can_view").unwrap(),
            &["employee"]
        );
    }

    #[test]
    fn test_relation_catalog() {
        let meta = metadata();
        let document = &meta.types["document"];
        assert_eq!(document.relations, vec!["owner", "editor", "viewer", "can_view"]);
        assert!(document.allow_direct_input);
        assert!(!meta.types["user"].allow_direct_input);
        assert!(meta.types["user"].relations.is_empty());
    }

    #[test]
    fn test_conditions_per_relation() {
        let meta = metadata();
        let condition = meta.condition_for("document", "owner").unwrap();
        assert_eq!(condition.name, "in_office");
        assert!(meta.condition_for("document", "editor").is_none());
        assert!(meta.conditions.contains_key("in_office"));
    }

    #[test]
    fn test_relations_accepting_matches_base_type() {
        let meta = metadata();
        assert_eq!(
            meta.relations_accepting("document", "user"),
            vec!["owner", "editor", "viewer", "can_view"]
        );
        assert_eq!(meta.relations_accepting("document", "group"), vec!["editor"]);
        assert!(meta.relations_accepting("document", "use").is_empty());
        assert!(meta.relations_accepting("missing", "user").is_empty());
    }

    #[test]
    fn test_lookups_on_unknown_names() {
        let meta = metadata();
        assert!(meta.user_types_for("document", "missing").is_none());
        assert!(meta.user_types_for("missing", "viewer").is_none());
    }
}
