//! Authorization model validation.
//!
//! Validates that authorization models are semantically correct:
//! - Type, relation and condition names are unique and writable as DSL
//! - The schema version is a single word
//! - Referenced relations, types and conditions exist
//! - Unions have at least two children, with any direct assignment first
//! - Direct assignments agree with the declared direct user types
//! - No cyclic computed relation definitions
//! - Condition expressions are well formed
//!
//! Every rule is checked and all violations are returned together.

use std::collections::{HashMap, HashSet};

use crate::condition::{validate_condition, ConditionError};
use crate::model::{
    is_valid_name, AuthorizationModel, DirectUserType, RelationDefinition, TypeDefinition, Userset,
};

/// Validation error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty model (no type definitions)
    EmptyModel,
    /// The schema version is empty or contains whitespace
    InvalidSchemaVersion { version: String },
    /// A type, relation or referenced name cannot be written as DSL
    InvalidName {
        /// What the name identifies: `type`, `relation` or `condition`
        kind: &'static str,
        name: String,
    },
    /// Two type definitions share a name
    DuplicateType { type_name: String },
    /// Two relations on one type share a name
    DuplicateRelation {
        type_name: String,
        relation_name: String,
    },
    /// Two conditions share a name
    DuplicateCondition { condition_name: String },
    /// A relation definition contains a cycle
    CyclicRelation {
        type_name: String,
        relation_name: String,
        cycle_path: Vec<String>,
    },
    /// A referenced relation does not exist
    UndefinedRelation {
        type_name: String,
        relation_name: String,
        referenced_relation: String,
    },
    /// Direct user type references an undefined type or relation
    InvalidTypeConstraint {
        type_name: String,
        relation_name: String,
        invalid_type: String,
    },
    /// Condition referenced in a direct user type does not exist
    UndefinedCondition {
        type_name: String,
        relation_name: String,
        condition_name: String,
    },
    /// A union with fewer than two children
    InvalidUnion {
        type_name: String,
        relation_name: String,
        children: usize,
    },
    /// A union holds its direct assignment after another child
    DirectAssignmentNotFirst {
        type_name: String,
        relation_name: String,
    },
    /// Direct assignment nodes disagree with the declared direct user types
    DirectAssignmentMismatch {
        type_name: String,
        relation_name: String,
        direct_nodes: usize,
        declared_types: usize,
    },
    /// A condition failed parsing rules (name, parameters, expression)
    InvalidCondition {
        condition_name: String,
        error: ConditionError,
    },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyModel => {
                write!(f, "model must have at least one type definition")
            }
            ValidationError::InvalidSchemaVersion { version } => {
                write!(f, "invalid schema version '{}'", version)
            }
            ValidationError::InvalidName { kind, name } => {
                write!(f, "invalid {} name '{}'", kind, name)
            }
            ValidationError::DuplicateType { type_name } => {
                write!(f, "type '{}' is defined more than once", type_name)
            }
            ValidationError::DuplicateRelation {
                type_name,
                relation_name,
            } => write!(
                f,
                "relation '{}' is defined more than once on type '{}'",
                relation_name, type_name
            ),
            ValidationError::DuplicateCondition { condition_name } => {
                write!(f, "condition '{}' is defined more than once", condition_name)
            }
            ValidationError::CyclicRelation {
                type_name,
                relation_name,
                cycle_path,
            } => write!(
                f,
                "cyclic relation definition in {}#{}: {}",
                type_name,
                relation_name,
                cycle_path.join(" -> ")
            ),
            ValidationError::UndefinedRelation {
                type_name,
                relation_name,
                referenced_relation,
            } => write!(
                f,
                "undefined relation '{}' referenced in {}#{}",
                referenced_relation, type_name, relation_name
            ),
            ValidationError::InvalidTypeConstraint {
                type_name,
                relation_name,
                invalid_type,
            } => write!(
                f,
                "invalid type constraint '{}' in {}#{}",
                invalid_type, type_name, relation_name
            ),
            ValidationError::UndefinedCondition {
                type_name,
                relation_name,
                condition_name,
            } => write!(
                f,
                "undefined condition '{}' referenced in {}#{}",
                condition_name, type_name, relation_name
            ),
            ValidationError::InvalidUnion {
                type_name,
                relation_name,
                children,
            } => write!(
                f,
                "union in {}#{} has {} children, at least 2 are required",
                type_name, relation_name, children
            ),
            ValidationError::DirectAssignmentNotFirst {
                type_name,
                relation_name,
            } => write!(
                f,
                "direct assignment in {}#{} must be the first union child",
                type_name, relation_name
            ),
            ValidationError::DirectAssignmentMismatch {
                type_name,
                relation_name,
                direct_nodes,
                declared_types,
            } => write!(
                f,
                "{}#{} has {} direct assignment nodes and {} declared direct user types",
                type_name, relation_name, direct_nodes, declared_types
            ),
            ValidationError::InvalidCondition {
                condition_name,
                error,
            } => write!(f, "invalid condition '{}': {}", condition_name, error),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, Vec<ValidationError>>;

/// Model validator
pub struct ModelValidator<'m> {
    /// Type definitions by name (first definition wins)
    types: HashMap<&'m str, &'m TypeDefinition>,
    /// All defined conditions in the model
    defined_conditions: HashSet<&'m str>,
}

impl<'m> ModelValidator<'m> {
    /// Create a new validator for the given model
    pub fn new(model: &'m AuthorizationModel) -> Self {
        let mut types = HashMap::new();
        for type_def in &model.type_definitions {
            types.entry(type_def.type_name.as_str()).or_insert(type_def);
        }
        let defined_conditions = model.conditions.iter().map(|c| c.name.as_str()).collect();

        Self {
            types,
            defined_conditions,
        }
    }

    /// Validate the model and return any errors found
    pub fn validate(&self, model: &AuthorizationModel) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if model.type_definitions.is_empty() {
            errors.push(ValidationError::EmptyModel);
            return Err(errors);
        }

        let version = &model.schema_version;
        if version.is_empty() || version.contains(char::is_whitespace) {
            errors.push(ValidationError::InvalidSchemaVersion {
                version: version.clone(),
            });
        }

        let mut seen_types = HashSet::new();
        for type_def in &model.type_definitions {
            check_name("type", &type_def.type_name, &mut errors);
            if !seen_types.insert(type_def.type_name.as_str()) {
                errors.push(ValidationError::DuplicateType {
                    type_name: type_def.type_name.clone(),
                });
            }
        }

        let mut seen_conditions = HashSet::new();
        for condition in &model.conditions {
            if !seen_conditions.insert(condition.name.as_str()) {
                errors.push(ValidationError::DuplicateCondition {
                    condition_name: condition.name.clone(),
                });
            }
            if let Err(error) = validate_condition(condition) {
                errors.push(ValidationError::InvalidCondition {
                    condition_name: condition.name.clone(),
                    error,
                });
            }
        }

        for type_def in &model.type_definitions {
            self.validate_type_definition(type_def, &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_type_definition(&self, type_def: &TypeDefinition, errors: &mut Vec<ValidationError>) {
        let mut seen = HashSet::new();
        for relation_def in &type_def.relations {
            check_name("relation", &relation_def.name, errors);
            if !seen.insert(relation_def.name.as_str()) {
                errors.push(ValidationError::DuplicateRelation {
                    type_name: type_def.type_name.clone(),
                    relation_name: relation_def.name.clone(),
                });
            }

            self.validate_direct_types(&type_def.type_name, relation_def, errors);
            self.validate_userset(type_def, &relation_def.name, &relation_def.rewrite, errors);
        }

        if let Some((relation_name, cycle_path)) = detect_cycle_in_type(type_def) {
            errors.push(ValidationError::CyclicRelation {
                type_name: type_def.type_name.clone(),
                relation_name,
                cycle_path,
            });
        }
    }

    /// Validate direct user types (e.g., [user], [group#member], [user with condition])
    fn validate_direct_types(
        &self,
        type_name: &str,
        relation_def: &RelationDefinition,
        errors: &mut Vec<ValidationError>,
    ) {
        let direct_nodes = relation_def.rewrite.direct_count();
        let declared_types = relation_def.directly_related_user_types.len();
        if direct_nodes > 1 || (direct_nodes == 0 && declared_types > 0) {
            errors.push(ValidationError::DirectAssignmentMismatch {
                type_name: type_name.to_string(),
                relation_name: relation_def.name.clone(),
                direct_nodes,
                declared_types,
            });
        }

        for entry in &relation_def.directly_related_user_types {
            check_name("type", &entry.type_name, errors);
            if let Some(relation) = &entry.relation {
                check_name("relation", relation, errors);
            }
            if let Some(condition) = &entry.condition {
                check_name("condition", condition, errors);
            }

            let target_ok = match &entry.relation {
                Some(relation) => self.relation_exists(&entry.type_name, relation),
                None => self.type_exists(&entry.type_name),
            };
            if !target_ok {
                errors.push(ValidationError::InvalidTypeConstraint {
                    type_name: type_name.to_string(),
                    relation_name: relation_def.name.clone(),
                    invalid_type: entry.to_string(),
                });
            }

            if let Some(condition_name) = &entry.condition {
                if !self.defined_conditions.contains(condition_name.as_str()) {
                    errors.push(ValidationError::UndefinedCondition {
                        type_name: type_name.to_string(),
                        relation_name: relation_def.name.clone(),
                        condition_name: condition_name.clone(),
                    });
                }
            }
        }
    }

    /// Validate a userset expression
    fn validate_userset(
        &self,
        type_def: &TypeDefinition,
        relation_name: &str,
        userset: &Userset,
        errors: &mut Vec<ValidationError>,
    ) {
        let undefined = |referenced: &str| ValidationError::UndefinedRelation {
            type_name: type_def.type_name.clone(),
            relation_name: relation_name.to_string(),
            referenced_relation: referenced.to_string(),
        };

        match userset {
            Userset::This => {}
            Userset::ComputedUserset { relation } => {
                if type_def.relation(relation).is_none() {
                    errors.push(undefined(relation));
                }
            }
            Userset::TupleToUserset {
                tupleset,
                computed_userset,
            } => match type_def.relation(tupleset) {
                None => errors.push(undefined(tupleset)),
                Some(tupleset_def) => {
                    // The computed relation must exist on at least one of the
                    // object types the tupleset points to.
                    let targets: Vec<&DirectUserType> = tupleset_def
                        .directly_related_user_types
                        .iter()
                        .filter(|t| t.relation.is_none() && !t.wildcard)
                        .collect();
                    if !targets.is_empty()
                        && !targets
                            .iter()
                            .any(|t| self.relation_exists(&t.type_name, computed_userset))
                    {
                        errors.push(undefined(&format!("{tupleset}->{computed_userset}")));
                    }
                }
            },
            Userset::Union { children } => {
                if children.len() < 2 {
                    errors.push(ValidationError::InvalidUnion {
                        type_name: type_def.type_name.clone(),
                        relation_name: relation_name.to_string(),
                        children: children.len(),
                    });
                }
                if children.iter().skip(1).any(|c| matches!(c, Userset::This)) {
                    errors.push(ValidationError::DirectAssignmentNotFirst {
                        type_name: type_def.type_name.clone(),
                        relation_name: relation_name.to_string(),
                    });
                }
                for child in children {
                    if matches!(child, Userset::Union { .. }) {
                        errors.push(ValidationError::InvalidUnion {
                            type_name: type_def.type_name.clone(),
                            relation_name: relation_name.to_string(),
                            children: children.len(),
                        });
                    }
                    self.validate_userset(type_def, relation_name, child, errors);
                }
            }
        }
    }

    /// Check if a type exists in the model
    pub fn type_exists(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Check if a relation exists on a type
    pub fn relation_exists(&self, type_name: &str, relation_name: &str) -> bool {
        self.types
            .get(type_name)
            .is_some_and(|td| td.relation(relation_name).is_some())
    }
}

fn check_name(kind: &'static str, name: &str, errors: &mut Vec<ValidationError>) {
    if !is_valid_name(name) {
        errors.push(ValidationError::InvalidName {
            kind,
            name: name.to_string(),
        });
    }
}

/// Detect cycles in computed relation definitions using DFS
fn detect_cycle_in_type(type_def: &TypeDefinition) -> Option<(String, Vec<String>)> {
    // Build adjacency list: relation -> [referenced relations]
    let mut graph: HashMap<&str, Vec<&str>> = HashMap::new();
    for rel_def in &type_def.relations {
        let mut refs = Vec::new();
        collect_referenced_relations(&rel_def.rewrite, &mut refs);
        graph.insert(rel_def.name.as_str(), refs);
    }

    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();

    for rel_name in type_def.relation_names() {
        if dfs_cycle_detect(rel_name, &graph, &mut visited, &mut rec_stack, &mut path) {
            return Some((rel_name.to_string(), path));
        }
    }
    None
}

/// Collect relations on the same object referenced by a userset expression
fn collect_referenced_relations<'u>(userset: &'u Userset, refs: &mut Vec<&'u str>) {
    match userset {
        Userset::This => {}
        Userset::ComputedUserset { relation } => refs.push(relation),
        // Tuple to userset goes to a different object, no local cycle
        Userset::TupleToUserset { .. } => {}
        Userset::Union { children } => {
            for child in children {
                collect_referenced_relations(child, refs);
            }
        }
    }
}

fn dfs_cycle_detect<'g>(
    node: &'g str,
    graph: &HashMap<&'g str, Vec<&'g str>>,
    visited: &mut HashSet<&'g str>,
    rec_stack: &mut HashSet<&'g str>,
    path: &mut Vec<String>,
) -> bool {
    if rec_stack.contains(node) {
        path.push(node.to_string());
        return true;
    }
    if !visited.insert(node) {
        return false;
    }

    rec_stack.insert(node);
    path.push(node.to_string());

    if let Some(neighbors) = graph.get(node) {
        for &neighbor in neighbors {
            if graph.contains_key(neighbor)
                && dfs_cycle_detect(neighbor, graph, visited, rec_stack, path)
            {
                return true;
            }
        }
    }

    rec_stack.remove(node);
    path.pop();
    false
}

/// Validate an authorization model
pub fn validate(model: &AuthorizationModel) -> ValidationResult<()> {
    ModelValidator::new(model).validate(model)
}
