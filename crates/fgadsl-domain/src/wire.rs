//! OpenFGA JSON wire format.
//!
//! Reads and writes the document shape the OpenFGA API stores:
//!
//! ```json
//! {
//!   "schema_version": "1.1",
//!   "type_definitions": [{
//!     "type": "document",
//!     "relations": { "viewer": { "union": { "child": [ { "this": {} }, { "computedUserset": { "relation": "owner" } } ] } } },
//!     "metadata": { "relations": { "viewer": { "directly_related_user_types": [ { "type": "user" } ] } } }
//!   }],
//!   "conditions": { "c": { "name": "c", "expression": "a > 1", "parameters": { "a": { "type_name": "TYPE_NAME_INT" } } } }
//! }
//! ```
//!
//! Object key order is preserved in both directions, so relations and
//! conditions keep their declaration order.

use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::model::{
    AuthorizationModel, Condition, ConditionParameter, DirectUserType, ParamType,
    RelationDefinition, TypeDefinition, Userset,
};

/// Errors reading a model from JSON.
#[derive(Debug, Error)]
pub enum WireError {
    /// The input is not JSON at all.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is absent.
    #[error("{context}: missing field '{field}'")]
    MissingField { context: String, field: String },

    /// A field is present but has the wrong shape.
    #[error("{context}: {message}")]
    InvalidField { context: String, message: String },

    /// A rewrite this compiler does not model (`intersection`, `difference`).
    #[error("{context}: unsupported rewrite '{shape}'")]
    Unsupported { context: String, shape: String },
}

/// Result type for wire operations.
pub type WireResult<T> = Result<T, WireError>;

fn missing(context: &str, field: &str) -> WireError {
    WireError::MissingField {
        context: context.to_string(),
        field: field.to_string(),
    }
}

fn invalid(context: &str, message: impl Into<String>) -> WireError {
    WireError::InvalidField {
        context: context.to_string(),
        message: message.into(),
    }
}

fn object<'v>(value: &'v Value, context: &str) -> WireResult<&'v Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| invalid(context, "expected a JSON object"))
}

fn string_field<'v>(value: &'v Value, field: &str, context: &str) -> WireResult<&'v str> {
    match value.get(field) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(invalid(context, format!("field '{field}' must be a string"))),
        None => Err(missing(context, field)),
    }
}

/// An optional string, treating `""` and `null` as absent.
fn optional_string(value: &Value, field: &str, context: &str) -> WireResult<Option<String>> {
    match value.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(invalid(context, format!("field '{field}' must be a string"))),
    }
}

/// Reads a model from its JSON document.
///
/// Accepts either the bare model or the `{"authorization_model": {...}}`
/// envelope returned by the read API.
pub fn model_from_json(input: &str) -> WireResult<AuthorizationModel> {
    let value: Value = serde_json::from_str(input)?;
    let value = value.get("authorization_model").unwrap_or(&value);
    model_from_value(value)
}

/// Reads a model from an already parsed JSON value.
pub fn model_from_value(value: &Value) -> WireResult<AuthorizationModel> {
    object(value, "model")?;
    let schema_version = string_field(value, "schema_version", "model")?;

    let type_defs = value
        .get("type_definitions")
        .ok_or_else(|| missing("model", "type_definitions"))?
        .as_array()
        .ok_or_else(|| invalid("model", "field 'type_definitions' must be an array"))?;

    let mut model = AuthorizationModel::new(schema_version);
    for type_def in type_defs {
        model.type_definitions.push(type_definition(type_def)?);
    }

    match value.get("conditions") {
        None | Some(Value::Null) => {}
        Some(conditions) => {
            for (name, condition_value) in object(conditions, "conditions")? {
                model.conditions.push(condition(name, condition_value)?);
            }
        }
    }

    debug!(
        types = model.type_definitions.len(),
        conditions = model.conditions.len(),
        "read model from JSON"
    );
    Ok(model)
}

fn type_definition(value: &Value) -> WireResult<TypeDefinition> {
    object(value, "type definition")?;
    let type_name = string_field(value, "type", "type definition")?;
    let context = format!("type '{type_name}'");
    let mut type_def = TypeDefinition::new(type_name);

    if let Some(relations) = value.get("relations").filter(|v| !v.is_null()) {
        for (name, rewrite) in object(relations, &context)? {
            let rewrite = userset(rewrite, &format!("{type_name}#{name}"))?;
            type_def
                .relations
                .push(RelationDefinition::new(name.clone(), rewrite));
        }
    }

    let metadata = value
        .get("metadata")
        .and_then(|m| m.get("relations"))
        .filter(|v| !v.is_null());
    if let Some(metadata) = metadata {
        for (name, relation_meta) in object(metadata, &context)? {
            let relation_context = format!("{type_name}#{name}");
            let relation = type_def
                .relations
                .iter_mut()
                .find(|r| &r.name == name)
                .ok_or_else(|| invalid(&relation_context, "metadata for undefined relation"))?;
            if let Some(entries) = relation_meta
                .get("directly_related_user_types")
                .filter(|v| !v.is_null())
            {
                let entries = entries.as_array().ok_or_else(|| {
                    invalid(&relation_context, "directly_related_user_types must be an array")
                })?;
                relation.directly_related_user_types = entries
                    .iter()
                    .map(|entry| direct_user_type(entry, &relation_context))
                    .collect::<WireResult<_>>()?;
            }
        }
    }

    Ok(type_def)
}

fn direct_user_type(value: &Value, context: &str) -> WireResult<DirectUserType> {
    object(value, context)?;
    let type_name = string_field(value, "type", context)?;
    let relation = optional_string(value, "relation", context)?;
    let wildcard = !matches!(value.get("wildcard"), None | Some(Value::Null));
    let condition = optional_string(value, "condition", context)?;

    let mut entry = match (relation, wildcard) {
        (Some(_), true) => {
            return Err(invalid(
                context,
                format!("user type '{type_name}' sets both relation and wildcard"),
            ))
        }
        (Some(relation), false) => DirectUserType::userset(type_name, relation),
        (None, true) => DirectUserType::wildcard(type_name),
        (None, false) => DirectUserType::new(type_name),
    };
    if let Some(condition) = condition {
        entry = entry.with_condition(condition);
    }
    Ok(entry)
}

fn relation_ref(value: &Value, field: &str, context: &str) -> WireResult<String> {
    let inner = value.get(field).ok_or_else(|| missing(context, field))?;
    Ok(string_field(inner, "relation", context)?.to_string())
}

fn userset(value: &Value, context: &str) -> WireResult<Userset> {
    let fields = object(value, context)?;
    let mut keys = fields.keys();
    let shape = match (keys.next(), keys.next()) {
        (Some(key), None) => key.as_str(),
        (None, _) => return Err(invalid(context, "empty relation rewrite")),
        (Some(_), Some(_)) => {
            return Err(invalid(context, "relation rewrite must have exactly one key"))
        }
    };

    match shape {
        "this" => Ok(Userset::This),
        "computedUserset" => Ok(Userset::computed(relation_ref(
            value,
            "computedUserset",
            context,
        )?)),
        "tupleToUserset" => {
            let inner = &value["tupleToUserset"];
            Ok(Userset::tuple_to_userset(
                relation_ref(inner, "tupleset", context)?,
                relation_ref(inner, "computedUserset", context)?,
            ))
        }
        "union" => {
            let children = value["union"]
                .get("child")
                .and_then(Value::as_array)
                .ok_or_else(|| invalid(context, "union must have a 'child' array"))?;
            if children.is_empty() {
                return Err(invalid(context, "union must have at least one child"));
            }
            let children = children
                .iter()
                .map(|child| userset(child, context))
                .collect::<WireResult<Vec<_>>>()?;
            Ok(Userset::union(children))
        }
        "intersection" | "difference" => Err(WireError::Unsupported {
            context: context.to_string(),
            shape: shape.to_string(),
        }),
        other => Err(invalid(context, format!("unknown relation rewrite '{other}'"))),
    }
}

fn condition(name: &str, value: &Value) -> WireResult<Condition> {
    let context = format!("condition '{name}'");
    object(value, &context)?;
    let expression = string_field(value, "expression", &context)?;

    let mut parameters = Vec::new();
    if let Some(params) = value.get("parameters").filter(|v| !v.is_null()) {
        for (param, spec) in object(params, &context)? {
            let type_name = string_field(spec, "type_name", &context)?;
            let param_type: ParamType = type_name.parse().map_err(|type_name| {
                invalid(
                    &context,
                    format!("parameter '{param}' has unsupported type '{type_name}'"),
                )
            })?;
            parameters.push(ConditionParameter::new(param.clone(), param_type));
        }
    }

    Ok(Condition {
        name: name.to_string(),
        parameters,
        expression: expression.trim().replace("\r\n", "\n"),
    })
}

/// Renders a model as its JSON document.
pub fn model_to_json(model: &AuthorizationModel) -> Value {
    let type_definitions: Vec<Value> = model
        .type_definitions
        .iter()
        .map(type_definition_to_json)
        .collect();

    let mut doc = Map::new();
    doc.insert("schema_version".into(), json!(model.schema_version));
    doc.insert("type_definitions".into(), Value::Array(type_definitions));
    if !model.conditions.is_empty() {
        let conditions: Map<String, Value> = model
            .conditions
            .iter()
            .map(|c| (c.name.clone(), condition_to_json(c)))
            .collect();
        doc.insert("conditions".into(), Value::Object(conditions));
    }
    Value::Object(doc)
}

/// Renders a model as pretty-printed JSON text.
pub fn model_to_json_string(model: &AuthorizationModel) -> String {
    format!("{:#}", model_to_json(model))
}

fn type_definition_to_json(type_def: &TypeDefinition) -> Value {
    let mut out = Map::new();
    out.insert("type".into(), json!(type_def.type_name));

    let relations: Map<String, Value> = type_def
        .relations
        .iter()
        .map(|r| (r.name.clone(), userset_to_json(&r.rewrite)))
        .collect();
    out.insert("relations".into(), Value::Object(relations));

    if !type_def.relations.is_empty() {
        let metadata: Map<String, Value> = type_def
            .relations
            .iter()
            .map(|r| {
                let entries: Vec<Value> = r
                    .directly_related_user_types
                    .iter()
                    .map(direct_user_type_to_json)
                    .collect();
                (r.name.clone(), json!({ "directly_related_user_types": entries }))
            })
            .collect();
        out.insert("metadata".into(), json!({ "relations": metadata }));
    }
    Value::Object(out)
}

fn userset_to_json(rewrite: &Userset) -> Value {
    match rewrite {
        Userset::This => json!({ "this": {} }),
        Userset::ComputedUserset { relation } => {
            json!({ "computedUserset": { "relation": relation } })
        }
        Userset::TupleToUserset {
            tupleset,
            computed_userset,
        } => json!({
            "tupleToUserset": {
                "tupleset": { "relation": tupleset },
                "computedUserset": { "relation": computed_userset }
            }
        }),
        Userset::Union { children } => {
            let child: Vec<Value> = children.iter().map(userset_to_json).collect();
            json!({ "union": { "child": child } })
        }
    }
}

fn direct_user_type_to_json(entry: &DirectUserType) -> Value {
    let mut out = Map::new();
    out.insert("type".into(), json!(entry.type_name));
    if let Some(relation) = &entry.relation {
        out.insert("relation".into(), json!(relation));
    }
    if entry.wildcard {
        out.insert("wildcard".into(), json!({}));
    }
    if let Some(condition) = &entry.condition {
        out.insert("condition".into(), json!(condition));
    }
    Value::Object(out)
}

fn condition_to_json(condition: &Condition) -> Value {
    let parameters: Map<String, Value> = condition
        .parameters
        .iter()
        .map(|p| (p.name.clone(), json!({ "type_name": p.param_type.wire_name() })))
        .collect();
    json!({
        "name": condition.name,
        "expression": condition.expression,
        "parameters": parameters,
    })
}
