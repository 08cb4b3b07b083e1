mod common;

use anyhow::Result;
use common::{sharing_model, sharing_model_json, HANDWRITTEN_SHARING_MODEL, SHARING_MODEL};
use fgadsl_domain::model::{
    Condition, ConditionParameter, DirectUserType, ParamType, RelationDefinition, TypeDefinition,
    Userset,
};
use fgadsl_domain::wire::model_from_value;
use fgadsl_domain::{
    compile, compile_with, model_from_json, model_to_json_string, parse, to_dsl,
    AuthorizationModel, CompilerConfig, ModelFormat,
};

// ============================================================================
// Section 1: Model Round Trips
// ============================================================================

/// Test: Canonical DSL renders back byte for byte
#[test]
fn test_canonical_dsl_renders_back_unchanged() -> Result<()> {
    let model = sharing_model()?;
    assert_eq!(to_dsl(&model), SHARING_MODEL);
    Ok(())
}

/// Test: Hand-written DSL normalizes to the canonical layout
#[test]
fn test_handwritten_dsl_normalizes_to_canonical_layout() -> Result<()> {
    let handwritten = compile(HANDWRITTEN_SHARING_MODEL)?;
    assert_eq!(handwritten, sharing_model()?);
    assert_eq!(to_dsl(&handwritten), SHARING_MODEL);
    Ok(())
}

/// Test: A model built in code survives DSL rendering and parsing
#[test]
fn test_hand_constructed_model_round_trips_through_dsl() -> Result<()> {
    let model = AuthorizationModel {
        schema_version: "1.1".to_string(),
        type_definitions: vec![
            TypeDefinition::new("user"),
            TypeDefinition::new("team").with_relation(RelationDefinition::with_direct_types(
                "member",
                Userset::This,
                vec![DirectUserType::new("user")],
            )),
            TypeDefinition::new("repo")
                .with_relation(RelationDefinition::with_direct_types(
                    "owner",
                    Userset::This,
                    vec![DirectUserType::new("team")],
                ))
                .with_relation(RelationDefinition::with_direct_types(
                    "admin",
                    Userset::union(vec![
                        Userset::This,
                        Userset::tuple_to_userset("owner", "member"),
                    ]),
                    vec![
                        DirectUserType::new("user").with_condition("office_hours"),
                        DirectUserType::userset("team", "member"),
                    ],
                ))
                .with_relation(RelationDefinition::with_direct_types(
                    "reader",
                    Userset::union(vec![Userset::This, Userset::computed("admin")]),
                    vec![DirectUserType::wildcard("user")],
                )),
        ],
        conditions: vec![Condition {
            name: "office_hours".to_string(),
            parameters: vec![
                ConditionParameter::new("hour", ParamType::Int),
                ConditionParameter::new("open", ParamType::Bool),
            ],
            expression: "open && hour >= 9 && hour < 17".to_string(),
        }],
    };

    let text = to_dsl(&model);
    assert!(text.contains("    define admin: [user with office_hours, team#member] or member from owner\n"));
    assert_eq!(parse(&text)?, model);
    Ok(())
}

/// Test: The stored JSON document and the DSL describe the same model
#[test]
fn test_json_document_matches_dsl_model() -> Result<()> {
    let from_json = model_from_value(&sharing_model_json())?;
    assert_eq!(from_json, sharing_model()?);
    Ok(())
}

/// Test: Rendered JSON reads back to the same model
#[test]
fn test_model_round_trips_through_json() -> Result<()> {
    let model = sharing_model()?;
    let json = model_to_json_string(&model);
    assert_eq!(model_from_json(&json)?, model);
    Ok(())
}

/// Test: JSON input converts to the canonical DSL
#[test]
fn test_json_input_renders_as_canonical_dsl() -> Result<()> {
    let json = sharing_model_json().to_string();
    let (model, format) = compile_with(&json, &CompilerConfig::default())?;
    assert_eq!(format, ModelFormat::Json);
    assert_eq!(to_dsl(&model), SHARING_MODEL);
    Ok(())
}

/// Test: A model without a schema line takes the configured default
#[test]
fn test_missing_schema_uses_configured_default() -> Result<()> {
    let config = CompilerConfig {
        default_schema_version: "1.2".to_string(),
        ..Default::default()
    };
    let (model, _) = compile_with("type user\n", &config)?;
    assert_eq!(model.schema_version, "1.2");
    assert_eq!(to_dsl(&model), "model\n  schema 1.2\n\ntype user\n");
    Ok(())
}
