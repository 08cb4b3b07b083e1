mod common;

use common::{model_with_document, sharing_model_json};
use fgadsl_domain::compiler::json_to_dsl;
use fgadsl_domain::model::{ParseErrorKind, RelationDefinition, TypeDefinition, Userset};
use fgadsl_domain::validation::{validate, ValidationError};
use fgadsl_domain::{compile, compile_with, parse, AuthorizationModel, CompilerConfig, DomainError};
use serde_json::json;

// ============================================================================
// Section 6: Error Reporting
// ============================================================================

fn validation_errors(text: &str) -> Vec<ValidationError> {
    match compile(text).unwrap_err() {
        DomainError::Validation(errors) => errors,
        other => panic!("expected validation errors, got {other:?}"),
    }
}

/// Test: A reference to an unknown relation fails validation
#[test]
fn test_undefined_relation() {
    let errors = validation_errors(&model_with_document("    define viewer: [user] or editor\n"));
    assert_eq!(
        errors,
        vec![ValidationError::UndefinedRelation {
            type_name: "document".to_string(),
            relation_name: "viewer".to_string(),
            referenced_relation: "editor".to_string(),
        }]
    );
}

/// Test: A condition must be defined before a user type can carry it
#[test]
fn test_undefined_condition() {
    let errors = validation_errors(&model_with_document("    define viewer: [user with ip_allowed]\n"));
    assert!(matches!(
        &errors[..],
        [ValidationError::UndefinedCondition { condition_name, .. }] if condition_name == "ip_allowed"
    ));
}

/// Test: A direct user type must name a defined type or relation
#[test]
fn test_unknown_direct_user_type() {
    let errors = validation_errors(&model_with_document("    define viewer: [user, team#member]\n"));
    assert!(matches!(
        &errors[..],
        [ValidationError::InvalidTypeConstraint { invalid_type, .. }] if invalid_type == "team#member"
    ));
}

/// Test: Relations that only reference each other are cyclic
#[test]
fn test_cyclic_relations() {
    let errors = validation_errors(&model_with_document(
        "    define viewer: editor\n    define editor: viewer\n",
    ));
    assert!(errors
        .iter()
        .any(|e| matches!(e, ValidationError::CyclicRelation { type_name, .. } if type_name == "document")));
}

/// Test: Every validation problem is reported at once
#[test]
fn test_all_validation_errors_are_collected() {
    let errors = validation_errors(&model_with_document(
        "    define viewer: [user with ip_allowed] or editor\n    define owner: [team]\n",
    ));
    assert_eq!(errors.len(), 3, "{errors:?}");
}

/// Test: Statement errors carry the line they occur on
#[test]
fn test_statement_errors_carry_line_numbers() {
    let cases = [
        ("model\n  schema 1.1\n\n  define viewer: [user]\n", ParseErrorKind::DefineOutsideType, 4),
        ("type user\ntype user\n", ParseErrorKind::DuplicateType, 2),
        (
            "type user\ntype doc\n  relations\n    define a: [user]\n    define a: [user]\n",
            ParseErrorKind::DuplicateRelation,
            5,
        ),
        ("type user\n  permissions\n", ParseErrorKind::UnexpectedStatement, 2),
    ];

    for (text, kind, line) in cases {
        let err = parse(text).unwrap_err();
        assert_eq!(err.kind, kind, "{text}");
        assert_eq!(err.line, Some(line), "{text}");
        assert!(err.to_string().starts_with(&format!("line {line}: ")));
    }
}

/// Test: Input that is neither format reports both attempts
#[test]
fn test_neither_format_reports_both_errors() {
    let err = compile("{ not json\ntype user\n").unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, DomainError::AmbiguousDualFormatParse { .. }));
    assert!(message.contains("line 1"), "{message}");
    assert!(message.contains("JSON attempt failed"), "{message}");
}

/// Test: Empty input is an empty model
#[test]
fn test_empty_input() {
    assert_eq!(validation_errors("\n# nothing here\n"), vec![ValidationError::EmptyModel]);
}

/// Test: Oversized input is rejected before parsing
#[test]
fn test_input_size_limit() {
    let config = CompilerConfig {
        max_input_bytes: 16,
        ..Default::default()
    };
    let err = compile_with(&model_with_document("    define viewer: [user]\n"), &config).unwrap_err();
    assert!(matches!(err, DomainError::InputTooLarge { limit: 16, .. }));
}

/// Test: JSON names the DSL cannot spell are rejected instead of converted
#[test]
fn test_json_names_must_be_writable_as_dsl() {
    let mut doc = sharing_model_json();
    doc["schema_version"] = json!("1.1 beta");
    doc["type_definitions"][3]["relations"]
        .as_object_mut()
        .unwrap()
        .insert("can view".to_string(), json!({ "this": {} }));
    doc["type_definitions"][3]["metadata"]["relations"]
        .as_object_mut()
        .unwrap()
        .insert(
            "can view".to_string(),
            json!({ "directly_related_user_types": [{ "type": "user", "relation": "and" }] }),
        );

    let err = json_to_dsl(&doc.to_string(), &CompilerConfig::default()).unwrap_err();
    let DomainError::Validation(errors) = err else {
        panic!("expected validation errors, got {err:?}");
    };
    assert!(errors.contains(&ValidationError::InvalidSchemaVersion {
        version: "1.1 beta".to_string()
    }));
    assert!(errors.contains(&ValidationError::InvalidName {
        kind: "relation",
        name: "can view".to_string()
    }));
    assert!(errors.contains(&ValidationError::InvalidName {
        kind: "relation",
        name: "and".to_string()
    }));
}

/// Test: A hand-built union must lead with its direct assignment
#[test]
fn test_direct_assignment_must_lead_union() {
    let model = AuthorizationModel::with_types(
        "1.1",
        vec![TypeDefinition::new("document")
            .with_relation(RelationDefinition::new("owner", Userset::This))
            .with_relation(RelationDefinition::new(
                "viewer",
                Userset::Union {
                    children: vec![Userset::computed("owner"), Userset::This],
                },
            ))],
    );
    assert_eq!(
        validate(&model),
        Err(vec![ValidationError::DirectAssignmentNotFirst {
            type_name: "document".to_string(),
            relation_name: "viewer".to_string(),
        }])
    );
}
