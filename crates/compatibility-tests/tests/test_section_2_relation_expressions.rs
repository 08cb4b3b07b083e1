mod common;

use anyhow::Result;
use common::{model_with_document, sharing_model};
use fgadsl_domain::model::{
    parse_direct_user_types, parse_relation_expression, DirectUserType, ParseErrorKind, Userset,
};
use fgadsl_domain::{parse, to_dsl};

// ============================================================================
// Section 2: Relation Expressions
// ============================================================================

/// Test: A bracket list joined with a relation becomes the first union child
#[test]
fn test_direct_assignment_or_relation() -> Result<()> {
    let parsed = parse_relation_expression("[user, user:*] or owner")?;

    assert_eq!(
        parsed.rewrite,
        Userset::Union {
            children: vec![Userset::This, Userset::computed("owner")]
        }
    );
    assert_eq!(
        parsed.directly_related_user_types,
        vec![DirectUserType::new("user"), DirectUserType::wildcard("user")]
    );
    Ok(())
}

/// Test: `from` maps to tuple to userset and renders back the same way
#[test]
fn test_tuple_to_userset_both_directions() -> Result<()> {
    let parsed = parse_relation_expression("viewer from parent")?;
    assert_eq!(
        parsed.rewrite,
        Userset::TupleToUserset {
            tupleset: "parent".to_string(),
            computed_userset: "viewer".to_string(),
        }
    );

    let model = sharing_model()?;
    let viewer = model
        .type_definition("document")
        .and_then(|t| t.relation("viewer"))
        .ok_or_else(|| anyhow::anyhow!("document#viewer missing"))?;
    assert!(matches!(
        &viewer.rewrite,
        Userset::Union { children } if children[2] == Userset::tuple_to_userset("parent", "viewer")
    ));
    assert!(to_dsl(&model).contains("or viewer from parent\n"));
    Ok(())
}

/// Test: Three `or` segments give a three-child union in source order
#[test]
fn test_three_way_union_keeps_source_order() -> Result<()> {
    let parsed = parse_relation_expression("editor or owner or viewer from parent")?;
    assert_eq!(
        parsed.rewrite,
        Userset::Union {
            children: vec![
                Userset::computed("editor"),
                Userset::computed("owner"),
                Userset::tuple_to_userset("parent", "viewer"),
            ]
        }
    );
    assert!(parsed.directly_related_user_types.is_empty());
    Ok(())
}

/// Test: A single term is not wrapped in a union
#[test]
fn test_single_terms_are_bare() -> Result<()> {
    assert_eq!(parse_relation_expression("owner")?.rewrite, Userset::computed("owner"));
    assert_eq!(parse_relation_expression("[user]")?.rewrite, Userset::This);
    assert_eq!(parse_relation_expression("[]")?.rewrite, Userset::This);
    Ok(())
}

/// Test: A trailing bracket list still leads the union
#[test]
fn test_trailing_direct_assignment_leads_union() -> Result<()> {
    let text = model_with_document("    define owner: [user]\n    define viewer: owner or [user]\n");
    let model = parse(&text)?;
    let rendered = to_dsl(&model);
    assert!(rendered.contains("    define viewer: [user] or owner\n"));
    assert_eq!(parse(&rendered)?, model);
    Ok(())
}

/// Test: Direct user type entries are classified by shape
#[test]
fn test_direct_user_type_classification() -> Result<()> {
    let entries =
        parse_direct_user_types("user, group#member, user:*, user with ip_allowed, team#member with ip_allowed")?;
    assert_eq!(
        entries,
        vec![
            DirectUserType::new("user"),
            DirectUserType::userset("group", "member"),
            DirectUserType::wildcard("user"),
            DirectUserType::new("user").with_condition("ip_allowed"),
            DirectUserType::userset("team", "member").with_condition("ip_allowed"),
        ]
    );
    assert!(parse_direct_user_types("")?.is_empty());
    Ok(())
}

/// Test: Intersection and exclusion are rejected by name
#[test]
fn test_unsupported_operators_are_rejected() {
    for expr in ["[user] and owner", "[user] but not blocked"] {
        let err = parse_relation_expression(expr).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnsupportedOperator, "{expr}");
    }
}

/// Test: Malformed definitions report their kind and line
#[test]
fn test_malformed_definitions() {
    let cases = [
        ("    define viewer:\n", ParseErrorKind::EmptyRelationDefinition),
        ("    define viewer: owner or\n", ParseErrorKind::InvalidRelationExpression),
        ("    define viewer: [user\n", ParseErrorKind::InvalidDirectUserType),
        ("    define viewer: [user] or [user:*]\n", ParseErrorKind::DuplicateDirectAssignment),
    ];

    for (relations, kind) in cases {
        let err = parse(&model_with_document(relations)).unwrap_err();
        assert_eq!(err.kind, kind, "{relations}");
        assert_eq!(err.line, Some(8), "{relations}");
    }
}
