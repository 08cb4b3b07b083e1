//! Property-based tests for model round trips.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::model::{
        parse, to_dsl, AuthorizationModel, Condition, ConditionParameter, DirectUserType,
        ParamType, RelationDefinition, TypeDefinition, Userset,
    };
    use crate::validation::{validate, ValidationError};
    use crate::wire::{model_from_json, model_to_json_string};

    /// Strategy for a non-direct leaf referencing relations `r0..r{relations}`
    fn leaf_strategy(relations: usize) -> impl Strategy<Value = Userset> {
        prop_oneof![
            (0..relations).prop_map(|k| Userset::computed(format!("r{k}"))),
            (0..relations, 0..relations).prop_map(|(tupleset, computed)| {
                Userset::tuple_to_userset(format!("r{tupleset}"), format!("r{computed}"))
            }),
        ]
    }

    /// Strategy for a rewrite: optional direct assignment plus up to two leaves
    fn rewrite_strategy(relations: usize) -> impl Strategy<Value = Userset> {
        (
            any::<bool>(),
            prop::collection::vec(leaf_strategy(relations), 0..3),
        )
            .prop_map(|(direct, leaves)| {
                let mut children = Vec::new();
                if direct || leaves.is_empty() {
                    children.push(Userset::This);
                }
                children.extend(leaves);
                Userset::union(children)
            })
    }

    /// Strategy for a union built without `Userset::union`, so a direct
    /// assignment may land anywhere among the children
    fn raw_union_strategy(relations: usize) -> impl Strategy<Value = Userset> {
        (
            prop::collection::vec(leaf_strategy(relations), 1..4),
            any::<prop::sample::Index>(),
            any::<bool>(),
        )
            .prop_map(|(mut children, at, direct)| {
                if direct {
                    let position = at.index(children.len() + 1);
                    children.insert(position, Userset::This);
                }
                Userset::Union { children }
            })
    }

    /// Strategy for a single-type model whose relations are all raw unions
    fn raw_union_model_strategy() -> impl Strategy<Value = AuthorizationModel> {
        (2..4usize).prop_flat_map(|relations| {
            prop::collection::vec(raw_union_strategy(relations), relations).prop_map(
                move |rewrites| {
                    let type_def = rewrites.into_iter().enumerate().fold(
                        TypeDefinition::new("t0"),
                        |type_def, (index, rewrite)| {
                            let direct = if rewrite.has_direct() {
                                vec![DirectUserType::new("t0")]
                            } else {
                                Vec::new()
                            };
                            type_def.with_relation(RelationDefinition::with_direct_types(
                                format!("r{index}"),
                                rewrite,
                                direct,
                            ))
                        },
                    );
                    AuthorizationModel::with_types("1.1", vec![type_def])
                },
            )
        })
    }

    /// Strategy for one direct user type over types `t0..t{types}`
    fn direct_type_strategy(types: usize, conditions: usize) -> impl Strategy<Value = DirectUserType> {
        let condition = if conditions == 0 {
            Just(None).boxed()
        } else {
            prop::option::of(0..conditions).boxed()
        };
        (0..types, 0..3u8, condition).prop_map(|(t, kind, condition)| {
            let type_name = format!("t{t}");
            let entry = match kind {
                0 => DirectUserType::new(type_name),
                1 => DirectUserType::userset(type_name, "r0"),
                _ => DirectUserType::wildcard(type_name),
            };
            match condition {
                Some(c) => entry.with_condition(format!("c{c}")),
                None => entry,
            }
        })
    }

    fn relation_strategy(
        index: usize,
        relations: usize,
        types: usize,
        conditions: usize,
    ) -> impl Strategy<Value = RelationDefinition> {
        (
            rewrite_strategy(relations),
            prop::collection::vec(direct_type_strategy(types, conditions), 0..3),
        )
            .prop_map(move |(rewrite, direct)| {
                let direct = if rewrite.has_direct() { direct } else { Vec::new() };
                RelationDefinition::with_direct_types(format!("r{index}"), rewrite, direct)
            })
    }

    fn condition_strategy(index: usize) -> impl Strategy<Value = Condition> {
        (
            prop::collection::vec(prop::sample::select(ParamType::ALL.to_vec()), 1..4),
            prop::sample::select(vec![" == ", " ==\n  ", " ==\n"]),
        )
            .prop_map(move |(types, separator)| {
                let parameters: Vec<ConditionParameter> = types
                    .into_iter()
                    .enumerate()
                    .map(|(i, t)| ConditionParameter::new(format!("p{i}"), t))
                    .collect();
                let names: Vec<&str> = parameters.iter().map(|p| p.name.as_str()).collect();
                let expression = if names.len() == 1 {
                    format!("{} != null", names[0])
                } else {
                    names.join(separator)
                };
                Condition {
                    name: format!("c{index}"),
                    parameters,
                    expression,
                }
            })
    }

    /// Strategy for a whole model with unique, non-reserved names
    fn model_strategy() -> impl Strategy<Value = AuthorizationModel> {
        (1..4usize, 1..4usize, 0..3usize).prop_flat_map(|(types, relations, conditions)| {
            let type_defs = (0..types)
                .map(|t| {
                    (0..relations)
                        .map(|r| relation_strategy(r, relations, types, conditions))
                        .collect::<Vec<_>>()
                        .prop_map(move |relations| TypeDefinition {
                            type_name: format!("t{t}"),
                            relations,
                        })
                })
                .collect::<Vec<_>>();
            let condition_defs = (0..conditions).map(condition_strategy).collect::<Vec<_>>();

            (type_defs, condition_defs).prop_map(|(type_definitions, conditions)| {
                AuthorizationModel {
                    schema_version: "1.1".to_string(),
                    type_definitions,
                    conditions,
                }
            })
        })
    }

    proptest! {
        #[test]
        fn test_dsl_round_trip_preserves_model(model in model_strategy()) {
            let text = to_dsl(&model);
            let parsed = parse(&text);
            prop_assert!(parsed.is_ok(), "Failed to parse:\n{}\n{:?}", text, parsed.err());
            prop_assert_eq!(parsed.unwrap(), model);
        }

        #[test]
        fn test_json_round_trip_preserves_model(model in model_strategy()) {
            let text = model_to_json_string(&model);
            let read = model_from_json(&text);
            prop_assert!(read.is_ok(), "Failed to read:\n{}\n{:?}", text, read.err());
            prop_assert_eq!(read.unwrap(), model);
        }

        #[test]
        fn test_valid_raw_unions_survive_dsl_round_trip(model in raw_union_model_strategy()) {
            let misplaced = model.type_definitions[0].relations.iter().any(|r| {
                matches!(&r.rewrite, Userset::Union { children }
                    if children.iter().skip(1).any(|c| matches!(c, Userset::This)))
            });
            match validate(&model) {
                Ok(()) => {
                    prop_assert!(!misplaced);
                    let text = to_dsl(&model);
                    let parsed = parse(&text);
                    prop_assert!(parsed.is_ok(), "Failed to parse:\n{}\n{:?}", text, parsed.err());
                    prop_assert_eq!(parsed.unwrap(), model);
                }
                Err(errors) => {
                    let flagged = errors
                        .iter()
                        .any(|e| matches!(e, ValidationError::DirectAssignmentNotFirst { .. }));
                    prop_assert_eq!(flagged, misplaced);
                }
            }
        }

        #[test]
        fn test_union_arity_matches_or_segments(count in 2..6usize) {
            let expr = (0..count).map(|i| format!("r{i}")).collect::<Vec<_>>().join(" or ");
            let parsed = crate::model::parse_relation_expression(&expr).unwrap();
            match parsed.rewrite {
                Userset::Union { children } => prop_assert_eq!(children.len(), count),
                other => prop_assert!(false, "expected union, got {:?}", other),
            }
        }
    }
}
