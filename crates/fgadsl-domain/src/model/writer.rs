//! Renders an [`AuthorizationModel`] back to canonical DSL text.
//!
//! Output layout:
//!
//! ```text
//! model
//!   schema 1.1
//!
//! condition <name>(<param>: <type>, ...) {
//!   <expression>
//! }
//!
//! type <name>
//!   relations
//!     define <relation>: <expression>
//! ```
//!
//! Rendering never fails; `parse(&to_dsl(&model))` yields `model` again for
//! every valid model.

use super::{AuthorizationModel, Condition, DirectUserType, Userset};

/// Renders a whole model.
pub fn to_dsl(model: &AuthorizationModel) -> String {
    let mut out = String::new();
    out.push_str("model\n");
    out.push_str(&format!("  schema {}\n", model.schema_version));

    for condition in &model.conditions {
        out.push('\n');
        out.push_str(&condition_to_dsl(condition));
    }

    for type_def in &model.type_definitions {
        out.push('\n');
        out.push_str(&format!("type {}\n", type_def.type_name));
        if type_def.relations.is_empty() {
            continue;
        }
        out.push_str("  relations\n");
        for relation in &type_def.relations {
            out.push_str(&format!(
                "    define {}: {}\n",
                relation.name,
                userset_to_dsl(&relation.rewrite, &relation.directly_related_user_types)
            ));
        }
    }

    out
}

/// Renders one relation's right-hand side.
///
/// `This` renders as the bracketed `direct_types` list (`[]` when empty).
/// Nested unions are written inline, which parses back as a single union.
pub fn userset_to_dsl(rewrite: &Userset, direct_types: &[DirectUserType]) -> String {
    match rewrite {
        Userset::This => direct_list(direct_types),
        Userset::ComputedUserset { relation } => relation.clone(),
        Userset::TupleToUserset {
            tupleset,
            computed_userset,
        } => format!("{computed_userset} from {tupleset}"),
        Userset::Union { children } => children
            .iter()
            .map(|child| userset_to_dsl(child, direct_types))
            .collect::<Vec<_>>()
            .join(" or "),
    }
}

fn direct_list(direct_types: &[DirectUserType]) -> String {
    let entries: Vec<String> = direct_types.iter().map(ToString::to_string).collect();
    format!("[{}]", entries.join(", "))
}

/// Renders a condition block, terminated by a newline.
///
/// The expression is written as is; continuation lines keep their own
/// indentation.
pub fn condition_to_dsl(condition: &Condition) -> String {
    let params: Vec<String> = condition
        .parameters
        .iter()
        .map(|p| format!("{}: {}", p.name, p.param_type))
        .collect();
    format!(
        "condition {}({}) {{\n  {}\n}}\n",
        condition.name,
        params.join(", "),
        condition.expression
    )
}
