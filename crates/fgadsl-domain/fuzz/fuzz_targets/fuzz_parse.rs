//! Fuzz target for the model compiler
//!
//! Assembles DSL text from model-shaped fragments so most inputs reach the
//! relation and condition parsers. Compilation must never panic, and every
//! model that compiles must render to DSL and JSON that compile back to the
//! same model.

#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use fgadsl_domain::{compile, model_to_json_string, to_dsl};

/// Fuzz input: a sequence of DSL lines
#[derive(Debug, Arbitrary)]
struct FuzzModelInput {
    #[arbitrary(with = |u: &mut Unstructured| -> arbitrary::Result<u8> {
        u.int_in_range(1..=40)
    })]
    num_lines: u8,

    lines: Vec<FuzzLine>,
}

#[derive(Debug, Arbitrary)]
enum FuzzLine {
    Model,
    Schema,
    Type(FuzzName),
    Relations,
    Define(FuzzName, Vec<FuzzTerm>),
    Condition(FuzzName, Vec<FuzzName>, Vec<FuzzExprToken>),
    Comment,
    Raw(String),
}

#[derive(Debug, Arbitrary)]
enum FuzzTerm {
    Direct(Vec<FuzzDirect>),
    Computed(FuzzName),
    TupleToUserset(FuzzName, FuzzName),
    And,
    ButNot,
}

#[derive(Debug, Arbitrary)]
enum FuzzDirect {
    Type(FuzzName),
    Userset(FuzzName, FuzzName),
    Wildcard(FuzzName),
    Conditioned(FuzzName, FuzzName),
}

#[derive(Debug, Arbitrary)]
enum FuzzExprToken {
    Name(FuzzName),
    Number(u8),
    Operator(u8),
    Open,
    Close,
    Dot,
    Quote,
}

/// Names from a small alphabet so references collide often
#[derive(Debug)]
struct FuzzName(String);

impl<'a> Arbitrary<'a> for FuzzName {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let len = u.int_in_range(1..=3)?;
        let s: String = (0..len)
            .map(|_| u.choose(&['a', 'b', 'c', '_', '1']).copied())
            .collect::<Result<_, _>>()?;
        Ok(FuzzName(s))
    }
}

const OPERATORS: &[&str] = &["+", "<", ">=", "==", "&&", "||", "!", "=<", "^"];
const PARAM_TYPES: &[&str] = &["int", "bool", "string", "timestamp", "duration", "float"];

fn direct_to_dsl(entry: &FuzzDirect) -> String {
    match entry {
        FuzzDirect::Type(t) => t.0.clone(),
        FuzzDirect::Userset(t, r) => format!("{}#{}", t.0, r.0),
        FuzzDirect::Wildcard(t) => format!("{}:*", t.0),
        FuzzDirect::Conditioned(t, c) => format!("{} with {}", t.0, c.0),
    }
}

fn term_to_dsl(term: &FuzzTerm) -> String {
    match term {
        FuzzTerm::Direct(entries) => {
            let entries: Vec<String> = entries.iter().take(4).map(direct_to_dsl).collect();
            format!("[{}]", entries.join(", "))
        }
        FuzzTerm::Computed(r) => r.0.clone(),
        FuzzTerm::TupleToUserset(computed, tupleset) => format!("{} from {}", computed.0, tupleset.0),
        FuzzTerm::And => "and".to_string(),
        FuzzTerm::ButNot => "but not".to_string(),
    }
}

fn line_to_dsl(line: &FuzzLine) -> String {
    match line {
        FuzzLine::Model => "model".to_string(),
        FuzzLine::Schema => "  schema 1.1".to_string(),
        FuzzLine::Type(name) => format!("type {}", name.0),
        FuzzLine::Relations => "  relations".to_string(),
        FuzzLine::Define(name, terms) => {
            let terms: Vec<String> = terms.iter().take(4).map(term_to_dsl).collect();
            format!("    define {}: {}", name.0, terms.join(" or "))
        }
        FuzzLine::Condition(name, params, tokens) => {
            let params: Vec<String> = params
                .iter()
                .take(3)
                .enumerate()
                .map(|(i, p)| format!("{}: {}", p.0, PARAM_TYPES[i % PARAM_TYPES.len()]))
                .collect();
            let expr: Vec<String> = tokens
                .iter()
                .take(8)
                .map(|t| match t {
                    FuzzExprToken::Name(n) => n.0.clone(),
                    FuzzExprToken::Number(n) => n.to_string(),
                    FuzzExprToken::Operator(i) => {
                        OPERATORS[*i as usize % OPERATORS.len()].to_string()
                    }
                    FuzzExprToken::Open => "(".to_string(),
                    FuzzExprToken::Close => ")".to_string(),
                    FuzzExprToken::Dot => ".".to_string(),
                    FuzzExprToken::Quote => "\"".to_string(),
                })
                .collect();
            format!(
                "condition {}({}) {{\n  {}\n}}",
                name.0,
                params.join(", "),
                expr.join(" ")
            )
        }
        FuzzLine::Comment => "# comment".to_string(),
        FuzzLine::Raw(text) => text.clone(),
    }
}

fuzz_target!(|input: FuzzModelInput| {
    let text: String = input
        .lines
        .iter()
        .take(input.num_lines as usize)
        .map(line_to_dsl)
        .collect::<Vec<_>>()
        .join("\n");

    // Should not panic
    let Ok(model) = compile(&text) else {
        return;
    };

    let dsl = to_dsl(&model);
    let reparsed = compile(&dsl).expect("rendered DSL must compile");
    assert_eq!(reparsed, model, "DSL round trip changed the model:\n{dsl}");

    let json = model_to_json_string(&model);
    let reread = compile(&json).expect("rendered JSON must compile");
    assert_eq!(reread, model, "JSON round trip changed the model:\n{json}");
});
