//! Direct user type list parser (`[user, group#member, user:*, user with cond]`).

use super::relation::{tokenize, Cursor, Keyword, Token};
use super::{ParseErrorKind, ParserError, ParserResult};
use crate::model::DirectUserType;

/// Parses list entries up to and including the closing `]`.
///
/// The opening `[` must already be consumed. An empty list is valid.
pub(crate) fn parse_direct_list(cursor: &mut Cursor<'_, '_>) -> ParserResult<Vec<DirectUserType>> {
    let mut types = Vec::new();

    if cursor.peek() == Some(Token::RBracket) {
        cursor.advance();
        return Ok(types);
    }

    loop {
        types.push(parse_entry(cursor)?);
        match cursor.advance() {
            Some(Token::Comma) => continue,
            Some(Token::RBracket) => return Ok(types),
            Some(other) => {
                return Err(invalid_entry(
                    cursor,
                    format!("expected ',' or ']', found {}", other.describe()),
                ))
            }
            None => return Err(invalid_entry(cursor, "missing closing ']'")),
        }
    }
}

/// entry := ident ("#" ident | ":" "*")? ("with" ident)?
fn parse_entry(cursor: &mut Cursor<'_, '_>) -> ParserResult<DirectUserType> {
    let type_name = match cursor.advance() {
        Some(Token::Ident(name)) => name,
        Some(other) => {
            return Err(invalid_entry(
                cursor,
                format!("expected a type name, found {}", other.describe()),
            ))
        }
        None => return Err(invalid_entry(cursor, "missing closing ']'")),
    };

    let mut entry = match cursor.peek() {
        Some(Token::Hash) => {
            cursor.advance();
            match cursor.advance() {
                Some(Token::Ident(relation)) => DirectUserType::userset(type_name, relation),
                _ => {
                    return Err(invalid_entry(
                        cursor,
                        format!("expected a relation after '{type_name}#'"),
                    ))
                }
            }
        }
        Some(Token::Colon) => {
            cursor.advance();
            match cursor.advance() {
                Some(Token::Star) => DirectUserType::wildcard(type_name),
                _ => {
                    return Err(invalid_entry(
                        cursor,
                        format!("expected '*' after '{type_name}:'"),
                    ))
                }
            }
        }
        _ => DirectUserType::new(type_name),
    };

    if cursor.peek() == Some(Token::Keyword(Keyword::With)) {
        cursor.advance();
        match cursor.advance() {
            Some(Token::Ident(condition)) => entry = entry.with_condition(condition),
            _ => {
                return Err(invalid_entry(
                    cursor,
                    format!("expected a condition name after '{type_name} with'"),
                ))
            }
        }
    }

    Ok(entry)
}

fn invalid_entry(cursor: &Cursor<'_, '_>, message: impl Into<String>) -> ParserError {
    let mut err = cursor.error(message);
    err.kind = ParseErrorKind::InvalidDirectUserType;
    err
}

/// Parses the content between `[` and `]` of a direct assignment.
///
/// `"user, group#member, user:*"` yields three entries; an empty or blank
/// string yields an empty list.
pub fn parse_direct_user_types(inner: &str) -> ParserResult<Vec<DirectUserType>> {
    let wrapped = format!("[{}]", inner.trim());
    let tokens = tokenize(&wrapped)?;
    let mut cursor = Cursor::new(&tokens, &wrapped);
    cursor.advance();
    let types = parse_direct_list(&mut cursor)?;
    if let Some(extra) = cursor.peek() {
        return Err(invalid_entry(
            &cursor,
            format!("unexpected {} after ']'", extra.describe()),
        ));
    }
    Ok(types)
}
