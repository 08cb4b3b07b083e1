//! Line scanner splitting DSL text into logical statements.
//!
//! Every statement is a single line, except condition blocks which are
//! merged from the `condition` line up to the line closing its body. Merged
//! blocks keep their line breaks so multi-line expressions survive intact.

use super::{ParseErrorKind, ParserError, ParserResult};

/// One logical DSL statement and the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Statement {
    pub line: usize,
    pub text: String,
}

impl Statement {
    pub fn is_condition(&self) -> bool {
        starts_with_keyword(&self.text, "condition")
    }
}

/// Returns true if `text` starts with `keyword` followed by a word boundary.
pub(crate) fn starts_with_keyword(text: &str, keyword: &str) -> bool {
    match text.strip_prefix(keyword) {
        Some(rest) => rest
            .chars()
            .next()
            .map_or(true, |c| c.is_whitespace() || c == '('),
        None => false,
    }
}

/// Drops a trailing ` # comment`. A `#` glued to a name (`group#member`) is kept.
fn strip_trailing_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'#' && (i == 0 || bytes[i - 1].is_ascii_whitespace()) {
            return line[..i].trim_end();
        }
    }
    line
}

/// Brace depth of an open condition block, ignoring string literals.
#[derive(Debug, Default)]
struct BraceDepth {
    depth: i64,
    opened: bool,
}

impl BraceDepth {
    /// Feeds one line. Returns the byte offset just past the `}` that closes
    /// the block, if this line closes it.
    fn feed(&mut self, line: &str) -> Option<usize> {
        let mut quote: Option<char> = None;
        let mut escaped = false;
        for (i, c) in line.char_indices() {
            if let Some(q) = quote {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
                continue;
            }
            match c {
                '"' | '\'' => quote = Some(c),
                '{' => {
                    self.opened = true;
                    self.depth += 1;
                }
                '}' => {
                    self.depth -= 1;
                    if self.opened && self.depth <= 0 {
                        return Some(i + 1);
                    }
                }
                _ => {}
            }
        }
        None
    }
}

/// Cuts the closing line of a block after its `}` when only a comment follows.
fn closing_line(line: &str, end: usize) -> &str {
    let rest = line[end..].trim_start();
    if rest.is_empty() || rest.starts_with('#') {
        &line[..end]
    } else {
        line
    }
}

/// Splits raw DSL text into statements.
///
/// Blank and comment lines are dropped. Condition blocks are joined with
/// newlines into one statement; lines inside a block keep their indentation.
pub(crate) fn scan(input: &str) -> ParserResult<Vec<Statement>> {
    let mut statements = Vec::new();
    let mut block: Option<(Statement, BraceDepth)> = None;

    for (index, raw) in input.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = raw.trim();

        if let Some((statement, braces)) = block.as_mut() {
            if trimmed.starts_with('#') {
                continue;
            }
            statement.text.push('\n');
            match braces.feed(raw) {
                Some(end) => {
                    statement.text.push_str(closing_line(raw, end));
                    if let Some((done, _)) = block.take() {
                        statements.push(done);
                    }
                }
                None => statement.text.push_str(raw),
            }
            continue;
        }

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if starts_with_keyword(trimmed, "condition") {
            let mut braces = BraceDepth::default();
            match braces.feed(trimmed) {
                Some(end) => statements.push(Statement {
                    line: line_no,
                    text: closing_line(trimmed, end).to_string(),
                }),
                None => {
                    let statement = Statement {
                        line: line_no,
                        text: trimmed.to_string(),
                    };
                    block = Some((statement, braces));
                }
            }
            continue;
        }

        let text = strip_trailing_comment(trimmed);
        if !text.is_empty() {
            statements.push(Statement {
                line: line_no,
                text: text.to_string(),
            });
        }
    }

    if let Some((statement, _)) = block {
        return Err(ParserError::at_line(
            ParseErrorKind::UnterminatedConditionBlock,
            format!(
                "condition block starting at line {} is missing its closing '}}'",
                statement.line
            ),
            statement.line,
        ));
    }

    Ok(statements)
}
