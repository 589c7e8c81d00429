//! Caret-aware source helpers
//!
//! Editors report the caret as a `(line, column)` pair. These helpers cut,
//! rebase and slice source text in the same zero-based, char-counted
//! coordinates the tokenizer uses.

use crate::parser::{Position, Token};

/// Caret position in a document
pub type Caret = Position;

/// Split source into lines the way the tokenizer counts them
pub fn source_lines(source: &str) -> Vec<&str> {
    source.split('\n').collect()
}

/// Caret position just after the last char of `source`
pub fn end_of(source: &str) -> Caret {
    let lines = source_lines(source);
    let line = lines.len() - 1;
    Caret::new(line, lines[line].chars().count())
}

/// Text from the start of the document up to the caret.
///
/// A caret past the last line returns the whole source.
pub fn limit_source(source: &str, caret: Caret) -> String {
    let lines = source_lines(source);
    if caret.line >= lines.len() {
        return source.to_string();
    }

    let mut limited: Vec<String> = lines[..caret.line].iter().map(|l| l.to_string()).collect();
    limited.push(lines[caret.line].chars().take(caret.column).collect());
    limited.join("\n")
}

/// Drop everything before `(line, column)` so the result starts there
pub fn rebase_source(source: &str, line: usize, column: usize) -> String {
    let lines = source_lines(source);
    if line >= lines.len() {
        return String::new();
    }

    let mut rest: Vec<String> = lines[line..].iter().map(|l| l.to_string()).collect();
    rest[0] = rest[0].chars().skip(column).collect();
    rest.join("\n")
}

/// Text between two positions, with line breaks dropped.
///
/// Multi-line constructs are reported as a single joined string.
pub fn slice_between(lines: &[&str], start: Position, end: Position) -> String {
    if start.line > end.line || start.line >= lines.len() {
        return String::new();
    }
    let last = end.line.min(lines.len() - 1);

    let mut pieces: Vec<String> = lines[start.line..=last].iter().map(|l| l.to_string()).collect();
    let tail = pieces.len() - 1;
    pieces[tail] = pieces[tail].chars().take(end.column).collect();
    pieces[0] = pieces[0].chars().skip(start.column).collect();
    pieces.concat()
}

/// Index of the last non-whitespace token
pub fn last_significant(tokens: &[Token]) -> Option<usize> {
    tokens.iter().rposition(|t| !t.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::CssLexer;

    #[test]
    fn test_limit_source_cuts_at_caret() {
        let source = "a {\n  color: red;\n}";
        assert_eq!(limit_source(source, Caret::new(1, 7)), "a {\n  color");
        assert_eq!(limit_source(source, Caret::new(0, 0)), "");
        assert_eq!(limit_source(source, Caret::new(9, 0)), source);
    }

    #[test]
    fn test_limit_source_clamps_column() {
        assert_eq!(limit_source("ab\ncd", Caret::new(0, 10)), "ab");
    }

    #[test]
    fn test_rebase_source() {
        let source = "a {}\nb { x: y }\nc";
        assert_eq!(rebase_source(source, 1, 3), " x: y }\nc");
        assert_eq!(rebase_source(source, 0, 0), source);
        assert_eq!(rebase_source(source, 7, 0), "");
    }

    #[test]
    fn test_slice_between_joins_lines() {
        let lines = source_lines("h1,\n  h2 {\n}");
        let text = slice_between(&lines, Position::new(0, 0), Position::new(1, 4));
        assert_eq!(text, "h1,  h2");
    }

    #[test]
    fn test_end_of() {
        assert_eq!(end_of(""), Caret::new(0, 0));
        assert_eq!(end_of("a {\n  col"), Caret::new(1, 5));
        assert_eq!(end_of("a\n"), Caret::new(1, 0));
    }

    #[test]
    fn test_last_significant_skips_whitespace() {
        let tokens = CssLexer::tokenize("a b  ");
        assert_eq!(last_significant(&tokens), Some(2));
        assert_eq!(last_significant(&[]), None);
    }
}
