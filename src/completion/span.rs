//! Span lookup for the construct under a caret
//!
//! Selectors and values may run over several lines, so their boundaries are
//! found by re-resolving a shrinking (backward) and growing (forward) token
//! window until the state changes. Property names are a single token.

use serde::Serialize;

use super::context::{CssState, ResolutionContext};
use super::fsm::{self, ScanStart};
use super::token_stream::{Caret, limit_source, slice_between, source_lines};
use crate::parser::{Location, Position, Token, Tokenizer};

/// What construct a caret sits in, and where exactly it starts and ends
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanInfo {
    pub state: CssState,
    /// Full selector text, in the selector state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    /// Property name (in the property state) or the property being valued
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,
    /// Full value text, in the value state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Finished members of the selector group
    pub selectors: Vec<String>,
    pub loc: Location,
}

fn query(tokens: &[Token]) -> Option<ResolutionContext> {
    let caret = tokens.last().map_or(Position::default(), |t| t.loc.end);
    fsm::resolve(tokens, ScanStart::default(), caret, None)
}

/// Whether a window no longer belongs to the construct being measured
fn left_construct(target: CssState, ctx: Option<&ResolutionContext>) -> bool {
    match ctx {
        None => true,
        Some(ctx) if ctx.state != target => true,
        Some(ctx) => target == CssState::Selector && ctx.selector_is_empty(),
    }
}

/// Locate the construct around `caret`
pub fn locate(tokenizer: &dyn Tokenizer, source: &str, caret: Caret) -> Option<SpanInfo> {
    let prefix = tokenizer.tokenize(&limit_source(source, caret));
    let ctx = fsm::resolve(&prefix, ScanStart::default(), caret, None)?;
    let lines = source_lines(source);

    match ctx.state {
        CssState::Selector | CssState::Value => {
            let start = walk_backward(&prefix, ctx.state)?;
            let end = walk_forward(tokenizer, &lines, prefix, caret, ctx.state);
            let text = slice_between(&lines, start, end);

            let (selector, value) = if ctx.state == CssState::Selector {
                (Some(text), None)
            } else {
                (None, Some(text))
            };
            Some(SpanInfo {
                state: ctx.state,
                selector,
                property_name: ctx.property_name,
                value,
                selectors: ctx.selectors,
                loc: Location { start, end },
            })
        }
        CssState::Property => {
            let line = lines.get(caret.line)?;
            let tokens = tokenizer.tokenize_at(line, caret.line, 0);
            let contains = |t: &&Token| t.loc.start <= caret && caret <= t.loc.end;
            let token = tokens
                .iter()
                .filter(|t| !t.is_whitespace())
                .find(contains)
                .or_else(|| tokens.iter().find(contains))?;

            Some(SpanInfo {
                state: ctx.state,
                selector: None,
                property_name: Some(token.text.clone()),
                value: None,
                selectors: ctx.selectors,
                loc: token.loc,
            })
        }
        _ => None,
    }
}

/// Pop tokens off the prefix until the window leaves the construct
fn walk_backward(prefix: &[Token], target: CssState) -> Option<Position> {
    let mut remaining = prefix.to_vec();
    let mut after: Option<Token> = None;

    while let Some(token) = remaining.pop() {
        if token.is_whitespace() {
            after = Some(token);
            continue;
        }

        if left_construct(target, query(&remaining).as_ref()) {
            let start = match target {
                CssState::Value => match after {
                    Some(ws) if ws.is_whitespace() => ws.loc.end,
                    _ => token.loc.end,
                },
                _ => token.loc.start,
            };
            return Some(start);
        }
        after = Some(token);
    }

    None
}

/// Feed the rest of the document in, line by line, until the construct ends
fn walk_forward(
    tokenizer: &dyn Tokenizer,
    lines: &[&str],
    mut window: Vec<Token>,
    caret: Caret,
    target: CssState,
) -> Position {
    let mut previous_whitespace = window.last().filter(|t| t.is_whitespace()).map(|t| t.loc.start);

    for (line, text) in lines.iter().enumerate().skip(caret.line) {
        let (text, column) = if line == caret.line {
            let rest: String = text.chars().skip(caret.column).collect();
            (rest, caret.column)
        } else {
            (text.to_string(), 0)
        };

        for token in tokenizer.tokenize_at(&text, line, column) {
            let start = token.loc.start;
            let is_whitespace = token.is_whitespace();
            window.push(token);

            if !is_whitespace && left_construct(target, query(&window).as_ref()) {
                return previous_whitespace.unwrap_or(start);
            }
            previous_whitespace = is_whitespace.then_some(start);
        }
    }

    let last = lines.len().saturating_sub(1);
    Position::new(last, lines.get(last).map_or(0, |l| l.chars().count()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::CssTokenizer;

    fn span_at(source: &str, line: usize, column: usize) -> Option<SpanInfo> {
        locate(&CssTokenizer, source, Caret::new(line, column))
    }

    #[test]
    fn test_value_span() {
        let info = span_at(".x {\n  color: red;\n}", 1, 10).unwrap();
        assert_eq!(info.state, CssState::Value);
        assert_eq!(info.value.as_deref(), Some("red"));
        assert_eq!(info.property_name.as_deref(), Some("color"));
        assert_eq!(info.loc.start, Position::new(1, 9));
        assert_eq!(info.loc.end, Position::new(1, 12));
    }

    #[test]
    fn test_multi_word_value_span() {
        let info = span_at("a { border: 1px solid black }", 0, 17).unwrap();
        assert_eq!(info.value.as_deref(), Some("1px solid black"));
        assert_eq!(info.loc.start, Position::new(0, 12));
        assert_eq!(info.loc.end, Position::new(0, 27));
    }

    #[test]
    fn test_selector_span() {
        let info = span_at("a { }\n.foo > bar {\n}", 1, 2).unwrap();
        assert_eq!(info.state, CssState::Selector);
        assert_eq!(info.selector.as_deref(), Some(".foo > bar"));
        assert_eq!(info.loc.start, Position::new(1, 0));
        assert_eq!(info.loc.end, Position::new(1, 10));
    }

    #[test]
    fn test_selector_span_stops_at_comma() {
        let first = span_at("h1, h2 {}", 0, 1).unwrap();
        assert_eq!(first.selector.as_deref(), Some("h1"));

        let second = span_at("h1, h2 {}", 0, 5).unwrap();
        assert_eq!(second.selector.as_deref(), Some("h2"));
        assert_eq!(second.selectors, vec!["h1".to_string()]);
    }

    #[test]
    fn test_selector_span_over_lines() {
        let info = span_at("div\n  span {}", 0, 2).unwrap();
        assert_eq!(info.loc.start, Position::new(0, 0));
        assert_eq!(info.loc.end, Position::new(1, 6));
        assert_eq!(info.selector.as_deref(), Some("div  span"));
    }

    #[test]
    fn test_property_span() {
        let info = span_at("a {\n  background: none;\n}", 1, 4).unwrap();
        assert_eq!(info.state, CssState::Property);
        assert_eq!(info.property_name.as_deref(), Some("background"));
        assert_eq!(info.loc.start, Position::new(1, 2));
        assert_eq!(info.loc.end, Position::new(1, 12));
    }

    #[test]
    fn test_null_state_has_no_span() {
        assert!(span_at("a { color: red }\n", 1, 0).is_none());
    }

    #[test]
    fn test_comment_before_caret_has_no_span() {
        assert!(span_at("a { /* x */ }", 0, 9).is_none());
    }

    #[test]
    fn test_value_to_end_of_source() {
        let info = span_at("a { color: red", 0, 12).unwrap();
        assert_eq!(info.value.as_deref(), Some("red"));
        assert_eq!(info.loc.end, Position::new(0, 14));
    }
}
