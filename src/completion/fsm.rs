//! Finite State Machine for CSS context resolution
//!
//! This module walks a located token stream and settles on the construct the
//! caret sits in. The machine is two-level:
//! - A top-level automaton over [`CssState`]
//! - While in [`CssState::Selector`], a nested automaton over
//!   [`SelectorSubstate`]
//!
//! Closing brackets are disambiguated by a scope stack of [`ScopeMarker`]s,
//! so a `}` returns to the right place whether it closes a rule, a keyframe
//! or an at-rule block. The machine is:
//! - Error-tolerant (half-typed input always resolves to something)
//! - Single pass, O(n) in the number of tokens
//! - Restartable from any top-level [`Checkpoint`](super::checkpoint::Checkpoint)

use tracing::trace;

use super::checkpoint::CheckpointCache;
use super::context::{CssState, ResolutionContext, ScopeMarker, SelectorSubstate};
use super::token_stream::{Caret, last_significant};
use crate::parser::{Position, Token, TokenKind};

/// Where a scan starts: document origin, or a restored checkpoint
#[derive(Debug, Clone, Default)]
pub struct ScanStart {
    /// Document position of the first token's possible start
    pub origin: Position,
    /// Scope stack in effect at `origin`
    pub scope_stack: Vec<ScopeMarker>,
}

/// Run the automaton over `tokens` and describe the state at `caret`.
///
/// Returns `None` when the tokens end before the caret, which happens when
/// the text ends in a comment or the caret lies past the text.
///
/// With `checkpoints`, every top-level position passed is recorded.
pub fn resolve(
    tokens: &[Token],
    start: ScanStart,
    caret: Caret,
    checkpoints: Option<&mut CheckpointCache>,
) -> Option<ResolutionContext> {
    let last_end = tokens.last().map_or(start.origin, |t| t.loc.end);
    if last_end < caret {
        trace!(?last_end, ?caret, "tokens end before caret");
        return None;
    }

    let mut machine = Automaton::new(tokens, start.scope_stack);
    machine.run(checkpoints);
    Some(machine.into_context(caret))
}

/// At-rules whose block holds declarations rather than rules
const DECLARATION_AT_RULES: [&str; 4] = ["counter-style", "font-face", "font-palette-values", "property"];

/// Prelude of an at-rule other than media and keyframes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AtRulePrelude {
    /// Block holds rules, like `@supports`
    Rules,
    /// Block holds declarations, like `@font-face`
    Declarations,
}

/// Mutable scan state; lives for a single resolve
struct Automaton<'t> {
    tokens: &'t [Token],
    cursor: usize,
    state: CssState,
    substate: SelectorSubstate,
    selector: String,
    selectors: Vec<String>,
    /// Outer selectors of open `:not(` groups, innermost last
    pending_not: Vec<String>,
    property_name: Option<String>,
    scope_stack: Vec<ScopeMarker>,
    /// Set between an unsupported at-keyword and its `;` or `{`
    at_rule: Option<AtRulePrelude>,
}

impl<'t> Automaton<'t> {
    fn new(tokens: &'t [Token], scope_stack: Vec<ScopeMarker>) -> Self {
        Self {
            tokens,
            cursor: 0,
            state: CssState::Null,
            substate: SelectorSubstate::Null,
            selector: String::new(),
            selectors: Vec::new(),
            pending_not: Vec::new(),
            property_name: None,
            scope_stack,
            at_rule: None,
        }
    }

    fn run(&mut self, mut checkpoints: Option<&mut CheckpointCache>) {
        while let Some(token) = self.next_token() {
            let before = self.state;
            self.step(token);

            if before != self.state {
                trace!(from = ?before, to = ?self.state, token = %token.text, "transition");
            }

            // Only tokens that cannot grow on the next keystroke make a restart point
            if self.state == CssState::Null
                && self.at_rule.is_none()
                && is_boundary(token)
                && let Some(cache) = checkpoints.as_deref_mut()
            {
                cache.record(token.loc.end.line, token.loc.end.column, &self.scope_stack);
            }
        }
    }

    fn next_token(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.cursor)?;
        self.cursor += 1;
        Some(token)
    }

    fn peek_token(&self) -> Option<&'t Token> {
        self.tokens.get(self.cursor)
    }

    fn top(&self) -> Option<ScopeMarker> {
        self.scope_stack.last().copied()
    }

    fn pop_if(&mut self, marker: ScopeMarker) -> bool {
        if self.top() == Some(marker) {
            self.scope_stack.pop();
            true
        } else {
            false
        }
    }

    fn step(&mut self, token: &'t Token) {
        match self.state {
            CssState::Null => self.step_null(token),
            CssState::Property => self.step_property(token),
            CssState::Value => self.step_value(token),
            CssState::Selector => self.step_selector(token),
            CssState::Media => self.step_media(token),
            CssState::Keyframes => self.step_keyframes(token),
            CssState::Frame => self.step_frame(token),
        }
    }

    /* ========================= Top-level states ========================= */

    fn step_null(&mut self, token: &'t Token) {
        if let Some(prelude) = self.at_rule {
            self.step_at_rule_prelude(prelude, token);
            return;
        }

        match &token.kind {
            TokenKind::Hash { .. } => {
                self.enter_selector(SelectorSubstate::Id);
                self.selector = format!("#{}", token.value);
            }
            TokenKind::Ident => {
                self.enter_selector(SelectorSubstate::Tag);
                self.selector = token.text.clone();
            }
            TokenKind::Delim('.') => {
                self.enter_selector(SelectorSubstate::Class);
                self.selector = ".".to_string();
                self.take_class_name();
            }
            TokenKind::Delim('#') => {
                self.enter_selector(SelectorSubstate::Id);
                self.selector = "#".to_string();
            }
            TokenKind::Delim('*') => {
                self.enter_selector(SelectorSubstate::Tag);
                self.selector = "*".to_string();
            }
            TokenKind::Colon => {
                self.state = CssState::Selector;
                self.pseudo();
            }
            TokenKind::SquareBracketBlock => {
                self.state = CssState::Selector;
                self.open_attribute();
            }
            TokenKind::CloseCurlyBracket => {
                if !self.pop_if(ScopeMarker::Media) {
                    self.pop_if(ScopeMarker::AtRule);
                }
            }
            TokenKind::AtKeyword if token.value.starts_with('m') => self.state = CssState::Media,
            TokenKind::AtKeyword if token.value.starts_with('k') => self.state = CssState::Keyframes,
            TokenKind::AtKeyword => {
                let name = token.value.to_ascii_lowercase();
                self.at_rule = Some(if DECLARATION_AT_RULES.contains(&name.as_str()) {
                    AtRulePrelude::Declarations
                } else {
                    AtRulePrelude::Rules
                });
            }
            _ => {}
        }
    }

    /// Skip the prelude of an unsupported at-rule, staying in Null
    fn step_at_rule_prelude(&mut self, prelude: AtRulePrelude, token: &'t Token) {
        match token.kind {
            TokenKind::Semicolon => self.at_rule = None,
            TokenKind::CurlyBracketBlock => {
                self.at_rule = None;
                match prelude {
                    AtRulePrelude::Rules => self.scope_stack.push(ScopeMarker::AtRule),
                    AtRulePrelude::Declarations => {
                        self.scope_stack.push(ScopeMarker::Brace);
                        self.state = CssState::Property;
                    }
                }
            }
            TokenKind::CloseCurlyBracket => {
                self.at_rule = None;
                self.step_null(token);
            }
            _ => {}
        }
    }

    fn step_media(&mut self, token: &Token) {
        if token.kind == TokenKind::CurlyBracketBlock {
            self.scope_stack.push(ScopeMarker::Media);
            self.state = CssState::Null;
        }
    }

    fn step_keyframes(&mut self, token: &Token) {
        if token.kind == TokenKind::CurlyBracketBlock {
            self.scope_stack.push(ScopeMarker::Keyframes);
            self.state = CssState::Frame;
        }
    }

    fn step_frame(&mut self, token: &Token) {
        match token.kind {
            TokenKind::CurlyBracketBlock => {
                self.scope_stack.push(ScopeMarker::Frame);
                self.state = CssState::Property;
            }
            TokenKind::CloseCurlyBracket => {
                self.pop_if(ScopeMarker::Keyframes);
                self.state = CssState::Null;
            }
            _ => {}
        }
    }

    fn step_property(&mut self, token: &Token) {
        match token.kind {
            TokenKind::Colon => {
                self.scope_stack.push(ScopeMarker::Colon);
                self.property_name = self.previous_significant_text();
                self.state = CssState::Value;
            }
            TokenKind::CloseCurlyBracket => self.close_block(),
            _ => {}
        }
    }

    fn step_value(&mut self, token: &Token) {
        match token.kind {
            TokenKind::Semicolon => {
                if self.pop_if(ScopeMarker::Colon) {
                    self.state = CssState::Property;
                }
            }
            TokenKind::CloseCurlyBracket => {
                self.pop_if(ScopeMarker::Colon);
                self.close_block();
            }
            _ => {}
        }
    }

    /// `}` of a rule body or keyframe
    fn close_block(&mut self) {
        match self.top() {
            Some(ScopeMarker::Frame) => {
                self.scope_stack.pop();
                self.state = CssState::Frame;
            }
            Some(ScopeMarker::Brace) => {
                self.scope_stack.pop();
                self.selector.clear();
                self.selectors.clear();
                self.pending_not.clear();
                self.state = CssState::Null;
            }
            _ => {}
        }
    }

    /// Text of the last non-whitespace token before the current one
    fn previous_significant_text(&self) -> Option<String> {
        let before = &self.tokens[..self.cursor.saturating_sub(1)];
        last_significant(before).map(|i| before[i].text.clone())
    }

    /* ========================= Selector states ========================= */

    fn enter_selector(&mut self, substate: SelectorSubstate) {
        self.state = CssState::Selector;
        self.substate = substate;
    }

    fn step_selector(&mut self, token: &'t Token) {
        if token.kind == TokenKind::CurlyBracketBlock {
            self.scope_stack.push(ScopeMarker::Brace);
            let selector = std::mem::take(&mut self.selector);
            self.selectors.push(selector.trim_end().to_string());
            self.state = CssState::Property;
            return;
        }

        match self.substate {
            SelectorSubstate::Id | SelectorSubstate::Class | SelectorSubstate::Tag => {
                self.step_compound(token)
            }
            SelectorSubstate::Null => self.step_selector_null(token),
            SelectorSubstate::Pseudo => self.step_pseudo(token),
            SelectorSubstate::Attribute => self.step_attribute(token),
            SelectorSubstate::Value => self.step_attribute_value(token),
        }
    }

    /// Inside an id, class or tag: combinators and whitespace end the compound
    fn step_compound(&mut self, token: &'t Token) {
        match &token.kind {
            TokenKind::Delim('>' | '~' | '+') => {
                self.substate = SelectorSubstate::Null;
                self.selector.push_str(&token.text);
            }
            TokenKind::Whitespace => {
                self.substate = SelectorSubstate::Null;
                self.push_space();
            }
            _ => self.simple_selector_start(token),
        }
    }

    /// Between compounds: idents and `*` start a tag
    fn step_selector_null(&mut self, token: &'t Token) {
        match &token.kind {
            TokenKind::Ident => {
                self.substate = SelectorSubstate::Tag;
                self.selector.push_str(&token.text);
            }
            TokenKind::Delim('*') => {
                self.substate = SelectorSubstate::Tag;
                self.selector.push('*');
            }
            TokenKind::Delim('>' | '~' | '+') => {
                self.selector.push_str(&token.text);
            }
            TokenKind::Whitespace => self.push_space(),
            _ => self.simple_selector_start(token),
        }
    }

    /// Tokens that behave the same in the null and compound sub-states
    fn simple_selector_start(&mut self, token: &'t Token) {
        match &token.kind {
            TokenKind::Hash { .. } => {
                self.substate = SelectorSubstate::Id;
                self.selector.push('#');
                self.selector.push_str(&token.value);
            }
            TokenKind::Delim('.') => {
                self.substate = SelectorSubstate::Class;
                self.selector.push('.');
                self.take_class_name();
            }
            TokenKind::Delim('#') => {
                self.substate = SelectorSubstate::Id;
                self.selector.push('#');
            }
            TokenKind::Comma => self.finish_group_member(),
            TokenKind::Colon => self.pseudo(),
            TokenKind::SquareBracketBlock => self.open_attribute(),
            TokenKind::CloseParenthesis => self.close_paren(),
            _ => {}
        }
    }

    fn step_pseudo(&mut self, token: &'t Token) {
        match &token.kind {
            TokenKind::Delim('>' | '~' | '+') => {
                self.substate = SelectorSubstate::Null;
                self.selector.push_str(&token.text);
            }
            TokenKind::Comma => self.finish_group_member(),
            TokenKind::Colon => self.pseudo(),
            TokenKind::SquareBracketBlock => self.open_attribute(),
            TokenKind::Whitespace => {
                self.substate = SelectorSubstate::Null;
                self.push_space();
            }
            _ => {}
        }
    }

    fn step_attribute(&mut self, token: &Token) {
        match &token.kind {
            kind if kind.is_attribute_match() => {
                self.substate = SelectorSubstate::Value;
                self.selector.push_str(&token.text);
            }
            TokenKind::Delim('=') => {
                self.substate = SelectorSubstate::Value;
                self.selector.push('=');
            }
            TokenKind::CloseSquareBracket => self.close_attribute(),
            TokenKind::Ident | TokenKind::QuotedString => self.selector.push_str(&token.text),
            _ => {}
        }
    }

    fn step_attribute_value(&mut self, token: &Token) {
        match &token.kind {
            TokenKind::Ident | TokenKind::QuotedString => self.selector.push_str(&token.text),
            TokenKind::CloseSquareBracket => self.close_attribute(),
            _ => {}
        }
    }

    /// After `.`, an immediately following ident is part of the class
    fn take_class_name(&mut self) {
        if let Some(next) = self.peek_token()
            && next.kind == TokenKind::Ident
        {
            self.cursor += 1;
            self.selector.push_str(&next.text);
        }
    }

    /// `:` with one token of lookahead for the pseudo-class name
    fn pseudo(&mut self) {
        self.substate = SelectorSubstate::Pseudo;
        self.selector.push(':');

        let Some(next) = self.peek_token() else {
            return;
        };
        if matches!(next.kind, TokenKind::Function | TokenKind::Ident) {
            self.cursor += 1;
        }
        match &next.kind {
            TokenKind::Function if next.value == "not" => {
                self.pending_not.push(std::mem::take(&mut self.selector));
                self.scope_stack.push(ScopeMarker::Paren);
                self.substate = SelectorSubstate::Null;
            }
            TokenKind::Function => {
                self.selector.push_str(&next.value);
                self.selector.push('(');
                self.substate = SelectorSubstate::Null;
            }
            TokenKind::Ident => self.selector.push_str(&next.text),
            _ => {}
        }
    }

    /// `)` closes a `:not(` group when one is open
    fn close_paren(&mut self) {
        if self.pop_if(ScopeMarker::Paren)
            && let Some(outer) = self.pending_not.pop()
        {
            let inner = std::mem::take(&mut self.selector);
            self.selector = format!("{outer}not({inner})");
        } else {
            self.selector.push(')');
        }
        self.substate = SelectorSubstate::Null;
    }

    fn open_attribute(&mut self) {
        self.substate = SelectorSubstate::Attribute;
        self.scope_stack.push(ScopeMarker::Bracket);
        self.selector.push('[');
    }

    fn close_attribute(&mut self) {
        self.pop_if(ScopeMarker::Bracket);
        self.substate = SelectorSubstate::Null;
        self.selector.push(']');
    }

    fn finish_group_member(&mut self) {
        self.substate = SelectorSubstate::Null;
        let selector = std::mem::take(&mut self.selector);
        self.selectors.push(selector.trim_end().to_string());
    }

    /// Whitespace collapses to one space; a dropped comment can leave two runs
    fn push_space(&mut self) {
        if !self.selector.is_empty() && !self.selector.ends_with(' ') {
            self.selector.push(' ');
        }
    }

    /* ========================= Finalisation ========================= */

    fn into_context(self, caret: Caret) -> ResolutionContext {
        let last = self.tokens.last();

        let mut selector = self.selector;
        if let Some(token) = last
            && !token.is_whitespace()
            && token.loc.end.line == caret.line
            && token.loc.end.column > caret.column
        {
            let overshoot = token.loc.end.column - caret.column;
            let keep = selector.chars().count().saturating_sub(overshoot);
            selector = selector.chars().take(keep).collect();
        }

        let partial = last.filter(|token| !token.is_whitespace());
        let mut completing = partial.map_or(String::new(), |token| completing_text(token, caret));

        if completing == ":" && self.state == CssState::Value {
            completing.clear();
        }

        // `!` only joins a word being typed right after it
        let before_last = self.tokens.len().checked_sub(2).map(|i| &self.tokens[i]);
        if partial.is_some()
            && let Some(prev) = before_last
            && prev.is_delim('!')
            && "important".starts_with(completing.as_str())
        {
            completing.insert(0, '!');
        }

        ResolutionContext {
            state: self.state,
            selector_substate: (self.state == CssState::Selector).then_some(self.substate),
            selector,
            selectors: self.selectors,
            selector_before_not: self.pending_not.last().cloned(),
            property_name: if self.state == CssState::Value {
                self.property_name
            } else {
                None
            },
            completing,
            scope_stack: self.scope_stack,
        }
    }
}

fn is_boundary(token: &Token) -> bool {
    matches!(
        token.kind,
        TokenKind::Whitespace
            | TokenKind::Semicolon
            | TokenKind::CurlyBracketBlock
            | TokenKind::CloseCurlyBracket
    )
}

/// Part of the final token typed before the caret
fn completing_text(token: &Token, caret: Caret) -> String {
    let typed: String = if token.loc.start.line == caret.line {
        let count = caret.column.saturating_sub(token.loc.start.column);
        token.text.chars().take(count).collect()
    } else {
        token.text.clone()
    };

    let typed = match token.kind {
        TokenKind::Hash { .. } | TokenKind::AtKeyword => typed.chars().skip(1).collect(),
        _ => typed,
    };

    if typed == "." || typed == "#" {
        String::new()
    } else {
        typed
    }
}
