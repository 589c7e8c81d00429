//! Completion context definitions
//!
//! This module defines the states the resolver can settle in and the
//! immutable [`ResolutionContext`] produced by a single resolve.

use std::fmt;

use serde::Serialize;

/// What kind of construct the caret sits inside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CssState {
    /// Top level, between rules
    Null,
    /// Declaration block, where a property name is expected
    Property,
    /// After `property:`, before `;` or `}`
    Value,
    /// Inside a selector, before its `{`
    Selector,
    /// After `@media` (or any other `@m...` rule), before its `{`
    Media,
    /// After `@keyframes` (or any other `@k...` rule), before its `{`
    Keyframes,
    /// Inside a keyframes block, where a frame selector is expected
    Frame,
}

/// Finer state while inside [`CssState::Selector`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorSubstate {
    Null,
    Id,
    Class,
    Tag,
    Pseudo,
    Attribute,
    Value,
}

impl SelectorSubstate {
    /// Stable label sent to selector query collaborators
    pub fn label(self) -> &'static str {
        match self {
            SelectorSubstate::Null => "null",
            SelectorSubstate::Id => "id",
            SelectorSubstate::Class => "class",
            SelectorSubstate::Tag => "tag",
            SelectorSubstate::Pseudo => "pseudo",
            SelectorSubstate::Attribute => "attribute",
            SelectorSubstate::Value => "value",
        }
    }
}

impl fmt::Display for SelectorSubstate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Marker for an open nested construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScopeMarker {
    /// `{` of a rule body
    #[serde(rename = "{")]
    Brace,
    /// `[` of an attribute selector
    #[serde(rename = "[")]
    Bracket,
    /// `(` of a `:not(` selector
    #[serde(rename = "(")]
    Paren,
    /// `:` between a property name and its value
    #[serde(rename = ":")]
    Colon,
    /// `{` of an `@media` block
    #[serde(rename = "@m")]
    Media,
    /// `{` of an `@keyframes` block
    #[serde(rename = "@k")]
    Keyframes,
    /// `{` of a single keyframe
    #[serde(rename = "f")]
    Frame,
    /// `{` of any other at-rule whose block holds rules
    #[serde(rename = "@")]
    AtRule,
}

/// Result of resolving the caret position of a document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionContext {
    /// Top-level state at the caret
    pub state: CssState,
    /// Sub-state, only while `state` is [`CssState::Selector`]
    pub selector_substate: Option<SelectorSubstate>,
    /// Selector text accumulated so far
    pub selector: String,
    /// Already completed members of the current comma group
    pub selectors: Vec<String>,
    /// Outer selector while the caret is inside `:not(`
    pub selector_before_not: Option<String>,
    /// Property being valued, only while `state` is [`CssState::Value`]
    pub property_name: Option<String>,
    /// Partial token being typed
    pub completing: String,
    /// Open constructs, innermost last
    pub scope_stack: Vec<ScopeMarker>,
}

impl ResolutionContext {
    /// Check if the selector (including a pending `:not(`) is empty
    pub fn selector_is_empty(&self) -> bool {
        self.selector.is_empty() && self.selector_before_not.is_none()
    }
}

/// A completion candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Display text for the candidate
    pub label: String,
    /// Part of the label the user already typed
    #[serde(rename = "preLabel")]
    pub pre_label: String,
    /// Replacement text to insert
    pub text: String,
}

impl Candidate {
    pub fn new(
        label: impl Into<String>,
        pre_label: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            pre_label: pre_label.into(),
            text: text.into(),
        }
    }
}
