//! CSS completion engine
//!
//! This module works out what the user is typing at a caret in a CSS
//! document and suggests how to finish it. The system is built on a
//! finite state machine that is error-tolerant and works with half-typed
//! stylesheets.
//!
//! # Architecture
//!
//! The completion system consists of several components:
//!
//! - **TokenStream**: Caret-aware helpers to cut and rebase source text
//! - **FSM**: Resolves the state at the caret from the token sequence
//! - **Checkpoint**: Caches top-level restart points of large documents
//! - **Context**: Immutable result of one resolve
//! - **Provider**: Property names and values from a sorted table
//! - **Selector**: Asynchronous selector suggestions with stale-answer checks
//! - **Span**: Exact span of the selector, property or value under a caret
//! - **Engine**: Orchestrates the entire completion flow
//!
//! # Examples
//!
//! ```no_run
//! use cssense::completion::{Caret, CssCompleter};
//!
//! # async fn demo() {
//! let mut completer = CssCompleter::default();
//!
//! // Complete "div { colo" with the caret after "colo"
//! let candidates = completer.complete("div { colo", Caret::new(0, 10)).await;
//! // Returns property names starting with "colo"
//! # }
//! ```

mod checkpoint;
mod context;
mod engine;
mod fsm;
mod provider;
mod selector;
mod span;
mod token_stream;

pub use checkpoint::{Checkpoint, CheckpointCache};
pub use context::{Candidate, CssState, ResolutionContext, ScopeMarker, SelectorSubstate};
pub use engine::CssCompleter;
pub use provider::{PropertyDatabase, StaticPropertyDatabase, complete_properties, complete_values};
pub use selector::{SelectorMatches, SelectorQuery, SelectorRequest, SelectorSuggestor, StaticSelectorIndex};
pub use span::SpanInfo;
pub use token_stream::{Caret, end_of};
