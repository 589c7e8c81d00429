//! cssense library
//!
//! Caret-aware completion for CSS documents. Given a stylesheet and a caret,
//! the engine works out whether the user is typing a selector, a property
//! name, a value or an at-rule keyword, and suggests how to finish it. It
//! also reports the exact span of the construct under the caret.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `completion`: State resolution, checkpoints and suggestion sources
//! - `config`: Configuration management
//! - `error`: Error types and handling
//! - `parser`: CSS tokenizer with line/column locations
//!
//! # Example
//!
//! ```no_run
//! use cssense::{Caret, CssCompleter, CssState};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut completer = CssCompleter::default();
//!     let source = "a {\n  background-c";
//!
//!     let ctx = completer.resolve_state(source, Caret::new(1, 14));
//!     assert_eq!(ctx.map(|c| c.state), Some(CssState::Property));
//!
//!     for candidate in completer.complete(source, Caret::new(1, 14)).await {
//!         println!("{}", candidate.text);
//!     }
//! }
//! ```

pub mod cli;
pub mod completion;
pub mod config;
pub mod error;
pub mod parser;

// Re-export commonly used types
pub use completion::{Candidate, Caret, CssCompleter, CssState, ResolutionContext, SpanInfo};
pub use config::Config;
pub use error::{CssenseError, Result};
pub use parser::{CssTokenizer, Tokenizer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
pub fn version() -> &'static str {
    VERSION
}
