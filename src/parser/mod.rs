//! CSS tokenization for cssense
//!
//! The completion engine never parses a full stylesheet. It only needs a
//! located token stream, which this module provides through the
//! [`Tokenizer`] trait. [`CssTokenizer`] is the built-in implementation;
//! hosts with their own lexer can plug it in instead.
//!
//! # Examples
//!
//! ```no_run
//! use cssense::parser::{CssTokenizer, TokenKind, Tokenizer};
//!
//! let tokens = CssTokenizer.tokenize("div { color: red }");
//! assert_eq!(tokens[0].kind, TokenKind::Ident);
//! ```

mod css_lexer;

// Re-export public API
pub use css_lexer::{CssLexer, CssTokenizer, Location, Position, Token, TokenKind, Tokenizer};
