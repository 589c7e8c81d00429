//! CSS lexer for error-tolerant tokenization
//!
//! Tokenizing is delegated to `cssparser`, which follows the CSS Syntax
//! Level 3 token model and accepts any input. Its block-structured stream
//! is flattened here into the located token list the resolver walks.
//!
//! # Design Principles
//!
//! - **Never reject input** - stray characters become `Delim` tokens
//! - **Flat stream** - block contents are inlined and a closing bracket is
//!   emitted only when the source actually contains it
//! - **Located tokens** - every token carries zero-based line/column positions
//!   counted in chars, with an exclusive end
//! - **No comments** - comments are dropped, so an unterminated comment
//!   simply ends the stream early

use cssparser::{ParseError, Parser, ParserInput, Token as CssToken};
use serde::Serialize;

/// A position in the source (zero-based, columns counted in chars)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Shift a position produced from a sub-text back into document coordinates.
    ///
    /// Only positions on the sub-text's first line receive the column offset.
    pub fn shifted(self, line: usize, column: usize) -> Self {
        if self.line == 0 {
            Self::new(line, self.column + column)
        } else {
            Self::new(self.line + line, self.column)
        }
    }
}

/// Start (inclusive) and end (exclusive) of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Location {
    pub start: Position,
    pub end: Position,
}

/// Token types for CSS
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifier (`color`, `div`, `--custom`)
    Ident,
    /// Function name including the opening paren (`not(`, `rgb(`)
    Function,
    /// At-keyword (`@media`)
    AtKeyword,
    /// Hash (`#main`); `id` is set when the name would start an identifier
    Hash { id: bool },
    /// Quoted string
    QuotedString,
    /// String broken by an unescaped newline
    BadString,
    /// Unquoted `url(...)`
    Url,
    /// Malformed unquoted url
    BadUrl,
    Number,
    Percentage,
    Dimension,
    Whitespace,
    /// Any single character without a dedicated token
    Delim(char),
    Colon,
    Semicolon,
    Comma,
    /// `{`
    CurlyBracketBlock,
    /// `}`
    CloseCurlyBracket,
    /// `[`
    SquareBracketBlock,
    /// `]`
    CloseSquareBracket,
    /// `(`
    ParenthesisBlock,
    /// `)`
    CloseParenthesis,
    /// `~=`
    IncludeMatch,
    /// `|=`
    DashMatch,
    /// `^=`
    PrefixMatch,
    /// `$=`
    SuffixMatch,
    /// `*=`
    SubstringMatch,
    /// `<!--`
    Cdo,
    /// `-->`
    Cdc,
}

impl TokenKind {
    /// Check if this kind is one of the attribute match operators
    pub fn is_attribute_match(&self) -> bool {
        matches!(
            self,
            TokenKind::IncludeMatch
                | TokenKind::DashMatch
                | TokenKind::PrefixMatch
                | TokenKind::SuffixMatch
                | TokenKind::SubstringMatch
        )
    }
}

/// Token with raw text, decoded value and location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Raw source slice
    pub text: String,
    /// Decoded payload (name without sigil, unquoted string, ...)
    pub value: String,
    pub loc: Location,
}

impl Token {
    /// Create a new token
    pub fn new(kind: TokenKind, text: String, value: String, loc: Location) -> Self {
        Self {
            kind,
            text,
            value,
            loc,
        }
    }

    pub fn is_whitespace(&self) -> bool {
        self.kind == TokenKind::Whitespace
    }

    /// Check if this token is the given delimiter character
    pub fn is_delim(&self, ch: char) -> bool {
        self.kind == TokenKind::Delim(ch)
    }

    /// Move the token from sub-text coordinates into document coordinates
    pub fn shifted(mut self, line: usize, column: usize) -> Self {
        self.loc.start = self.loc.start.shifted(line, column);
        self.loc.end = self.loc.end.shifted(line, column);
        self
    }
}

/// Something that can split CSS text into located tokens
pub trait Tokenizer: Send + Sync {
    /// Tokenize a whole text; locations start at line 0, column 0
    fn tokenize(&self, text: &str) -> Vec<Token>;

    /// Tokenize a fragment that starts at `(line, column)` of a larger document
    fn tokenize_at(&self, text: &str, line: usize, column: usize) -> Vec<Token> {
        self.tokenize(text)
            .into_iter()
            .map(|token| token.shifted(line, column))
            .collect()
    }
}

/// Default [`Tokenizer`] backed by [`CssLexer`]
#[derive(Debug, Clone, Copy, Default)]
pub struct CssTokenizer;

impl Tokenizer for CssTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        CssLexer::tokenize(text)
    }
}

/// Flattens the `cssparser` token stream into located [`Token`]s
pub struct CssLexer<'a> {
    source: &'a str,
    /// Byte offset that `position` describes
    offset: usize,
    position: Position,
    tokens: Vec<Token>,
}

impl<'a> CssLexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            position: Position::default(),
            tokens: Vec::new(),
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(input: &str) -> Vec<Token> {
        let mut parser_input = ParserInput::new(input);
        let mut parser = Parser::new(&mut parser_input);
        let mut lexer = CssLexer::new(input);
        lexer.collect(&mut parser);
        lexer.tokens
    }

    /// Drain `parser`, descending into every block it opens
    fn collect(&mut self, parser: &mut Parser<'_, '_>) {
        loop {
            let start = parser.position().byte_index();
            let token = match parser.next_including_whitespace_and_comments() {
                Ok(token) => token.clone(),
                Err(_) => return,
            };
            let end = parser.position().byte_index();

            let closing = closing_kind(&token);
            if let Some((kind, value)) = classify(&token) {
                self.push(kind, value, start, end);
            }

            let Some(closing) = closing else {
                continue;
            };
            let mut inner_end = end;
            let _: Result<(), ParseError<'_, ()>> = parser.parse_nested_block(|inner| {
                self.collect(inner);
                inner_end = inner.position().byte_index();
                Ok(())
            });

            // An unterminated block stops at end of input without a closing token
            let after = parser.position().byte_index();
            if after > inner_end {
                self.push(closing, None, inner_end, after);
            }
        }
    }

    fn push(&mut self, kind: TokenKind, value: Option<String>, start: usize, end: usize) {
        let text = self.source.get(start..end).unwrap_or_default().to_string();
        let loc = Location {
            start: self.advance_to(start),
            end: self.advance_to(end),
        };
        let value = value.unwrap_or_else(|| text.clone());
        self.tokens.push(Token::new(kind, text, value, loc));
    }

    /// Move the line/column cursor forward to a byte offset
    fn advance_to(&mut self, offset: usize) -> Position {
        if let Some(skipped) = self.source.get(self.offset..offset) {
            for ch in skipped.chars() {
                if ch == '\n' {
                    self.position.line += 1;
                    self.position.column = 0;
                } else {
                    self.position.column += 1;
                }
            }
            self.offset = offset;
        }
        self.position
    }
}

/// Kind and decoded value of a `cssparser` token; `None` for comments
fn classify(token: &CssToken<'_>) -> Option<(TokenKind, Option<String>)> {
    let decoded = |value: &str| Some(value.to_string());
    let classified = match token {
        CssToken::Ident(name) => (TokenKind::Ident, decoded(name)),
        CssToken::AtKeyword(name) => (TokenKind::AtKeyword, decoded(name)),
        CssToken::Hash(name) => (TokenKind::Hash { id: false }, decoded(name)),
        CssToken::IDHash(name) => (TokenKind::Hash { id: true }, decoded(name)),
        CssToken::QuotedString(value) => (TokenKind::QuotedString, decoded(value)),
        CssToken::BadString(value) => (TokenKind::BadString, decoded(value)),
        CssToken::UnquotedUrl(url) => (TokenKind::Url, decoded(url)),
        CssToken::BadUrl(url) => (TokenKind::BadUrl, decoded(url)),
        CssToken::Function(name) => (TokenKind::Function, decoded(name)),
        CssToken::Delim(ch) => (TokenKind::Delim(*ch), None),
        CssToken::Number { .. } => (TokenKind::Number, None),
        CssToken::Percentage { .. } => (TokenKind::Percentage, None),
        CssToken::Dimension { .. } => (TokenKind::Dimension, None),
        CssToken::WhiteSpace(_) => (TokenKind::Whitespace, None),
        CssToken::Comment(_) => return None,
        CssToken::Colon => (TokenKind::Colon, None),
        CssToken::Semicolon => (TokenKind::Semicolon, None),
        CssToken::Comma => (TokenKind::Comma, None),
        CssToken::IncludeMatch => (TokenKind::IncludeMatch, None),
        CssToken::DashMatch => (TokenKind::DashMatch, None),
        CssToken::PrefixMatch => (TokenKind::PrefixMatch, None),
        CssToken::SuffixMatch => (TokenKind::SuffixMatch, None),
        CssToken::SubstringMatch => (TokenKind::SubstringMatch, None),
        CssToken::CDO => (TokenKind::Cdo, None),
        CssToken::CDC => (TokenKind::Cdc, None),
        CssToken::ParenthesisBlock => (TokenKind::ParenthesisBlock, None),
        CssToken::SquareBracketBlock => (TokenKind::SquareBracketBlock, None),
        CssToken::CurlyBracketBlock => (TokenKind::CurlyBracketBlock, None),
        CssToken::CloseParenthesis => (TokenKind::CloseParenthesis, None),
        CssToken::CloseSquareBracket => (TokenKind::CloseSquareBracket, None),
        CssToken::CloseCurlyBracket => (TokenKind::CloseCurlyBracket, None),
    };
    Some(classified)
}

/// Closing kind for tokens that open a nested block
fn closing_kind(token: &CssToken<'_>) -> Option<TokenKind> {
    match token {
        CssToken::Function(_) | CssToken::ParenthesisBlock => Some(TokenKind::CloseParenthesis),
        CssToken::SquareBracketBlock => Some(TokenKind::CloseSquareBracket),
        CssToken::CurlyBracketBlock => Some(TokenKind::CloseCurlyBracket),
        _ => None,
    }
}
