//! Completion engine - orchestrates the completion flow
//!
//! [`CssCompleter`] is the per-document session: it owns the checkpoint
//! cache, resolves the caret state and dispatches to the suggestors.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use tracing::debug;

use super::checkpoint::CheckpointCache;
use super::context::{Candidate, CssState, ResolutionContext};
use super::fsm::{self, ScanStart};
use super::provider::{PropertyDatabase, StaticPropertyDatabase, complete_properties, complete_values};
use super::selector::{SelectorQuery, SelectorSuggestor, StaticSelectorIndex};
use super::span::{self, SpanInfo};
use super::token_stream::{Caret, limit_source, rebase_source};
use crate::config::CompletionConfig;
use crate::error::{ConfigError, Result};
use crate::parser::{CssTokenizer, Position, Token, Tokenizer};

/// At-rule keywords offered after `@`
const AT_RULE_KEYWORDS: [&str; 2] = ["media", "keyframes"];

/// Completion session for one CSS document
pub struct CssCompleter {
    tokenizer: Box<dyn Tokenizer>,
    properties: Arc<dyn PropertyDatabase>,
    selectors: Option<SelectorSuggestor>,
    max_entries: usize,
    checkpoints: CheckpointCache,
}

impl Default for CssCompleter {
    fn default() -> Self {
        Self::new(Arc::new(StaticPropertyDatabase::default()))
    }
}

impl CssCompleter {
    /// Create a completer with the default tokenizer and no selector source
    pub fn new(properties: Arc<dyn PropertyDatabase>) -> Self {
        Self {
            tokenizer: Box::new(CssTokenizer),
            properties,
            selectors: None,
            max_entries: CompletionConfig::default().max_entries,
            checkpoints: CheckpointCache::new(),
        }
    }

    /// Build a completer from configuration, loading any configured tables
    pub fn from_config(config: &CompletionConfig) -> Result<Self> {
        let properties: Arc<dyn PropertyDatabase> = match &config.properties_file {
            Some(path) => Arc::new(StaticPropertyDatabase::from_json_file(path)?),
            None => Arc::new(StaticPropertyDatabase::default()),
        };

        let mut completer = Self::new(properties).with_max_entries(config.max_entries)?;
        if let Some(path) = &config.selectors_file {
            let index = StaticSelectorIndex::from_json_file(path)?;
            completer = completer.with_selector_query(Arc::new(index));
        }
        Ok(completer)
    }

    /// Set the candidate cap; zero is rejected
    pub fn with_max_entries(mut self, max_entries: usize) -> Result<Self> {
        if max_entries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_entries".to_string(),
                value: max_entries.to_string(),
            }
            .into());
        }
        self.max_entries = max_entries;
        Ok(self)
    }

    pub fn with_tokenizer(mut self, tokenizer: Box<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Enable selector completion backed by `query`
    pub fn with_selector_query(mut self, query: Arc<dyn SelectorQuery>) -> Self {
        self.selectors = Some(SelectorSuggestor::new(query));
        self
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn checkpoints(&self) -> &CheckpointCache {
        &self.checkpoints
    }

    /// Complete the source at the given caret
    ///
    /// The resolve and any synchronous suggestion happen before this returns.
    /// The future only waits for a selector query, and yields nothing if a
    /// newer completion started in the meantime.
    pub fn complete(&mut self, source: &str, caret: Caret) -> BoxFuture<'static, Vec<Candidate>> {
        if let Some(selectors) = &self.selectors {
            selectors.supersede();
        }

        let Some(ctx) = self.resolve_state(source, caret) else {
            debug!(?caret, "no context at caret");
            return future::ready(Vec::new()).boxed();
        };
        debug!(state = ?ctx.state, completing = %ctx.completing, "dispatching completion");

        let candidates = match ctx.state {
            CssState::Property => {
                complete_properties(self.properties.as_ref(), &ctx.completing, self.max_entries)
            }
            CssState::Value => match &ctx.property_name {
                Some(property) => complete_values(
                    self.properties.as_ref(),
                    property,
                    &ctx.completing,
                    self.max_entries,
                ),
                None => Vec::new(),
            },
            CssState::Selector => {
                return match &self.selectors {
                    Some(selectors) => selectors.suggest(&ctx, self.max_entries),
                    None => future::ready(Vec::new()).boxed(),
                };
            }
            CssState::Media | CssState::Keyframes => at_rule_candidates(&ctx.completing),
            CssState::Null | CssState::Frame => Vec::new(),
        };

        future::ready(candidates).boxed()
    }

    /// Resolve the caret state of a whole document, using and updating the
    /// checkpoint cache
    pub fn resolve_state(&mut self, source: &str, caret: Caret) -> Option<ResolutionContext> {
        let limited = limit_source(source, caret);

        let (text, start) = match self.checkpoints.nearest_before(caret) {
            Some(index) => {
                let checkpoint = self.checkpoints.get(index)?.clone();
                self.checkpoints.truncate_after(index);
                debug!(line = checkpoint.line, column = checkpoint.column, "checkpoint hit");

                let text = rebase_source(&limited, checkpoint.line, checkpoint.column);
                let start = ScanStart {
                    origin: checkpoint.position(),
                    scope_stack: checkpoint.scope_stack,
                };
                (text, start)
            }
            None => {
                debug!(line = caret.line, "checkpoint miss, scanning from start");
                self.checkpoints.reset();
                (limited, ScanStart::default())
            }
        };

        let tokens = self
            .tokenizer
            .tokenize_at(&text, start.origin.line, start.origin.column);
        fsm::resolve(&tokens, start, caret, Some(&mut self.checkpoints))
    }

    /// Resolve an already tokenized document without touching the cache.
    ///
    /// Without a caret, the end of the last token is used.
    pub fn resolve_tokens(&self, tokens: &[Token], caret: Option<Caret>) -> Option<ResolutionContext> {
        let caret = caret.unwrap_or_else(|| tokens.last().map_or(Position::default(), |t| t.loc.end));
        fsm::resolve(tokens, ScanStart::default(), caret, None)
    }

    /// Drop cached checkpoints at or after `line`; call on every edit there
    pub fn invalidate_cache(&mut self, line: usize) {
        self.checkpoints.invalidate(line);
    }

    /// Find the construct around `caret` and its exact span
    pub fn get_info_at(&self, source: &str, caret: Caret) -> Option<SpanInfo> {
        span::locate(self.tokenizer.as_ref(), source, caret)
    }
}

fn at_rule_candidates(completing: &str) -> Vec<Candidate> {
    AT_RULE_KEYWORDS
        .iter()
        .find(|keyword| keyword.starts_with(completing))
        .map(|keyword| vec![Candidate::new(*keyword, completing, *keyword)])
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::context::ScopeMarker;
    use crate::completion::token_stream::end_of;

    const STYLESHEET: &str = "\
@media screen {
  .nav > li:hover,
  #main a:not(.external) {
    color: red;
    margin: 0 auto !important;
  }
}

@keyframes spin {
  from { transform: none; }
  to { transform: rotate(1turn); }
}

input[type=\"text\"] {
  border: 1px solid black;
}
";

    fn complete_now(completer: &mut CssCompleter, source: &str) -> Vec<Candidate> {
        tokio_test::block_on(completer.complete(source, end_of(source)))
    }

    fn every_caret(source: &str) -> Vec<Caret> {
        source
            .split('\n')
            .enumerate()
            .flat_map(|(line, text)| (0..=text.chars().count()).map(move |column| Caret::new(line, column)))
            .collect()
    }

    #[test]
    fn test_complete_property() {
        let mut completer = CssCompleter::default();
        let candidates = complete_now(&mut completer, "div.foo { colo");
        assert!(candidates.contains(&Candidate::new("color", "colo", "color: ")));
    }

    #[test]
    fn test_complete_value() {
        let mut completer = CssCompleter::default();
        let candidates = complete_now(&mut completer, "div { color: r");
        assert!(candidates.iter().any(|c| c.label == "red"));
    }

    #[test]
    fn test_complete_media_exact() {
        let mut completer = CssCompleter::default();
        let candidates = complete_now(&mut completer, "@med");
        assert_eq!(candidates, vec![Candidate::new("media", "med", "media")]);
    }

    #[test]
    fn test_complete_keyframes() {
        let mut completer = CssCompleter::default();
        let candidates = complete_now(&mut completer, "@key");
        assert_eq!(candidates, vec![Candidate::new("keyframes", "key", "keyframes")]);
        assert!(complete_now(&mut completer, "@font").is_empty());
    }

    #[test]
    fn test_no_important_without_prefix() {
        let mut completer = CssCompleter::default();
        let candidates = complete_now(&mut completer, "a { color: ");
        assert!(!candidates.is_empty());
        assert!(candidates.iter().all(|c| c.label != "!important;"));

        let candidates = complete_now(&mut completer, "a { color: red !im");
        assert_eq!(candidates, vec![Candidate::new("!important;", "!im", "!important;")]);
    }

    #[test]
    fn test_complete_respects_max_entries() {
        let mut completer = CssCompleter::default().with_max_entries(2).unwrap();
        assert_eq!(complete_now(&mut completer, "a { b").len(), 2);
    }

    #[test]
    fn test_zero_max_entries_rejected() {
        assert!(CssCompleter::default().with_max_entries(0).is_err());
    }

    #[test]
    fn test_malformed_input_gives_empty_list() {
        let mut completer = CssCompleter::default();
        assert!(complete_now(&mut completer, "a { /* unterminated").is_empty());
        assert!(complete_now(&mut completer, "").is_empty());
    }

    #[test]
    fn test_selector_without_query_source_is_empty() {
        let mut completer = CssCompleter::default();
        assert!(complete_now(&mut completer, "div.fo").is_empty());
    }

    #[tokio::test]
    async fn test_complete_selector() {
        let index = StaticSelectorIndex {
            classes: vec!["foo".to_string(), "footer".to_string()],
            ..Default::default()
        };
        let mut completer = CssCompleter::default().with_selector_query(Arc::new(index));

        let candidates = completer.complete("div.fo", Caret::new(0, 6)).await;
        assert_eq!(
            candidates,
            vec![
                Candidate::new("div.foo", "div.fo", "div.foo"),
                Candidate::new("div.footer", "div.fo", "div.footer"),
            ]
        );
    }

    #[tokio::test]
    async fn test_newer_completion_supersedes_selector_query() {
        let index = StaticSelectorIndex {
            tags: vec!["span".to_string()],
            ..Default::default()
        };
        let mut completer = CssCompleter::default().with_selector_query(Arc::new(index));

        let stale = completer.complete("sp", Caret::new(0, 2));
        let fresh = completer.complete("a { colo", Caret::new(0, 8));

        assert!(stale.await.is_empty());
        assert_eq!(fresh.await, vec![Candidate::new("color", "colo", "color: ")]);
    }

    #[test]
    fn test_resolve_state_records_checkpoints() {
        let mut completer = CssCompleter::default();
        let ctx = completer.resolve_state(STYLESHEET, end_of(STYLESHEET)).unwrap();
        assert_eq!(ctx.state, CssState::Null);
        assert!(ctx.scope_stack.is_empty());
        assert!(completer.checkpoints().len() > 3);
    }

    #[test]
    fn test_cache_is_transparent() {
        let mut cached = CssCompleter::default();
        cached.resolve_state(STYLESHEET, end_of(STYLESHEET));

        for caret in every_caret(STYLESHEET) {
            let fresh = CssCompleter::default().resolve_state(STYLESHEET, caret);
            let warm = cached.resolve_state(STYLESHEET, caret);
            assert_eq!(warm, fresh, "caret {caret:?}");
        }
    }

    #[test]
    fn test_cache_is_transparent_going_backwards() {
        let mut cached = CssCompleter::default();
        for caret in every_caret(STYLESHEET).into_iter().rev() {
            let fresh = CssCompleter::default().resolve_state(STYLESHEET, caret);
            assert_eq!(cached.resolve_state(STYLESHEET, caret), fresh, "caret {caret:?}");
        }
    }

    #[test]
    fn test_cache_is_transparent_after_bang_and_whitespace() {
        let source = "!  \n  #c {}\na { color: red !  \n  imp }\n!";
        let mut cached = CssCompleter::default();
        cached.resolve_state(source, end_of(source));

        for caret in every_caret(source) {
            let fresh = CssCompleter::default().resolve_state(source, caret);
            assert_eq!(cached.resolve_state(source, caret), fresh, "caret {caret:?}");
        }

        let ctx = cached.resolve_state(source, Caret::new(1, 0)).unwrap();
        assert_eq!(ctx.completing, "");
    }

    #[test]
    fn test_cache_is_transparent_around_other_at_rules() {
        let source = "@charset \"utf-8\";\n@import url(x.css)\n  screen;\n\
                      @supports (display: grid) {\n  .a, .b { color: red }\n}\n\
                      @font-face {\n  font-family: x;\n}\np { }";
        let mut cached = CssCompleter::default();
        cached.resolve_state(source, end_of(source));

        for caret in every_caret(source) {
            let fresh = CssCompleter::default().resolve_state(source, caret);
            assert_eq!(cached.resolve_state(source, caret), fresh, "caret {caret:?}");
        }
    }

    #[test]
    fn test_complete_inside_font_face() {
        let mut completer = CssCompleter::default();
        let candidates = complete_now(&mut completer, "@font-face { font-fa");
        assert_eq!(candidates, vec![Candidate::new("font-family", "font-fa", "font-family: ")]);
    }

    #[test]
    fn test_selector_after_charset() {
        let mut completer = CssCompleter::default();
        let ctx = completer.resolve_state("@charset \"utf-8\";\n.a, .b", Caret::new(1, 6)).unwrap();
        assert_eq!(ctx.state, CssState::Selector);
        assert_eq!(ctx.selectors, vec![".a".to_string()]);
    }

    #[test]
    fn test_checkpoint_restores_media_scope() {
        let mut completer = CssCompleter::default();
        let source = "@media print {\n  a { }\n  b { col";
        completer.resolve_state(source, end_of(source));

        let ctx = completer.resolve_state(source, end_of(source)).unwrap();
        assert_eq!(ctx.state, CssState::Property);
        assert_eq!(ctx.scope_stack, vec![ScopeMarker::Media, ScopeMarker::Brace]);
        assert_eq!(ctx.selectors, vec!["b".to_string()]);
    }

    #[test]
    fn test_invalidate_zero_is_fresh_session() {
        let mut completer = CssCompleter::default();
        completer.resolve_state(STYLESHEET, end_of(STYLESHEET));
        completer.invalidate_cache(0);
        assert!(completer.checkpoints().is_empty());

        let edited = STYLESHEET.replace("color: red;", "color: blu");
        let caret = Caret::new(3, 14);
        let after_invalidate = completer.resolve_state(&edited, caret);
        let fresh = CssCompleter::default().resolve_state(&edited, caret);
        assert_eq!(after_invalidate, fresh);

        let ctx = after_invalidate.unwrap();
        assert_eq!(ctx.state, CssState::Value);
        assert_eq!(ctx.completing, "blu");
    }

    #[test]
    fn test_invalidate_after_edit() {
        let mut completer = CssCompleter::default();
        let before = "a { }\nb { }\nc { }";
        completer.resolve_state(before, end_of(before));

        // Line 1 now opens a block that swallows line 2
        let after = "a { }\nb { \nc { }";
        completer.invalidate_cache(1);
        let ctx = completer.resolve_state(after, Caret::new(2, 1)).unwrap();
        assert_eq!(ctx.state, CssState::Property);
    }

    #[test]
    fn test_resolve_tokens_is_query_only() {
        let completer = CssCompleter::default();
        let tokens = CssTokenizer.tokenize("a { color: r");
        let ctx = completer.resolve_tokens(&tokens, None).unwrap();
        assert_eq!(ctx.state, CssState::Value);
        assert_eq!(ctx.completing, "r");
        assert!(completer.checkpoints().is_empty());

        let ctx = completer.resolve_tokens(&tokens, Some(Caret::new(0, 11))).unwrap();
        assert_eq!(ctx.completing, "");
    }

    #[test]
    fn test_get_info_at_value() {
        let completer = CssCompleter::default();
        let info = completer.get_info_at(".x {\n  color: red;\n}", Caret::new(1, 10)).unwrap();
        assert_eq!(info.state, CssState::Value);
        assert_eq!(info.value.as_deref(), Some("red"));
        assert_eq!(info.loc.start, Position::new(1, 9));
        assert_eq!(info.loc.end, Position::new(1, 12));
    }

    #[test]
    fn test_from_config_defaults() {
        let completer = CssCompleter::from_config(&CompletionConfig::default()).unwrap();
        assert_eq!(completer.max_entries(), 15);
    }

    #[test]
    fn test_from_config_missing_table() {
        let config = CompletionConfig {
            properties_file: Some("/nonexistent/cssense/props.json".into()),
            ..Default::default()
        };
        assert!(CssCompleter::from_config(&config).is_err());
    }
}
