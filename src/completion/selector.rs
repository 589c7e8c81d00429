//! Selector suggestions
//!
//! Selector candidates come from a [`SelectorQuery`] collaborator (in a
//! browser, whatever knows the live DOM). The round trip is asynchronous, so
//! every request is stamped with a generation number and a response is
//! dropped if a newer request started in the meantime.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::context::{Candidate, ResolutionContext, SelectorSubstate};
use crate::error::Result;

/// Answer to a selector query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorMatches {
    /// The query this answer belongs to
    pub query: String,
    /// Match text (with its own sigil) and the kind of selector it is
    pub suggestions: Vec<(String, SelectorSubstate)>,
}

/// Something that knows which selectors exist in a document
#[async_trait]
pub trait SelectorQuery: Send + Sync {
    /// Find selector parts that could follow `query`
    ///
    /// # Arguments
    /// * `query` - Selector typed so far, without the partial token
    /// * `partial` - Partial token being typed (no sigil)
    /// * `substate` - Selector sub-state the caret is in
    async fn find_selector_matches(
        &self,
        query: &str,
        partial: &str,
        substate: SelectorSubstate,
    ) -> Result<SelectorMatches>;
}

/// Fixed set of known tags, ids, classes and pseudo-classes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticSelectorIndex {
    pub tags: Vec<String>,
    pub ids: Vec<String>,
    pub classes: Vec<String>,
    pub pseudo_classes: Vec<String>,
}

impl StaticSelectorIndex {
    /// Parse a JSON index of `{ "tags": [...], "ids": [...], ... }`
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut index: Self = serde_json::from_str(json)?;
        for list in [
            &mut index.tags,
            &mut index.ids,
            &mut index.classes,
            &mut index.pseudo_classes,
        ] {
            list.sort();
            list.dedup();
        }
        Ok(index)
    }

    /// Load an index from disk
    pub fn from_json_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    fn matching<'a>(
        names: &'a [String],
        partial: &'a str,
        sigil: &'a str,
        substate: SelectorSubstate,
    ) -> impl Iterator<Item = (String, SelectorSubstate)> + 'a {
        names
            .iter()
            .filter(move |name| name.starts_with(partial))
            .map(move |name| (format!("{sigil}{name}"), substate))
    }
}

#[async_trait]
impl SelectorQuery for StaticSelectorIndex {
    async fn find_selector_matches(
        &self,
        query: &str,
        partial: &str,
        substate: SelectorSubstate,
    ) -> Result<SelectorMatches> {
        use SelectorSubstate::*;

        let tags = Self::matching(&self.tags, partial, "", Tag);
        let ids = Self::matching(&self.ids, partial, "#", Id);
        let classes = Self::matching(&self.classes, partial, ".", Class);
        let pseudo = Self::matching(&self.pseudo_classes, partial, ":", Pseudo);

        let suggestions = match substate {
            Null | Tag => tags.chain(classes).chain(ids).collect(),
            Id => ids.collect(),
            Class => classes.collect(),
            Pseudo => pseudo.collect(),
            Attribute | Value => Vec::new(),
        };

        Ok(SelectorMatches {
            query: query.to_string(),
            suggestions,
        })
    }
}

/// A selector query ready to be sent, and what is needed to read its answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorRequest {
    /// Query sent to the collaborator
    pub query: String,
    /// Partial token sent to the collaborator
    pub partial: String,
    pub substate: SelectorSubstate,
    /// Text each returned match is appended to
    pub stem: String,
    /// Selector as typed, used as every candidate's pre-label
    pub selector: String,
}

impl SelectorRequest {
    /// Build the request for a context in the selector state.
    ///
    /// Returns `None` right after a `,`, where nothing useful can be asked.
    pub fn from_context(ctx: &ResolutionContext) -> Option<Self> {
        let substate = ctx.selector_substate.unwrap_or(SelectorSubstate::Null);
        let selector = ctx.selector.clone();
        let mut partial = ctx.completing.clone();

        let stem = match substate {
            SelectorSubstate::Null => {
                if partial == "," {
                    return None;
                }
                selector.clone()
            }
            SelectorSubstate::Id | SelectorSubstate::Class | SelectorSubstate::Pseudo => {
                if is_bare_sigil(&partial) {
                    let stem = drop_last_chars(&selector, partial.chars().count());
                    partial.clear();
                    stem
                } else {
                    drop_last_chars(&selector, partial.chars().count() + 1)
                }
            }
            SelectorSubstate::Tag
            | SelectorSubstate::Attribute
            | SelectorSubstate::Value => drop_last_chars(&selector, partial.chars().count()),
        };

        let mut query = match substate {
            SelectorSubstate::Null => format!("{selector}*"),
            SelectorSubstate::Attribute | SelectorSubstate::Value => selector.clone(),
            _ => stem.clone(),
        };
        let open_ended = query
            .chars()
            .last()
            .is_some_and(|c| c.is_whitespace() || matches!(c, '+' | '>' | '~'));
        if open_ended && !matches!(substate, SelectorSubstate::Attribute | SelectorSubstate::Value) {
            query.push('*');
        }

        Some(Self {
            query,
            partial,
            substate,
            stem,
            selector,
        })
    }

    /// Turn a collaborator answer into candidates
    pub fn prepare_results(&self, matches: SelectorMatches, max_entries: usize) -> Vec<Candidate> {
        matches
            .suggestions
            .into_iter()
            .take(max_entries)
            .map(|(text, kind)| {
                let label = format!("{}{}", self.stem, text);
                let pre_label = match (self.substate, kind) {
                    (SelectorSubstate::Tag, SelectorSubstate::Class) => format!(".{}", self.selector),
                    (SelectorSubstate::Tag, SelectorSubstate::Id) => format!("#{}", self.selector),
                    _ => self.selector.clone(),
                };
                Candidate::new(label.clone(), pre_label, label)
            })
            .collect()
    }
}

fn is_bare_sigil(text: &str) -> bool {
    matches!(text, "." | "#" | ":")
}

fn drop_last_chars(text: &str, count: usize) -> String {
    let keep = text.chars().count().saturating_sub(count);
    text.chars().take(keep).collect()
}

/// Sends selector queries and discards answers that arrive too late
#[derive(Clone)]
pub struct SelectorSuggestor {
    query: Arc<dyn SelectorQuery>,
    generation: Arc<AtomicU64>,
}

impl SelectorSuggestor {
    pub fn new(query: Arc<dyn SelectorQuery>) -> Self {
        Self {
            query,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Mark every in-flight request as stale
    pub fn supersede(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Generation of the newest request
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Start a selector query for `ctx`.
    ///
    /// The request is stamped synchronously, so any later call makes this
    /// one stale even if its future has not been polled yet.
    pub fn suggest(
        &self,
        ctx: &ResolutionContext,
        max_entries: usize,
    ) -> BoxFuture<'static, Vec<Candidate>> {
        let generation = self.supersede();
        let Some(request) = SelectorRequest::from_context(ctx) else {
            return futures::future::ready(Vec::new()).boxed();
        };

        debug!(query = %request.query, partial = %request.partial, substate = %request.substate, generation, "selector query");

        let query = Arc::clone(&self.query);
        let live = Arc::clone(&self.generation);
        async move {
            let matches = match query
                .find_selector_matches(&request.query, &request.partial, request.substate)
                .await
            {
                Ok(matches) => matches,
                Err(e) => {
                    warn!("Selector query failed: {}", e);
                    return Vec::new();
                }
            };

            let current = live.load(Ordering::SeqCst);
            if current != generation || matches.query != request.query {
                debug!(generation, current, query = %matches.query, "discarding stale selector answer");
                return Vec::new();
            }

            request.prepare_results(matches, max_entries)
        }
        .boxed()
    }
}
