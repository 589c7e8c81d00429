//! Checkpoint cache for incremental resolution
//!
//! Every time a whole-document scan passes through the top-level (null)
//! state, the resolver records where it was and which constructs were open.
//! A later resolve can restart from the closest checkpoint instead of
//! re-scanning the unchanged prefix of a large stylesheet.

use tracing::debug;

use super::context::ScopeMarker;
use crate::parser::Position;

/// A top-level position the automaton can safely restart from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub line: usize,
    pub column: usize,
    /// Open constructs at this point (e.g. the `@m` of an enclosing `@media`)
    pub scope_stack: Vec<ScopeMarker>,
}

impl Checkpoint {
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

/// Line-ascending list of checkpoints owned by one editing session
#[derive(Debug, Clone, Default)]
pub struct CheckpointCache {
    checkpoints: Vec<Checkpoint>,
}

impl CheckpointCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Checkpoint> {
        self.checkpoints.get(index)
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    /// Record a checkpoint unless the newest one already covers `line`
    pub fn record(&mut self, line: usize, column: usize, scope_stack: &[ScopeMarker]) -> bool {
        if let Some(last) = self.checkpoints.last()
            && last.line >= line
        {
            return false;
        }

        self.checkpoints.push(Checkpoint {
            line,
            column,
            scope_stack: scope_stack.to_vec(),
        });
        true
    }

    /// Index of the last checkpoint whose line is at or before `line`.
    ///
    /// Checkpoint density follows document structure rather than being
    /// uniform, so probes are placed by linear interpolation between the
    /// bracketing lines, falling back to bisection when interpolation would
    /// not narrow the bracket.
    pub fn nearest_at_or_before(&self, line: usize) -> Option<usize> {
        let arr = &self.checkpoints;
        let first = arr.first()?;
        if first.line > line {
            return None;
        }

        let mut high = arr.len() - 1;
        if arr[high].line <= line {
            return Some(high);
        }

        // Invariant: arr[low].line <= line < arr[high].line
        let mut low = 0;
        while high - low > 1 {
            let span = arr[high].line - arr[low].line;
            let offset = (line - arr[low].line) * (high - low) / span;
            let mut probe = low + offset;
            if probe <= low || probe >= high {
                probe = low + (high - low) / 2;
            }

            if arr[probe].line <= line {
                low = probe;
            } else {
                high = probe;
            }
        }

        Some(low)
    }

    /// Index of the last checkpoint strictly before `position`
    pub fn nearest_before(&self, position: Position) -> Option<usize> {
        let mut index = self.nearest_at_or_before(position.line)?;
        while self.checkpoints[index].position() >= position {
            index = index.checked_sub(1)?;
        }
        Some(index)
    }

    /// Keep entries `0..=index`; anything later may be stale
    pub fn truncate_after(&mut self, index: usize) {
        self.checkpoints.truncate(index + 1);
    }

    /// Drop every checkpoint at or after `line`.
    ///
    /// Must be called by the host on every edit touching `line` or later.
    pub fn invalidate(&mut self, line: usize) {
        let keep = self.checkpoints.partition_point(|c| c.line < line);
        if keep < self.checkpoints.len() {
            debug!(line, kept = keep, dropped = self.checkpoints.len() - keep, "invalidated checkpoints");
        }
        self.checkpoints.truncate(keep);
    }

    pub fn reset(&mut self) {
        self.checkpoints.clear();
    }
}
