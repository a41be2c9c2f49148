//! Stepwise breadth-first shortest path search.
//!
//! A search is a value the caller drives: `step()` performs a bounded amount
//! of work and returns, so a long traversal can be interleaved with other
//! work or time-sliced with `run_for`. Progress is never lost between calls.
//!
//! ```
//! use stepwise_bfs_core::{find_shortest_path, DirectedGraph, SearchStatus};
//!
//! let mut g = DirectedGraph::new();
//! g.load_edges([(0, 1), (1, 2), (0, 3), (3, 2)]);
//!
//! let mut search = find_shortest_path()
//!     .from(g.node(0).unwrap())
//!     .to(g.node(2).unwrap());
//! search.run_to_completion().unwrap();
//!
//! assert_eq!(search.status(), SearchStatus::FoundPath);
//! let ids: Vec<u64> = search.shortest_path().unwrap().iter().map(|n| n.id()).collect();
//! assert_eq!(ids, vec![0, 1, 2]);
//! ```

use std::collections::{HashMap, VecDeque};
use std::marker::PhantomData;
use std::time::{Duration, Instant};

use crate::config::{clamp_expansions, SearchConfig};
use crate::error::{Endpoint, Result, SearchError};
use crate::graph::ChildExpander;
use crate::listener::{Listeners, SearchListener};

/// Lifecycle of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    /// Not stepped yet.
    Uninitialized,
    Running,
    /// Target reached. Terminal.
    FoundPath,
    /// Frontier exhausted without reaching the target. Terminal.
    NoPath,
}

impl SearchStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SearchStatus::FoundPath | SearchStatus::NoPath)
    }
}

/// Start a query. Pick the source with [`SourceSelector::from`], then the
/// target with [`TargetSelector::to`].
pub fn find_shortest_path<N: ChildExpander>() -> SourceSelector<N> {
    SourceSelector {
        _node: PhantomData,
    }
}

/// Build a search from endpoints that may be missing, e.g. the results of
/// node lookups. The source is checked first.
pub fn try_search<'a, N: ChildExpander>(
    source: Option<N>,
    target: Option<N>,
) -> Result<SearchState<'a, N>> {
    let source = source.ok_or(SearchError::MissingNode(Endpoint::Source))?;
    let target = target.ok_or(SearchError::MissingNode(Endpoint::Target))?;
    Ok(SearchState::new(source, target))
}

pub struct SourceSelector<N> {
    _node: PhantomData<N>,
}

impl<N: ChildExpander> SourceSelector<N> {
    pub fn from(self, source: N) -> TargetSelector<N> {
        TargetSelector { source }
    }
}

pub struct TargetSelector<N> {
    source: N,
}

impl<N: ChildExpander> TargetSelector<N> {
    /// Finish the query. Nothing is expanded until the search is stepped.
    pub fn to<'a>(self, target: N) -> SearchState<'a, N> {
        SearchState::new(self.source, target)
    }
}

/// Resumable BFS from a fixed source to a fixed target.
///
/// Invariants:
/// - every node in `frontier` is a key of `parents`, and enters the frontier
///   exactly once, when it is first recorded;
/// - a `parents` entry is never overwritten, so the first (shortest) way a
///   node is reached is the one kept;
/// - once `status` is terminal it never changes and `step()` is a no-op.
///
/// A listener error aborts the current `step()` but leaves the search
/// consistent. The undelivered part of the failed notification is kept,
/// including which listener it stopped at, and the next `step()` delivers
/// it before doing anything else. Each listener therefore sees each event
/// exactly once and in order, even across faults.
pub struct SearchState<'a, N: ChildExpander> {
    source: N,
    target: N,
    expansions_per_step: usize,
    status: SearchStatus,
    begun: bool,
    frontier: VecDeque<N>,
    /// node → predecessor; `None` marks the source.
    parents: HashMap<N, Option<N>>,
    nodes_expanded: usize,
    pending: Pending,
    listeners: Listeners<'a, N>,
}

/// Notifications not yet delivered to every listener. Listener indices say
/// where to resume the fan-out.
#[derive(Debug, Default)]
struct Pending {
    begin: Option<usize>,
    /// Trailing frontier entries whose `reach` is undelivered.
    reach: usize,
    reach_listener: usize,
    /// Resume point of `expand` for the frontier head.
    expand_listener: usize,
    terminal: Option<usize>,
}

impl<'a, N: ChildExpander> SearchState<'a, N> {
    fn new(source: N, target: N) -> Self {
        let mut frontier = VecDeque::new();
        frontier.push_back(source.clone());
        let mut parents = HashMap::new();
        parents.insert(source.clone(), None);

        Self {
            source,
            target,
            expansions_per_step: SearchConfig::default().expansions_per_step,
            status: SearchStatus::Running,
            begun: false,
            frontier,
            parents,
            nodes_expanded: 0,
            pending: Pending::default(),
            listeners: Listeners::new(),
        }
    }

    /// Set the number of expansion rounds per `step()`. Values below 1 are
    /// raised to 1.
    pub fn set_expansions_per_step(&mut self, expansions: usize) -> &mut Self {
        self.expansions_per_step = clamp_expansions(expansions);
        self
    }

    pub fn with_expansions_per_step(mut self, expansions: usize) -> Self {
        self.set_expansions_per_step(expansions);
        self
    }

    pub fn with_config(self, config: SearchConfig) -> Self {
        self.with_expansions_per_step(config.effective_expansions())
    }

    pub fn expansions_per_step(&self) -> usize {
        self.expansions_per_step
    }

    /// Register a listener. Only events fired after registration are
    /// delivered. Pass `&mut listener` to keep ownership of it.
    pub fn add_listener(&mut self, listener: impl SearchListener<N> + 'a) -> &mut Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn with_listener(mut self, listener: impl SearchListener<N> + 'a) -> Self {
        self.add_listener(listener);
        self
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Perform up to `expansions_per_step` expansion rounds.
    ///
    /// Returns early when the search reaches a terminal state. Once terminal
    /// and every notification has been delivered, this is a no-op.
    ///
    /// # Errors
    ///
    /// [`SearchError::Listener`] if a listener fails. The listener's own
    /// error is not altered: it is the wrapped value, reachable through
    /// [`std::error::Error::source`] (or by matching the variant) for
    /// downcasting. The search remains valid and may be stepped again; the
    /// interrupted notification is resumed at the listener that failed.
    pub fn step(&mut self) -> Result<()> {
        if !self.begun {
            tracing::debug!(
                expansions_per_step = self.expansions_per_step,
                "beginning shortest path search"
            );
            self.begun = true;
            self.pending.begin = Some(0);
            // The source sits alone in the frontier.
            self.pending.reach = 1;
        }

        self.flush_pending()?;
        if self.is_complete() {
            return Ok(());
        }

        for _ in 0..self.expansions_per_step {
            self.expand_once()?;
            if self.is_complete() {
                break;
            }
        }

        tracing::trace!(
            frontier = self.frontier.len(),
            reached = self.parents.len(),
            expanded = self.nodes_expanded,
            "step done"
        );
        Ok(())
    }

    /// Deliver whatever an earlier listener fault left undelivered, oldest
    /// first: begin, then reach events for the frontier tail, then the
    /// terminal event.
    fn flush_pending(&mut self) -> Result<()> {
        if let Some(cursor) = self.pending.begin.as_mut() {
            self.listeners.begin_search(cursor, &self.source)?;
            self.pending.begin = None;
        }

        while self.pending.reach > 0 {
            let idx = self.frontier.len() - self.pending.reach;
            self.listeners
                .reach(&mut self.pending.reach_listener, &self.frontier[idx])?;
            self.pending.reach -= 1;
        }

        if let Some(cursor) = self.pending.terminal.as_mut() {
            match self.status {
                SearchStatus::FoundPath => self.listeners.success(cursor, &self.target)?,
                SearchStatus::NoPath => self.listeners.failure(cursor)?,
                SearchStatus::Uninitialized | SearchStatus::Running => {}
            }
            self.pending.terminal = None;
        }
        Ok(())
    }

    /// One expansion round.
    fn expand_once(&mut self) -> Result<()> {
        let Some(current) = self.frontier.front().cloned() else {
            self.status = SearchStatus::NoPath;
            tracing::debug!(
                reached = self.parents.len(),
                expanded = self.nodes_expanded,
                "frontier exhausted, target not reachable"
            );
            self.pending.terminal = Some(0);
            return self.flush_pending();
        };

        // Notify before popping so a failing listener leaves the node queued.
        self.listeners
            .expand(&mut self.pending.expand_listener, &current)?;
        self.frontier.pop_front();
        self.nodes_expanded += 1;

        if current == self.target {
            self.status = SearchStatus::FoundPath;
            tracing::debug!(
                reached = self.parents.len(),
                expanded = self.nodes_expanded,
                "target reached"
            );
            self.pending.terminal = Some(0);
            return self.flush_pending();
        }

        for child in current.children() {
            if !self.parents.contains_key(&child) {
                self.parents.insert(child.clone(), Some(current.clone()));
                self.frontier.push_back(child);
                self.pending.reach += 1;
            }
        }

        self.flush_pending()
    }

    /// Terminal with nothing left to deliver.
    fn is_settled(&self) -> bool {
        self.is_complete() && self.pending.terminal.is_none()
    }

    /// Step until the search is terminal. Terminates on any finite graph.
    ///
    /// # Errors
    ///
    /// [`SearchError::Listener`] if a listener fails.
    pub fn run_to_completion(&mut self) -> Result<()> {
        while !self.is_settled() {
            self.step()?;
        }
        Ok(())
    }

    /// Step until `budget` of wall-clock time has elapsed or the search is
    /// terminal, whichever comes first.
    ///
    /// Elapsed time is checked after each `step()`, so at least one step runs
    /// (even with a zero budget) and one step's batch may overrun the budget.
    ///
    /// # Errors
    ///
    /// [`SearchError::Listener`] if a listener fails.
    pub fn run_for(&mut self, budget: Duration) -> Result<()> {
        let started = Instant::now();
        self.run_until(|| started.elapsed() >= budget)?;
        if !self.is_complete() {
            tracing::debug!(
                budget_ms = budget.as_millis() as u64,
                frontier = self.frontier.len(),
                "time budget used, yielding"
            );
        }
        Ok(())
    }

    /// Step until `should_stop` returns true or the search is terminal.
    /// `should_stop` is consulted after each `step()`.
    ///
    /// # Errors
    ///
    /// [`SearchError::Listener`] if a listener fails.
    pub fn run_until<F: FnMut() -> bool>(&mut self, mut should_stop: F) -> Result<()> {
        while !self.is_settled() {
            self.step()?;
            if should_stop() {
                break;
            }
        }
        Ok(())
    }

    /// `Uninitialized` until the first `step()` has begun the search.
    pub fn status(&self) -> SearchStatus {
        if !self.begun && self.status == SearchStatus::Running {
            SearchStatus::Uninitialized
        } else {
            self.status
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status.is_terminal()
    }

    /// The shortest path from source to target, both included.
    ///
    /// # Errors
    ///
    /// [`SearchError::NotComplete`] while the search is not terminal,
    /// [`SearchError::NoPath`] if the target is unreachable.
    pub fn shortest_path(&self) -> Result<Vec<N>> {
        match self.status {
            SearchStatus::FoundPath => Ok(self.trace_back_path()),
            SearchStatus::NoPath => Err(SearchError::NoPath),
            SearchStatus::Uninitialized | SearchStatus::Running => Err(SearchError::NotComplete),
        }
    }

    /// Walk parent pointers from the target to the source, then reverse.
    fn trace_back_path(&self) -> Vec<N> {
        let mut path = Vec::new();
        let mut current = Some(&self.target);

        while let Some(node) = current {
            path.push(node.clone());
            current = self.parents.get(node).and_then(Option::as_ref);
        }

        path.reverse();
        path
    }

    pub fn source(&self) -> &N {
        &self.source
    }

    pub fn target(&self) -> &N {
        &self.target
    }

    /// Number of distinct nodes discovered so far, the source included.
    pub fn nodes_reached(&self) -> usize {
        self.parents.len()
    }

    /// Number of nodes taken from the frontier so far.
    pub fn nodes_expanded(&self) -> usize {
        self.nodes_expanded
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }
}
