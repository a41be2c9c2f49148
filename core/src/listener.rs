//! Observer protocol for search lifecycle events.
//!
//! Listeners are invoked synchronously, in registration order, at five
//! points of the search:
//!
//! | Event       | Fires when                                         |
//! |-------------|----------------------------------------------------|
//! | begin       | first `step()`, before anything is expanded        |
//! | reach       | a node is first recorded in the visited/parent map |
//! | expand      | a node is taken from the frontier for processing   |
//! | success     | the target is taken from the frontier              |
//! | failure     | the frontier empties without reaching the target   |
//!
//! A listener that returns `Err` stops the fan-out for that event and the
//! error is returned from the driving `step()` call. The search remembers
//! which listener the event stopped at; stepping again re-sends it to that
//! listener and the ones after it, so no listener misses or repeats an event.

use std::fmt;

use serde::Serialize;

use crate::error::{ListenerError, Result, SearchError};

pub type ListenerResult = std::result::Result<(), ListenerError>;

/// Receives search lifecycle events. All methods default to doing nothing.
pub trait SearchListener<N> {
    fn on_begin_search(&mut self, _source: &N) -> ListenerResult {
        Ok(())
    }

    fn on_reach(&mut self, _node: &N) -> ListenerResult {
        Ok(())
    }

    fn on_expand(&mut self, _node: &N) -> ListenerResult {
        Ok(())
    }

    fn on_success(&mut self, _target: &N) -> ListenerResult {
        Ok(())
    }

    fn on_failure(&mut self) -> ListenerResult {
        Ok(())
    }
}

/// Lets a caller register `&mut listener` and keep ownership.
impl<N, L: SearchListener<N> + ?Sized> SearchListener<N> for &mut L {
    fn on_begin_search(&mut self, source: &N) -> ListenerResult {
        (**self).on_begin_search(source)
    }

    fn on_reach(&mut self, node: &N) -> ListenerResult {
        (**self).on_reach(node)
    }

    fn on_expand(&mut self, node: &N) -> ListenerResult {
        (**self).on_expand(node)
    }

    fn on_success(&mut self, target: &N) -> ListenerResult {
        (**self).on_success(target)
    }

    fn on_failure(&mut self) -> ListenerResult {
        (**self).on_failure()
    }
}

/// One recorded lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "node", rename_all = "snake_case")]
pub enum SearchEvent<N> {
    BeginSearch(N),
    Reach(N),
    Expand(N),
    EndSearchSuccess(N),
    EndSearchFailure,
}

impl<N: fmt::Display> fmt::Display for SearchEvent<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchEvent::BeginSearch(n) => write!(f, "begin({n})"),
            SearchEvent::Reach(n) => write!(f, "reach({n})"),
            SearchEvent::Expand(n) => write!(f, "expand({n})"),
            SearchEvent::EndSearchSuccess(n) => write!(f, "success({n})"),
            SearchEvent::EndSearchFailure => f.write_str("failure"),
        }
    }
}

/// Listener that keeps every event in arrival order.
#[derive(Debug, Clone)]
pub struct EventRecorder<N> {
    events: Vec<SearchEvent<N>>,
}

impl<N> EventRecorder<N> {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn events(&self) -> &[SearchEvent<N>] {
        &self.events
    }

    pub fn into_events(self) -> Vec<SearchEvent<N>> {
        self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl<N> Default for EventRecorder<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Clone> SearchListener<N> for EventRecorder<N> {
    fn on_begin_search(&mut self, source: &N) -> ListenerResult {
        self.events.push(SearchEvent::BeginSearch(source.clone()));
        Ok(())
    }

    fn on_reach(&mut self, node: &N) -> ListenerResult {
        self.events.push(SearchEvent::Reach(node.clone()));
        Ok(())
    }

    fn on_expand(&mut self, node: &N) -> ListenerResult {
        self.events.push(SearchEvent::Expand(node.clone()));
        Ok(())
    }

    fn on_success(&mut self, target: &N) -> ListenerResult {
        self.events.push(SearchEvent::EndSearchSuccess(target.clone()));
        Ok(())
    }

    fn on_failure(&mut self) -> ListenerResult {
        self.events.push(SearchEvent::EndSearchFailure);
        Ok(())
    }
}

/// Listener that logs each event at `trace` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl<N: fmt::Debug> SearchListener<N> for TracingListener {
    fn on_begin_search(&mut self, source: &N) -> ListenerResult {
        tracing::trace!(?source, "begin search");
        Ok(())
    }

    fn on_reach(&mut self, node: &N) -> ListenerResult {
        tracing::trace!(?node, "reach");
        Ok(())
    }

    fn on_expand(&mut self, node: &N) -> ListenerResult {
        tracing::trace!(?node, "expand");
        Ok(())
    }

    fn on_success(&mut self, target: &N) -> ListenerResult {
        tracing::trace!(?target, "end search: success");
        Ok(())
    }

    fn on_failure(&mut self) -> ListenerResult {
        tracing::trace!("end search: failure");
        Ok(())
    }
}

/// Ordered fan-out over the registered listeners.
pub(crate) struct Listeners<'a, N> {
    inner: Vec<Box<dyn SearchListener<N> + 'a>>,
}

impl<'a, N> Listeners<'a, N> {
    pub(crate) fn new() -> Self {
        Self { inner: Vec::new() }
    }

    pub(crate) fn push(&mut self, listener: Box<dyn SearchListener<N> + 'a>) {
        self.inner.push(listener);
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.len()
    }

    /// Call `f` on each listener from `*cursor` onwards. On failure
    /// `*cursor` is left at the failing listener so a retry resumes there;
    /// after a full pass it is reset to 0.
    fn dispatch<F>(&mut self, cursor: &mut usize, mut f: F) -> Result<()>
    where
        F: FnMut(&mut (dyn SearchListener<N> + 'a)) -> ListenerResult,
    {
        while let Some(listener) = self.inner.get_mut(*cursor) {
            f(listener.as_mut()).map_err(SearchError::Listener)?;
            *cursor += 1;
        }
        *cursor = 0;
        Ok(())
    }

    pub(crate) fn begin_search(&mut self, cursor: &mut usize, source: &N) -> Result<()> {
        self.dispatch(cursor, |l| l.on_begin_search(source))
    }

    pub(crate) fn reach(&mut self, cursor: &mut usize, node: &N) -> Result<()> {
        self.dispatch(cursor, |l| l.on_reach(node))
    }

    pub(crate) fn expand(&mut self, cursor: &mut usize, node: &N) -> Result<()> {
        self.dispatch(cursor, |l| l.on_expand(node))
    }

    pub(crate) fn success(&mut self, cursor: &mut usize, target: &N) -> Result<()> {
        self.dispatch(cursor, |l| l.on_success(target))
    }

    pub(crate) fn failure(&mut self, cursor: &mut usize) -> Result<()> {
        self.dispatch(cursor, |l| l.on_failure())
    }
}
