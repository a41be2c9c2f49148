//! stepwise-bfs-core: incremental breadth-first shortest path search.
//!
//! The search is a state machine the caller drives one bounded step at a
//! time, so a traversal over a large graph can be time-sliced, interleaved
//! with other work, or observed event by event. Nodes are anything that
//! implements [`ChildExpander`]; the crate never owns or mutates the graph.
//!
//! A small adjacency-list graph ([`DirectedGraph`]) is included for tests
//! and benchmarking, but the search does not depend on it.

mod config;
mod error;
mod graph;
mod listener;
mod search;

pub use config::{SearchConfig, DEFAULT_EXPANSIONS_PER_STEP};
pub use error::{Endpoint, ErrorKind, ListenerError, Result, SearchError};
pub use graph::{ChildExpander, Children, DirectedGraph, GraphNode, NodeId, NodeInfo};
pub use listener::{EventRecorder, ListenerResult, SearchEvent, SearchListener, TracingListener};
pub use search::{
    find_shortest_path, try_search, SearchState, SearchStatus, SourceSelector, TargetSelector,
};
