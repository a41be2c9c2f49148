use std::fmt;

/// Error raised by a [`SearchListener`](crate::SearchListener) callback.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Which end of the query a builder argument names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Source,
    Target,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Source => f.write_str("source"),
            Endpoint::Target => f.write_str("target"),
        }
    }
}

/// Broad classification of a [`SearchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller passed a missing argument. Fix the call site.
    InvalidArgument,
    /// Operation not valid in the current lifecycle state. Check
    /// `status()` / `is_complete()` first.
    IllegalState,
    /// A registered listener failed; its error is the source.
    Listener,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("the {0} node is absent")]
    MissingNode(Endpoint),

    #[error("the path search is not yet complete")]
    NotComplete,

    #[error("the target node is not reachable from the source node")]
    NoPath,

    #[error("search listener failed: {0}")]
    Listener(#[source] ListenerError),
}

impl SearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::MissingNode(_) => ErrorKind::InvalidArgument,
            SearchError::NotComplete | SearchError::NoPath => ErrorKind::IllegalState,
            SearchError::Listener(_) => ErrorKind::Listener,
        }
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
