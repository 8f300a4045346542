//! Error Types
//!
//! The error surface of the graph core is intentionally small: the only
//! operations that can fail with an error value are [`compile`] and
//! [`execute`]. Every other failure mode — capacity overflow, stale
//! handles — surfaces as an invalid handle, a `false` return, or `None`
//! (see the individual building operations). The core never panics.
//!
//! [`compile`]: crate::graph::RenderGraph::compile
//! [`execute`]: crate::graph::RenderGraph::execute

use thiserror::Error;

/// Errors produced by graph compilation and execution.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphError {
    /// The declared pass dependencies form a cycle.
    ///
    /// The graph is left un-compiled; a previously compiled schedule (if
    /// any) stays intact so the application can keep rendering the last
    /// good frame while the caller fixes the graph.
    #[error("render graph contains a dependency cycle")]
    CycleDetected,

    /// `execute` was called before a successful `compile`.
    #[error("render graph has not been compiled")]
    NotCompiled,
}

/// Alias for `Result<T, GraphError>`.
pub type Result<T> = std::result::Result<T, GraphError>;
