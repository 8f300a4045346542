//! Backend Contract
//!
//! The core is backend-agnostic: it schedules passes and computes
//! barriers, but never records GPU commands itself. A backend plugs in
//! through [`CommandContext`], which the executor drives once per pass:
//!
//! ```text
//! for pass in compiled order:
//!     begin_pass(graph, pass, barriers)   // realize, sync, open scope
//!     pass.execute_callback(ctx)          // application records commands
//!     end_pass(graph, pass)               // close scope
//! ```
//!
//! Inside `begin_pass` a conforming backend must:
//! 1. ensure every attachment's resource has a realized GPU object,
//!    storing it in the entry's [`payload`](crate::resource::ResourceEntry::payload);
//! 2. issue the compiled barrier list, translating access flags and
//!    layouts through the numeric mappings on
//!    [`AccessFlags`](crate::barrier::AccessFlags) /
//!    [`ImageLayout`](crate::barrier::ImageLayout) (a Metal backend treats
//!    the list as a no-op);
//! 3. begin a render or compute scope tagged with the pass name, honoring
//!    the configured attachments and load/store ops.

use crate::barrier::ResourceBarrier;
use crate::graph::RenderGraph;

/// Per-frame command recording context supplied by the backend.
pub trait CommandContext {
    /// Prepares a pass for execution: realize attachments, issue
    /// `barriers`, open a scope named after the pass.
    ///
    /// `pass_index` is the declaration index into
    /// [`RenderGraph::pass`]; the graph is mutable so the backend can
    /// write realized objects into resource payloads.
    fn begin_pass(&mut self, graph: &mut RenderGraph, pass_index: u16, barriers: &[ResourceBarrier]);

    /// Closes the scope opened by the matching `begin_pass`.
    fn end_pass(&mut self, graph: &mut RenderGraph, pass_index: u16);
}
