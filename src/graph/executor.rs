//! Graph Executor
//!
//! Drives one frame against a compiled schedule. The executor walks the
//! compiled order, hands each pass's barrier list to the backend's
//! [`CommandContext`], and invokes the pass callback with a
//! [`PassContext`]. It never records GPU commands itself — barriers and
//! attachment binding are entirely the backend's job; the pass callback is
//! the only place backend-specific command recording occurs.
//!
//! Compiled state is frozen between compiles: the executor may run any
//! number of frames against the same schedule, and two consecutive frames
//! see the identical order.

use std::any::Any;

use smallvec::SmallVec;

use crate::backend::CommandContext;
use crate::barrier::ResourceBarrier;
use crate::errors::{GraphError, Result};
use crate::pass::Pass;

use super::{CompiledPass, RenderGraph};

/// Per-frame execution statistics, reset at the start of every
/// [`execute`](RenderGraph::execute).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct FrameStats {
    pub passes_executed: u32,
    pub barriers_issued: u32,
}

/// Everything a pass callback can see while it records commands.
///
/// Captured closure state stands in for the opaque user-data pointer of
/// C-style engines; `renderer` carries the application's own per-frame
/// state, downcast via [`Any`].
pub struct PassContext<'a> {
    pub graph: &'a RenderGraph,
    pub pass_index: u16,
    pub execution_order: u32,
    pub frame_index: u32,
    pub delta_time: f32,
    pub cmd: &'a mut dyn CommandContext,
    pub renderer: &'a mut dyn Any,
}

impl PassContext<'_> {
    /// The pass being executed.
    #[must_use]
    pub fn pass(&self) -> &Pass {
        &self.graph.passes()[self.pass_index as usize]
    }

    /// The compiled schedule entry for this pass.
    #[must_use]
    pub fn compiled(&self) -> &CompiledPass {
        &self.graph.compiled[self.execution_order as usize]
    }
}

impl RenderGraph {
    /// Executes one frame.
    ///
    /// Fails with [`GraphError::NotCompiled`] if the graph is not marked
    /// compiled. Otherwise, for each pass in execution order: culled
    /// passes are skipped; every other pass has its barriers accounted and
    /// handed to `cmd.begin_pass`, its callback invoked, and its scope
    /// closed with `cmd.end_pass`. The frame index advances with
    /// wraparound at the end.
    pub fn execute(
        &mut self,
        delta_time: f32,
        cmd: &mut dyn CommandContext,
        renderer: &mut dyn Any,
    ) -> Result<()> {
        if !self.is_compiled {
            return Err(GraphError::NotCompiled);
        }
        self.stats = FrameStats::default();

        for position in 0..self.compiled.len() {
            let pass_index = self.compiled[position].pass_index;
            if self.passes()[pass_index as usize].is_culled() {
                continue;
            }

            let barriers: SmallVec<[ResourceBarrier; 8]> =
                self.compiled[position].barriers.clone();
            self.stats.passes_executed += 1;
            self.stats.barriers_issued += barriers.len() as u32;

            // The callback is lifted out of the pass for the duration of
            // the call so it can borrow the graph read-only.
            let mut callback = self.passes_mut()[pass_index as usize].execute.take();

            cmd.begin_pass(self, pass_index, &barriers);
            if let Some(callback_fn) = callback.as_mut() {
                let mut ctx = PassContext {
                    graph: self,
                    pass_index,
                    execution_order: position as u32,
                    frame_index: self.frame_index,
                    delta_time,
                    cmd: &mut *cmd,
                    renderer: &mut *renderer,
                };
                callback_fn(&mut ctx);
            }
            cmd.end_pass(self, pass_index);

            self.passes_mut()[pass_index as usize].execute = callback;
        }

        self.frame_index = self.frame_index.wrapping_add(1);
        Ok(())
    }
}
