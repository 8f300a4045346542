//! Graph Compiler
//!
//! Transforms the declared graph into an executable schedule. A compile
//! runs five phases, aborting on the first error:
//!
//! 1. **Dependency construction** — every sampled read (and read-only
//!    depth) adds an edge from the reader to *every* pass that writes the
//!    resource, in declaration order. A read with no writer adds no edge:
//!    the resource is presumed externally initialized.
//! 2. **Cycle detection** — depth-first search with tri-state marks.
//! 3. **Topological sort** — Kahn's algorithm, declaration order as the
//!    tiebreak. The tiebreak is observable and part of the contract.
//! 4. **Lifetime analysis** — expands each resource's
//!    `[first_use, last_use]` interval over the execution order; disjoint
//!    transient intervals are aliasing candidates for the backend.
//! 5. **Barrier generation** — tracks per-resource `(layout, access)`
//!    state through the schedule and emits a transition in front of every
//!    pass that needs the resource in a different layout.
//!
//! Nothing observable is mutated until every fallible phase has
//! succeeded, so a failed compile leaves the previous schedule usable.

use smallvec::SmallVec;

use crate::barrier::{AccessFlags, ImageLayout, ResourceBarrier};
use crate::errors::{GraphError, Result};
use crate::handle::ResourceHandle;
use crate::pass::PassKind;
use crate::resource::NO_PASS;

use super::{MAX_PASSES, MAX_RESOURCES, RenderGraph};

/// Predecessors recorded per compiled pass.
pub const MAX_PASS_PREDECESSORS: usize = 16;
/// Barriers recorded per compiled pass; excess is truncated.
pub const MAX_PASS_BARRIERS: usize = 32;

// The dependency matrix packs one adjacency row into a u64, and the
// `1u64 << writer` shifts below assume pass indices fit that row. Anyone
// raising `MAX_PASSES` past 64 must widen the rows here in the same edit.
const _: () = assert!(MAX_PASSES <= 64);
// Slot indices must round-trip through the 16-bit handle index, with
// `u16::MAX` reserved for the invalid handle.
const _: () = assert!(MAX_RESOURCES < u16::MAX as usize);

/// A pass augmented with its schedule position, predecessors, and the
/// barriers to issue immediately before it runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledPass {
    /// Declaration index into the graph's pass table.
    pub pass_index: u16,
    /// Position in the execution order.
    pub execution_order: u32,
    /// Execution-order indices of the passes this one depends on,
    /// ascending.
    pub predecessors: SmallVec<[u16; MAX_PASS_PREDECESSORS]>,
    /// Layout/access transitions issued before the pass.
    pub barriers: SmallVec<[ResourceBarrier; 8]>,
}

/// Adjacency rows (`depends_on[p]` bit `w` set ⇔ p reads what w writes)
/// plus per-pass in-degrees for Kahn's algorithm.
struct DependencyInfo {
    depends_on: Vec<u64>,
    in_degree: Vec<u32>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitMark {
    Unvisited,
    Visiting,
    Done,
}

impl RenderGraph {
    /// Compiles the declared graph into an execution schedule.
    ///
    /// Idempotent: repeated compiles without intervening mutation produce
    /// an identical schedule. On [`GraphError::CycleDetected`] the graph
    /// stays un-compiled and the previous schedule is untouched.
    pub fn compile(&mut self) -> Result<()> {
        let deps = self.build_dependencies();
        self.detect_cycles(&deps)?;
        let order = self.topological_sort(&deps)?;

        // All fallible phases passed; derived state may be written now.
        let mut compiled = self.build_compiled_passes(&deps, &order);
        self.analyze_lifetimes(&order);
        self.generate_barriers(&order, &mut compiled);

        for (position, &pass_index) in order.iter().enumerate() {
            self.passes_mut()[pass_index as usize].execution_order = position as u32;
        }
        self.compiled = compiled;
        self.is_compiled = true;
        Ok(())
    }

    // ── Phase 1: dependency construction ───────────────────────────────────

    fn build_dependencies(&self) -> DependencyInfo {
        let pass_count = self.passes().len();
        let mut depends_on = vec![0u64; pass_count];
        let mut in_degree = vec![0u32; pass_count];

        for reader in 0..pass_count {
            for handle in self.passes()[reader].input_handles() {
                if self.get_resource_entry(handle).is_none() {
                    continue;
                }
                // All-writers semantics: one edge per declared writer, in
                // declaration order. No writer at all is fine — the
                // resource is externally initialized.
                for writer in 0..pass_count {
                    if writer == reader || !self.passes()[writer].writes_resource(handle) {
                        continue;
                    }
                    let bit = 1u64 << writer;
                    if depends_on[reader] & bit == 0 {
                        depends_on[reader] |= bit;
                        in_degree[reader] += 1;
                    }
                }
            }
        }

        DependencyInfo {
            depends_on,
            in_degree,
        }
    }

    // ── Phase 2: cycle detection ───────────────────────────────────────────

    fn detect_cycles(&self, deps: &DependencyInfo) -> Result<()> {
        fn visit(pass: usize, deps: &DependencyInfo, marks: &mut [VisitMark]) -> Result<()> {
            marks[pass] = VisitMark::Visiting;
            let mut edges = deps.depends_on[pass];
            while edges != 0 {
                let writer = edges.trailing_zeros() as usize;
                edges &= edges - 1;
                match marks[writer] {
                    VisitMark::Visiting => return Err(GraphError::CycleDetected),
                    VisitMark::Unvisited => visit(writer, deps, marks)?,
                    VisitMark::Done => {}
                }
            }
            marks[pass] = VisitMark::Done;
            Ok(())
        }

        let mut marks = vec![VisitMark::Unvisited; self.passes().len()];
        for pass in 0..self.passes().len() {
            if marks[pass] == VisitMark::Unvisited {
                visit(pass, deps, &mut marks)?;
            }
        }
        Ok(())
    }

    // ── Phase 3: topological sort (Kahn) ───────────────────────────────────

    fn topological_sort(&self, deps: &DependencyInfo) -> Result<Vec<u16>> {
        let pass_count = self.passes().len();
        let mut in_degree = deps.in_degree.clone();

        // FIFO work queue seeded with all roots in declaration order.
        let mut queue: Vec<u16> = (0..pass_count as u16)
            .filter(|&p| in_degree[p as usize] == 0)
            .collect();
        let mut head = 0;
        let mut order = Vec::with_capacity(pass_count);

        while head < queue.len() {
            let writer = queue[head];
            head += 1;
            order.push(writer);

            let bit = 1u64 << writer;
            // Ascending scan keeps newly-freed passes enqueued in
            // declaration order — the observable tiebreak.
            for reader in 0..pass_count {
                if deps.depends_on[reader] & bit != 0 {
                    in_degree[reader] -= 1;
                    if in_degree[reader] == 0 {
                        queue.push(reader as u16);
                    }
                }
            }
        }

        if order.len() != pass_count {
            // Unreachable after phase 2, kept as a schedule-integrity check.
            return Err(GraphError::CycleDetected);
        }
        Ok(order)
    }

    fn build_compiled_passes(&self, deps: &DependencyInfo, order: &[u16]) -> Vec<CompiledPass> {
        let mut position_of = vec![0u16; self.passes().len()];
        for (position, &pass_index) in order.iter().enumerate() {
            position_of[pass_index as usize] = position as u16;
        }

        order
            .iter()
            .enumerate()
            .map(|(position, &pass_index)| {
                let mut predecessors: SmallVec<[u16; MAX_PASS_PREDECESSORS]> = SmallVec::new();
                let mut edges = deps.depends_on[pass_index as usize];
                while edges != 0 {
                    let writer = edges.trailing_zeros() as usize;
                    edges &= edges - 1;
                    if predecessors.len() == MAX_PASS_PREDECESSORS {
                        log::warn!(
                            "pass '{}' exceeds {MAX_PASS_PREDECESSORS} predecessors, truncating",
                            self.passes()[pass_index as usize].name()
                        );
                        break;
                    }
                    predecessors.push(position_of[writer]);
                }
                predecessors.sort_unstable();

                CompiledPass {
                    pass_index,
                    execution_order: position as u32,
                    predecessors,
                    barriers: SmallVec::new(),
                }
            })
            .collect()
    }

    // ── Phase 4: resource-lifetime analysis ────────────────────────────────

    fn analyze_lifetimes(&mut self, order: &[u16]) {
        for index in 0..self.resource_count() {
            let entry = self.slot_mut(index);
            entry.first_use_pass = NO_PASS;
            entry.last_use_pass = 0;
        }

        for (position, &pass_index) in order.iter().enumerate() {
            let position = position as u32;
            let handles: SmallVec<[ResourceHandle; 16]> = {
                let pass = &self.passes()[pass_index as usize];
                pass.input_handles().chain(pass.output_handles()).collect()
            };
            for handle in handles {
                if let Some(entry) = self.get_resource_entry_mut(handle) {
                    entry.first_use_pass = entry.first_use_pass.min(position);
                    entry.last_use_pass = entry.last_use_pass.max(position);
                }
            }
        }
    }

    // ── Phase 5: barrier generation ────────────────────────────────────────

    fn generate_barriers(&self, order: &[u16], compiled: &mut [CompiledPass]) {
        // Per-slot tracked state; everything starts un-initialized, so the
        // first use of a writer-less resource still transitions it out of
        // `Undefined`.
        let mut states = vec![(ImageLayout::Undefined, AccessFlags::empty()); self.resource_count()];

        for (position, &pass_index) in order.iter().enumerate() {
            let pass = &self.passes()[pass_index as usize];

            let mut required: SmallVec<[(ResourceHandle, ImageLayout, AccessFlags); 16]> =
                SmallVec::new();
            for attachment in pass.color_attachments() {
                required.push((
                    attachment.handle,
                    ImageLayout::ColorAttachment,
                    AccessFlags::COLOR_ATTACHMENT_WRITE,
                ));
            }
            if let Some(depth) = pass.depth_attachment() {
                if depth.read_only {
                    required.push((
                        depth.handle,
                        ImageLayout::DepthStencilReadOnly,
                        AccessFlags::DEPTH_READ,
                    ));
                } else {
                    required.push((
                        depth.handle,
                        ImageLayout::DepthStencilAttachment,
                        AccessFlags::DEPTH_WRITE,
                    ));
                }
            }
            for read in pass.reads() {
                required.push((
                    read.handle,
                    ImageLayout::ShaderReadOnly,
                    AccessFlags::SHADER_READ,
                ));
            }
            for write in pass.writes() {
                if pass.kind() == PassKind::Transfer {
                    required.push((
                        write.handle,
                        ImageLayout::TransferDst,
                        AccessFlags::TRANSFER_WRITE,
                    ));
                } else {
                    required.push((write.handle, ImageLayout::General, AccessFlags::SHADER_WRITE));
                }
            }

            for (handle, dst_layout, dst_access) in required {
                if self.get_resource_entry(handle).is_none() {
                    continue;
                }
                let slot = handle.index() as usize;
                let (current_layout, current_access) = states[slot];
                if dst_layout == current_layout {
                    continue;
                }

                let barriers = &mut compiled[position].barriers;
                if barriers.len() < MAX_PASS_BARRIERS {
                    barriers.push(ResourceBarrier {
                        resource: handle,
                        src_access: current_access,
                        dst_access,
                        src_layout: current_layout,
                        dst_layout,
                    });
                } else {
                    log::warn!(
                        "pass '{}' exceeds {MAX_PASS_BARRIERS} barriers, truncating",
                        pass.name()
                    );
                }
                states[slot] = (dst_layout, dst_access);
            }
        }
    }
}
