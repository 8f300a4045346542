//! Render Graph
//!
//! [`RenderGraph`] owns the pass and resource tables and exposes the
//! declarative building API. A frame is described once — named resources,
//! named passes, and which passes read/write which resources — then
//! [`compile`](RenderGraph::compile) turns the description into an
//! execution order with synchronization, and
//! [`execute`](RenderGraph::execute) drives it every frame.
//!
//! # Design
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                       RenderGraph                         │
//! │                                                           │
//! │  resources: [ResourceEntry; ≤256]  ←─ ResourceHandle      │
//! │  passes:    [Pass; ≤64]            ←─ declaration index   │
//! │  compiled:  [CompiledPass]         ←─ execution order     │
//! │                                                           │
//! │  build (mutates, invalidates) → compile → execute × N     │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! The graph has sole ownership of both tables; passes and resources
//! reference each other only through handles, so no cyclic owning
//! references exist. Building operations never fail with an error value:
//! they either succeed or return the invalid handle / `None`, leaving no
//! partial state behind.

pub mod compiler;
pub mod executor;

use rustc_hash::FxHashMap;

use crate::format::TextureFormat;
use crate::handle::{ResourceHandle, next_generation};
use crate::pass::{Pass, PassKind};
use crate::resource::{
    GpuPayload, NO_PASS, ResourceDescriptor, ResourceEntry, ResourceKind, ResourceUsage,
    clamp_name,
};

pub use compiler::CompiledPass;
pub use executor::{FrameStats, PassContext};

/// Passes per graph.
pub const MAX_PASSES: usize = 64;
/// Resource slots per graph.
pub const MAX_RESOURCES: usize = 256;

/// Declarative pass/resource graph for one renderer.
pub struct RenderGraph {
    /// Slot table. Slots past `resource_count` are retired but keep their
    /// generation counters so stale handles keep failing validation.
    resources: Vec<ResourceEntry>,
    resource_count: usize,
    resource_names: FxHashMap<String, ResourceHandle>,
    passes: Vec<Pass>,
    backbuffer: ResourceHandle,
    pub(crate) compiled: Vec<CompiledPass>,
    pub(crate) is_compiled: bool,
    pub(crate) frame_index: u32,
    pub(crate) stats: FrameStats,
}

impl Default for RenderGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderGraph {
    /// Creates an empty graph with capacity pre-allocated for a typical
    /// frame.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resources: Vec::with_capacity(MAX_RESOURCES),
            resource_count: 0,
            resource_names: FxHashMap::default(),
            passes: Vec::with_capacity(16),
            backbuffer: ResourceHandle::INVALID,
            compiled: Vec::new(),
            is_compiled: false,
            frame_index: 0,
            stats: FrameStats::default(),
        }
    }

    // ── Resource creation ──────────────────────────────────────────────────

    /// Allocates a resource slot, records the descriptor, and returns the
    /// slot's handle. Returns [`ResourceHandle::INVALID`] once
    /// [`MAX_RESOURCES`] slots are live.
    ///
    /// The name (clamped to 63 bytes) is inserted into a case-sensitive
    /// name→handle map for [`get_resource_by_name`](Self::get_resource_by_name).
    pub fn create_resource(
        &mut self,
        name: &str,
        kind: ResourceKind,
        descriptor: ResourceDescriptor,
    ) -> ResourceHandle {
        if self.resource_count >= MAX_RESOURCES {
            return ResourceHandle::INVALID;
        }

        let index = self.resource_count;
        if index == self.resources.len() {
            self.resources.push(ResourceEntry::empty());
        }
        self.resource_count += 1;

        let entry = &mut self.resources[index];
        entry.generation = next_generation(entry.generation);
        entry.name = clamp_name(name);
        entry.kind = kind;
        entry.descriptor = descriptor;
        entry.is_valid = true;
        entry.is_imported = false;
        entry.is_exported = false;
        entry.first_use_pass = NO_PASS;
        entry.last_use_pass = 0;
        entry.payload = GpuPayload::None;

        let map_key = entry.name.clone();
        let handle = ResourceHandle::new(index as u16, entry.generation);
        self.resource_names.insert(map_key, handle);
        self.invalidate();
        handle
    }

    /// Creates a transient 2D color texture.
    pub fn create_texture_2d(
        &mut self,
        name: &str,
        width: u32,
        height: u32,
        format: TextureFormat,
        usage: ResourceUsage,
    ) -> ResourceHandle {
        self.create_resource(
            name,
            ResourceKind::Texture2d,
            ResourceDescriptor {
                width,
                height,
                format,
                usage,
                ..Default::default()
            },
        )
    }

    /// Creates a transient cube texture (six layers, square faces).
    pub fn create_texture_cube(
        &mut self,
        name: &str,
        size: u32,
        format: TextureFormat,
        usage: ResourceUsage,
    ) -> ResourceHandle {
        self.create_resource(
            name,
            ResourceKind::TextureCube,
            ResourceDescriptor {
                width: size,
                height: size,
                format,
                usage,
                array_layers: 6,
                ..Default::default()
            },
        )
    }

    /// Creates a transient depth buffer.
    pub fn create_depth_buffer(
        &mut self,
        name: &str,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> ResourceHandle {
        self.create_resource(
            name,
            ResourceKind::DepthBuffer,
            ResourceDescriptor {
                width,
                height,
                format,
                usage: ResourceUsage::DEPTH_TARGET_SAMPLED,
                ..Default::default()
            },
        )
    }

    /// Creates a uniform buffer of `size` bytes.
    pub fn create_uniform_buffer(&mut self, name: &str, size: u64) -> ResourceHandle {
        self.create_buffer(name, ResourceKind::UniformBuffer, size)
    }

    /// Creates a storage buffer of `size` bytes.
    pub fn create_storage_buffer(&mut self, name: &str, size: u64) -> ResourceHandle {
        self.create_buffer(name, ResourceKind::StorageBuffer, size)
    }

    /// Creates a vertex buffer of `size` bytes.
    pub fn create_vertex_buffer(&mut self, name: &str, size: u64) -> ResourceHandle {
        self.create_buffer(name, ResourceKind::VertexBuffer, size)
    }

    /// Creates an index buffer of `size` bytes.
    pub fn create_index_buffer(&mut self, name: &str, size: u64) -> ResourceHandle {
        self.create_buffer(name, ResourceKind::IndexBuffer, size)
    }

    fn create_buffer(&mut self, name: &str, kind: ResourceKind, size: u64) -> ResourceHandle {
        let usage = match kind {
            ResourceKind::StorageBuffer => ResourceUsage::STORAGE,
            _ => ResourceUsage::empty(),
        };
        self.create_resource(
            name,
            kind,
            ResourceDescriptor {
                size,
                usage,
                is_transient: false,
                ..Default::default()
            },
        )
    }

    /// Registers the externally-owned swapchain backbuffer.
    ///
    /// The backbuffer is imported *and* exported: the graph never aliases
    /// or destroys it, and it must survive execution for presentation.
    /// The handle is also stored for [`backbuffer`](Self::backbuffer).
    pub fn import_backbuffer(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> ResourceHandle {
        let handle = self.create_resource(
            "backbuffer",
            ResourceKind::Texture2d,
            ResourceDescriptor {
                width,
                height,
                format,
                usage: ResourceUsage::COLOR_ATTACHMENT,
                is_transient: false,
                ..Default::default()
            },
        );
        if let Some(entry) = self.get_resource_entry_mut(handle) {
            entry.is_imported = true;
            entry.is_exported = true;
        }
        self.backbuffer = handle;
        handle
    }

    /// Handle of the imported backbuffer, or the invalid handle if none
    /// was imported.
    #[inline]
    #[must_use]
    pub fn backbuffer(&self) -> ResourceHandle {
        self.backbuffer
    }

    // ── Pass creation ──────────────────────────────────────────────────────

    /// Appends a pass and returns it for attachment/binding setup.
    /// Returns `None` once [`MAX_PASSES`] passes exist.
    pub fn add_pass(&mut self, name: &str, kind: PassKind) -> Option<&mut Pass> {
        if self.passes.len() >= MAX_PASSES {
            return None;
        }
        self.invalidate();
        self.passes.push(Pass::new(name, kind));
        self.passes.last_mut()
    }

    // ── Lookup ─────────────────────────────────────────────────────────────

    /// Resolves a handle to its slot.
    ///
    /// Succeeds iff the index is in range, the slot is live, and the
    /// slot's generation equals the handle's. Every other case — including
    /// any handle issued before the last [`reset`](Self::reset) — returns
    /// `None`; this never panics.
    #[must_use]
    pub fn get_resource_entry(&self, handle: ResourceHandle) -> Option<&ResourceEntry> {
        let index = handle.index() as usize;
        if index >= self.resource_count {
            return None;
        }
        let entry = &self.resources[index];
        (entry.is_valid && entry.generation == handle.generation()).then_some(entry)
    }

    /// Mutable variant of [`get_resource_entry`](Self::get_resource_entry),
    /// used by backends to install realized payloads.
    pub fn get_resource_entry_mut(&mut self, handle: ResourceHandle) -> Option<&mut ResourceEntry> {
        let index = handle.index() as usize;
        if index >= self.resource_count {
            return None;
        }
        let entry = &mut self.resources[index];
        (entry.is_valid && entry.generation == handle.generation()).then_some(entry)
    }

    /// Case-sensitive name lookup.
    #[must_use]
    pub fn get_resource_by_name(&self, name: &str) -> Option<ResourceHandle> {
        self.resource_names.get(name).copied()
    }

    /// Finds a pass by name (declaration order, first match).
    #[must_use]
    pub fn get_pass_by_name(&self, name: &str) -> Option<&Pass> {
        self.passes.iter().find(|p| p.name() == name)
    }

    /// Mutable pass lookup by name. Invalidates compilation, since the
    /// caller can change the pass's declared accesses through it.
    pub fn get_pass_by_name_mut(&mut self, name: &str) -> Option<&mut Pass> {
        self.invalidate();
        self.passes.iter_mut().find(|p| p.name() == name)
    }

    /// Pass by declaration index.
    #[must_use]
    pub fn pass(&self, index: u16) -> Option<&Pass> {
        self.passes.get(index as usize)
    }

    #[inline]
    #[must_use]
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Live resource slots.
    #[inline]
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.resource_count
    }

    // ── Compiled state ─────────────────────────────────────────────────────

    /// Whether the current description has been compiled.
    #[inline]
    #[must_use]
    pub fn is_compiled(&self) -> bool {
        self.is_compiled
    }

    /// The compiled schedule of the last successful compile, in execution
    /// order. Stale (but intact) while the graph is invalidated.
    #[inline]
    #[must_use]
    pub fn compiled_passes(&self) -> &[CompiledPass] {
        &self.compiled
    }

    /// Statistics of the most recent [`execute`](Self::execute).
    #[inline]
    #[must_use]
    pub fn frame_stats(&self) -> FrameStats {
        self.stats
    }

    /// Frame counter advanced (with wraparound) by each execute.
    #[inline]
    #[must_use]
    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    /// Whether two resources could share backing memory: both transient,
    /// neither imported, both used, with disjoint lifetime intervals.
    ///
    /// The compiler only identifies candidates; actually aliasing memory
    /// is the backend allocator's decision.
    #[must_use]
    pub fn resources_can_alias(&self, a: ResourceHandle, b: ResourceHandle) -> bool {
        let (Some(ra), Some(rb)) = (self.get_resource_entry(a), self.get_resource_entry(b)) else {
            return false;
        };
        if ra.is_imported || rb.is_imported {
            return false;
        }
        if !ra.descriptor.is_transient || !rb.descriptor.is_transient {
            return false;
        }
        let (Some((a0, a1)), Some((b0, b1))) = (ra.lifetime(), rb.lifetime()) else {
            return false;
        };
        a1 < b0 || b1 < a0
    }

    // ── Lifecycle ──────────────────────────────────────────────────────────

    /// Marks the compiled schedule stale. Called by every builder
    /// mutation; the schedule itself is kept so a failed rebuild can fall
    /// back to the last good frame.
    pub fn invalidate(&mut self) {
        self.is_compiled = false;
    }

    /// Retires every resource slot and removes every pass.
    ///
    /// Generation counters survive, so any handle issued before the reset
    /// fails validation afterwards. Slot storage is retained.
    pub fn reset(&mut self) {
        for entry in &mut self.resources[..self.resource_count] {
            entry.is_valid = false;
            entry.is_imported = false;
            entry.is_exported = false;
            entry.payload = GpuPayload::None;
        }
        self.resource_count = 0;
        self.resource_names.clear();
        self.passes.clear();
        self.compiled.clear();
        self.backbuffer = ResourceHandle::INVALID;
        self.is_compiled = false;
    }

    /// Dumps the graph description and compiled schedule at `debug` level.
    pub fn debug_print(&self) {
        log::debug!(
            "render graph: {} passes, {} resources, compiled: {}",
            self.passes.len(),
            self.resource_count,
            self.is_compiled
        );
        for (i, pass) in self.passes.iter().enumerate() {
            log::debug!(
                "  pass[{i}] '{}' {:?} colors={} depth={} reads={} writes={} order={} culled={}",
                pass.name(),
                pass.kind(),
                pass.color_attachments.len(),
                pass.depth_attachment.is_some(),
                pass.reads.len(),
                pass.writes.len(),
                pass.execution_order,
                pass.culled,
            );
        }
        for entry in &self.resources[..self.resource_count] {
            log::debug!(
                "  resource '{}' {:?} gen={} imported={} exported={} lifetime={:?}",
                entry.name(),
                entry.kind(),
                entry.generation,
                entry.is_imported,
                entry.is_exported,
                entry.lifetime(),
            );
        }
        for compiled in &self.compiled {
            log::debug!(
                "  order[{}] pass[{}] preds={:?} barriers={}",
                compiled.execution_order,
                compiled.pass_index,
                compiled.predecessors,
                compiled.barriers.len(),
            );
        }
    }

    pub(crate) fn passes(&self) -> &[Pass] {
        &self.passes
    }

    pub(crate) fn passes_mut(&mut self) -> &mut [Pass] {
        &mut self.passes
    }

    /// Slot access by raw index for compiler-internal walks over live
    /// slots (bypasses generation checks).
    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut ResourceEntry {
        &mut self.resources[index]
    }
}
