//! Pass Model
//!
//! A [`Pass`] is one node of the graph: a named unit of GPU work that
//! declares which resources it writes (color/depth attachments, storage
//! writes) and which it reads (sampled bindings, read-only depth). The
//! compiler derives scheduling and synchronization purely from these
//! declarations; the pass body itself is an opaque execute callback that
//! records backend commands at execution time.
//!
//! Attachment and binding lists have fixed capacities. Overflowing
//! additions return `false` and change nothing — a graph that hits these
//! limits is considered a program bug, not a runtime condition.

use glam::Vec4;
use smallvec::SmallVec;

use crate::graph::executor::PassContext;
use crate::handle::ResourceHandle;
use crate::resource::clamp_name;

/// Color attachments per pass.
pub const MAX_COLOR_ATTACHMENTS: usize = 8;
/// Read bindings per pass.
pub const MAX_READ_BINDINGS: usize = 16;
/// Write bindings per pass.
pub const MAX_WRITE_BINDINGS: usize = 8;

/// What kind of GPU work a pass records.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum PassKind {
    #[default]
    Graphics,
    Compute,
    Transfer,
}

/// What happens to an attachment's contents when a pass begins.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum LoadOp {
    Load,
    #[default]
    Clear,
    DontCare,
}

impl LoadOp {
    /// `VkAttachmentLoadOp` numeric code.
    #[must_use]
    pub const fn vulkan_op(self) -> u32 {
        match self {
            Self::Load => 0,
            Self::Clear => 1,
            Self::DontCare => 2,
        }
    }

    /// Metal load-action code (mirrors the Vulkan table).
    #[must_use]
    pub const fn metal_op(self) -> u32 {
        self.vulkan_op()
    }
}

/// What happens to an attachment's contents when a pass ends.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum StoreOp {
    #[default]
    Store,
    DontCare,
}

impl StoreOp {
    /// `VkAttachmentStoreOp` numeric code.
    #[must_use]
    pub const fn vulkan_op(self) -> u32 {
        match self {
            Self::Store => 0,
            Self::DontCare => 1,
        }
    }

    /// Metal store-action code (mirrors the Vulkan table).
    #[must_use]
    pub const fn metal_op(self) -> u32 {
        self.vulkan_op()
    }
}

bitflags::bitflags! {
    /// Shader stages a binding is visible to.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX       = 1 << 0;
        const FRAGMENT     = 1 << 1;
        const COMPUTE      = 1 << 2;
        const GEOMETRY     = 1 << 3;
        const TESS_CONTROL = 1 << 4;
        const TESS_EVAL    = 1 << 5;
    }
}

impl ShaderStageFlags {
    /// `VkShaderStageFlags` bit mask.
    #[must_use]
    pub fn vulkan_stages(self) -> u32 {
        let mut bits = 0;
        if self.contains(Self::VERTEX) {
            bits |= 0x01;
        }
        if self.contains(Self::TESS_CONTROL) {
            bits |= 0x02;
        }
        if self.contains(Self::TESS_EVAL) {
            bits |= 0x04;
        }
        if self.contains(Self::GEOMETRY) {
            bits |= 0x08;
        }
        if self.contains(Self::FRAGMENT) {
            bits |= 0x10;
        }
        if self.contains(Self::COMPUTE) {
            bits |= 0x20;
        }
        bits
    }

    /// `MTLRenderStages` bit mask. Metal expresses compute, geometry, and
    /// tessellation through separate encoder types, so only the render
    /// stages map to bits.
    #[must_use]
    pub fn metal_stages(self) -> u32 {
        let mut bits = 0;
        if self.contains(Self::VERTEX) {
            bits |= 0x01;
        }
        if self.contains(Self::FRAGMENT) {
            bits |= 0x02;
        }
        bits
    }
}

/// One color output of a graphics pass.
#[derive(Clone, Copy, Debug)]
pub struct ColorAttachment {
    pub handle: ResourceHandle,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub clear_color: Vec4,
}

/// The depth/stencil output (or read-only input) of a graphics pass.
#[derive(Clone, Copy, Debug)]
pub struct DepthAttachment {
    pub handle: ResourceHandle,
    pub depth_load_op: LoadOp,
    pub depth_store_op: StoreOp,
    pub stencil_load_op: LoadOp,
    pub stencil_store_op: StoreOp,
    pub clear_depth: f32,
    pub clear_stencil: u32,
    /// Read-only depth participates in the pass's read set and keeps the
    /// resource in `DepthStencilReadOnly` layout.
    pub read_only: bool,
}

impl DepthAttachment {
    /// A cleared, writable depth attachment with the usual defaults.
    #[must_use]
    pub fn clear(handle: ResourceHandle, clear_depth: f32) -> Self {
        Self {
            handle,
            depth_load_op: LoadOp::Clear,
            depth_store_op: StoreOp::Store,
            stencil_load_op: LoadOp::DontCare,
            stencil_store_op: StoreOp::DontCare,
            clear_depth,
            clear_stencil: 0,
            read_only: false,
        }
    }

    /// A read-only depth attachment loading existing contents.
    #[must_use]
    pub fn read_only(handle: ResourceHandle) -> Self {
        Self {
            handle,
            depth_load_op: LoadOp::Load,
            depth_store_op: StoreOp::Store,
            stencil_load_op: LoadOp::DontCare,
            stencil_store_op: StoreOp::DontCare,
            clear_depth: 1.0,
            clear_stencil: 0,
            read_only: true,
        }
    }
}

/// A shader-visible resource binding (descriptor set slot).
#[derive(Clone, Copy, Debug)]
pub struct ResourceBinding {
    pub handle: ResourceHandle,
    pub set: u32,
    pub binding: u32,
    pub stages: ShaderStageFlags,
}

/// Boxed execute callback. Captured state plays the role an opaque
/// user-data pointer plays in C-style engines.
pub type PassExecuteFn = Box<dyn FnMut(&mut PassContext<'_>)>;

/// A named unit of GPU work and its declared resource accesses.
pub struct Pass {
    pub(crate) name: String,
    pub(crate) kind: PassKind,
    pub(crate) color_attachments: SmallVec<[ColorAttachment; MAX_COLOR_ATTACHMENTS]>,
    pub(crate) depth_attachment: Option<DepthAttachment>,
    pub(crate) reads: SmallVec<[ResourceBinding; 4]>,
    pub(crate) writes: SmallVec<[ResourceBinding; 4]>,
    pub(crate) execute: Option<PassExecuteFn>,
    pub(crate) execution_order: u32,
    pub(crate) culled: bool,
}

impl Pass {
    pub(crate) fn new(name: &str, kind: PassKind) -> Self {
        Self {
            name: clamp_name(name),
            kind,
            color_attachments: SmallVec::new(),
            depth_attachment: None,
            reads: SmallVec::new(),
            writes: SmallVec::new(),
            execute: None,
            execution_order: 0,
            culled: false,
        }
    }

    // ── Building ───────────────────────────────────────────────────────────

    /// Appends a color attachment. Returns `false` (and changes nothing)
    /// past [`MAX_COLOR_ATTACHMENTS`].
    pub fn add_color_attachment(
        &mut self,
        handle: ResourceHandle,
        load_op: LoadOp,
        store_op: StoreOp,
        clear_color: Vec4,
    ) -> bool {
        if self.color_attachments.len() >= MAX_COLOR_ATTACHMENTS {
            return false;
        }
        self.color_attachments.push(ColorAttachment {
            handle,
            load_op,
            store_op,
            clear_color,
        });
        true
    }

    /// Sets (or replaces) the depth attachment.
    pub fn set_depth_attachment(&mut self, attachment: DepthAttachment) {
        self.depth_attachment = Some(attachment);
    }

    /// Declares a sampled read. Returns `false` past [`MAX_READ_BINDINGS`].
    pub fn add_resource_read(
        &mut self,
        handle: ResourceHandle,
        set: u32,
        binding: u32,
        stages: ShaderStageFlags,
    ) -> bool {
        if self.reads.len() >= MAX_READ_BINDINGS {
            return false;
        }
        self.reads.push(ResourceBinding {
            handle,
            set,
            binding,
            stages,
        });
        true
    }

    /// Declares a storage (or transfer-destination) write. Returns `false`
    /// past [`MAX_WRITE_BINDINGS`].
    pub fn add_resource_write(
        &mut self,
        handle: ResourceHandle,
        set: u32,
        binding: u32,
        stages: ShaderStageFlags,
    ) -> bool {
        if self.writes.len() >= MAX_WRITE_BINDINGS {
            return false;
        }
        self.writes.push(ResourceBinding {
            handle,
            set,
            binding,
            stages,
        });
        true
    }

    /// Installs the execute callback invoked once per frame for this pass.
    pub fn set_execute_callback(&mut self, callback: impl FnMut(&mut PassContext<'_>) + 'static) {
        self.execute = Some(Box::new(callback));
    }

    // ── Inspection ─────────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> PassKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn color_attachments(&self) -> &[ColorAttachment] {
        &self.color_attachments
    }

    #[inline]
    #[must_use]
    pub fn depth_attachment(&self) -> Option<&DepthAttachment> {
        self.depth_attachment.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn reads(&self) -> &[ResourceBinding] {
        &self.reads
    }

    #[inline]
    #[must_use]
    pub fn writes(&self) -> &[ResourceBinding] {
        &self.writes
    }

    /// Execution index assigned by the last successful compile.
    #[inline]
    #[must_use]
    pub fn execution_order(&self) -> u32 {
        self.execution_order
    }

    /// Culled passes stay in the compiled order but are skipped by the
    /// executor.
    #[inline]
    #[must_use]
    pub fn is_culled(&self) -> bool {
        self.culled
    }

    /// Manually marks the pass culled (the reserved cull extension point;
    /// the compiler itself culls nothing).
    pub fn set_culled(&mut self, culled: bool) {
        self.culled = culled;
    }

    /// All handles the pass reads: sampled bindings plus read-only depth.
    pub(crate) fn input_handles(&self) -> impl Iterator<Item = ResourceHandle> + '_ {
        self.reads
            .iter()
            .map(|b| b.handle)
            .chain(
                self.depth_attachment
                    .iter()
                    .filter(|d| d.read_only)
                    .map(|d| d.handle),
            )
    }

    /// All handles the pass writes: color attachments, writable depth,
    /// storage writes.
    pub(crate) fn output_handles(&self) -> impl Iterator<Item = ResourceHandle> + '_ {
        self.color_attachments
            .iter()
            .map(|a| a.handle)
            .chain(
                self.depth_attachment
                    .iter()
                    .filter(|d| !d.read_only)
                    .map(|d| d.handle),
            )
            .chain(self.writes.iter().map(|b| b.handle))
    }

    /// Whether `handle` appears in the pass's output set.
    pub(crate) fn writes_resource(&self, handle: ResourceHandle) -> bool {
        self.output_handles().any(|h| h == handle)
    }
}
