//! Resource Model
//!
//! A graph resource is a named, described GPU object slot: textures, depth
//! buffers, and the buffer kinds a pass can bind. The graph owns a flat
//! slot table ([`ResourceEntry`]); passes refer to slots exclusively
//! through generation-counted [`ResourceHandle`](crate::handle::ResourceHandle)s,
//! so no cyclic owning references exist between passes and resources.
//!
//! Slots carry two groups of derived state:
//! - lifetime fields (`first_use_pass` / `last_use_pass`), filled by the
//!   compiler's lifetime analysis and consumed by transient-memory
//!   aliasing decisions;
//! - a backend payload ([`GpuPayload`]), reserved for whichever backend
//!   realizes the resource into API objects.

use bitflags::bitflags;

use crate::format::TextureFormat;

/// Longest resource or pass name, in bytes.
pub const MAX_NAME_LEN: usize = 63;

/// Sentinel for "never used by any pass" in [`ResourceEntry::first_use_pass`].
pub const NO_PASS: u32 = u32::MAX;

bitflags! {
    /// How a resource may be used across the graph.
    ///
    /// The descriptor's usage is declarative: it is what the resource is
    /// *allowed* to do, while the per-pass attachment/binding lists decide
    /// what it actually does in each pass.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct ResourceUsage: u32 {
        const COLOR_ATTACHMENT = 1 << 0;
        const DEPTH_ATTACHMENT = 1 << 1;
        const SAMPLED          = 1 << 2;
        const STORAGE          = 1 << 3;
        const TRANSFER_SRC     = 1 << 4;
        const TRANSFER_DST     = 1 << 5;

        /// Render target that is later sampled (the common offscreen case).
        const RENDER_TARGET = Self::COLOR_ATTACHMENT.bits() | Self::SAMPLED.bits();
        /// Depth buffer that is later sampled (shadow maps).
        const DEPTH_TARGET_SAMPLED = Self::DEPTH_ATTACHMENT.bits() | Self::SAMPLED.bits();
    }
}

/// What kind of GPU object a slot describes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum ResourceKind {
    #[default]
    Texture2d,
    TextureCube,
    DepthBuffer,
    UniformBuffer,
    StorageBuffer,
    VertexBuffer,
    IndexBuffer,
}

/// Creation parameters for a resource.
///
/// Texture kinds use `width`/`height`/`format` and the count fields;
/// buffer kinds use `size` and leave the texture fields at their defaults.
#[derive(Clone, Copy, Debug)]
pub struct ResourceDescriptor {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: ResourceUsage,
    pub mip_levels: u32,
    pub array_layers: u32,
    pub sample_count: u32,
    /// Byte size, buffer kinds only.
    pub size: u64,
    /// Eligible for transient-memory aliasing when lifetimes permit.
    pub is_transient: bool,
}

impl Default for ResourceDescriptor {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            format: TextureFormat::Rgba8Unorm,
            usage: ResourceUsage::empty(),
            mip_levels: 1,
            array_layers: 1,
            sample_count: 1,
            size: 0,
            is_transient: true,
        }
    }
}

/// Backend-realized GPU objects for one resource slot.
///
/// The core reserves this slot for the backend and never interprets it;
/// ids are opaque API object handles. A single build uses one backend,
/// chosen at engine startup, so the variants are never mixed within a
/// graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GpuPayload {
    #[default]
    None,
    Vulkan {
        image: u64,
        view: u64,
        sampler: u64,
        memory: u64,
    },
    Metal {
        texture: u64,
        buffer: u64,
    },
}

/// One slot of the graph's resource table.
pub struct ResourceEntry {
    pub(crate) name: String,
    pub(crate) kind: ResourceKind,
    pub(crate) descriptor: ResourceDescriptor,
    pub(crate) generation: u16,
    pub(crate) is_valid: bool,
    /// Externally owned (e.g. the swapchain backbuffer): never aliased,
    /// never destroyed by the graph.
    pub(crate) is_imported: bool,
    /// Must outlive graph execution.
    pub(crate) is_exported: bool,
    pub(crate) first_use_pass: u32,
    pub(crate) last_use_pass: u32,
    /// Backend-owned realization of this slot.
    pub payload: GpuPayload,
}

impl ResourceEntry {
    pub(crate) fn empty() -> Self {
        Self {
            name: String::new(),
            kind: ResourceKind::Texture2d,
            descriptor: ResourceDescriptor::default(),
            generation: 0,
            is_valid: false,
            is_imported: false,
            is_exported: false,
            first_use_pass: NO_PASS,
            last_use_pass: 0,
            payload: GpuPayload::None,
        }
    }

    /// Resource name (clamped to [`MAX_NAME_LEN`] bytes at creation).
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    #[inline]
    #[must_use]
    pub fn is_imported(&self) -> bool {
        self.is_imported
    }

    #[inline]
    #[must_use]
    pub fn is_exported(&self) -> bool {
        self.is_exported
    }

    /// Execution index of the first pass touching this resource, or
    /// [`NO_PASS`] before compilation / when unused.
    #[inline]
    #[must_use]
    pub fn first_use_pass(&self) -> u32 {
        self.first_use_pass
    }

    /// Execution index of the last pass touching this resource.
    #[inline]
    #[must_use]
    pub fn last_use_pass(&self) -> u32 {
        self.last_use_pass
    }

    /// Whether the last lifetime analysis saw any pass touch this slot.
    #[inline]
    #[must_use]
    pub fn is_used(&self) -> bool {
        self.first_use_pass != NO_PASS
    }

    /// Lifetime interval `[first, last]` of execution indices, if used.
    #[must_use]
    pub fn lifetime(&self) -> Option<(u32, u32)> {
        self.is_used()
            .then_some((self.first_use_pass, self.last_use_pass))
    }
}

/// Clamps a name to [`MAX_NAME_LEN`] bytes on a char boundary.
pub(crate) fn clamp_name(name: &str) -> String {
    if name.len() <= MAX_NAME_LEN {
        return name.to_owned();
    }
    let mut end = MAX_NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_presets() {
        assert_eq!(
            ResourceUsage::RENDER_TARGET,
            ResourceUsage::COLOR_ATTACHMENT | ResourceUsage::SAMPLED
        );
        assert_eq!(
            ResourceUsage::DEPTH_TARGET_SAMPLED,
            ResourceUsage::DEPTH_ATTACHMENT | ResourceUsage::SAMPLED
        );
    }

    #[test]
    fn name_clamping_respects_char_boundaries() {
        let long = "a".repeat(100);
        assert_eq!(clamp_name(&long).len(), MAX_NAME_LEN);

        // 62 ASCII bytes followed by a 2-byte char straddling the limit.
        let straddle = format!("{}é", "a".repeat(62));
        let clamped = clamp_name(&straddle);
        assert!(clamped.len() <= MAX_NAME_LEN);
        assert!(clamped.chars().all(|c| c == 'a'));
    }
}
