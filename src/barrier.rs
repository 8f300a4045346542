//! Barriers and Layout Transitions
//!
//! The compiler reduces every cross-pass hazard to a [`ResourceBarrier`]:
//! a declarative `(access, layout) → (access, layout)` transition attached
//! to the pass that consumes the new state. Backends translate barriers
//! through the numeric mappings below — on Vulkan into
//! `vkCmdPipelineBarrier` arguments, on Metal into nothing at all (Metal
//! tracks attachment state through load/store descriptors, so the barrier
//! list collapses to a no-op there but is still emitted by the compiler).

use bitflags::bitflags;

use crate::handle::ResourceHandle;

bitflags! {
    /// Memory access kinds a pass performs on a resource.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct AccessFlags: u32 {
        const VERTEX_READ             = 1 << 0;
        const INDEX_READ              = 1 << 1;
        const UNIFORM_READ            = 1 << 2;
        const SHADER_READ             = 1 << 3;
        const SHADER_WRITE            = 1 << 4;
        const COLOR_ATTACHMENT_READ   = 1 << 5;
        const COLOR_ATTACHMENT_WRITE  = 1 << 6;
        const DEPTH_READ              = 1 << 7;
        const DEPTH_WRITE             = 1 << 8;
        const TRANSFER_READ           = 1 << 9;
        const TRANSFER_WRITE          = 1 << 10;
    }
}

bitflags! {
    /// Pipeline stages derived from access flags when issuing a barrier.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct PipelineStageFlags: u32 {
        const TOP_OF_PIPE             = 1 << 0;
        const VERTEX_INPUT            = 1 << 1;
        const FRAGMENT_SHADER         = 1 << 2;
        const EARLY_FRAGMENT_TESTS    = 1 << 3;
        const COLOR_ATTACHMENT_OUTPUT = 1 << 4;
        const TRANSFER                = 1 << 5;
    }
}

impl AccessFlags {
    /// Pipeline stages that an access mask executes in.
    ///
    /// Shader reads run in the fragment stage, color access in
    /// color-attachment output, depth access in early fragment tests,
    /// transfers in the transfer stage; an empty mask (the state of a
    /// never-touched resource) anchors at top-of-pipe.
    #[must_use]
    pub fn pipeline_stages(self) -> PipelineStageFlags {
        if self.is_empty() {
            return PipelineStageFlags::TOP_OF_PIPE;
        }

        let mut stages = PipelineStageFlags::empty();
        if self.intersects(Self::VERTEX_READ | Self::INDEX_READ) {
            stages |= PipelineStageFlags::VERTEX_INPUT;
        }
        if self.intersects(Self::UNIFORM_READ | Self::SHADER_READ | Self::SHADER_WRITE) {
            stages |= PipelineStageFlags::FRAGMENT_SHADER;
        }
        if self.intersects(Self::COLOR_ATTACHMENT_READ | Self::COLOR_ATTACHMENT_WRITE) {
            stages |= PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT;
        }
        if self.intersects(Self::DEPTH_READ | Self::DEPTH_WRITE) {
            stages |= PipelineStageFlags::EARLY_FRAGMENT_TESTS;
        }
        if self.intersects(Self::TRANSFER_READ | Self::TRANSFER_WRITE) {
            stages |= PipelineStageFlags::TRANSFER;
        }
        stages
    }

    /// `VkAccessFlags` bit mask.
    #[must_use]
    pub fn vulkan_access(self) -> u32 {
        let mut bits = 0;
        if self.contains(Self::INDEX_READ) {
            bits |= 0x0000_0002; // VK_ACCESS_INDEX_READ_BIT
        }
        if self.contains(Self::VERTEX_READ) {
            bits |= 0x0000_0004; // VK_ACCESS_VERTEX_ATTRIBUTE_READ_BIT
        }
        if self.contains(Self::UNIFORM_READ) {
            bits |= 0x0000_0008;
        }
        if self.contains(Self::SHADER_READ) {
            bits |= 0x0000_0020;
        }
        if self.contains(Self::SHADER_WRITE) {
            bits |= 0x0000_0040;
        }
        if self.contains(Self::COLOR_ATTACHMENT_READ) {
            bits |= 0x0000_0080;
        }
        if self.contains(Self::COLOR_ATTACHMENT_WRITE) {
            bits |= 0x0000_0100;
        }
        if self.contains(Self::DEPTH_READ) {
            bits |= 0x0000_0200; // VK_ACCESS_DEPTH_STENCIL_ATTACHMENT_READ_BIT
        }
        if self.contains(Self::DEPTH_WRITE) {
            bits |= 0x0000_0400;
        }
        if self.contains(Self::TRANSFER_READ) {
            bits |= 0x0000_0800;
        }
        if self.contains(Self::TRANSFER_WRITE) {
            bits |= 0x0000_1000;
        }
        bits
    }
}

impl PipelineStageFlags {
    /// `VkPipelineStageFlags` bit mask.
    #[must_use]
    pub fn vulkan_stages(self) -> u32 {
        let mut bits = 0;
        if self.contains(Self::TOP_OF_PIPE) {
            bits |= 0x0000_0001;
        }
        if self.contains(Self::VERTEX_INPUT) {
            bits |= 0x0000_0004;
        }
        if self.contains(Self::FRAGMENT_SHADER) {
            bits |= 0x0000_0080;
        }
        if self.contains(Self::EARLY_FRAGMENT_TESTS) {
            bits |= 0x0000_0100;
        }
        if self.contains(Self::COLOR_ATTACHMENT_OUTPUT) {
            bits |= 0x0000_0400;
        }
        if self.contains(Self::TRANSFER) {
            bits |= 0x0000_1000;
        }
        bits
    }
}

/// Abstract state a GPU image is in, deciding which operations may touch it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum ImageLayout {
    #[default]
    Undefined,
    General,
    ColorAttachment,
    DepthStencilAttachment,
    DepthStencilReadOnly,
    ShaderReadOnly,
    TransferSrc,
    TransferDst,
    PresentSrc,
}

impl ImageLayout {
    /// `VkImageLayout` numeric code.
    ///
    /// Metal has no layout concept; a Metal backend ignores layouts and
    /// relies on its attachment descriptors instead.
    #[must_use]
    pub const fn vulkan_layout(self) -> u32 {
        match self {
            Self::Undefined => 0,
            Self::General => 1,
            Self::ColorAttachment => 2,
            Self::DepthStencilAttachment => 3,
            Self::DepthStencilReadOnly => 4,
            Self::ShaderReadOnly => 5,
            Self::TransferSrc => 6,
            Self::TransferDst => 7,
            Self::PresentSrc => 1_000_001_002, // VK_IMAGE_LAYOUT_PRESENT_SRC_KHR
        }
    }
}

/// A synchronization step issued immediately before the pass that needs
/// the destination state.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ResourceBarrier {
    pub resource: ResourceHandle,
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
    pub src_layout: ImageLayout,
    pub dst_layout: ImageLayout,
}

impl ResourceBarrier {
    /// Source pipeline stage mask, derived from the source access.
    #[inline]
    #[must_use]
    pub fn src_stage_mask(&self) -> PipelineStageFlags {
        self.src_access.pipeline_stages()
    }

    /// Destination pipeline stage mask, derived from the destination access.
    #[inline]
    #[must_use]
    pub fn dst_stage_mask(&self) -> PipelineStageFlags {
        self.dst_access.pipeline_stages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_access_anchors_at_top_of_pipe() {
        assert_eq!(
            AccessFlags::empty().pipeline_stages(),
            PipelineStageFlags::TOP_OF_PIPE
        );
    }

    #[test]
    fn stage_derivation_covers_each_family() {
        assert_eq!(
            AccessFlags::SHADER_READ.pipeline_stages(),
            PipelineStageFlags::FRAGMENT_SHADER
        );
        assert_eq!(
            AccessFlags::COLOR_ATTACHMENT_WRITE.pipeline_stages(),
            PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
        );
        assert_eq!(
            AccessFlags::DEPTH_WRITE.pipeline_stages(),
            PipelineStageFlags::EARLY_FRAGMENT_TESTS
        );
        assert_eq!(
            AccessFlags::TRANSFER_WRITE.pipeline_stages(),
            PipelineStageFlags::TRANSFER
        );
    }

    #[test]
    fn layout_codes_match_vulkan() {
        assert_eq!(ImageLayout::ColorAttachment.vulkan_layout(), 2);
        assert_eq!(ImageLayout::ShaderReadOnly.vulkan_layout(), 5);
        assert_eq!(ImageLayout::PresentSrc.vulkan_layout(), 1_000_001_002);
    }
}
