//! Texture Formats
//!
//! Closed enumeration of the pixel formats the graph understands, with the
//! per-format metadata (bytes per pixel, depth/stencil classification) and
//! the numeric codes a backend needs to translate a format into its native
//! API. The numeric mappings are part of the backend contract: a
//! conforming Vulkan backend feeds [`TextureFormat::vulkan_format`]
//! straight into `VkFormat`, a Metal backend feeds
//! [`TextureFormat::metal_format`] into `MTLPixelFormat`.

/// Pixel format of a texture or depth buffer resource.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum TextureFormat {
    #[default]
    Rgba8Unorm,
    Rgba8Srgb,
    Bgra8Unorm,
    Bgra8Srgb,
    Rgba16Float,
    Rgba32Float,
    Rg16Float,
    Rg32Float,
    R16Float,
    R32Float,
    R8Unorm,
    Depth32Float,
    Depth24Stencil8,
    Depth16Unorm,
}

impl TextureFormat {
    /// Bytes per pixel for a tightly-packed single sample.
    #[must_use]
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::R8Unorm => 1,
            Self::R16Float | Self::Depth16Unorm => 2,
            Self::Rgba8Unorm
            | Self::Rgba8Srgb
            | Self::Bgra8Unorm
            | Self::Bgra8Srgb
            | Self::Rg16Float
            | Self::R32Float
            | Self::Depth32Float
            | Self::Depth24Stencil8 => 4,
            Self::Rgba16Float | Self::Rg32Float => 8,
            Self::Rgba32Float => 16,
        }
    }

    /// Returns `true` for depth and depth-stencil formats.
    #[must_use]
    pub const fn is_depth(self) -> bool {
        matches!(
            self,
            Self::Depth32Float | Self::Depth24Stencil8 | Self::Depth16Unorm
        )
    }

    /// Returns `true` when the format carries a stencil aspect.
    #[must_use]
    pub const fn has_stencil(self) -> bool {
        matches!(self, Self::Depth24Stencil8)
    }

    /// `VkFormat` numeric code.
    #[must_use]
    pub const fn vulkan_format(self) -> u32 {
        match self {
            Self::Rgba8Unorm => 37,
            Self::Rgba8Srgb => 43,
            Self::Bgra8Unorm => 44,
            Self::Bgra8Srgb => 50,
            Self::Rgba16Float => 97,
            Self::Rgba32Float => 109,
            Self::Rg16Float => 83,
            Self::Rg32Float => 103,
            Self::R16Float => 76,
            Self::R32Float => 100,
            Self::R8Unorm => 9,
            Self::Depth32Float => 126,
            Self::Depth24Stencil8 => 129,
            Self::Depth16Unorm => 124,
        }
    }

    /// `MTLPixelFormat` numeric code.
    #[must_use]
    pub const fn metal_format(self) -> u32 {
        match self {
            Self::Rgba8Unorm => 70,
            Self::Rgba8Srgb => 71,
            Self::Bgra8Unorm => 80,
            Self::Bgra8Srgb => 81,
            Self::Rgba16Float => 115,
            Self::Rgba32Float => 125,
            Self::Rg16Float => 65,
            Self::Rg32Float => 105,
            Self::R16Float => 25,
            Self::R32Float => 55,
            Self::R8Unorm => 10,
            Self::Depth32Float => 252,
            Self::Depth24Stencil8 => 255,
            Self::Depth16Unorm => 250,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_pinned_codes() {
        assert_eq!(TextureFormat::Rgba8Unorm.vulkan_format(), 37);
        assert_eq!(TextureFormat::Rgba8Unorm.metal_format(), 70);
        assert_eq!(TextureFormat::Rgba16Float.vulkan_format(), 97);
        assert_eq!(TextureFormat::Rgba16Float.metal_format(), 115);
        assert_eq!(TextureFormat::Depth32Float.vulkan_format(), 126);
        assert_eq!(TextureFormat::Depth32Float.metal_format(), 252);
    }

    #[test]
    fn depth_classification() {
        assert!(TextureFormat::Depth32Float.is_depth());
        assert!(TextureFormat::Depth16Unorm.is_depth());
        assert!(!TextureFormat::Rgba8Unorm.is_depth());
        assert!(TextureFormat::Depth24Stencil8.has_stencil());
        assert!(!TextureFormat::Depth32Float.has_stencil());
    }
}
