//! Generation-Counted Resource Handles
//!
//! A [`ResourceHandle`] is a 32-bit `{ index, generation }` pair that
//! identifies a resource slot without owning it. Handles are `Copy`, cheap
//! to compare, and safe to hold across frames: the graph bumps a slot's
//! generation every time the slot is (re)allocated, so a handle issued
//! before a [`reset`](crate::graph::RenderGraph::reset) fails validation
//! instead of silently aliasing a new resource.

/// Slot index reserved for the invalid handle.
pub const INVALID_RESOURCE_INDEX: u16 = u16::MAX;

/// Type-safe, generation-counted handle to a graph resource.
///
/// Equality is componentwise: two handles are equal iff both the slot
/// index and the generation match. A handle never owns the resource it
/// names; resolve it through
/// [`RenderGraph::get_resource_entry`](crate::graph::RenderGraph::get_resource_entry),
/// which returns `None` for stale or out-of-range handles.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ResourceHandle {
    index: u16,
    generation: u16,
}

impl ResourceHandle {
    /// The invalid handle. Returned by building operations on capacity
    /// overflow; fails every lookup.
    pub const INVALID: Self = Self {
        index: INVALID_RESOURCE_INDEX,
        generation: 0,
    };

    pub(crate) const fn new(index: u16, generation: u16) -> Self {
        Self { index, generation }
    }

    /// Returns the slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u16 {
        self.index
    }

    /// Returns the generation the handle was issued with.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u16 {
        self.generation
    }

    /// Returns `true` unless this is the invalid handle.
    ///
    /// A `true` result does not mean the handle still resolves — a stale
    /// generation is only detected at lookup time.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.index != INVALID_RESOURCE_INDEX
    }
}

impl Default for ResourceHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Advances a slot generation, skipping 0 (the never-issued marker).
pub(crate) fn next_generation(current: u16) -> u16 {
    match current.wrapping_add(1) {
        0 => 1,
        g => g,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_handle_is_not_valid() {
        assert!(!ResourceHandle::INVALID.is_valid());
        assert_eq!(ResourceHandle::default(), ResourceHandle::INVALID);
    }

    #[test]
    fn equality_is_componentwise() {
        let a = ResourceHandle::new(3, 1);
        let b = ResourceHandle::new(3, 2);
        let c = ResourceHandle::new(4, 1);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, ResourceHandle::new(3, 1));
    }

    #[test]
    fn generation_wraps_past_zero() {
        assert_eq!(next_generation(0), 1);
        assert_eq!(next_generation(1), 2);
        assert_eq!(next_generation(u16::MAX), 1);
    }
}
