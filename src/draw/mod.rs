//! Draw List
//!
//! Per-frame draw-call collector. The scene fills the list once per frame,
//! sorts it with one of the key-based orders, and passes hand out filtered
//! views ([`PassDrawList`]) during execution.
//!
//! # Sort-key encoding
//!
//! ```text
//! 63            32 31             0
//! ┌───────────────┬───────────────┐
//! │  material id  │ distance bits │
//! └───────────────┴───────────────┘
//! ```
//!
//! The lower half is the raw bit pattern of the squared camera distance.
//! For non-negative IEEE-754 floats, raw-bit ordering agrees with numeric
//! ordering, so front-to-back is ascending on the lower 32 bits and the
//! full key realizes material-major, distance-minor batching. All sorts
//! are stable, so equal keys keep their insertion order.
//!
//! # Capacity
//!
//! Appends past the per-frame cap are silently dropped — hitting the cap
//! is a content bug, not a runtime condition. Backing storage is retained
//! across [`clear`](DrawList::clear) to amortize allocation.

pub mod pass_list;
pub(crate) mod radix;

use std::cmp::Reverse;

use glam::Mat4;

use crate::worker::WorkerPool;

pub use pass_list::PassDrawList;

/// Default per-frame draw-call cap.
pub const MAX_DRAW_CALLS: usize = 8192;
/// Below this length the parallel sort falls back to the serial path.
pub const PARALLEL_SORT_THRESHOLD: usize = 512;

/// Reference into the external geometry storage.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GeometryId(pub u32);

/// One recorded draw.
#[derive(Clone, Copy, Debug)]
pub struct DrawCall {
    pub geometry: GeometryId,
    pub material_id: u32,
    pub model_matrix: Mat4,
    pub sort_key: u64,
    /// Opaque caller tag, carried through sorts untouched.
    pub user_data: u64,
}

/// Packs a material id and squared camera distance into a sort key.
///
/// Negative distances clamp to zero; distance zero means "no distance
/// component" and leaves pure material ordering.
#[must_use]
pub fn encode_sort_key(material_id: u32, distance_sq: f32) -> u64 {
    let distance_bits = if distance_sq.is_sign_negative() {
        0
    } else {
        distance_sq.to_bits()
    };
    (u64::from(material_id) << 32) | u64::from(distance_bits)
}

/// Per-frame draw-call collector with serial and parallel sorting.
pub struct DrawList {
    calls: Vec<DrawCall>,
    /// Radix-sort double buffer, retained across frames.
    scratch: Vec<DrawCall>,
    capacity: usize,
}

impl Default for DrawList {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawList {
    /// Creates a list with the default [`MAX_DRAW_CALLS`] cap.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_DRAW_CALLS)
    }

    /// Creates a list with a custom per-frame cap.
    #[must_use]
    pub fn with_capacity(max_calls: usize) -> Self {
        Self {
            calls: Vec::with_capacity(max_calls.min(MAX_DRAW_CALLS)),
            scratch: Vec::new(),
            capacity: max_calls,
        }
    }

    /// Empties the list, retaining storage.
    #[inline]
    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Records a draw sorted by material only.
    pub fn add_draw_call(&mut self, geometry: GeometryId, material_id: u32, model_matrix: Mat4) {
        self.push(DrawCall {
            geometry,
            material_id,
            model_matrix,
            sort_key: encode_sort_key(material_id, 0.0),
            user_data: 0,
        });
    }

    /// Records a draw with a camera-distance component in its key.
    pub fn add_draw_call_with_distance(
        &mut self,
        geometry: GeometryId,
        material_id: u32,
        model_matrix: Mat4,
        distance_sq: f32,
    ) {
        self.push(DrawCall {
            geometry,
            material_id,
            model_matrix,
            sort_key: encode_sort_key(material_id, distance_sq),
            user_data: 0,
        });
    }

    /// Appends a fully-formed call. Silently dropped past the cap.
    pub fn push(&mut self, call: DrawCall) {
        if self.calls.len() < self.capacity {
            self.calls.push(call);
        }
    }

    // ── Sorting ────────────────────────────────────────────────────────────

    /// Stable sort by material id alone.
    pub fn sort_by_material(&mut self) {
        self.calls.sort_by_key(|call| call.sort_key >> 32);
    }

    /// Stable ascending sort on the full 64-bit key: material batching
    /// with distance as the secondary key.
    pub fn sort_by_sort_key(&mut self) {
        self.calls.sort_by_key(|call| call.sort_key);
    }

    /// Stable ascending sort on the distance bits (near first).
    pub fn sort_front_to_back(&mut self) {
        self.calls.sort_by_key(|call| call.sort_key as u32);
    }

    /// Stable descending sort on the distance bits (far first).
    pub fn sort_back_to_front(&mut self) {
        self.calls.sort_by_key(|call| Reverse(call.sort_key as u32));
    }

    /// Parallel stable radix sort on the full key.
    ///
    /// Falls back to [`sort_by_sort_key`](Self::sort_by_sort_key) below
    /// [`PARALLEL_SORT_THRESHOLD`] items or without a scheduler; both
    /// paths produce the identical ordering.
    pub fn sort_by_sort_key_parallel(&mut self, pool: Option<&WorkerPool>) {
        match pool {
            Some(pool) if self.calls.len() >= PARALLEL_SORT_THRESHOLD => {
                radix::parallel_sort_by_key(&mut self.calls, &mut self.scratch, pool);
            }
            _ => self.sort_by_sort_key(),
        }
    }

    // ── Access ─────────────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// The per-frame cap this list was created with.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    #[must_use]
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&DrawCall> {
        self.calls.get(index)
    }

    /// Iterates calls in their current (post-sort) order.
    pub fn iter(&self) -> std::slice::Iter<'_, DrawCall> {
        self.calls.iter()
    }

    /// Indices of the calls matching `predicate`, in list order.
    pub fn filter_by(&self, mut predicate: impl FnMut(&DrawCall) -> bool) -> Vec<u32> {
        self.calls
            .iter()
            .enumerate()
            .filter(|(_, call)| predicate(call))
            .map(|(index, _)| index as u32)
            .collect()
    }
}

impl<'a> IntoIterator for &'a DrawList {
    type Item = &'a DrawCall;
    type IntoIter = std::slice::Iter<'a, DrawCall>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_key_packs_material_and_distance() {
        let key = encode_sort_key(7, 2.5);
        assert_eq!(key >> 32, 7);
        assert_eq!(key as u32, 2.5f32.to_bits());
    }

    #[test]
    fn negative_distance_clamps_to_zero() {
        assert_eq!(encode_sort_key(1, -4.0) as u32, 0);
    }

    #[test]
    fn appends_past_cap_are_dropped() {
        let mut list = DrawList::with_capacity(2);
        for i in 0..5 {
            list.add_draw_call(GeometryId(i), i, Mat4::IDENTITY);
        }
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(1).unwrap().material_id, 1);
    }
}
