//! Per-Pass Draw List
//!
//! A [`PassDrawList`] is a filtered view over the frame's main
//! [`DrawList`]: it owns only an index array and the pass name, never the
//! calls themselves. The external material system decides which passes a
//! material participates in through the `(material_id, pass_name)`
//! predicate handed to [`build_for_pass`](PassDrawList::build_for_pass).

use crate::resource::clamp_name;

use super::{DrawCall, DrawList};

/// Filtered, ordered view of the main draw list for one pass.
pub struct PassDrawList<'a> {
    list: &'a DrawList,
    pass_name: String,
    indices: Vec<u32>,
}

impl<'a> PassDrawList<'a> {
    /// Creates an empty view over `list` for the named pass.
    #[must_use]
    pub fn new(list: &'a DrawList, pass_name: &str) -> Self {
        Self {
            list,
            pass_name: clamp_name(pass_name),
            indices: Vec::new(),
        }
    }

    /// Scans the main list and keeps the indices of calls whose material
    /// participates in this pass. Kept indices preserve main-list order,
    /// so a sorted main list yields a sorted view.
    pub fn build_for_pass(&mut self, mut participates: impl FnMut(u32, &str) -> bool) {
        self.indices.clear();
        for (index, call) in self.list.iter().enumerate() {
            if participates(call.material_id, &self.pass_name) {
                self.indices.push(index as u32);
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn pass_name(&self) -> &str {
        &self.pass_name
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Kept main-list indices, in filtered order.
    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// The `index`-th kept draw call.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&'a DrawCall> {
        self.indices
            .get(index)
            .and_then(|&list_index| self.list.get(list_index as usize))
    }

    /// Iterates the kept draw calls in filtered order.
    pub fn iter(&self) -> impl Iterator<Item = &'a DrawCall> + '_ {
        self.indices
            .iter()
            .filter_map(|&list_index| self.list.get(list_index as usize))
    }
}

#[cfg(test)]
mod tests {
    use glam::Mat4;

    use crate::draw::GeometryId;

    use super::*;

    #[test]
    fn filter_keeps_main_list_order() {
        let mut list = DrawList::new();
        for material in [2u32, 0, 1, 2, 0] {
            list.add_draw_call(GeometryId(material), material, Mat4::IDENTITY);
        }

        let mut view = PassDrawList::new(&list, "opaque");
        view.build_for_pass(|material, pass| {
            assert_eq!(pass, "opaque");
            material != 1
        });

        assert_eq!(view.len(), 4);
        assert_eq!(view.indices(), &[0, 1, 3, 4]);
        let materials: Vec<u32> = view.iter().map(|c| c.material_id).collect();
        assert_eq!(materials, [2, 0, 2, 0]);
    }

    #[test]
    fn pass_name_is_clamped() {
        let list = DrawList::new();
        let long = "p".repeat(100);
        let view = PassDrawList::new(&list, &long);
        assert_eq!(view.pass_name().len(), 63);
    }
}
