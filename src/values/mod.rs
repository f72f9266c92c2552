//! Container and payload types stored on the heap.
//!
//! This module contains the slot models wrapped by `HeapData`: fixed-size tuples,
//! growable lists, dicts and sets keyed by hashable objects, and strings (the
//! payload probe objects carry).
//!
//! The `PyTrait` trait provides the common interface the heap dispatches to.
use std::fmt::Write;

use ahash::AHashSet;

use crate::heap::{Heap, HeapId};
use crate::resource::ResourceTracker;
use crate::value::Ref;

pub mod dict;
pub mod list;
pub mod set;
pub mod str;
pub mod tuple;

pub use dict::Dict;
pub use list::List;
pub use set::Set;
pub use str::Str;
pub use tuple::Tuple;

/// Common operations implemented by every heap-allocated type.
pub trait PyTrait {
    /// Returns the Python type name, used in error messages and repr.
    fn py_type(&self) -> &'static str;

    /// Estimates the memory used by this value in bytes, reported to the resource tracker.
    fn py_estimate_size(&self) -> usize;

    /// Returns the number of items (or characters for strings).
    fn py_len(&self) -> usize;

    /// Moves every owned reference out of this value and pushes its id onto `stack`.
    ///
    /// Called when the value is freed so the heap can decrement the children.
    /// Afterwards the value owns nothing.
    fn py_dec_ref_ids(&mut self, stack: &mut Vec<HeapId>);

    /// Writes the Python repr of this value.
    ///
    /// `heap_ids` holds the containers currently being formatted, so self-referencing
    /// containers print `...` instead of recursing forever.
    fn py_repr_fmt<W: Write, T: ResourceTracker>(
        &self,
        f: &mut W,
        heap: &Heap<T>,
        heap_ids: &mut AHashSet<HeapId>,
    ) -> std::fmt::Result;
}

/// Converts a signed index into a slot position, or `None` when it falls outside `[0, len)`.
pub(crate) fn checked_index(index: isize, len: usize) -> Option<usize> {
    usize::try_from(index).ok().filter(|&i| i < len)
}

/// Drains every occupied slot into `stack`, leaving all slots empty.
pub(crate) fn dec_ref_slots(slots: &mut [Option<Ref>], stack: &mut Vec<HeapId>) {
    for slot in slots {
        if let Some(r) = slot.take() {
            stack.push(r.leak());
        }
    }
}

/// Writes `value` (or an empty slot) at `index` without a bounds check and
/// without releasing the previous occupant, whose count is leaked.
///
/// # Safety
/// `index` must be less than `slots.len()`.
pub(crate) unsafe fn install_unchecked(slots: &mut [Option<Ref>], index: usize, value: Option<Ref>) {
    debug_assert!(index < slots.len(), "install_unchecked: index {index} out of bounds");
    // SAFETY: the caller guarantees `index` is in bounds.
    let slot = unsafe { slots.get_unchecked_mut(index) };
    if let Some(old) = std::mem::replace(slot, value) {
        let leaked = old.leak();
        tracing::debug!(leaked, index, "unchecked set overwrote an occupied slot");
    }
}

/// Formats a sequence of slots with the given start and end characters.
///
/// Empty slots are written as `<NULL>`.
pub(crate) fn repr_sequence_fmt<W: Write, T: ResourceTracker>(
    start: char,
    end: char,
    slots: &[Option<Ref>],
    f: &mut W,
    heap: &Heap<T>,
    heap_ids: &mut AHashSet<HeapId>,
) -> std::fmt::Result {
    f.write_char(start)?;
    let mut first = true;
    for slot in slots {
        if !first {
            f.write_str(", ")?;
        }
        first = false;
        match slot {
            Some(r) => heap.repr_fmt(r.id(), f, heap_ids)?,
            None => f.write_str("<NULL>")?,
        }
    }
    // single element tuples need a trailing comma
    if start == '(' && slots.len() == 1 {
        f.write_char(',')?;
    }
    f.write_char(end)
}

#[cfg(test)]
mod tests {
    use super::checked_index;

    #[test]
    fn checked_index_bounds() {
        assert_eq!(checked_index(0, 3), Some(0));
        assert_eq!(checked_index(2, 3), Some(2));
        assert_eq!(checked_index(3, 3), None);
        assert_eq!(checked_index(-1, 3), None);
        assert_eq!(checked_index(0, 0), None);
    }
}
