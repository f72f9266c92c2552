use std::fmt::Write;

use ahash::AHashSet;

use crate::heap::{Heap, HeapId};
use crate::resource::ResourceTracker;
use crate::value::Ref;
use crate::values::{dec_ref_slots, install_unchecked, repr_sequence_fmt, PyTrait};

/// Python list type, a growable run of slots.
///
/// `List::with_len` creates empty slots, the same shape a freshly allocated list
/// has before it is populated. `append` and `insert` grow the list.
///
/// # Reference Counting
/// Every method here takes ownership of the `Ref` it is given; any increment the
/// operation's contract requires is done by the caller before the call (see
/// `Runtime::list_append`). When a list is freed, every occupied slot is decremented.
#[derive(Debug, Default)]
pub struct List(Vec<Option<Ref>>);

impl List {
    #[must_use]
    pub fn with_len(len: usize) -> Self {
        Self(std::iter::repeat_with(|| None).take(len).collect())
    }

    /// Creates a list whose slots take ownership of `refs`.
    #[must_use]
    pub fn from_refs(refs: Vec<Ref>) -> Self {
        Self(refs.into_iter().map(Some).collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn slots(&self) -> &[Option<Ref>] {
        &self.0
    }

    /// Returns the id held in slot `index`, if any. Panics if out of bounds.
    #[must_use]
    pub fn slot_id(&self, index: usize) -> Option<HeapId> {
        self.0[index].as_ref().map(Ref::id)
    }

    /// Appends an element to the end of the list.
    pub(crate) fn append(&mut self, item: Ref) {
        self.0.push(Some(item));
    }

    /// Inserts an element before position `index`.
    ///
    /// Negative indexes count from the end and are clamped at zero, indexes past
    /// the end append, matching Python's `list.insert`.
    pub(crate) fn insert(&mut self, index: isize, item: Ref) {
        let len = self.0.len();
        let position = if index < 0 {
            len.saturating_sub(index.unsigned_abs())
        } else {
            index.unsigned_abs().min(len)
        };
        self.0.insert(position, Some(item));
    }

    /// Puts `value` into slot `index` and hands back the previous occupant.
    pub(crate) fn replace(&mut self, index: usize, value: Option<Ref>) -> Option<Ref> {
        std::mem::replace(&mut self.0[index], value)
    }

    /// # Safety
    /// `index` must be less than `self.len()`.
    pub(crate) unsafe fn install_unchecked(&mut self, index: usize, value: Option<Ref>) {
        // SAFETY: forwarded from the caller.
        unsafe { install_unchecked(&mut self.0, index, value) }
    }
}

impl PyTrait for List {
    fn py_type(&self) -> &'static str {
        "list"
    }

    fn py_estimate_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.0.capacity() * std::mem::size_of::<Option<Ref>>()
    }

    fn py_len(&self) -> usize {
        self.0.len()
    }

    fn py_dec_ref_ids(&mut self, stack: &mut Vec<HeapId>) {
        dec_ref_slots(&mut self.0, stack);
    }

    fn py_repr_fmt<W: Write, T: ResourceTracker>(
        &self,
        f: &mut W,
        heap: &Heap<T>,
        heap_ids: &mut AHashSet<HeapId>,
    ) -> std::fmt::Result {
        repr_sequence_fmt('[', ']', &self.0, f, heap, heap_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::List;
    use crate::value::Ref;

    fn ids(list: &List) -> Vec<Option<usize>> {
        (0..list.len()).map(|i| list.slot_id(i)).collect()
    }

    #[test]
    fn insert_positions() {
        let mut list = List::default();
        list.insert(4, Ref::new_for_test(10));
        list.insert(-1, Ref::new_for_test(11));
        list.insert(-100, Ref::new_for_test(12));
        list.insert(1, Ref::new_for_test(13));
        assert_eq!(ids(&list), vec![Some(12), Some(13), Some(11), Some(10)]);
        let mut stack = Vec::new();
        crate::values::PyTrait::py_dec_ref_ids(&mut list, &mut stack);
        assert_eq!(stack, vec![12, 13, 11, 10]);
    }
}
