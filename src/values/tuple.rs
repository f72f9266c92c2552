//! Python tuple type, a fixed-length run of slots.
use std::fmt::Write;

use ahash::AHashSet;

use crate::heap::{Heap, HeapId};
use crate::resource::ResourceTracker;
use crate::value::Ref;
use crate::values::{dec_ref_slots, install_unchecked, repr_sequence_fmt, PyTrait};

/// Python tuple value stored on the heap.
///
/// The length is fixed when the tuple is allocated. Each slot is either empty
/// or owns exactly one counted reference. Tuples are conceptually immutable once
/// published; slot mutation exists for populating freshly allocated tuples.
///
/// # Reference Counting
/// When a tuple is freed, every occupied slot has its refcount decremented via
/// `py_dec_ref_ids`.
#[derive(Debug, Default)]
pub struct Tuple(Vec<Option<Ref>>);

impl Tuple {
    /// Creates a tuple of `len` empty slots.
    #[must_use]
    pub fn with_len(len: usize) -> Self {
        Self(std::iter::repeat_with(|| None).take(len).collect())
    }

    /// Creates a tuple whose slots take ownership of `refs`.
    ///
    /// Note: This does NOT increment reference counts.
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

    /// Puts `value` into slot `index` and hands back the previous occupant.
    ///
    /// The caller decides what to do with the returned reference. Panics if out of bounds.
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

impl PyTrait for Tuple {
    fn py_type(&self) -> &'static str {
        "tuple"
    }

    fn py_estimate_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.0.len() * std::mem::size_of::<Option<Ref>>()
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
        repr_sequence_fmt('(', ')', &self.0, f, heap, heap_ids)
    }
}
