use crate::heap::{Heap, HeapId};
use crate::resource::ResourceTracker;

/// An owned, counted reference to a heap object.
///
/// A `Ref` stands for exactly one unit of an object's refcount. Operations that
/// steal a reference take a `Ref` by value; operations that borrow take `&Ref`
/// and increment the count themselves. The compiler therefore rejects passing a
/// reference to a stealing operation and then releasing it again.
///
/// NOTE: `Clone` is intentionally NOT derived. Use `clone_with_heap()`, which
/// increments the refcount, and `drop_with_heap()`, which decrements it. A plain
/// drop forgets the reference and leaks its count.
#[derive(Debug)]
pub struct Ref(HeapId);

impl Ref {
    /// Wraps a reference whose count has already been accounted for by the heap.
    pub(crate) fn from_counted(id: HeapId) -> Self {
        Self(id)
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(id: HeapId) -> Self {
        Self(id)
    }

    /// The heap id this reference points at.
    #[must_use]
    pub fn id(&self) -> HeapId {
        self.0
    }

    /// Returns true when both references point at the same object.
    #[must_use]
    pub fn is(&self, other: &Self) -> bool {
        self.0 == other.0
    }

    /// Creates a new counted reference to the same object (an explicit incref).
    #[must_use]
    pub fn clone_with_heap<T: ResourceTracker>(&self, heap: &mut Heap<T>) -> Self {
        heap.inc_ref(self.0);
        Self(self.0)
    }

    /// Releases this reference (an explicit decref), freeing the object when
    /// the count reaches zero.
    pub fn drop_with_heap<T: ResourceTracker>(self, heap: &mut Heap<T>) {
        let id = self.leak();
        heap.dec_ref(id);
    }

    /// Gives up the token without touching the count.
    ///
    /// The count this reference stood for stays on the object with no owner; it can
    /// only be reclaimed with `Heap::dec_ref(id)`.
    #[must_use = "the returned id is the only way left to release the reference"]
    pub fn leak(self) -> HeapId {
        let id = self.0;
        std::mem::forget(self);
        id
    }
}

/// Panics if a `Ref` is dropped without calling `drop_with_heap` or `leak`.
/// Only enabled when the `dec-ref-check` feature is active.
#[cfg(feature = "dec-ref-check")]
impl Drop for Ref {
    fn drop(&mut self) {
        panic!(
            "Ref({}) dropped without calling drop_with_heap() - this is a reference counting bug",
            self.0
        );
    }
}
