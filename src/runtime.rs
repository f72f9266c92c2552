use crate::exceptions::RefResult;
use crate::heap::{Heap, HeapData, HeapId};
use crate::resource::{LimitedTracker, NoLimitTracker, ResourceLimits, ResourceTracker};
use crate::value::Ref;
use crate::values::{PyTrait, Str};

/// The object runtime every mutation operation goes through.
///
/// Constructed once and passed by `&mut` to whoever drives it (usually the
/// verification harness). It owns the heap, so every count change is an ordinary
/// `&mut self` method call and mutation is serialized by the borrow checker.
///
/// The refcount primitives (`new_str`, `incref`, `decref`, `refcount`) live here;
/// the container operations are added by the `mutation` modules.
#[derive(Debug)]
pub struct Runtime<T: ResourceTracker = NoLimitTracker> {
    pub(crate) heap: Heap<T>,
    /// Counter making probe payloads unique across the runtime's lifetime.
    probe_count: u64,
}

impl Runtime<NoLimitTracker> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_tracker(NoLimitTracker)
    }
}

impl Default for Runtime<NoLimitTracker> {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime<LimitedTracker> {
    #[must_use]
    pub fn with_limits(limits: ResourceLimits) -> Self {
        Self::with_tracker(LimitedTracker::new(limits))
    }
}

impl<T: ResourceTracker> Runtime<T> {
    pub fn with_tracker(tracker: T) -> Self {
        Self {
            heap: Heap::new(64, tracker),
            probe_count: 0,
        }
    }

    #[must_use]
    pub fn heap(&self) -> &Heap<T> {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap<T> {
        &mut self.heap
    }

    /// Creates a string object with a refcount of 1.
    pub fn new_str(&mut self, s: impl Into<String>) -> RefResult<Ref> {
        Ok(self.heap.allocate(HeapData::Str(Str::new(s.into())))?)
    }

    /// Creates a probe: a fresh, unique string with a refcount of 1.
    ///
    /// The payload is `"{label}-{n}"` where `n` increases with every probe, so
    /// two probes never compare equal as dict keys or set members.
    pub fn new_probe(&mut self, label: &str) -> RefResult<Ref> {
        let n = self.probe_count;
        self.probe_count += 1;
        self.new_str(format!("{label}-{n}"))
    }

    /// Increments the count of `r` and returns the new reference.
    #[must_use]
    pub fn incref(&mut self, r: &Ref) -> Ref {
        r.clone_with_heap(&mut self.heap)
    }

    /// Releases `r`, freeing the object if this was the last reference.
    pub fn decref(&mut self, r: Ref) {
        r.drop_with_heap(&mut self.heap);
    }

    /// Releases a count that no `Ref` stands for, such as the occupant an
    /// unchecked set overwrote.
    ///
    /// # Panics
    /// Panics if `id` has already been freed.
    pub fn decref_id(&mut self, id: HeapId) {
        self.heap.dec_ref(id);
    }

    /// Creates a strong reference from a borrowed id, e.g. one returned by `tuple_get_item`.
    ///
    /// # Panics
    /// Panics if `id` has already been freed.
    #[must_use]
    pub fn new_ref(&mut self, id: HeapId) -> Ref {
        self.heap.inc_ref(id);
        Ref::from_counted(id)
    }

    #[must_use]
    pub fn refcount(&self, r: &Ref) -> usize {
        self.heap.get_refcount(r.id())
    }

    /// Refcount of an object known only by id.
    ///
    /// # Panics
    /// Panics if `id` has already been freed; check `is_live` first when unsure.
    #[must_use]
    pub fn refcount_of(&self, id: HeapId) -> usize {
        self.heap.get_refcount(id)
    }

    #[must_use]
    pub fn is_live(&self, id: HeapId) -> bool {
        self.heap.is_live(id)
    }

    /// Number of objects that have not been freed.
    #[must_use]
    pub fn live_objects(&self) -> usize {
        self.heap.entry_count()
    }

    #[must_use]
    pub fn type_name(&self, r: &Ref) -> &'static str {
        self.heap.get(r.id()).py_type()
    }

    /// Length of a container, or character count of a string.
    #[must_use]
    pub fn len(&self, r: &Ref) -> usize {
        self.heap.get(r.id()).py_len()
    }

    /// True when a container has no items or a string is empty.
    #[must_use]
    pub fn is_empty(&self, r: &Ref) -> bool {
        self.len(r) == 0
    }

    /// The text of a string object, `None` for any other type.
    #[must_use]
    pub fn str_value(&self, id: HeapId) -> Option<&str> {
        match self.heap.get(id) {
            HeapData::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn repr(&self, r: &Ref) -> String {
        self.heap.repr(r.id())
    }
}
