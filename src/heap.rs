use std::collections::hash_map::DefaultHasher;
use std::fmt::Write;
use std::hash::{Hash, Hasher};

use ahash::AHashSet;

use crate::resource::{NoLimitTracker, ResourceError, ResourceTracker};
use crate::value::Ref;
use crate::values::{Dict, List, PyTrait, Set, Str, Tuple};

/// Unique identifier for values stored inside the heap arena.
pub type HeapId = usize;

/// HeapData captures every payload that can live in the arena.
///
/// Each variant wraps a type implementing `PyTrait`; the trait is implemented
/// here by matching on the variant and delegating.
#[derive(Debug)]
pub enum HeapData {
    Str(Str),
    Tuple(Tuple),
    List(List),
    Dict(Dict),
    Set(Set),
}

impl PyTrait for HeapData {
    fn py_type(&self) -> &'static str {
        match self {
            Self::Str(s) => s.py_type(),
            Self::Tuple(t) => t.py_type(),
            Self::List(l) => l.py_type(),
            Self::Dict(d) => d.py_type(),
            Self::Set(s) => s.py_type(),
        }
    }

    fn py_estimate_size(&self) -> usize {
        match self {
            Self::Str(s) => s.py_estimate_size(),
            Self::Tuple(t) => t.py_estimate_size(),
            Self::List(l) => l.py_estimate_size(),
            Self::Dict(d) => d.py_estimate_size(),
            Self::Set(s) => s.py_estimate_size(),
        }
    }

    fn py_len(&self) -> usize {
        match self {
            Self::Str(s) => s.py_len(),
            Self::Tuple(t) => t.py_len(),
            Self::List(l) => l.py_len(),
            Self::Dict(d) => d.py_len(),
            Self::Set(s) => s.py_len(),
        }
    }

    fn py_dec_ref_ids(&mut self, stack: &mut Vec<HeapId>) {
        match self {
            Self::Str(s) => s.py_dec_ref_ids(stack),
            Self::Tuple(t) => t.py_dec_ref_ids(stack),
            Self::List(l) => l.py_dec_ref_ids(stack),
            Self::Dict(d) => d.py_dec_ref_ids(stack),
            Self::Set(s) => s.py_dec_ref_ids(stack),
        }
    }

    fn py_repr_fmt<W: Write, T: ResourceTracker>(
        &self,
        f: &mut W,
        heap: &Heap<T>,
        heap_ids: &mut AHashSet<HeapId>,
    ) -> std::fmt::Result {
        match self {
            Self::Str(s) => s.py_repr_fmt(f, heap, heap_ids),
            Self::Tuple(t) => t.py_repr_fmt(f, heap, heap_ids),
            Self::List(l) => l.py_repr_fmt(f, heap, heap_ids),
            Self::Dict(d) => d.py_repr_fmt(f, heap, heap_ids),
            Self::Set(s) => s.py_repr_fmt(f, heap, heap_ids),
        }
    }
}

/// A single entry inside the heap arena, storing refcount and payload.
///
/// The `data` field is an Option to support temporary borrowing: `with_entry_mut`
/// takes the data out (leaving `None`), passes `&mut Heap` to the closure, then
/// restores the data. This keeps `refcount` reachable for `inc_ref`/`dec_ref`
/// while a container is being mutated, e.g. when a list is appended to itself.
#[derive(Debug)]
struct HeapValue {
    refcount: usize,
    /// The payload data. Temporarily `None` while borrowed via `with_entry_mut`.
    data: Option<HeapData>,
}

/// Reference-counted arena that backs every object.
///
/// Uses a free list to reuse slots from freed values. When a value is freed via
/// `dec_ref`, its slot ID is added to the free list; new allocations pop from the
/// free list when available, otherwise append.
///
/// Generic over `T: ResourceTracker` to support different resource tracking strategies.
/// With `NoLimitTracker` (the default) all resource checks compile away to no-ops.
#[derive(Debug)]
pub struct Heap<T: ResourceTracker = NoLimitTracker> {
    entries: Vec<Option<HeapValue>>,
    /// IDs of freed slots available for reuse. Populated by `dec_ref`, consumed by `allocate`.
    free_list: Vec<HeapId>,
    tracker: T,
}

macro_rules! take_data {
    ($self:ident, $id:expr, $func_name:literal) => {
        $self
            .entries
            .get_mut($id)
            .expect(concat!("Heap::", $func_name, ": slot missing"))
            .as_mut()
            .expect(concat!("Heap::", $func_name, ": object already freed"))
            .data
            .take()
            .expect(concat!("Heap::", $func_name, ": data already borrowed"))
    };
}

macro_rules! restore_data {
    ($self:ident, $id:expr, $new_data:expr, $func_name:literal) => {{
        let entry = $self
            .entries
            .get_mut($id)
            .expect(concat!("Heap::", $func_name, ": slot missing"))
            .as_mut()
            .expect(concat!("Heap::", $func_name, ": object already freed"));
        entry.data = Some($new_data);
    }};
}

impl Default for Heap<NoLimitTracker> {
    fn default() -> Self {
        Self::new(0, NoLimitTracker)
    }
}

impl<T: ResourceTracker> Heap<T> {
    pub fn new(capacity: usize, tracker: T) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            tracker,
        }
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut T {
        &mut self.tracker
    }

    /// Allocates a new heap entry with a refcount of 1 and returns the caller's reference to it.
    ///
    /// Returns `Err(ResourceError)` if allocation would exceed configured limits;
    /// in that case `data` is dropped together with any references it owns.
    pub fn allocate(&mut self, data: HeapData) -> Result<Ref, ResourceError> {
        if let Err(err) = self.tracker.on_allocate(|| data.py_estimate_size()) {
            self.release_children(data);
            return Err(err);
        }

        let kind = data.py_type();
        let new_entry = HeapValue {
            refcount: 1,
            data: Some(data),
        };

        let id = if let Some(id) = self.free_list.pop() {
            self.entries[id] = Some(new_entry);
            id
        } else {
            let id = self.entries.len();
            self.entries.push(Some(new_entry));
            id
        };
        tracing::trace!(id, kind, "allocate");

        Ok(Ref::from_counted(id))
    }

    /// Increments the reference count for an existing heap entry.
    ///
    /// # Panics
    /// Panics if the value ID is invalid or the value has already been freed.
    pub fn inc_ref(&mut self, id: HeapId) {
        let value = self
            .entries
            .get_mut(id)
            .expect("Heap::inc_ref: slot missing")
            .as_mut()
            .expect("Heap::inc_ref: object already freed");
        value.refcount += 1;
        tracing::trace!(id, refcount = value.refcount, "inc_ref");
    }

    /// Decrements the reference count and frees the value (plus children) once it hits zero.
    ///
    /// When a value is freed, its slot ID is added to the free list and every
    /// reference it owned is queued for decrementing. The queue is drained in a
    /// loop, so freeing a deeply nested structure does not grow the call stack.
    ///
    /// # Panics
    /// Panics if the value ID is invalid or the value has already been freed.
    pub fn dec_ref(&mut self, id: HeapId) {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            let slot = self.entries.get_mut(id).expect("Heap::dec_ref: slot missing");
            let entry = slot.as_mut().expect("Heap::dec_ref: object already freed");
            if entry.refcount > 1 {
                entry.refcount -= 1;
                tracing::trace!(id, refcount = entry.refcount, "dec_ref");
            } else if let Some(value) = slot.take() {
                self.free_list.push(id);
                tracing::trace!(id, "free");
                if let Some(mut data) = value.data {
                    self.tracker.on_free(|| data.py_estimate_size());
                    data.py_dec_ref_ids(&mut pending);
                }
            }
        }
    }

    /// Decrements every reference owned by `data`, then drops it.
    fn release_children(&mut self, mut data: HeapData) {
        let mut child_ids = Vec::new();
        data.py_dec_ref_ids(&mut child_ids);
        drop(data);
        for child_id in child_ids {
            self.dec_ref(child_id);
        }
    }

    /// Returns an immutable reference to the heap data stored at the given ID.
    ///
    /// # Panics
    /// Panics if the value ID is invalid, the value has already been freed,
    /// or the data is currently borrowed via `with_entry_mut`.
    #[must_use]
    pub fn get(&self, id: HeapId) -> &HeapData {
        self.entries
            .get(id)
            .expect("Heap::get: slot missing")
            .as_ref()
            .expect("Heap::get: object already freed")
            .data
            .as_ref()
            .expect("Heap::get: data currently borrowed")
    }

    /// Returns a mutable reference to the heap data stored at the given ID.
    ///
    /// # Panics
    /// Same conditions as `get`.
    pub fn get_mut(&mut self, id: HeapId) -> &mut HeapData {
        self.entries
            .get_mut(id)
            .expect("Heap::get_mut: slot missing")
            .as_mut()
            .expect("Heap::get_mut: object already freed")
            .data
            .as_mut()
            .expect("Heap::get_mut: data currently borrowed")
    }

    /// Gives mutable access to a heap entry while allowing reentrant heap usage
    /// inside the closure (e.g. to adjust refcounts or compare keys).
    ///
    /// The data is temporarily taken from the heap entry and automatically
    /// restored after the closure completes. Inside the closure the entry's own
    /// data is unavailable through `get`, but its refcount can still be changed.
    pub fn with_entry_mut<F, R>(&mut self, id: HeapId, f: F) -> R
    where
        F: FnOnce(&mut Heap<T>, &mut HeapData) -> R,
    {
        let mut data = take_data!(self, id, "with_entry_mut");

        let result = f(self, &mut data);

        restore_data!(self, id, data, "with_entry_mut");
        result
    }

    /// Returns the reference count for the heap entry at the given ID.
    ///
    /// # Panics
    /// Panics if the value ID is invalid or the value has already been freed.
    #[must_use]
    pub fn get_refcount(&self, id: HeapId) -> usize {
        self.entries
            .get(id)
            .expect("Heap::get_refcount: slot missing")
            .as_ref()
            .expect("Heap::get_refcount: object already freed")
            .refcount
    }

    /// Returns true if `id` names an entry that has not been freed.
    #[must_use]
    pub fn is_live(&self, id: HeapId) -> bool {
        matches!(self.entries.get(id), Some(Some(_)))
    }

    /// Returns the number of live (non-freed) values on the heap.
    ///
    /// Used by the harness to detect objects a scenario failed to release.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.iter().filter(|o| o.is_some()).count()
    }

    /// Removes all values, used to reset a heap between independent runs.
    pub fn clear(&mut self) {
        // forget the Refs held by containers so `dec-ref-check` doesn't trip on drop
        let mut dummy_stack = Vec::new();
        for value in self.entries.iter_mut().flatten() {
            if let Some(data) = &mut value.data {
                data.py_dec_ref_ids(&mut dummy_stack);
            }
        }
        self.entries.clear();
        self.free_list.clear();
    }

    /// Data at `id`, or `None` when it is freed or taken out by `with_entry_mut`.
    fn try_get(&self, id: HeapId) -> Option<&HeapData> {
        self.entries.get(id)?.as_ref()?.data.as_ref()
    }

    /// Computes the hash of the object at `id`.
    ///
    /// Returns `Some(hash)` for strings and for tuples whose slots are all occupied
    /// by hashable objects, `None` for everything else (lists, dicts, sets). A tuple
    /// that contains itself is unhashable.
    #[must_use]
    pub fn py_hash(&self, id: HeapId) -> Option<u64> {
        self.py_hash_guarded(id, &mut AHashSet::new())
    }

    fn py_hash_guarded(&self, id: HeapId, visiting: &mut AHashSet<HeapId>) -> Option<u64> {
        let mut hasher = DefaultHasher::new();
        match self.try_get(id)? {
            HeapData::Str(s) => s.as_str().hash(&mut hasher),
            HeapData::Tuple(t) => {
                if !visiting.insert(id) {
                    return None;
                }
                t.len().hash(&mut hasher);
                for slot in t.slots() {
                    self.py_hash_guarded(slot.as_ref()?.id(), visiting)?.hash(&mut hasher);
                }
                visiting.remove(&id);
            }
            HeapData::List(_) | HeapData::Dict(_) | HeapData::Set(_) => return None,
        }
        Some(hasher.finish())
    }

    /// Compares two objects for equality the way dict keys and set members are compared.
    ///
    /// Identity implies equality; otherwise strings compare by content and tuples
    /// element-wise. Any other pair of distinct objects is unequal, as is a pair
    /// reached again while comparing itself, or an object whose data is taken
    /// out by `with_entry_mut`.
    #[must_use]
    pub fn py_eq(&self, left: HeapId, right: HeapId) -> bool {
        self.py_eq_guarded(left, right, &mut AHashSet::new())
    }

    fn py_eq_guarded(&self, left: HeapId, right: HeapId, visiting: &mut AHashSet<(HeapId, HeapId)>) -> bool {
        if left == right {
            return true;
        }
        let (Some(left_data), Some(right_data)) = (self.try_get(left), self.try_get(right)) else {
            return false;
        };
        match (left_data, right_data) {
            (HeapData::Str(a), HeapData::Str(b)) => a == b,
            (HeapData::Tuple(a), HeapData::Tuple(b)) => {
                if a.len() != b.len() || !visiting.insert((left, right)) {
                    return false;
                }
                let equal = a.slots().iter().zip(b.slots()).all(|pair| match pair {
                    (Some(x), Some(y)) => self.py_eq_guarded(x.id(), y.id(), visiting),
                    (None, None) => true,
                    _ => false,
                });
                visiting.remove(&(left, right));
                equal
            }
            _ => false,
        }
    }

    /// Writes the repr of the object at `id`, printing `...` for containers already
    /// being formatted higher up the stack.
    pub fn repr_fmt<W: Write>(&self, id: HeapId, f: &mut W, heap_ids: &mut AHashSet<HeapId>) -> std::fmt::Result {
        let data = self.get(id);
        if matches!(data, HeapData::Str(_)) {
            return data.py_repr_fmt(f, self, heap_ids);
        }
        if !heap_ids.insert(id) {
            return match data {
                HeapData::List(_) => f.write_str("[...]"),
                HeapData::Tuple(_) => f.write_str("(...)"),
                _ => f.write_str("{...}"),
            };
        }
        let result = data.py_repr_fmt(f, self, heap_ids);
        heap_ids.remove(&id);
        result
    }

    /// Returns the repr of the object at `id`.
    #[must_use]
    pub fn repr(&self, id: HeapId) -> String {
        let mut s = String::new();
        // writing to a String cannot fail
        let _ = self.repr_fmt(id, &mut s, &mut AHashSet::new());
        s
    }
}

/// Forgets every contained `Ref` before dropping so the `dec-ref-check` feature
/// does not panic when a heap with live containers goes out of scope.
#[cfg(feature = "dec-ref-check")]
impl<T: ResourceTracker> Drop for Heap<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freed_slots_are_reused() {
        let mut heap: Heap = Heap::default();
        let a = heap.allocate(HeapData::Str("a".into())).unwrap();
        let a_id = a.id();
        a.drop_with_heap(&mut heap);
        assert!(!heap.is_live(a_id));
        let b = heap.allocate(HeapData::Str("b".into())).unwrap();
        assert_eq!(b.id(), a_id);
        assert_eq!(heap.get_refcount(b.id()), 1);
        b.drop_with_heap(&mut heap);
        assert_eq!(heap.entry_count(), 0);
    }

    #[test]
    fn freeing_a_container_releases_children() {
        let mut heap: Heap = Heap::default();
        let item = heap.allocate(HeapData::Str("item".into())).unwrap();
        let keep = item.clone_with_heap(&mut heap);
        let tuple = heap.allocate(HeapData::Tuple(Tuple::from_refs(vec![item]))).unwrap();
        assert_eq!(heap.get_refcount(keep.id()), 2);
        tuple.drop_with_heap(&mut heap);
        assert_eq!(heap.get_refcount(keep.id()), 1);
        keep.drop_with_heap(&mut heap);
        assert_eq!(heap.entry_count(), 0);
    }

    #[test]
    fn hash_and_eq() {
        let mut heap: Heap = Heap::default();
        let a = heap.allocate(HeapData::Str("k".into())).unwrap();
        let b = heap.allocate(HeapData::Str("k".into())).unwrap();
        let list = heap.allocate(HeapData::List(List::default())).unwrap();
        assert_eq!(heap.py_hash(a.id()), heap.py_hash(b.id()));
        assert!(heap.py_eq(a.id(), b.id()));
        assert_eq!(heap.py_hash(list.id()), None);
        assert!(!heap.py_eq(a.id(), list.id()));

        let half = heap.allocate(HeapData::Tuple(Tuple::with_len(1))).unwrap();
        assert_eq!(heap.py_hash(half.id()), None);

        for r in [a, b, list, half] {
            r.drop_with_heap(&mut heap);
        }
    }

    #[test]
    fn cyclic_tuples_are_unhashable_and_unequal() {
        let mut heap: Heap = Heap::default();
        let left = heap.allocate(HeapData::Tuple(Tuple::with_len(1))).unwrap();
        let right = heap.allocate(HeapData::Tuple(Tuple::with_len(1))).unwrap();
        for t in [&left, &right] {
            let inner = t.clone_with_heap(&mut heap);
            if let HeapData::Tuple(tuple) = heap.get_mut(t.id()) {
                let _ = tuple.replace(0, Some(inner));
            }
        }
        assert_eq!(heap.py_hash(left.id()), None);
        assert!(!heap.py_eq(left.id(), right.id()));
        assert!(heap.py_eq(left.id(), left.id()));
        heap.clear();
        let _ = left.leak();
        let _ = right.leak();
    }

    #[test]
    fn repr_of_self_referencing_list() {
        let mut heap: Heap = Heap::default();
        let list = heap.allocate(HeapData::List(List::default())).unwrap();
        let inner = list.clone_with_heap(&mut heap);
        heap.with_entry_mut(list.id(), |_, data| {
            if let HeapData::List(l) = data {
                l.append(inner);
            }
        });
        assert_eq!(heap.repr(list.id()), "[[...]]");
        heap.clear();
        let _ = list.leak();
    }
}
