use std::fmt::Write;

use ahash::AHashSet;
use indexmap::IndexMap;

use crate::heap::{Heap, HeapId};
use crate::resource::ResourceTracker;
use crate::value::Ref;
use crate::values::PyTrait;

/// Python dict type, wrapping an IndexMap to preserve insertion order.
///
/// # Storage Strategy
/// Uses `IndexMap<u64, Vec<(Ref, Ref)>>` where the map key is the hash of the dict
/// key. The Vec handles hash collisions by storing every `(key, value)` pair with
/// the same hash, compared with `Heap::py_eq`.
///
/// # Reference Counting
/// The dict owns one reference to each key and one to each value. The methods here
/// only move `Ref`s in and out; the borrow semantics of `Runtime::dict_set_item`
/// (increment on insert) live at the runtime layer. Callers pass the key hash,
/// computed with `Heap::py_hash` before the dict was taken out of the heap.
#[derive(Debug, Default)]
pub struct Dict {
    map: IndexMap<u64, Vec<(Ref, Ref)>>,
}

impl Dict {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of key/value pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates over `(key, value)` pairs in insertion order of their hash bucket.
    pub fn iter(&self) -> impl Iterator<Item = (&Ref, &Ref)> {
        self.map.values().flatten().map(|(k, v)| (k, v))
    }

    /// Returns the value stored for `key`, without touching any refcount.
    pub fn get<T: ResourceTracker>(&self, hash: u64, key: HeapId, heap: &Heap<T>) -> Option<&Ref> {
        self.map
            .get(&hash)?
            .iter()
            .find(|(k, _)| heap.py_eq(k.id(), key))
            .map(|(_, v)| v)
    }

    /// Replaces the value stored for an existing `key` and returns the previous value.
    ///
    /// Returns `Err(value)` when the key is absent, handing the value back untouched.
    /// The stored key object is kept, matching Python where an equal key never
    /// replaces the original.
    pub(crate) fn replace_value<T: ResourceTracker>(
        &mut self,
        hash: u64,
        key: HeapId,
        value: Ref,
        heap: &Heap<T>,
    ) -> Result<Ref, Ref> {
        let Some(bucket) = self.map.get_mut(&hash) else {
            return Err(value);
        };
        match bucket.iter_mut().find(|(k, _)| heap.py_eq(k.id(), key)) {
            Some((_, v)) => Ok(std::mem::replace(v, value)),
            None => Err(value),
        }
    }

    /// Adds a pair whose key is known to be absent.
    pub(crate) fn push_new(&mut self, hash: u64, key: Ref, value: Ref) {
        self.map.entry(hash).or_default().push((key, value));
    }

    /// Removes `key` and returns the owned `(key, value)` pair.
    pub(crate) fn remove<T: ResourceTracker>(&mut self, hash: u64, key: HeapId, heap: &Heap<T>) -> Option<(Ref, Ref)> {
        let bucket = self.map.get_mut(&hash)?;
        let position = bucket.iter().position(|(k, _)| heap.py_eq(k.id(), key))?;
        let pair = bucket.remove(position);
        if bucket.is_empty() {
            self.map.shift_remove(&hash);
        }
        Some(pair)
    }
}

impl PyTrait for Dict {
    fn py_type(&self) -> &'static str {
        "dict"
    }

    fn py_estimate_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.len() * (std::mem::size_of::<u64>() + 2 * std::mem::size_of::<Ref>())
    }

    fn py_len(&self) -> usize {
        self.len()
    }

    fn py_dec_ref_ids(&mut self, stack: &mut Vec<HeapId>) {
        for (_, bucket) in self.map.drain(..) {
            for (k, v) in bucket {
                stack.push(k.leak());
                stack.push(v.leak());
            }
        }
    }

    fn py_repr_fmt<W: Write, T: ResourceTracker>(
        &self,
        f: &mut W,
        heap: &Heap<T>,
        heap_ids: &mut AHashSet<HeapId>,
    ) -> std::fmt::Result {
        f.write_char('{')?;
        let mut first = true;
        for (k, v) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            heap.repr_fmt(k.id(), f, heap_ids)?;
            f.write_str(": ")?;
            heap.repr_fmt(v.id(), f, heap_ids)?;
        }
        f.write_char('}')
    }
}
