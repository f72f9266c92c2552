use std::fmt::Write;

use ahash::AHashSet;
use indexmap::IndexMap;

use crate::heap::{Heap, HeapId};
use crate::resource::ResourceTracker;
use crate::value::Ref;
use crate::values::PyTrait;

/// Python set type: unique hashable members, no associated values.
///
/// Same bucket layout as `Dict`, keyed by member hash, with each bucket holding
/// the members that share a hash. The set owns one reference per member.
#[derive(Debug, Default)]
pub struct Set {
    map: IndexMap<u64, Vec<Ref>>,
}

impl Set {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ref> {
        self.map.values().flatten()
    }

    #[must_use]
    pub fn contains<T: ResourceTracker>(&self, hash: u64, member: HeapId, heap: &Heap<T>) -> bool {
        self.map
            .get(&hash)
            .is_some_and(|bucket| bucket.iter().any(|m| heap.py_eq(m.id(), member)))
    }

    /// Adds a member known to be absent.
    pub(crate) fn push_new(&mut self, hash: u64, member: Ref) {
        self.map.entry(hash).or_default().push(member);
    }

    /// Removes the member equal to `member` and returns the set's reference to it.
    pub(crate) fn remove<T: ResourceTracker>(&mut self, hash: u64, member: HeapId, heap: &Heap<T>) -> Option<Ref> {
        let bucket = self.map.get_mut(&hash)?;
        let position = bucket.iter().position(|m| heap.py_eq(m.id(), member))?;
        let removed = bucket.remove(position);
        if bucket.is_empty() {
            self.map.shift_remove(&hash);
        }
        Some(removed)
    }

    /// Removes the most recently added bucket's last member.
    pub(crate) fn pop(&mut self) -> Option<Ref> {
        let (hash, bucket) = self.map.last_mut()?;
        let hash = *hash;
        let member = bucket.pop();
        if bucket.is_empty() {
            self.map.shift_remove(&hash);
        }
        member
    }
}

impl PyTrait for Set {
    fn py_type(&self) -> &'static str {
        "set"
    }

    fn py_estimate_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.len() * (std::mem::size_of::<u64>() + std::mem::size_of::<Ref>())
    }

    fn py_len(&self) -> usize {
        self.len()
    }

    fn py_dec_ref_ids(&mut self, stack: &mut Vec<HeapId>) {
        for (_, bucket) in self.map.drain(..) {
            stack.extend(bucket.into_iter().map(Ref::leak));
        }
    }

    fn py_repr_fmt<W: Write, T: ResourceTracker>(
        &self,
        f: &mut W,
        heap: &Heap<T>,
        heap_ids: &mut AHashSet<HeapId>,
    ) -> std::fmt::Result {
        if self.is_empty() {
            return f.write_str("set()");
        }
        f.write_char('{')?;
        let mut first = true;
        for member in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            heap.repr_fmt(member.id(), f, heap_ids)?;
        }
        f.write_char('}')
    }
}
