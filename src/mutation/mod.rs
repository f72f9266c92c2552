//! Container mutation operations, one module per container kind.
//!
//! Each module adds an `impl<T: ResourceTracker> Runtime<T>` block. The ownership
//! contract of every operation is visible in its signature:
//!
//! - a `Ref` taken by value is **stolen**: on success the container owns it and
//!   the caller's count is not incremented
//! - a `&Ref` is **borrowed**: the operation increments the count for the
//!   reference the container keeps, and the caller still owns its own
//!
//! Checked operations validate the target kind, index and hashability before
//! touching anything, so a failed call never leaves a partial mutation behind.

mod dict;
mod list;
mod set;
mod tuple;

pub use dict::SetDefault;

use crate::exceptions::{RefError, RefResult};
use crate::heap::{Heap, HeapData, HeapId};
use crate::resource::ResourceTracker;
use crate::runtime::Runtime;
use crate::value::Ref;
use crate::values::{Dict, PyTrait, Set};

impl<T: ResourceTracker> Runtime<T> {
    /// Hashes a dict key or set member, failing with `Unhashable` for lists, dicts and sets.
    pub(crate) fn hash_of(&self, r: &Ref) -> RefResult<u64> {
        self.heap
            .py_hash(r.id())
            .ok_or_else(|| RefError::unhashable(self.type_name(r)))
    }

    /// Fails with `TypeMismatch` unless `matches` accepts the object behind `target`.
    pub(crate) fn check_kind(
        &self,
        target: &Ref,
        func: &'static str,
        matches: impl FnOnce(&HeapData) -> bool,
    ) -> RefResult<()> {
        if matches(self.heap.get(target.id())) {
            Ok(())
        } else {
            Err(RefError::bad_internal_call(func))
        }
    }

    /// Runs `f` on the dict at `id` while the rest of the heap stays usable for key comparison.
    ///
    /// # Panics
    /// Panics if `id` is not a dict; callers validate the kind first.
    pub(crate) fn with_dict_mut<R>(&mut self, id: HeapId, f: impl FnOnce(&Heap<T>, &mut Dict) -> R) -> R {
        self.heap.with_entry_mut(id, |heap, data| match data {
            HeapData::Dict(dict) => f(heap, dict),
            other => panic!("with_dict_mut: expected dict, found {}", other.py_type()),
        })
    }

    /// Set counterpart of `with_dict_mut`.
    ///
    /// # Panics
    /// Panics if `id` is not a set.
    pub(crate) fn with_set_mut<R>(&mut self, id: HeapId, f: impl FnOnce(&Heap<T>, &mut Set) -> R) -> R {
        self.heap.with_entry_mut(id, |heap, data| match data {
            HeapData::Set(set) => f(heap, set),
            other => panic!("with_set_mut: expected set, found {}", other.py_type()),
        })
    }
}
