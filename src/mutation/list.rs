use crate::exceptions::{RefError, RefResult, StealError};
use crate::heap::{HeapData, HeapId};
use crate::resource::ResourceTracker;
use crate::runtime::Runtime;
use crate::value::Ref;
use crate::values::{checked_index, List};

impl<T: ResourceTracker> Runtime<T> {
    /// Allocates a list of `len` empty slots.
    pub fn list_new(&mut self, len: usize) -> RefResult<Ref> {
        Ok(self.heap.allocate(HeapData::List(List::with_len(len)))?)
    }

    /// Steals `value` into slot `index`, releasing whatever the slot held before.
    ///
    /// # Errors
    /// `TypeMismatch` when `list` is not a list, `IndexOutOfRange` with
    /// `"list assignment index out of range"` otherwise. `value` is handed back
    /// untouched on failure.
    pub fn list_set_item(&mut self, list: &Ref, index: isize, value: Ref) -> Result<(), StealError> {
        let old = match self.heap.get_mut(list.id()) {
            HeapData::List(l) => match checked_index(index, l.len()) {
                Some(index) => l.replace(index, Some(value)),
                None => return Err(StealError::new(RefError::assignment_index_error("list"), value)),
            },
            _ => return Err(StealError::new(RefError::bad_internal_call("list_set_item"), value)),
        };
        tracing::debug!(list = list.id(), index, replaced = old.as_ref().map(Ref::id), "list_set_item");
        if let Some(old) = old {
            self.decref(old);
        }
        Ok(())
    }

    /// Steals `value` into slot `index` with no validation, leaking the previous occupant.
    ///
    /// # Safety
    /// `list` must be a list and `index` must lie in `[0, len)`.
    pub unsafe fn list_set_item_unchecked(&mut self, list: &Ref, index: isize, value: Ref) {
        // SAFETY: forwarded from the caller.
        unsafe { self.list_install_unchecked(list, index, Some(value)) }
    }

    /// Empties slot `index`, releasing its previous occupant.
    pub fn list_clear_item(&mut self, list: &Ref, index: isize) -> RefResult<()> {
        let old = match self.heap.get_mut(list.id()) {
            HeapData::List(l) => {
                let index = checked_index(index, l.len()).ok_or_else(|| RefError::assignment_index_error("list"))?;
                l.replace(index, None)
            }
            _ => return Err(RefError::bad_internal_call("list_clear_item")),
        };
        tracing::debug!(list = list.id(), index, released = old.as_ref().map(Ref::id), "list_clear_item");
        if let Some(old) = old {
            self.decref(old);
        }
        Ok(())
    }

    /// Empties slot `index` without validation, leaking its previous occupant.
    ///
    /// # Safety
    /// Same contract as `list_set_item_unchecked`.
    pub unsafe fn list_clear_item_unchecked(&mut self, list: &Ref, index: isize) {
        // SAFETY: forwarded from the caller.
        unsafe { self.list_install_unchecked(list, index, None) }
    }

    #[allow(clippy::cast_sign_loss)]
    unsafe fn list_install_unchecked(&mut self, list: &Ref, index: isize, value: Option<Ref>) {
        match self.heap.get_mut(list.id()) {
            // SAFETY: the caller guarantees `index` is in bounds.
            HeapData::List(l) => unsafe { l.install_unchecked(index as usize, value) },
            // SAFETY: the caller guarantees the target is a list.
            _ => unsafe { std::hint::unreachable_unchecked() },
        }
    }

    /// Appends a new reference to `value`, growing the list by one.
    pub fn list_append(&mut self, list: &Ref, value: &Ref) -> RefResult<()> {
        self.check_kind(list, "list_append", |data| matches!(data, HeapData::List(_)))?;
        let item = self.incref(value);
        tracing::debug!(list = list.id(), item = item.id(), "list_append");
        if let HeapData::List(l) = self.heap.get_mut(list.id()) {
            l.append(item);
        }
        Ok(())
    }

    /// Inserts a new reference to `value` before position `index`.
    ///
    /// Never fails on the index: a negative index counts from the end and stops
    /// at the front, an index past the end appends.
    pub fn list_insert(&mut self, list: &Ref, index: isize, value: &Ref) -> RefResult<()> {
        self.check_kind(list, "list_insert", |data| matches!(data, HeapData::List(_)))?;
        let item = self.incref(value);
        tracing::debug!(list = list.id(), index, item = item.id(), "list_insert");
        if let HeapData::List(l) = self.heap.get_mut(list.id()) {
            l.insert(index, item);
        }
        Ok(())
    }

    /// Builds a list holding a new reference to each of `values`.
    pub fn list_build(&mut self, values: &[&Ref]) -> RefResult<Ref> {
        let refs = values.iter().map(|v| self.incref(v)).collect();
        let list = self.heap.allocate(HeapData::List(List::from_refs(refs)))?;
        tracing::debug!(list = list.id(), "list_build");
        Ok(list)
    }

    /// Reads slot `index` without touching any count.
    pub fn list_get_item(&self, list: &Ref, index: isize) -> RefResult<Option<HeapId>> {
        match self.heap.get(list.id()) {
            HeapData::List(l) => {
                let index = checked_index(index, l.len()).ok_or_else(|| RefError::index_error("list"))?;
                Ok(l.slot_id(index))
            }
            _ => Err(RefError::bad_internal_call("list_get_item")),
        }
    }
}
