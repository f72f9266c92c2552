use crate::exceptions::{RefError, RefResult, StealError};
use crate::heap::{HeapData, HeapId};
use crate::resource::ResourceTracker;
use crate::runtime::Runtime;
use crate::value::Ref;
use crate::values::{checked_index, Tuple};

impl<T: ResourceTracker> Runtime<T> {
    /// Allocates a tuple of `len` empty slots.
    pub fn tuple_new(&mut self, len: usize) -> RefResult<Ref> {
        Ok(self.heap.allocate(HeapData::Tuple(Tuple::with_len(len)))?)
    }

    /// Steals `value` into slot `index`, releasing whatever the slot held before.
    ///
    /// The new reference is installed first and the old one released afterwards,
    /// so replacing a slot with the object it already holds is safe as long as
    /// the caller passed in a reference of its own.
    ///
    /// # Errors
    /// `TypeMismatch` when `tuple` is not a tuple, `IndexOutOfRange` when `index`
    /// is outside `[0, len)`. In both cases nothing is mutated and `value` comes
    /// back inside the `StealError` with its count unchanged.
    pub fn tuple_set_item(&mut self, tuple: &Ref, index: isize, value: Ref) -> Result<(), StealError> {
        let old = match self.heap.get_mut(tuple.id()) {
            HeapData::Tuple(t) => match checked_index(index, t.len()) {
                Some(index) => t.replace(index, Some(value)),
                None => return Err(StealError::new(RefError::assignment_index_error("tuple"), value)),
            },
            _ => return Err(StealError::new(RefError::bad_internal_call("tuple_set_item"), value)),
        };
        tracing::debug!(tuple = tuple.id(), index, replaced = old.as_ref().map(Ref::id), "tuple_set_item");
        if let Some(old) = old {
            self.decref(old);
        }
        Ok(())
    }

    /// Steals `value` into slot `index` with no validation and no release of the
    /// previous occupant, whose count is leaked.
    ///
    /// Meant for filling a freshly allocated tuple whose slots are still empty.
    ///
    /// # Safety
    /// `tuple` must be a tuple and `index` must lie in `[0, len)`. Anything else
    /// is undefined behaviour.
    pub unsafe fn tuple_set_item_unchecked(&mut self, tuple: &Ref, index: isize, value: Ref) {
        // SAFETY: forwarded from the caller.
        unsafe { self.tuple_install_unchecked(tuple, index, Some(value)) }
    }

    /// Empties slot `index`, releasing its previous occupant.
    ///
    /// # Errors
    /// Same validation as `tuple_set_item`.
    pub fn tuple_clear_item(&mut self, tuple: &Ref, index: isize) -> RefResult<()> {
        let old = match self.heap.get_mut(tuple.id()) {
            HeapData::Tuple(t) => {
                let index = checked_index(index, t.len()).ok_or_else(|| RefError::assignment_index_error("tuple"))?;
                t.replace(index, None)
            }
            _ => return Err(RefError::bad_internal_call("tuple_clear_item")),
        };
        tracing::debug!(tuple = tuple.id(), index, released = old.as_ref().map(Ref::id), "tuple_clear_item");
        if let Some(old) = old {
            self.decref(old);
        }
        Ok(())
    }

    /// Empties slot `index` without validation, leaking its previous occupant.
    ///
    /// # Safety
    /// Same contract as `tuple_set_item_unchecked`.
    pub unsafe fn tuple_clear_item_unchecked(&mut self, tuple: &Ref, index: isize) {
        // SAFETY: forwarded from the caller.
        unsafe { self.tuple_install_unchecked(tuple, index, None) }
    }

    #[allow(clippy::cast_sign_loss)]
    unsafe fn tuple_install_unchecked(&mut self, tuple: &Ref, index: isize, value: Option<Ref>) {
        match self.heap.get_mut(tuple.id()) {
            // SAFETY: the caller guarantees `index` is in bounds.
            HeapData::Tuple(t) => unsafe { t.install_unchecked(index as usize, value) },
            // SAFETY: the caller guarantees the target is a tuple.
            _ => unsafe { std::hint::unreachable_unchecked() },
        }
    }

    /// Builds a tuple that steals every reference in `values`.
    ///
    /// If the allocation is refused the references are released, so the steal
    /// happens either way.
    pub fn tuple_pack(&mut self, values: Vec<Ref>) -> RefResult<Ref> {
        let tuple = self.heap.allocate(HeapData::Tuple(Tuple::from_refs(values)))?;
        tracing::debug!(tuple = tuple.id(), "tuple_pack");
        Ok(tuple)
    }

    /// Builds a tuple holding a new reference to each of `values`.
    pub fn tuple_build(&mut self, values: &[&Ref]) -> RefResult<Ref> {
        let refs = values.iter().map(|v| self.incref(v)).collect();
        let tuple = self.heap.allocate(HeapData::Tuple(Tuple::from_refs(refs)))?;
        tracing::debug!(tuple = tuple.id(), "tuple_build");
        Ok(tuple)
    }

    /// Reads slot `index` without touching any count. `None` means the slot is empty.
    ///
    /// The returned id is only valid while the tuple keeps its reference; use
    /// `new_ref` to hold on to it.
    pub fn tuple_get_item(&self, tuple: &Ref, index: isize) -> RefResult<Option<HeapId>> {
        match self.heap.get(tuple.id()) {
            HeapData::Tuple(t) => {
                let index = checked_index(index, t.len()).ok_or_else(|| RefError::index_error("tuple"))?;
                Ok(t.slot_id(index))
            }
            _ => Err(RefError::bad_internal_call("tuple_get_item")),
        }
    }
}
