use crate::exceptions::RefResult;
use crate::heap::HeapData;
use crate::resource::ResourceTracker;
use crate::runtime::Runtime;
use crate::value::Ref;
use crate::values::Set;

impl<T: ResourceTracker> Runtime<T> {
    pub fn set_new(&mut self) -> RefResult<Ref> {
        Ok(self.heap.allocate(HeapData::Set(Set::new()))?)
    }

    fn set_member_hash(&self, set: &Ref, value: &Ref, func: &'static str) -> RefResult<u64> {
        self.check_kind(set, func, |data| matches!(data, HeapData::Set(_)))?;
        self.hash_of(value)
    }

    /// Adds `value`, borrowing it. Adding a member that is already present changes no count.
    ///
    /// # Errors
    /// `TypeMismatch` when `set` is not a set, `Unhashable` when `value` cannot be hashed.
    pub fn set_add(&mut self, set: &Ref, value: &Ref) -> RefResult<()> {
        let hash = self.set_member_hash(set, value, "set_add")?;
        if self.set_contains_hashed(set, hash, value) {
            return Ok(());
        }
        let member = self.incref(value);
        tracing::debug!(set = set.id(), member = member.id(), "set_add");
        self.with_set_mut(set.id(), |_, s| s.push_new(hash, member));
        Ok(())
    }

    pub fn set_contains(&self, set: &Ref, value: &Ref) -> RefResult<bool> {
        let hash = self.set_member_hash(set, value, "set_contains")?;
        Ok(self.set_contains_hashed(set, hash, value))
    }

    fn set_contains_hashed(&self, set: &Ref, hash: u64, value: &Ref) -> bool {
        match self.heap.get(set.id()) {
            HeapData::Set(s) => s.contains(hash, value.id(), &self.heap),
            _ => false,
        }
    }

    /// Removes the member equal to `value` and releases the set's reference to it.
    ///
    /// Returns whether a member was removed.
    pub fn set_discard(&mut self, set: &Ref, value: &Ref) -> RefResult<bool> {
        let hash = self.set_member_hash(set, value, "set_discard")?;
        let value_id = value.id();
        match self.with_set_mut(set.id(), |heap, s| s.remove(hash, value_id, heap)) {
            Some(member) => {
                tracing::debug!(set = set.id(), member = member.id(), "set_discard");
                self.decref(member);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes an arbitrary member and hands the set's reference to the caller.
    ///
    /// Returns `Ok(None)` for an empty set.
    pub fn set_pop(&mut self, set: &Ref) -> RefResult<Option<Ref>> {
        self.check_kind(set, "set_pop", |data| matches!(data, HeapData::Set(_)))?;
        let member = self.with_set_mut(set.id(), |_, s| s.pop());
        tracing::debug!(set = set.id(), member = member.as_ref().map(Ref::id), "set_pop");
        Ok(member)
    }

    /// Builds a set holding a new reference to each distinct member of `values`.
    ///
    /// On error the partly built set is released, so no count changes.
    pub fn set_build(&mut self, values: &[&Ref]) -> RefResult<Ref> {
        let set = self.set_new()?;
        for value in values {
            if let Err(err) = self.set_add(&set, value) {
                self.decref(set);
                return Err(err);
            }
        }
        Ok(set)
    }
}
