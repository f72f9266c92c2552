use strum::Display;

use crate::exceptions::{RefError, RefResult};
use crate::heap::{HeapData, HeapId};
use crate::resource::ResourceTracker;
use crate::runtime::Runtime;
use crate::value::Ref;
use crate::values::Dict;

/// Which branch `dict_set_default_ref` took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SetDefault {
    /// The key was already present and the default was not used.
    Present,
    /// The key was absent and the default was inserted.
    Inserted,
}

impl<T: ResourceTracker> Runtime<T> {
    pub fn dict_new(&mut self) -> RefResult<Ref> {
        Ok(self.heap.allocate(HeapData::Dict(Dict::new()))?)
    }

    /// Validates the target and hashes the key, in that order.
    fn dict_key_hash(&self, dict: &Ref, key: &Ref, func: &'static str) -> RefResult<u64> {
        self.check_kind(dict, func, |data| matches!(data, HeapData::Dict(_)))?;
        self.hash_of(key)
    }

    /// Maps `key` to `value`, borrowing both.
    ///
    /// When an equal key is already present the dict keeps its original key
    /// object, takes a new reference to `value` and releases the value it held.
    /// Otherwise it takes new references to both `key` and `value`.
    ///
    /// # Errors
    /// `TypeMismatch` when `dict` is not a dict and `Unhashable` when `key`
    /// cannot be hashed. No count changes on failure.
    pub fn dict_set_item(&mut self, dict: &Ref, key: &Ref, value: &Ref) -> RefResult<()> {
        let hash = self.dict_key_hash(dict, key, "dict_set_item")?;
        let new_value = self.incref(value);
        let key_id = key.id();
        match self.with_dict_mut(dict.id(), |heap, d| d.replace_value(hash, key_id, new_value, heap)) {
            Ok(old_value) => {
                tracing::debug!(dict = dict.id(), key = key_id, released = old_value.id(), "dict_set_item replaced");
                self.decref(old_value);
            }
            Err(new_value) => {
                let new_key = self.incref(key);
                tracing::debug!(dict = dict.id(), key = key_id, "dict_set_item inserted");
                self.with_dict_mut(dict.id(), |_, d| d.push_new(hash, new_key, new_value));
            }
        }
        Ok(())
    }

    /// Looks up `key` without touching any count.
    pub fn dict_get_item(&self, dict: &Ref, key: &Ref) -> RefResult<Option<HeapId>> {
        match self.heap.get(dict.id()) {
            HeapData::Dict(d) => {
                let hash = self.hash_of(key)?;
                Ok(d.get(hash, key.id(), &self.heap).map(Ref::id))
            }
            _ => Err(RefError::bad_internal_call("dict_get_item")),
        }
    }

    /// Looks up `key` and returns a new reference to the value.
    pub fn dict_get_item_ref(&mut self, dict: &Ref, key: &Ref) -> RefResult<Option<Ref>> {
        Ok(self.dict_get_item(dict, key)?.map(|id| self.new_ref(id)))
    }

    /// Returns the value for `key`, inserting `default` first when the key is absent.
    ///
    /// The result is borrowed: it stays valid only while the dict holds it.
    /// `default` is borrowed as in `dict_set_item` and is only incremented when it is inserted.
    pub fn dict_set_default(&mut self, dict: &Ref, key: &Ref, default: &Ref) -> RefResult<HeapId> {
        self.set_default_inner(dict, key, default, "dict_set_default")
            .map(|(_, id)| id)
    }

    /// Like `dict_set_default`, but the result is a new strong reference the
    /// caller must release.
    pub fn dict_set_default_ref(&mut self, dict: &Ref, key: &Ref, default: &Ref) -> RefResult<(SetDefault, Ref)> {
        let (state, id) = self.set_default_inner(dict, key, default, "dict_set_default_ref")?;
        Ok((state, self.new_ref(id)))
    }

    fn set_default_inner(
        &mut self,
        dict: &Ref,
        key: &Ref,
        default: &Ref,
        func: &'static str,
    ) -> RefResult<(SetDefault, HeapId)> {
        let hash = self.dict_key_hash(dict, key, func)?;
        if let HeapData::Dict(d) = self.heap.get(dict.id()) {
            if let Some(existing) = d.get(hash, key.id(), &self.heap) {
                return Ok((SetDefault::Present, existing.id()));
            }
        }
        let new_key = self.incref(key);
        let new_value = self.incref(default);
        tracing::debug!(dict = dict.id(), key = key.id(), value = default.id(), "{func} inserted default");
        self.with_dict_mut(dict.id(), |_, d| d.push_new(hash, new_key, new_value));
        Ok((SetDefault::Inserted, default.id()))
    }

    /// Removes `key`, handing the dict's value reference to the caller and releasing its key reference.
    ///
    /// Returns `Ok(None)` when the key is absent.
    pub fn dict_pop(&mut self, dict: &Ref, key: &Ref) -> RefResult<Option<Ref>> {
        let hash = self.dict_key_hash(dict, key, "dict_pop")?;
        let key_id = key.id();
        let Some((old_key, value)) = self.with_dict_mut(dict.id(), |heap, d| d.remove(hash, key_id, heap)) else {
            return Ok(None);
        };
        tracing::debug!(dict = dict.id(), key = key_id, "dict_pop");
        self.decref(old_key);
        Ok(Some(value))
    }

    /// Builds a dict from `(key, value)` pairs with `dict_set_item` semantics.
    ///
    /// Later pairs win over earlier ones with an equal key. On error the partly
    /// built dict is released, so no count changes.
    pub fn dict_build(&mut self, pairs: &[(&Ref, &Ref)]) -> RefResult<Ref> {
        let dict = self.dict_new()?;
        for (key, value) in pairs {
            if let Err(err) = self.dict_set_item(&dict, key, value) {
                self.decref(dict);
                return Err(err);
            }
        }
        Ok(dict)
    }
}
