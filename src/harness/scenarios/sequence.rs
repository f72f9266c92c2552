//! Slot-assignment scenarios shared by tuples and lists.
//!
//! Both containers have the same checked and unchecked set contracts, so each
//! scenario is written once against `Sequence` and registered for both.

use crate::exceptions::{RefResult, StealError};
use crate::harness::{expect_steal_failure, expect_true, ScenarioError, ScenarioResult, Step};
use crate::heap::HeapId;
use crate::resource::ResourceTracker;
use crate::runtime::Runtime;
use crate::value::Ref;
use crate::expect_refcount;

/// The slot operations of one sequence kind.
pub(super) trait Sequence {
    /// Probe label prefix.
    const LABEL: &'static str;

    fn new<T: ResourceTracker>(rt: &mut Runtime<T>, len: usize) -> RefResult<Ref>;

    /// A one-slot container of the other sequence kind, for type-mismatch scenarios.
    fn new_wrong_kind<T: ResourceTracker>(rt: &mut Runtime<T>) -> RefResult<Ref>;

    fn set_item<T: ResourceTracker>(rt: &mut Runtime<T>, seq: &Ref, index: isize, value: Ref) -> Result<(), StealError>;

    /// # Safety
    /// `seq` must be this kind and `index` in bounds.
    unsafe fn set_item_unchecked<T: ResourceTracker>(rt: &mut Runtime<T>, seq: &Ref, index: isize, value: Ref);

    fn clear_item<T: ResourceTracker>(rt: &mut Runtime<T>, seq: &Ref, index: isize) -> RefResult<()>;

    /// # Safety
    /// `seq` must be this kind and `index` in bounds.
    unsafe fn clear_item_unchecked<T: ResourceTracker>(rt: &mut Runtime<T>, seq: &Ref, index: isize);

    fn get_item<T: ResourceTracker>(rt: &Runtime<T>, seq: &Ref, index: isize) -> RefResult<Option<HeapId>>;
}

pub(super) struct TupleOps;

impl Sequence for TupleOps {
    const LABEL: &'static str = "tuple";

    fn new<T: ResourceTracker>(rt: &mut Runtime<T>, len: usize) -> RefResult<Ref> {
        rt.tuple_new(len)
    }

    fn new_wrong_kind<T: ResourceTracker>(rt: &mut Runtime<T>) -> RefResult<Ref> {
        rt.list_new(1)
    }

    fn set_item<T: ResourceTracker>(rt: &mut Runtime<T>, seq: &Ref, index: isize, value: Ref) -> Result<(), StealError> {
        rt.tuple_set_item(seq, index, value)
    }

    unsafe fn set_item_unchecked<T: ResourceTracker>(rt: &mut Runtime<T>, seq: &Ref, index: isize, value: Ref) {
        // SAFETY: forwarded from the caller.
        unsafe { rt.tuple_set_item_unchecked(seq, index, value) }
    }

    fn clear_item<T: ResourceTracker>(rt: &mut Runtime<T>, seq: &Ref, index: isize) -> RefResult<()> {
        rt.tuple_clear_item(seq, index)
    }

    unsafe fn clear_item_unchecked<T: ResourceTracker>(rt: &mut Runtime<T>, seq: &Ref, index: isize) {
        // SAFETY: forwarded from the caller.
        unsafe { rt.tuple_clear_item_unchecked(seq, index) }
    }

    fn get_item<T: ResourceTracker>(rt: &Runtime<T>, seq: &Ref, index: isize) -> RefResult<Option<HeapId>> {
        rt.tuple_get_item(seq, index)
    }
}

pub(super) struct ListOps;

impl Sequence for ListOps {
    const LABEL: &'static str = "list";

    fn new<T: ResourceTracker>(rt: &mut Runtime<T>, len: usize) -> RefResult<Ref> {
        rt.list_new(len)
    }

    fn new_wrong_kind<T: ResourceTracker>(rt: &mut Runtime<T>) -> RefResult<Ref> {
        rt.tuple_new(1)
    }

    fn set_item<T: ResourceTracker>(rt: &mut Runtime<T>, seq: &Ref, index: isize, value: Ref) -> Result<(), StealError> {
        rt.list_set_item(seq, index, value)
    }

    unsafe fn set_item_unchecked<T: ResourceTracker>(rt: &mut Runtime<T>, seq: &Ref, index: isize, value: Ref) {
        // SAFETY: forwarded from the caller.
        unsafe { rt.list_set_item_unchecked(seq, index, value) }
    }

    fn clear_item<T: ResourceTracker>(rt: &mut Runtime<T>, seq: &Ref, index: isize) -> RefResult<()> {
        rt.list_clear_item(seq, index)
    }

    unsafe fn clear_item_unchecked<T: ResourceTracker>(rt: &mut Runtime<T>, seq: &Ref, index: isize) {
        // SAFETY: forwarded from the caller.
        unsafe { rt.list_clear_item_unchecked(seq, index) }
    }

    fn get_item<T: ResourceTracker>(rt: &Runtime<T>, seq: &Ref, index: isize) -> RefResult<Option<HeapId>> {
        rt.list_get_item(seq, index)
    }
}

fn expect_slot<S: Sequence, T: ResourceTracker>(
    rt: &Runtime<T>,
    seq: &Ref,
    index: isize,
    expected: Option<HeapId>,
) -> ScenarioResult {
    let found = S::get_item(rt, seq, index).step("get_item")?;
    expect_true("get_item", found == expected, || {
        format!("slot {index} holds {found:?}, expected {expected:?}")
    })
}

/// A set into an empty slot does not increment; freeing the container frees the value.
pub(super) fn steals<S: Sequence, T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = S::new(rt, 1).step("new")?;
    let value = rt.new_probe(S::LABEL).step("new_probe")?;
    let value_id = value.id();
    S::set_item(rt, &container, 0, value).step("set_item")?;
    expect_refcount!(rt, id value_id, 1);

    rt.decref(container);
    expect_refcount!(rt, id value_id, 0);
    Ok(())
}

/// Checked set steals the value: its count stays 1 and the container releases it.
pub(super) fn set_item_steals<S: Sequence, T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = S::new(rt, 1).step("new")?;
    expect_refcount!(rt, container, 1);
    let value = rt.new_probe(S::LABEL).step("new_probe")?;
    expect_refcount!(rt, value, 1);
    let value_id = value.id();

    S::set_item(rt, &container, 0, value).step("set_item")?;
    expect_refcount!(rt, id value_id, 1);
    expect_slot::<S, T>(rt, &container, 0, Some(value_id))?;

    // hold a reference of our own to watch the container release its one
    let kept = rt.new_ref(value_id);
    expect_refcount!(rt, kept, 2);
    rt.decref(container);
    expect_refcount!(rt, kept, 1);
    rt.decref(kept);
    Ok(())
}

/// Unchecked set into an empty slot behaves exactly like the checked one.
pub(super) fn set_item_unchecked_steals<S: Sequence, T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = S::new(rt, 1).step("new")?;
    let value = rt.new_probe(S::LABEL).step("new_probe")?;
    let value_id = value.id();

    // SAFETY: `container` is a fresh one-slot sequence of kind `S`.
    unsafe { S::set_item_unchecked(rt, &container, 0, value) };
    expect_refcount!(rt, id value_id, 1);
    expect_slot::<S, T>(rt, &container, 0, Some(value_id))?;

    let kept = rt.new_ref(value_id);
    rt.decref(container);
    expect_refcount!(rt, kept, 1);
    rt.decref(kept);
    Ok(())
}

/// Replacing an occupied slot releases the old value.
pub(super) fn set_item_steals_replace<S: Sequence, T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = S::new(rt, 1).step("new")?;
    let value_0 = rt.new_probe(S::LABEL).step("new_probe")?;
    let value_0_id = value_0.id();
    S::set_item(rt, &container, 0, value_0).step("set_item")?;
    expect_refcount!(rt, id value_0_id, 1);

    let value_1 = rt.new_probe(S::LABEL).step("new_probe")?;
    let value_1_id = value_1.id();
    let kept_0 = rt.new_ref(value_0_id);
    expect_refcount!(rt, kept_0, 2);
    let kept_1 = rt.incref(&value_1);
    expect_refcount!(rt, kept_1, 2);

    S::set_item(rt, &container, 0, value_1).step("set_item")?;
    expect_refcount!(rt, kept_1, 2);
    expect_refcount!(rt, kept_0, 1);
    expect_slot::<S, T>(rt, &container, 0, Some(value_1_id))?;

    rt.decref(container);
    expect_refcount!(rt, kept_1, 1);
    rt.decref(kept_0);
    rt.decref(kept_1);
    Ok(())
}

/// Unchecked replace overwrites the old value without releasing it.
pub(super) fn set_item_unchecked_steals_replace<S: Sequence, T: ResourceTracker>(
    rt: &mut Runtime<T>,
) -> ScenarioResult {
    let container = S::new(rt, 1).step("new")?;
    let value_0 = rt.new_probe(S::LABEL).step("new_probe")?;
    let value_0_id = value_0.id();
    // SAFETY: `container` is a one-slot sequence of kind `S`.
    unsafe { S::set_item_unchecked(rt, &container, 0, value_0) };
    expect_refcount!(rt, id value_0_id, 1);

    let value_1 = rt.new_probe(S::LABEL).step("new_probe")?;
    let value_1_id = value_1.id();
    // SAFETY: as above.
    unsafe { S::set_item_unchecked(rt, &container, 0, value_1) };
    expect_refcount!(rt, id value_1_id, 1);
    expect_slot::<S, T>(rt, &container, 0, Some(value_1_id))?;

    rt.decref(container);
    expect_refcount!(rt, id value_1_id, 0);
    // leaked: nobody owns this count any more
    expect_refcount!(rt, id value_0_id, 1);
    rt.decref_id(value_0_id);
    Ok(())
}

/// Checked set of the object a slot already holds: the new reference goes in
/// before the old one is released, so the object survives.
pub(super) fn set_item_replace_with_same<S: Sequence, T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = S::new(rt, 1).step("new")?;
    let value = rt.new_probe(S::LABEL).step("new_probe")?;
    let value_id = value.id();
    S::set_item(rt, &container, 0, value).step("set_item")?;
    expect_refcount!(rt, id value_id, 1);

    let again = rt.new_ref(value_id);
    expect_refcount!(rt, again, 2);
    S::set_item(rt, &container, 0, again).step("set_item")?;
    expect_refcount!(rt, id value_id, 1);
    expect_slot::<S, T>(rt, &container, 0, Some(value_id))?;

    let kept = rt.new_ref(value_id);
    rt.decref(container);
    expect_refcount!(rt, kept, 1);
    rt.decref(kept);
    Ok(())
}

/// Unchecked set of the object a slot already holds leaks the overwritten count.
pub(super) fn set_item_unchecked_replace_with_same<S: Sequence, T: ResourceTracker>(
    rt: &mut Runtime<T>,
) -> ScenarioResult {
    let container = S::new(rt, 1).step("new")?;
    let value = rt.new_probe(S::LABEL).step("new_probe")?;
    let value_id = value.id();
    // SAFETY: `container` is a one-slot sequence of kind `S`.
    unsafe { S::set_item_unchecked(rt, &container, 0, value) };
    expect_refcount!(rt, id value_id, 1);

    let again = rt.new_ref(value_id);
    // SAFETY: as above.
    unsafe { S::set_item_unchecked(rt, &container, 0, again) };
    expect_refcount!(rt, id value_id, 2);
    expect_slot::<S, T>(rt, &container, 0, Some(value_id))?;

    rt.decref(container);
    expect_refcount!(rt, id value_id, 1);
    rt.decref_id(value_id);
    Ok(())
}

/// Clearing an empty slot is a no-op.
pub(super) fn set_item_null<S: Sequence, T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = S::new(rt, 1).step("new")?;
    S::clear_item(rt, &container, 0).step("clear_item")?;
    expect_slot::<S, T>(rt, &container, 0, None)?;
    expect_refcount!(rt, container, 1);
    rt.decref(container);
    Ok(())
}

pub(super) fn set_item_unchecked_null<S: Sequence, T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = S::new(rt, 1).step("new")?;
    // SAFETY: `container` is a one-slot sequence of kind `S`.
    unsafe { S::clear_item_unchecked(rt, &container, 0) };
    expect_slot::<S, T>(rt, &container, 0, None)?;
    rt.decref(container);
    Ok(())
}

/// A cleared slot can be filled again with the usual steal.
pub(super) fn set_item_null_set_item<S: Sequence, T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = S::new(rt, 1).step("new")?;
    S::clear_item(rt, &container, 0).step("clear_item")?;

    let value = rt.new_probe(S::LABEL).step("new_probe")?;
    let kept = rt.incref(&value);
    expect_refcount!(rt, kept, 2);
    S::set_item(rt, &container, 0, value).step("set_item")?;
    expect_refcount!(rt, kept, 2);

    rt.decref(container);
    expect_refcount!(rt, kept, 1);
    rt.decref(kept);
    Ok(())
}

pub(super) fn set_item_unchecked_null_set_item<S: Sequence, T: ResourceTracker>(
    rt: &mut Runtime<T>,
) -> ScenarioResult {
    let container = S::new(rt, 1).step("new")?;
    // SAFETY: `container` is a one-slot sequence of kind `S`.
    unsafe { S::clear_item_unchecked(rt, &container, 0) };

    let value = rt.new_probe(S::LABEL).step("new_probe")?;
    let kept = rt.incref(&value);
    expect_refcount!(rt, kept, 2);
    // SAFETY: as above.
    unsafe { S::set_item_unchecked(rt, &container, 0, value) };
    expect_refcount!(rt, kept, 2);

    rt.decref(container);
    expect_refcount!(rt, kept, 1);
    rt.decref(kept);
    Ok(())
}

/// A checked set into the wrong container kind fails and hands the value back untouched.
pub(super) fn set_item_fails_wrong_kind<S: Sequence, T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = S::new_wrong_kind(rt).step("new_wrong_kind")?;
    let value = rt.new_probe(S::LABEL).step("new_probe")?;
    expect_refcount!(rt, value, 1);

    let (error, value) = expect_steal_failure("set_item", S::set_item(rt, &container, 0, value))?.into_parts();
    expect_refcount!(rt, value, 1);
    expect_refcount!(rt, container, 1);

    rt.decref(container);
    rt.decref(value);
    Err(ScenarioError::Raised(error))
}

/// A checked set past the end fails and hands the value back untouched.
pub(super) fn set_item_fails_out_of_range<S: Sequence, T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = S::new(rt, 3).step("new")?;
    let value = rt.new_probe(S::LABEL).step("new_probe")?;

    let (error, value) = expect_steal_failure("set_item", S::set_item(rt, &container, 5, value))?.into_parts();
    expect_refcount!(rt, value, 1);
    expect_slot::<S, T>(rt, &container, 0, None)?;

    rt.decref(container);
    rt.decref(value);
    Err(ScenarioError::Raised(error))
}
