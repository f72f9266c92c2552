use crate::expect_refcount;
use crate::harness::scenarios::sequence::{self, TupleOps};
use crate::harness::{expect_len, Expect, Scenario, ScenarioResult, Step};
use crate::resource::{LimitedTracker, ResourceTracker};
use crate::runtime::Runtime;

pub(super) fn register(out: &mut Vec<Scenario>) {
    register!(out, Tuple, {
        tuple_steals => sequence::steals::<TupleOps, LimitedTracker>, Expect::Balanced;
        tuple_buildvalue_steals => tuple_buildvalue_steals::<LimitedTracker>, Expect::Balanced;
        tuple_set_item_steals => sequence::set_item_steals::<TupleOps, LimitedTracker>, Expect::Balanced;
        tuple_set_item_unchecked_steals => sequence::set_item_unchecked_steals::<TupleOps, LimitedTracker>, Expect::Balanced;
        tuple_set_item_steals_replace => sequence::set_item_steals_replace::<TupleOps, LimitedTracker>, Expect::Balanced;
        tuple_set_item_unchecked_steals_replace =>
            sequence::set_item_unchecked_steals_replace::<TupleOps, LimitedTracker>, Expect::Balanced;
        tuple_set_item_replace_with_same => sequence::set_item_replace_with_same::<TupleOps, LimitedTracker>, Expect::Balanced;
        tuple_set_item_unchecked_replace_with_same =>
            sequence::set_item_unchecked_replace_with_same::<TupleOps, LimitedTracker>, Expect::Balanced;
        tuple_set_item_null => sequence::set_item_null::<TupleOps, LimitedTracker>, Expect::Balanced;
        tuple_set_item_unchecked_null => sequence::set_item_unchecked_null::<TupleOps, LimitedTracker>, Expect::Balanced;
        tuple_set_item_null_set_item => sequence::set_item_null_set_item::<TupleOps, LimitedTracker>, Expect::Balanced;
        tuple_set_item_unchecked_null_set_item =>
            sequence::set_item_unchecked_null_set_item::<TupleOps, LimitedTracker>, Expect::Balanced;
        tuple_set_item_fails_not_a_tuple =>
            sequence::set_item_fails_wrong_kind::<TupleOps, LimitedTracker>, Expect::bad_internal_call();
        tuple_set_item_fails_out_of_range =>
            sequence::set_item_fails_out_of_range::<TupleOps, LimitedTracker>,
            Expect::index_error("tuple assignment index out of range");
        tuple_pack => tuple_pack::<LimitedTracker>, Expect::Balanced;
        tuple_build => tuple_build::<LimitedTracker>, Expect::Balanced;
    });
}

/// Borrow-construct followed by the caller dropping its reference leaves the
/// tuple as the only owner, the same end state as a steal.
fn tuple_buildvalue_steals<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let value = rt.new_probe("tuple_buildvalue_steals").step("new_probe")?;
    let value_id = value.id();
    let container = rt.tuple_build(&[&value]).step("tuple_build")?;
    expect_refcount!(rt, container, 1);
    expect_refcount!(rt, value, 2);

    rt.decref(value);
    expect_refcount!(rt, id value_id, 1);
    rt.decref(container);
    expect_refcount!(rt, id value_id, 0);
    Ok(())
}

/// Pack steals both arguments.
fn tuple_pack<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let value_a = rt.new_probe("tuple_pack").step("new_probe")?;
    let value_b = rt.new_probe("tuple_pack").step("new_probe")?;
    let (a_id, b_id) = (value_a.id(), value_b.id());

    let container = rt.tuple_pack(vec![value_a, value_b]).step("tuple_pack")?;
    expect_refcount!(rt, id a_id, 1);
    expect_refcount!(rt, id b_id, 1);
    expect_len(rt, "len", &container, 2)?;

    let kept_a = rt.new_ref(a_id);
    let kept_b = rt.new_ref(b_id);
    rt.decref(container);
    expect_refcount!(rt, kept_a, 1);
    expect_refcount!(rt, kept_b, 1);
    rt.decref(kept_a);
    rt.decref(kept_b);
    Ok(())
}

/// Borrow-construct increments both arguments; the caller still owns its references.
fn tuple_build<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let value_a = rt.new_probe("tuple_build").step("new_probe")?;
    let value_b = rt.new_probe("tuple_build").step("new_probe")?;

    let container = rt.tuple_build(&[&value_a, &value_b]).step("tuple_build")?;
    expect_refcount!(rt, value_a, 2);
    expect_refcount!(rt, value_b, 2);
    expect_len(rt, "len", &container, 2)?;

    rt.decref(container);
    expect_refcount!(rt, value_a, 1);
    expect_refcount!(rt, value_b, 1);
    rt.decref(value_a);
    rt.decref(value_b);
    Ok(())
}
