use crate::harness::scenarios::sequence::{self, ListOps};
use crate::harness::{expect_failure, expect_len, expect_true, Expect, Scenario, ScenarioError, ScenarioResult, Step};
use crate::resource::{LimitedTracker, ResourceTracker};
use crate::runtime::Runtime;
use crate::value::Ref;
use crate::expect_refcount;

pub(super) fn register(out: &mut Vec<Scenario>) {
    register!(out, List, {
        list_steals => sequence::steals::<ListOps, LimitedTracker>, Expect::Balanced;
        list_buildvalue_steals => list_buildvalue_steals::<LimitedTracker>, Expect::Balanced;
        list_set_item_steals => sequence::set_item_steals::<ListOps, LimitedTracker>, Expect::Balanced;
        list_set_item_unchecked_steals => sequence::set_item_unchecked_steals::<ListOps, LimitedTracker>, Expect::Balanced;
        list_set_item_steals_replace => sequence::set_item_steals_replace::<ListOps, LimitedTracker>, Expect::Balanced;
        list_set_item_unchecked_steals_replace =>
            sequence::set_item_unchecked_steals_replace::<ListOps, LimitedTracker>, Expect::Balanced;
        list_set_item_replace_with_same => sequence::set_item_replace_with_same::<ListOps, LimitedTracker>, Expect::Balanced;
        list_set_item_unchecked_replace_with_same =>
            sequence::set_item_unchecked_replace_with_same::<ListOps, LimitedTracker>, Expect::Balanced;
        list_set_item_null => sequence::set_item_null::<ListOps, LimitedTracker>, Expect::Balanced;
        list_set_item_unchecked_null => sequence::set_item_unchecked_null::<ListOps, LimitedTracker>, Expect::Balanced;
        list_set_item_null_set_item => sequence::set_item_null_set_item::<ListOps, LimitedTracker>, Expect::Balanced;
        list_set_item_unchecked_null_set_item =>
            sequence::set_item_unchecked_null_set_item::<ListOps, LimitedTracker>, Expect::Balanced;
        list_set_item_fails_not_a_list =>
            sequence::set_item_fails_wrong_kind::<ListOps, LimitedTracker>, Expect::bad_internal_call();
        list_set_item_fails_out_of_range =>
            sequence::set_item_fails_out_of_range::<ListOps, LimitedTracker>,
            Expect::index_error("list assignment index out of range");
        list_append => list_append::<LimitedTracker>, Expect::Balanced;
        list_append_fails_not_a_list => list_append_fails_not_a_list::<LimitedTracker>, Expect::bad_internal_call();
        list_insert => list_insert::<LimitedTracker>, Expect::Balanced;
        list_insert_is_truncated => list_insert_is_truncated::<LimitedTracker>, Expect::Balanced;
        list_insert_negative_index => list_insert_negative_index::<LimitedTracker>, Expect::Balanced;
        list_insert_fails_not_a_list => list_insert_fails_not_a_list::<LimitedTracker>, Expect::bad_internal_call();
        list_build => list_build::<LimitedTracker>, Expect::Balanced;
    });
}

fn list_buildvalue_steals<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let value = rt.new_probe("list_buildvalue_steals").step("new_probe")?;
    let value_id = value.id();
    let container = rt.list_build(&[&value]).step("list_build")?;
    expect_refcount!(rt, value, 2);

    rt.decref(value);
    expect_refcount!(rt, id value_id, 1);
    rt.decref(container);
    expect_refcount!(rt, id value_id, 0);
    Ok(())
}

/// Appending borrows: the list takes its own reference.
fn list_append<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = rt.list_new(0).step("list_new")?;
    let value = rt.new_probe("list_append").step("new_probe")?;

    rt.list_append(&container, &value).step("list_append")?;
    expect_len(rt, "list_append", &container, 1)?;
    expect_refcount!(rt, value, 2);
    expect_item(rt, &container, 0, &value)?;

    rt.decref(container);
    expect_refcount!(rt, value, 1);
    rt.decref(value);
    Ok(())
}

fn list_append_fails_not_a_list<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = rt.tuple_new(1).step("tuple_new")?;
    let value = rt.new_probe("list_append_fails_not_a_list").step("new_probe")?;

    let error = expect_failure("list_append", rt.list_append(&container, &value))?;
    expect_refcount!(rt, value, 1);

    rt.decref(container);
    rt.decref(value);
    Err(ScenarioError::Raised(error))
}

/// Inserts one probe into an empty list at `index` and checks it lands at position 0.
fn insert_into_empty<T: ResourceTracker>(rt: &mut Runtime<T>, label: &str, index: isize) -> ScenarioResult {
    let container = rt.list_new(0).step("list_new")?;
    let value = rt.new_probe(label).step("new_probe")?;

    rt.list_insert(&container, index, &value).step("list_insert")?;
    expect_len(rt, "list_insert", &container, 1)?;
    expect_refcount!(rt, value, 2);
    expect_item(rt, &container, 0, &value)?;

    rt.decref(container);
    expect_refcount!(rt, value, 1);
    rt.decref(value);
    Ok(())
}

fn list_insert<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    insert_into_empty(rt, "list_insert", 0)
}

/// An index past the end appends.
fn list_insert_is_truncated<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    insert_into_empty(rt, "list_insert_is_truncated", 4)
}

/// A negative index counts from the end and stops at the front.
fn list_insert_negative_index<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    insert_into_empty(rt, "list_insert_negative_index", -1)
}

fn list_insert_fails_not_a_list<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = rt.tuple_new(1).step("tuple_new")?;
    let value = rt.new_probe("list_insert_fails_not_a_list").step("new_probe")?;

    let error = expect_failure("list_insert", rt.list_insert(&container, 0, &value))?;
    expect_refcount!(rt, value, 1);

    rt.decref(container);
    rt.decref(value);
    Err(ScenarioError::Raised(error))
}

fn list_build<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let value_a = rt.new_probe("list_build").step("new_probe")?;
    let value_b = rt.new_probe("list_build").step("new_probe")?;

    let container = rt.list_build(&[&value_a, &value_b]).step("list_build")?;
    expect_refcount!(rt, value_a, 2);
    expect_refcount!(rt, value_b, 2);
    expect_item(rt, &container, 1, &value_b)?;

    rt.decref(container);
    expect_refcount!(rt, value_a, 1);
    expect_refcount!(rt, value_b, 1);
    rt.decref(value_a);
    rt.decref(value_b);
    Ok(())
}

fn expect_item<T: ResourceTracker>(rt: &Runtime<T>, list: &Ref, index: isize, expected: &Ref) -> ScenarioResult {
    let found = rt.list_get_item(list, index).step("list_get_item")?;
    expect_true("list_get_item", found == Some(expected.id()), || {
        format!("slot {index} holds {found:?}, expected {}", rt.repr(expected))
    })
}
