use crate::expect_refcount;
use crate::harness::{expect_failure, expect_len, expect_true, Expect, Scenario, ScenarioError, ScenarioResult, Step};
use crate::mutation::SetDefault;
use crate::resource::{LimitedTracker, ResourceTracker};
use crate::runtime::Runtime;

pub(super) fn register(out: &mut Vec<Scenario>) {
    register!(out, Dict, {
        dict_no_steals => dict_no_steals::<LimitedTracker>, Expect::Balanced;
        dict_no_steals_decref_after_set => dict_no_steals_decref_after_set::<LimitedTracker>, Expect::Balanced;
        dict_buildvalue_no_steals => dict_buildvalue_no_steals::<LimitedTracker>, Expect::Balanced;
        dict_set_item_increments => dict_set_item_increments::<LimitedTracker>, Expect::Balanced;
        dict_set_item_fails_not_a_dict => dict_set_item_fails_not_a_dict::<LimitedTracker>, Expect::bad_internal_call();
        dict_set_item_fails_not_hashable =>
            dict_set_item_fails_not_hashable::<LimitedTracker>, Expect::unhashable("unhashable type: 'list'");
        dict_set_default_default_unused => dict_set_default_default_unused::<LimitedTracker>, Expect::Balanced;
        dict_set_default_default_used => dict_set_default_default_used::<LimitedTracker>, Expect::Balanced;
        dict_set_default_ref_default_unused => dict_set_default_ref_default_unused::<LimitedTracker>, Expect::Balanced;
        dict_set_default_ref_default_used => dict_set_default_ref_default_used::<LimitedTracker>, Expect::Balanced;
        dict_get_item => dict_get_item::<LimitedTracker>, Expect::Balanced;
        dict_pop_key_present => dict_pop_key_present::<LimitedTracker>, Expect::Balanced;
        dict_pop_key_absent => dict_pop_key_absent::<LimitedTracker>, Expect::Balanced;
    });
}

/// Insertion borrows both the key and the value.
fn dict_no_steals<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = rt.dict_new().step("dict_new")?;
    let key = rt.new_probe("dict_no_steals").step("new_probe")?;
    let value = rt.new_probe("dict_no_steals").step("new_probe")?;

    rt.dict_set_item(&container, &key, &value).step("dict_set_item")?;
    expect_refcount!(rt, key, 2);
    expect_refcount!(rt, value, 2);

    rt.decref(container);
    expect_refcount!(rt, key, 1);
    expect_refcount!(rt, value, 1);
    rt.decref(key);
    rt.decref(value);
    Ok(())
}

/// Releasing the caller's references right after insertion leaves the dict as sole owner.
fn dict_no_steals_decref_after_set<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = rt.dict_new().step("dict_new")?;
    let key = rt.new_probe("dict_no_steals_decref_after_set").step("new_probe")?;
    let value = rt.new_probe("dict_no_steals_decref_after_set").step("new_probe")?;
    let (key_id, value_id) = (key.id(), value.id());

    rt.dict_set_item(&container, &key, &value).step("dict_set_item")?;
    rt.decref(key);
    rt.decref(value);
    expect_refcount!(rt, id key_id, 1);
    expect_refcount!(rt, id value_id, 1);

    rt.decref(container);
    expect_refcount!(rt, id key_id, 0);
    expect_refcount!(rt, id value_id, 0);
    Ok(())
}

fn dict_buildvalue_no_steals<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let key = rt.new_probe("dict_buildvalue_no_steals").step("new_probe")?;
    let value = rt.new_probe("dict_buildvalue_no_steals").step("new_probe")?;

    let container = rt.dict_build(&[(&key, &value)]).step("dict_build")?;
    expect_len(rt, "dict_build", &container, 1)?;
    expect_refcount!(rt, key, 2);
    expect_refcount!(rt, value, 2);

    rt.decref(container);
    expect_refcount!(rt, key, 1);
    expect_refcount!(rt, value, 1);
    rt.decref(key);
    rt.decref(value);
    Ok(())
}

/// Replacing a value under an existing key keeps the key's count and swaps the value counts.
fn dict_set_item_increments<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = rt.dict_new().step("dict_new")?;
    let key = rt.new_probe("dict_set_item_increments").step("new_probe")?;
    let value_a = rt.new_probe("dict_set_item_increments").step("new_probe")?;

    rt.dict_set_item(&container, &key, &value_a).step("dict_set_item")?;
    expect_refcount!(rt, key, 2);
    expect_refcount!(rt, value_a, 2);
    let get_item = rt.dict_get_item(&container, &key).step("dict_get_item")?;
    expect_true("dict_get_item", get_item == Some(value_a.id()), || format!("found {get_item:?}"))?;

    let value_b = rt.new_probe("dict_set_item_increments").step("new_probe")?;
    rt.dict_set_item(&container, &key, &value_b).step("dict_set_item")?;
    expect_refcount!(rt, key, 2);
    expect_refcount!(rt, value_a, 1);
    expect_refcount!(rt, value_b, 2);
    let get_item = rt.dict_get_item(&container, &key).step("dict_get_item")?;
    expect_true("dict_get_item", get_item == Some(value_b.id()), || format!("found {get_item:?}"))?;

    // same key and value again: no count moves
    rt.dict_set_item(&container, &key, &value_b).step("dict_set_item")?;
    expect_refcount!(rt, key, 2);
    expect_refcount!(rt, value_b, 2);

    rt.decref(container);
    expect_refcount!(rt, key, 1);
    expect_refcount!(rt, value_b, 1);
    rt.decref(key);
    rt.decref(value_a);
    rt.decref(value_b);
    Ok(())
}

fn dict_set_item_fails_not_a_dict<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = rt.list_new(0).step("list_new")?;
    let key = rt.new_probe("dict_set_item_fails_not_a_dict").step("new_probe")?;
    let value = rt.new_probe("dict_set_item_fails_not_a_dict").step("new_probe")?;

    let error = expect_failure("dict_set_item", rt.dict_set_item(&container, &key, &value))?;
    expect_refcount!(rt, key, 1);
    expect_refcount!(rt, value, 1);

    rt.decref(container);
    rt.decref(key);
    rt.decref(value);
    Err(ScenarioError::Raised(error))
}

fn dict_set_item_fails_not_hashable<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = rt.dict_new().step("dict_new")?;
    let key = rt.list_new(0).step("list_new")?;
    let value = rt.new_probe("dict_set_item_fails_not_hashable").step("new_probe")?;

    let error = expect_failure("dict_set_item", rt.dict_set_item(&container, &key, &value))?;
    expect_refcount!(rt, key, 1);
    expect_refcount!(rt, value, 1);
    expect_len(rt, "dict_set_item", &container, 0)?;

    rt.decref(container);
    rt.decref(key);
    rt.decref(value);
    Err(ScenarioError::Raised(error))
}

/// `dict_set_default` on a present key returns the existing value and leaves the default alone.
fn dict_set_default_default_unused<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = rt.dict_new().step("dict_new")?;
    let key = rt.new_probe("dict_set_default_default_unused").step("new_probe")?;
    let value = rt.new_probe("dict_set_default_default_unused").step("new_probe")?;
    rt.dict_set_item(&container, &key, &value).step("dict_set_item")?;
    expect_refcount!(rt, key, 2);
    expect_refcount!(rt, value, 2);

    let default = rt.new_probe("dict_set_default_default_unused").step("new_probe")?;
    let get_item = rt.dict_set_default(&container, &key, &default).step("dict_set_default")?;
    expect_true("dict_set_default", get_item == value.id(), || format!("returned {get_item}"))?;
    expect_refcount!(rt, key, 2);
    expect_refcount!(rt, value, 2);
    expect_refcount!(rt, default, 1);

    rt.decref(container);
    rt.decref(key);
    rt.decref(value);
    rt.decref(default);
    Ok(())
}

/// `dict_set_default` on an absent key inserts the default with borrow semantics.
fn dict_set_default_default_used<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = rt.dict_new().step("dict_new")?;
    let key = rt.new_probe("dict_set_default_default_used").step("new_probe")?;
    let default = rt.new_probe("dict_set_default_default_used").step("new_probe")?;

    let get_item = rt.dict_set_default(&container, &key, &default).step("dict_set_default")?;
    expect_true("dict_set_default", get_item == default.id(), || format!("returned {get_item}"))?;
    expect_len(rt, "dict_set_default", &container, 1)?;
    expect_refcount!(rt, key, 2);
    expect_refcount!(rt, default, 2);

    rt.decref(container);
    expect_refcount!(rt, key, 1);
    expect_refcount!(rt, default, 1);
    rt.decref(key);
    rt.decref(default);
    Ok(())
}

/// The strong variant hands back a new reference to the existing value.
fn dict_set_default_ref_default_unused<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = rt.dict_new().step("dict_new")?;
    let key = rt.new_probe("dict_set_default_ref_default_unused").step("new_probe")?;
    let value = rt.new_probe("dict_set_default_ref_default_unused").step("new_probe")?;
    rt.dict_set_item(&container, &key, &value).step("dict_set_item")?;

    let default = rt.new_probe("dict_set_default_ref_default_unused").step("new_probe")?;
    let (state, result) = rt
        .dict_set_default_ref(&container, &key, &default)
        .step("dict_set_default_ref")?;
    expect_true("dict_set_default_ref", state == SetDefault::Present, || format!("took the {state} branch"))?;
    expect_true("dict_set_default_ref", result.is(&value), || "result is not the stored value".to_owned())?;
    expect_refcount!(rt, key, 2);
    expect_refcount!(rt, value, 3);
    expect_refcount!(rt, default, 1);

    rt.decref(container);
    expect_refcount!(rt, key, 1);
    expect_refcount!(rt, value, 2);
    expect_refcount!(rt, default, 1);
    rt.decref(key);
    rt.decref(result);
    rt.decref(value);
    rt.decref(default);
    Ok(())
}

/// The strong variant on an absent key: the dict and the caller each gain a reference to the default.
fn dict_set_default_ref_default_used<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = rt.dict_new().step("dict_new")?;
    let key = rt.new_probe("dict_set_default_ref_default_used").step("new_probe")?;
    let default = rt.new_probe("dict_set_default_ref_default_used").step("new_probe")?;

    let (state, result) = rt
        .dict_set_default_ref(&container, &key, &default)
        .step("dict_set_default_ref")?;
    expect_true("dict_set_default_ref", state == SetDefault::Inserted, || format!("took the {state} branch"))?;
    expect_true("dict_set_default_ref", result.is(&default), || "result is not the default".to_owned())?;
    expect_refcount!(rt, key, 2);
    expect_refcount!(rt, default, 3);

    rt.decref(container);
    expect_refcount!(rt, key, 1);
    expect_refcount!(rt, default, 2);
    rt.decref(key);
    rt.decref(result);
    rt.decref(default);
    Ok(())
}

/// Borrowed lookups change no count; the strong lookup adds one.
fn dict_get_item<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = rt.dict_new().step("dict_new")?;
    let key = rt.new_probe("dict_get_item").step("new_probe")?;
    let value = rt.new_probe("dict_get_item").step("new_probe")?;
    rt.dict_set_item(&container, &key, &value).step("dict_set_item")?;

    let borrowed = rt.dict_get_item(&container, &key).step("dict_get_item")?;
    expect_true("dict_get_item", borrowed == Some(value.id()), || format!("found {borrowed:?}"))?;
    expect_refcount!(rt, value, 2);

    let strong = rt.dict_get_item_ref(&container, &key).step("dict_get_item_ref")?;
    expect_refcount!(rt, value, 3);
    if let Some(strong) = strong {
        rt.decref(strong);
    }
    expect_refcount!(rt, value, 2);

    let missing = rt.new_probe("dict_get_item").step("new_probe")?;
    let absent = rt.dict_get_item(&container, &missing).step("dict_get_item")?;
    expect_true("dict_get_item", absent.is_none(), || format!("found {absent:?} for a missing key"))?;

    rt.decref(container);
    rt.decref(key);
    rt.decref(value);
    rt.decref(missing);
    Ok(())
}

/// Popping transfers the dict's value reference to the caller and releases its key reference.
fn dict_pop_key_present<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = rt.dict_new().step("dict_new")?;
    let key = rt.new_probe("dict_pop_key_present").step("new_probe")?;
    let value = rt.new_probe("dict_pop_key_present").step("new_probe")?;
    rt.dict_set_item(&container, &key, &value).step("dict_set_item")?;

    let popped = rt.dict_pop(&container, &key).step("dict_pop")?;
    expect_len(rt, "dict_pop", &container, 0)?;
    expect_refcount!(rt, key, 1);
    expect_refcount!(rt, value, 2);
    match popped {
        Some(popped) => {
            let same = popped.is(&value);
            rt.decref(popped);
            expect_true("dict_pop", same, || "popped a different object".to_owned())?;
        }
        None => return Err(ScenarioError::Check { step: "dict_pop", detail: "key not found".to_owned() }),
    }
    expect_refcount!(rt, value, 1);

    rt.decref(container);
    rt.decref(key);
    rt.decref(value);
    Ok(())
}

fn dict_pop_key_absent<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = rt.dict_new().step("dict_new")?;
    let key = rt.new_probe("dict_pop_key_absent").step("new_probe")?;

    let popped = rt.dict_pop(&container, &key).step("dict_pop")?;
    expect_true("dict_pop", popped.is_none(), || "popped from an empty dict".to_owned())?;
    expect_refcount!(rt, key, 1);

    rt.decref(container);
    rt.decref(key);
    Ok(())
}
