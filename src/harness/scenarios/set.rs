use crate::expect_refcount;
use crate::harness::{expect_failure, expect_len, expect_true, Expect, Scenario, ScenarioError, ScenarioResult, Step};
use crate::resource::{LimitedTracker, ResourceTracker};
use crate::runtime::Runtime;

pub(super) fn register(out: &mut Vec<Scenario>) {
    register!(out, Set, {
        set_no_steals => set_no_steals::<LimitedTracker>, Expect::Balanced;
        set_no_steals_decref => set_no_steals_decref::<LimitedTracker>, Expect::Balanced;
        set_add => set_add::<LimitedTracker>, Expect::Balanced;
        set_add_fails_not_a_set => set_add_fails_not_a_set::<LimitedTracker>, Expect::bad_internal_call();
        set_discard => set_discard::<LimitedTracker>, Expect::Balanced;
        set_pop => set_pop::<LimitedTracker>, Expect::Balanced;
    });
}

fn set_no_steals<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = rt.set_new().step("set_new")?;
    let value = rt.new_probe("set_no_steals").step("new_probe")?;

    rt.set_add(&container, &value).step("set_add")?;
    expect_refcount!(rt, value, 2);

    rt.decref(container);
    expect_refcount!(rt, value, 1);
    rt.decref(value);
    Ok(())
}

fn set_no_steals_decref<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = rt.set_new().step("set_new")?;
    let value = rt.new_probe("set_no_steals_decref").step("new_probe")?;
    let value_id = value.id();

    rt.set_add(&container, &value).step("set_add")?;
    rt.decref(value);
    expect_refcount!(rt, id value_id, 1);

    rt.decref(container);
    expect_refcount!(rt, id value_id, 0);
    Ok(())
}

/// Adding a member that is already present, by identity or by equality, moves no count.
fn set_add<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = rt.set_new().step("set_new")?;
    let value = rt.new_probe("set_add").step("new_probe")?;
    rt.set_add(&container, &value).step("set_add")?;
    expect_refcount!(rt, value, 2);

    rt.set_add(&container, &value).step("set_add")?;
    expect_refcount!(rt, value, 2);

    let text = rt.str_value(value.id()).unwrap_or_default().to_owned();
    let equal = rt.new_str(text).step("new_str")?;
    rt.set_add(&container, &equal).step("set_add")?;
    expect_refcount!(rt, equal, 1);
    expect_len(rt, "set_add", &container, 1)?;

    rt.decref(container);
    expect_refcount!(rt, value, 1);
    rt.decref(value);
    rt.decref(equal);
    Ok(())
}

fn set_add_fails_not_a_set<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = rt.dict_new().step("dict_new")?;
    let value = rt.new_probe("set_add_fails_not_a_set").step("new_probe")?;

    let error = expect_failure("set_add", rt.set_add(&container, &value))?;
    expect_refcount!(rt, value, 1);

    rt.decref(container);
    rt.decref(value);
    Err(ScenarioError::Raised(error))
}

/// Discarding releases the set's reference; discarding again is a no-op.
fn set_discard<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = rt.set_new().step("set_new")?;
    let value = rt.new_probe("set_discard").step("new_probe")?;
    rt.set_add(&container, &value).step("set_add")?;
    expect_refcount!(rt, value, 2);

    let removed = rt.set_discard(&container, &value).step("set_discard")?;
    expect_true("set_discard", removed, || "member was not found".to_owned())?;
    expect_refcount!(rt, value, 1);

    let removed = rt.set_discard(&container, &value).step("set_discard")?;
    expect_true("set_discard", !removed, || "member removed twice".to_owned())?;
    expect_refcount!(rt, value, 1);

    rt.decref(container);
    rt.decref(value);
    Ok(())
}

/// Popping hands the set's reference to the caller.
fn set_pop<T: ResourceTracker>(rt: &mut Runtime<T>) -> ScenarioResult {
    let container = rt.set_new().step("set_new")?;
    let value = rt.new_probe("set_pop").step("new_probe")?;
    rt.set_add(&container, &value).step("set_add")?;

    let popped = rt.set_pop(&container).step("set_pop")?;
    expect_len(rt, "set_pop", &container, 0)?;
    expect_refcount!(rt, value, 2);
    match popped {
        Some(popped) => {
            let same = popped.is(&value);
            rt.decref(popped);
            expect_true("set_pop", same, || "popped a different object".to_owned())?;
        }
        None => return Err(ScenarioError::Check { step: "set_pop", detail: "set was empty".to_owned() }),
    }
    expect_refcount!(rt, value, 1);

    let empty = rt.set_pop(&container).step("set_pop")?;
    expect_true("set_pop", empty.is_none(), || "popped from an empty set".to_owned())?;

    rt.decref(container);
    rt.decref(value);
    Ok(())
}
