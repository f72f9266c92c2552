use refsteal::{ErrorKind, ExcType, Runtime, SetDefault};

#[test]
fn set_item_borrows_key_and_value() {
    let mut rt = Runtime::new();
    let dict = rt.dict_new().unwrap();
    let key = rt.new_probe("key").unwrap();
    let value = rt.new_probe("value").unwrap();

    rt.dict_set_item(&dict, &key, &value).unwrap();
    assert_eq!(rt.refcount(&key), 2);
    assert_eq!(rt.refcount(&value), 2);
    assert_eq!(rt.len(&dict), 1);

    rt.decref(dict);
    assert_eq!(rt.refcount(&key), 1);
    assert_eq!(rt.refcount(&value), 1);
    rt.decref(key);
    rt.decref(value);
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn replace_keeps_original_key() {
    let mut rt = Runtime::new();
    let dict = rt.dict_new().unwrap();
    let key = rt.new_str("k").unwrap();
    let equal_key = rt.new_str("k").unwrap();
    let first = rt.new_probe("first").unwrap();
    let second = rt.new_probe("second").unwrap();

    rt.dict_set_item(&dict, &key, &first).unwrap();
    rt.dict_set_item(&dict, &equal_key, &second).unwrap();
    assert_eq!(rt.len(&dict), 1);
    assert_eq!(rt.refcount(&key), 2);
    assert_eq!(rt.refcount(&equal_key), 1);
    assert_eq!(rt.refcount(&first), 1);
    assert_eq!(rt.refcount(&second), 2);
    assert_eq!(rt.dict_get_item(&dict, &key).unwrap(), Some(second.id()));

    rt.decref(dict);
    for r in [key, equal_key, first, second] {
        assert_eq!(rt.refcount(&r), 1);
        rt.decref(r);
    }
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn set_item_same_value_twice_is_neutral() {
    let mut rt = Runtime::new();
    let dict = rt.dict_new().unwrap();
    let key = rt.new_probe("key").unwrap();
    let value = rt.new_probe("value").unwrap();

    rt.dict_set_item(&dict, &key, &value).unwrap();
    rt.dict_set_item(&dict, &key, &value).unwrap();
    assert_eq!(rt.refcount(&key), 2);
    assert_eq!(rt.refcount(&value), 2);

    rt.decref(dict);
    rt.decref(key);
    rt.decref(value);
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn set_item_errors_leave_counts_alone() {
    let mut rt = Runtime::new();
    let list = rt.list_new(0).unwrap();
    let key = rt.new_probe("key").unwrap();
    let value = rt.new_probe("value").unwrap();

    let err = rt.dict_set_item(&list, &key, &value).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(err.message(), "dict_set_item: bad argument to internal function");

    let dict = rt.dict_new().unwrap();
    let err = rt.dict_set_item(&dict, &list, &value).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unhashable);
    assert_eq!(err.exc_type(), ExcType::TypeError);
    assert_eq!(err.message(), "unhashable type: 'list'");
    assert_eq!(err.to_string(), "TypeError(\"unhashable type: 'list'\")");

    assert_eq!(rt.refcount(&list), 1);
    assert_eq!(rt.refcount(&key), 1);
    assert_eq!(rt.refcount(&value), 1);
    assert_eq!(rt.len(&dict), 0);

    for r in [list, key, value, dict] {
        rt.decref(r);
    }
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn tuple_keys_hash_by_content() {
    let mut rt = Runtime::new();
    let dict = rt.dict_new().unwrap();
    let a = rt.new_str("a").unwrap();
    let key = rt.tuple_build(&[&a]).unwrap();
    let equal_key = rt.tuple_build(&[&a]).unwrap();
    let value = rt.new_probe("value").unwrap();

    rt.dict_set_item(&dict, &key, &value).unwrap();
    assert_eq!(rt.dict_get_item(&dict, &equal_key).unwrap(), Some(value.id()));

    // a tuple with an empty slot cannot be hashed
    let holey = rt.tuple_new(1).unwrap();
    let err = rt.dict_set_item(&dict, &holey, &value).unwrap_err();
    assert_eq!(err.message(), "unhashable type: 'tuple'");

    for r in [dict, key, equal_key, holey, value, a] {
        rt.decref(r);
    }
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn get_item_is_borrowed_and_get_item_ref_is_new() {
    let mut rt = Runtime::new();
    let key = rt.new_probe("key").unwrap();
    let value = rt.new_probe("value").unwrap();
    let dict = rt.dict_build(&[(&key, &value)]).unwrap();

    assert_eq!(rt.dict_get_item(&dict, &key).unwrap(), Some(value.id()));
    assert_eq!(rt.refcount(&value), 2);

    let held = rt.dict_get_item_ref(&dict, &key).unwrap().unwrap();
    assert!(held.is(&value));
    assert_eq!(rt.refcount(&value), 3);
    rt.decref(held);

    let missing = rt.new_probe("missing").unwrap();
    assert_eq!(rt.dict_get_item(&dict, &missing).unwrap(), None);
    assert!(rt.dict_get_item_ref(&dict, &missing).unwrap().is_none());

    for r in [dict, key, value, missing] {
        rt.decref(r);
    }
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn set_default_inserts_once() {
    let mut rt = Runtime::new();
    let dict = rt.dict_new().unwrap();
    let key = rt.new_probe("key").unwrap();
    let default = rt.new_probe("default").unwrap();
    let other = rt.new_probe("other").unwrap();

    let got = rt.dict_set_default(&dict, &key, &default).unwrap();
    assert_eq!(got, default.id());
    assert_eq!(rt.refcount(&key), 2);
    assert_eq!(rt.refcount(&default), 2);

    let got = rt.dict_set_default(&dict, &key, &other).unwrap();
    assert_eq!(got, default.id());
    assert_eq!(rt.refcount(&default), 2);
    assert_eq!(rt.refcount(&other), 1);

    for r in [dict, key, default, other] {
        rt.decref(r);
    }
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn set_default_ref_returns_new_reference() {
    let mut rt = Runtime::new();
    let dict = rt.dict_new().unwrap();
    let key = rt.new_probe("key").unwrap();
    let default = rt.new_probe("default").unwrap();

    let (state, got) = rt.dict_set_default_ref(&dict, &key, &default).unwrap();
    assert_eq!(state, SetDefault::Inserted);
    assert!(got.is(&default));
    assert_eq!(rt.refcount(&default), 3);
    rt.decref(got);

    let (state, got) = rt.dict_set_default_ref(&dict, &key, &default).unwrap();
    assert_eq!(state, SetDefault::Present);
    assert_eq!(rt.refcount(&default), 3);
    rt.decref(got);
    assert_eq!(rt.refcount(&default), 2);

    let err = rt.dict_set_default_ref(&key, &key, &default).unwrap_err();
    assert_eq!(err.message(), "dict_set_default_ref: bad argument to internal function");

    for r in [dict, key, default] {
        rt.decref(r);
    }
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn pop_transfers_value_and_releases_key() {
    let mut rt = Runtime::new();
    let key = rt.new_probe("key").unwrap();
    let value = rt.new_probe("value").unwrap();
    let dict = rt.dict_build(&[(&key, &value)]).unwrap();
    assert_eq!(rt.refcount(&key), 2);

    let popped = rt.dict_pop(&dict, &key).unwrap().unwrap();
    assert!(popped.is(&value));
    assert_eq!(rt.refcount(&key), 1);
    assert_eq!(rt.refcount(&value), 2);
    assert_eq!(rt.len(&dict), 0);
    rt.decref(popped);

    assert!(rt.dict_pop(&dict, &key).unwrap().is_none());
    assert_eq!(rt.refcount(&value), 1);

    for r in [dict, key, value] {
        rt.decref(r);
    }
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn build_later_pairs_win() {
    let mut rt = Runtime::new();
    let key = rt.new_str("k").unwrap();
    let first = rt.new_str("first").unwrap();
    let second = rt.new_str("second").unwrap();

    let dict = rt.dict_build(&[(&key, &first), (&key, &second)]).unwrap();
    assert_eq!(rt.repr(&dict), "{'k': 'second'}");
    assert_eq!(rt.refcount(&first), 1);

    let list = rt.list_new(0).unwrap();
    let err = rt.dict_build(&[(&key, &first), (&list, &second)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unhashable);
    assert_eq!(rt.refcount(&key), 2);
    assert_eq!(rt.refcount(&first), 1);
    assert_eq!(rt.live_objects(), 5);

    for r in [dict, key, first, second, list] {
        rt.decref(r);
    }
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn self_referencing_tuple_is_unhashable() {
    let mut rt = Runtime::new();
    let dict = rt.dict_new().unwrap();
    let value = rt.new_probe("value").unwrap();
    let tuple = rt.tuple_new(1).unwrap();
    let inner = rt.incref(&tuple);
    rt.tuple_set_item(&tuple, 0, inner).unwrap();
    assert_eq!(rt.refcount(&tuple), 2);

    let err = rt.dict_set_item(&dict, &tuple, &value).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unhashable);
    assert_eq!(err.message(), "unhashable type: 'tuple'");
    assert!(rt.is_empty(&dict));
    assert_eq!(rt.refcount(&tuple), 2);
    assert_eq!(rt.refcount(&value), 1);

    let set = rt.set_new().unwrap();
    let err = rt.set_add(&set, &tuple).unwrap_err();
    assert_eq!(err.message(), "unhashable type: 'tuple'");

    // a tuple nesting the cyclic one is unhashable too
    let outer = rt.tuple_build(&[&tuple]).unwrap();
    let err = rt.dict_set_item(&dict, &outer, &value).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unhashable);

    rt.tuple_clear_item(&tuple, 0).unwrap();
    for r in [dict, value, set, outer, tuple] {
        rt.decref(r);
    }
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn stored_key_holding_the_dict_compares_unequal() {
    let mut rt = Runtime::new();
    let dict = rt.dict_new().unwrap();
    let a = rt.new_str("a").unwrap();
    let value = rt.new_probe("value").unwrap();
    let key = rt.tuple_build(&[&a]).unwrap();
    rt.dict_set_item(&dict, &key, &value).unwrap();

    // the stored key keeps its old hash but now holds the dict itself
    let dict_ref = rt.incref(&dict);
    rt.tuple_set_item(&key, 0, dict_ref).unwrap();
    assert_eq!(rt.refcount(&a), 1);
    assert_eq!(rt.refcount(&dict), 2);

    let same_hash = rt.tuple_build(&[&a]).unwrap();
    rt.dict_set_item(&dict, &same_hash, &value).unwrap();
    assert_eq!(rt.len(&dict), 2);
    assert_eq!(rt.refcount(&same_hash), 2);
    assert_eq!(rt.refcount(&value), 3);

    let popped = rt.dict_pop(&dict, &same_hash).unwrap().unwrap();
    assert!(popped.is(&value));
    rt.decref(popped);
    assert_eq!(rt.refcount(&same_hash), 1);
    assert!(rt.dict_pop(&dict, &same_hash).unwrap().is_none());
    assert_eq!(rt.len(&dict), 1);

    rt.tuple_clear_item(&key, 0).unwrap();
    assert_eq!(rt.refcount(&dict), 1);
    for r in [dict, key, same_hash, value, a] {
        rt.decref(r);
    }
    assert_eq!(rt.live_objects(), 0);
}
