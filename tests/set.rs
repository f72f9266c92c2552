use refsteal::{ErrorKind, Runtime};

#[test]
fn add_borrows_and_free_releases() {
    let mut rt = Runtime::new();
    let set = rt.set_new().unwrap();
    let value = rt.new_probe("member").unwrap();

    rt.set_add(&set, &value).unwrap();
    assert_eq!(rt.refcount(&value), 2);
    assert!(rt.set_contains(&set, &value).unwrap());

    rt.decref(set);
    assert_eq!(rt.refcount(&value), 1);
    rt.decref(value);
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn add_existing_member_is_count_neutral() {
    let mut rt = Runtime::new();
    let set = rt.set_new().unwrap();
    let value = rt.new_str("x").unwrap();
    let equal = rt.new_str("x").unwrap();

    rt.set_add(&set, &value).unwrap();
    rt.set_add(&set, &value).unwrap();
    rt.set_add(&set, &equal).unwrap();
    assert_eq!(rt.len(&set), 1);
    assert_eq!(rt.refcount(&value), 2);
    assert_eq!(rt.refcount(&equal), 1);
    assert!(rt.set_contains(&set, &equal).unwrap());
    assert_eq!(rt.repr(&set), "{'x'}");

    for r in [set, value, equal] {
        rt.decref(r);
    }
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn errors() {
    let mut rt = Runtime::new();
    let dict = rt.dict_new().unwrap();
    let set = rt.set_new().unwrap();
    let value = rt.new_probe("member").unwrap();

    let err = rt.set_add(&dict, &value).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(err.message(), "set_add: bad argument to internal function");

    let err = rt.set_add(&set, &dict).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unhashable);
    assert_eq!(err.message(), "unhashable type: 'dict'");

    let err = rt.set_pop(&dict).unwrap_err();
    assert_eq!(err.message(), "set_pop: bad argument to internal function");
    let err = rt.set_discard(&set, &set).unwrap_err();
    assert_eq!(err.message(), "unhashable type: 'set'");

    assert_eq!(rt.refcount(&value), 1);
    assert_eq!(rt.refcount(&dict), 1);
    for r in [dict, set, value] {
        rt.decref(r);
    }
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn discard_releases_membership() {
    let mut rt = Runtime::new();
    let value = rt.new_probe("member").unwrap();
    let set = rt.set_build(&[&value]).unwrap();
    assert_eq!(rt.refcount(&value), 2);

    assert!(rt.set_discard(&set, &value).unwrap());
    assert_eq!(rt.refcount(&value), 1);
    assert!(!rt.set_discard(&set, &value).unwrap());
    assert!(!rt.set_contains(&set, &value).unwrap());
    assert_eq!(rt.repr(&set), "set()");

    rt.decref(set);
    rt.decref(value);
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn pop_transfers_ownership() {
    let mut rt = Runtime::new();
    let a = rt.new_probe("a").unwrap();
    let b = rt.new_probe("b").unwrap();
    let set = rt.set_build(&[&a, &b, &a]).unwrap();
    assert_eq!(rt.len(&set), 2);

    let first = rt.set_pop(&set).unwrap().unwrap();
    let second = rt.set_pop(&set).unwrap().unwrap();
    assert!(rt.set_pop(&set).unwrap().is_none());
    assert!(first.is(&a) || first.is(&b));
    assert!(!first.is(&second));
    assert_eq!(rt.refcount(&a), 2);
    assert_eq!(rt.refcount(&b), 2);

    for r in [first, second, set, a, b] {
        rt.decref(r);
    }
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn build_failure_releases_partial_set() {
    let mut rt = Runtime::new();
    let a = rt.new_probe("a").unwrap();
    let list = rt.list_new(0).unwrap();

    let err = rt.set_build(&[&a, &list]).unwrap_err();
    assert_eq!(err.message(), "unhashable type: 'list'");
    assert_eq!(rt.refcount(&a), 1);
    assert_eq!(rt.live_objects(), 2);

    rt.decref(a);
    rt.decref(list);
}

#[test]
fn stored_member_holding_the_set_compares_unequal() {
    let mut rt = Runtime::new();
    let set = rt.set_new().unwrap();
    let a = rt.new_str("a").unwrap();
    let member = rt.tuple_build(&[&a]).unwrap();
    rt.set_add(&set, &member).unwrap();

    let set_ref = rt.incref(&set);
    rt.tuple_set_item(&member, 0, set_ref).unwrap();

    let same_hash = rt.tuple_build(&[&a]).unwrap();
    assert!(!rt.set_discard(&set, &same_hash).unwrap());
    assert!(!rt.set_contains(&set, &same_hash).unwrap());
    rt.set_add(&set, &same_hash).unwrap();
    assert_eq!(rt.len(&set), 2);
    assert!(rt.set_discard(&set, &same_hash).unwrap());
    assert_eq!(rt.refcount(&same_hash), 1);

    rt.tuple_clear_item(&member, 0).unwrap();
    assert_eq!(rt.refcount(&set), 1);
    for r in [set, member, same_hash, a] {
        rt.decref(r);
    }
    assert_eq!(rt.live_objects(), 0);
}
