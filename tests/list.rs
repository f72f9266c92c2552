use refsteal::{ErrorKind, Ref, Runtime};

/// Builds a list of `len` distinct string items `"0"`, `"1"`, ...
fn filled(rt: &mut Runtime, len: usize) -> Ref {
    let list = rt.list_new(0).unwrap();
    for i in 0..len {
        let item = rt.new_str(i.to_string()).unwrap();
        rt.list_append(&list, &item).unwrap();
        rt.decref(item);
    }
    list
}

macro_rules! insert_tests {
    ($($name:ident: $len:expr, $index:expr, $expected:literal;)*) => {
        $(
            paste::item! {
                #[test]
                fn [< insert_ $name >]() {
                    let mut rt = Runtime::new();
                    let list = filled(&mut rt, $len);
                    let value = rt.new_str("new").unwrap();

                    rt.list_insert(&list, $index, &value).unwrap();
                    assert_eq!(rt.refcount(&value), 2);
                    assert_eq!(rt.len(&list), $len + 1);
                    assert_eq!(rt.repr(&list), $expected);

                    rt.decref(list);
                    assert_eq!(rt.refcount(&value), 1);
                    rt.decref(value);
                    assert_eq!(rt.live_objects(), 0);
                }
            }
        )*
    }
}

insert_tests! {
    empty_front: 0, 0, "['new']";
    empty_past_end: 0, 4, "['new']";
    empty_negative: 0, -1, "['new']";
    front: 2, 0, "['new', '0', '1']";
    middle: 2, 1, "['0', 'new', '1']";
    past_end: 2, 10, "['0', '1', 'new']";
    negative_one: 2, -1, "['0', 'new', '1']";
    negative_past_front: 2, -10, "['new', '0', '1']";
}

#[test]
fn set_item_steals_and_replaces() {
    let mut rt = Runtime::new();
    let list = rt.list_new(1).unwrap();
    let first = rt.new_probe("first").unwrap();
    let first_id = first.id();

    rt.list_set_item(&list, 0, first).unwrap();
    assert_eq!(rt.refcount_of(first_id), 1);

    let second = rt.new_probe("second").unwrap();
    let keep = rt.incref(&second);
    rt.list_set_item(&list, 0, second).unwrap();
    assert!(!rt.is_live(first_id));
    assert_eq!(rt.refcount(&keep), 2);
    assert_eq!(rt.list_get_item(&list, 0).unwrap(), Some(keep.id()));

    rt.decref(list);
    assert_eq!(rt.refcount(&keep), 1);
    rt.decref(keep);
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn set_item_out_of_range() {
    let mut rt = Runtime::new();
    let list = rt.list_new(3).unwrap();
    let value = rt.new_probe("range").unwrap();

    let err = rt.list_set_item(&list, 5, value).unwrap_err();
    assert_eq!(err.error.kind(), ErrorKind::IndexOutOfRange);
    assert_eq!(err.error.message(), "list assignment index out of range");
    assert_eq!(rt.refcount(&err.value), 1);

    rt.decref(err.value);
    rt.decref(list);
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn set_item_on_a_tuple() {
    let mut rt = Runtime::new();
    let tuple = rt.tuple_new(1).unwrap();
    let value = rt.new_probe("kind").unwrap();

    let (error, value) = rt.list_set_item(&tuple, 0, value).unwrap_err().into_parts();
    assert_eq!(error.kind(), ErrorKind::TypeMismatch);
    assert_eq!(error.message(), "list_set_item: bad argument to internal function");
    assert_eq!(rt.refcount(&value), 1);

    rt.decref(value);
    rt.decref(tuple);
}

#[test]
fn append_and_insert_reject_non_lists() {
    let mut rt = Runtime::new();
    let tuple = rt.tuple_new(1).unwrap();
    let value = rt.new_probe("kind").unwrap();

    let err = rt.list_append(&tuple, &value).unwrap_err();
    assert_eq!(err.message(), "list_append: bad argument to internal function");
    let err = rt.list_insert(&tuple, 0, &value).unwrap_err();
    assert_eq!(err.message(), "list_insert: bad argument to internal function");
    assert_eq!(rt.refcount(&value), 1);
    assert_eq!(rt.len(&tuple), 1);

    rt.decref(value);
    rt.decref(tuple);
}

#[test]
fn append_same_object_twice() {
    let mut rt = Runtime::new();
    let list = rt.list_new(0).unwrap();
    let value = rt.new_probe("twice").unwrap();

    rt.list_append(&list, &value).unwrap();
    rt.list_append(&list, &value).unwrap();
    assert_eq!(rt.refcount(&value), 3);

    rt.list_clear_item(&list, 0).unwrap();
    assert_eq!(rt.refcount(&value), 2);
    assert_eq!(rt.len(&list), 2);

    rt.decref(list);
    assert_eq!(rt.refcount(&value), 1);
    rt.decref(value);
}

#[test]
fn unchecked_set_leaks_and_clear_leaks() {
    let mut rt = Runtime::new();
    let list = rt.list_new(1).unwrap();
    let first = rt.new_probe("first").unwrap();
    let first_id = first.id();
    let second = rt.new_probe("second").unwrap();
    let second_id = second.id();

    unsafe {
        rt.list_set_item_unchecked(&list, 0, first);
        rt.list_set_item_unchecked(&list, 0, second);
        rt.list_clear_item_unchecked(&list, 0);
    }
    assert_eq!(rt.list_get_item(&list, 0).unwrap(), None);
    assert_eq!(rt.refcount_of(first_id), 1);
    assert_eq!(rt.refcount_of(second_id), 1);

    rt.decref(list);
    rt.decref_id(first_id);
    rt.decref_id(second_id);
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn build_borrows_every_item() {
    let mut rt = Runtime::new();
    let a = rt.new_probe("a").unwrap();
    let b = rt.new_probe("b").unwrap();

    let list = rt.list_build(&[&a, &b, &a]).unwrap();
    assert_eq!(rt.refcount(&a), 3);
    assert_eq!(rt.refcount(&b), 2);
    assert_eq!(rt.list_get_item(&list, 2).unwrap(), Some(a.id()));
    assert_eq!(rt.list_get_item(&list, 3).unwrap_err().message(), "list index out of range");

    rt.decref(list);
    assert_eq!(rt.refcount(&a), 1);
    assert_eq!(rt.refcount(&b), 1);
    rt.decref(a);
    rt.decref(b);
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn self_referencing_list_repr_and_free() {
    let mut rt = Runtime::new();
    let list = rt.list_new(0).unwrap();
    rt.list_append(&list, &list).unwrap();
    assert_eq!(rt.refcount(&list), 2);
    assert_eq!(rt.repr(&list), "[[...]]");

    rt.list_clear_item(&list, 0).unwrap();
    assert_eq!(rt.refcount(&list), 1);
    rt.decref(list);
    assert_eq!(rt.live_objects(), 0);
}
