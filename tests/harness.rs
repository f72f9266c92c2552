use refsteal::harness::{Container, Outcome};
use refsteal::{ErrorKind, Expect, Harness, HarnessConfig, ResourceLimits, ScenarioError};

macro_rules! balanced_tests {
    ($($name:ident;)*) => {
        $(
            paste::item! {
                #[test]
                fn [< balanced_ $name >]() {
                    let harness = Harness::default();
                    match harness.call(stringify!($name)) {
                        Ok(code) => assert_eq!(code, 0),
                        Err(e) => panic!("{} failed: {e}", stringify!($name)),
                    }
                }
            }
        )*
    }
}

balanced_tests! {
    tuple_steals;
    tuple_buildvalue_steals;
    tuple_set_item_steals;
    tuple_set_item_unchecked_steals;
    tuple_set_item_steals_replace;
    tuple_set_item_unchecked_steals_replace;
    tuple_set_item_replace_with_same;
    tuple_set_item_unchecked_replace_with_same;
    tuple_set_item_null;
    tuple_set_item_unchecked_null;
    tuple_set_item_null_set_item;
    tuple_set_item_unchecked_null_set_item;
    tuple_pack;
    tuple_build;
    list_steals;
    list_buildvalue_steals;
    list_set_item_steals;
    list_set_item_unchecked_steals;
    list_set_item_steals_replace;
    list_set_item_unchecked_steals_replace;
    list_set_item_replace_with_same;
    list_set_item_unchecked_replace_with_same;
    list_set_item_null;
    list_set_item_unchecked_null;
    list_set_item_null_set_item;
    list_set_item_unchecked_null_set_item;
    list_append;
    list_insert;
    list_insert_is_truncated;
    list_insert_negative_index;
    list_build;
    dict_no_steals;
    dict_no_steals_decref_after_set;
    dict_buildvalue_no_steals;
    dict_set_item_increments;
    dict_set_default_default_unused;
    dict_set_default_default_used;
    dict_set_default_ref_default_unused;
    dict_set_default_ref_default_used;
    dict_get_item;
    dict_pop_key_present;
    dict_pop_key_absent;
    set_no_steals;
    set_no_steals_decref;
    set_add;
    set_discard;
    set_pop;
}

macro_rules! raises_tests {
    ($($name:ident: $kind:ident, $message:literal;)*) => {
        $(
            paste::item! {
                #[test]
                fn [< raises_ $name >]() {
                    let harness = Harness::default();
                    match harness.call(stringify!($name)) {
                        Err(ScenarioError::Raised(err)) => {
                            assert_eq!(err.kind(), ErrorKind::$kind);
                            assert_eq!(err.message(), $message);
                        }
                        otherwise => panic!("{} should have raised, got {otherwise:?}", stringify!($name)),
                    }
                }
            }
        )*
    }
}

raises_tests! {
    tuple_set_item_fails_not_a_tuple: TypeMismatch, "tuple_set_item: bad argument to internal function";
    tuple_set_item_fails_out_of_range: IndexOutOfRange, "tuple assignment index out of range";
    list_set_item_fails_not_a_list: TypeMismatch, "list_set_item: bad argument to internal function";
    list_set_item_fails_out_of_range: IndexOutOfRange, "list assignment index out of range";
    list_append_fails_not_a_list: TypeMismatch, "list_append: bad argument to internal function";
    list_insert_fails_not_a_list: TypeMismatch, "list_insert: bad argument to internal function";
    dict_set_item_fails_not_a_dict: TypeMismatch, "dict_set_item: bad argument to internal function";
    dict_set_item_fails_not_hashable: Unhashable, "unhashable type: 'list'";
    set_add_fails_not_a_set: TypeMismatch, "set_add: bad argument to internal function";
}

#[test]
fn every_scenario_meets_its_expectation() {
    let report = Harness::default().run_all();
    let failures: Vec<_> = report.failures().map(|f| format!("{}: {:?}", f.name, f.detail)).collect();
    assert!(failures.is_empty(), "failed scenarios: {failures:#?}");
    assert_eq!(report.passed(), Harness::default().scenarios().len());
}

#[test]
fn names_are_unique_and_sorted() {
    let harness = Harness::default();
    let names = harness.names();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(names, sorted);
    assert!(names.len() >= 56);
}

#[test]
fn every_container_is_covered() {
    let harness = Harness::default();
    for container in [Container::Tuple, Container::List, Container::Dict, Container::Set] {
        assert!(
            harness.scenarios().iter().any(|s| s.container == container),
            "no scenarios for {container}"
        );
    }
}

#[test]
fn unknown_scenario() {
    let harness = Harness::default();
    let err = harness.call("no_such_scenario").unwrap_err();
    assert!(matches!(err, ScenarioError::UnknownScenario(ref name) if name == "no_such_scenario"));
    assert_eq!(err.to_string(), "no scenario named \"no_such_scenario\"");
}

#[test]
fn filter_selects_by_substring() {
    let harness = Harness::new(HarnessConfig {
        filter: Some("dict_pop".to_owned()),
        ..HarnessConfig::default()
    });
    let report = harness.run();
    let names: Vec<_> = report.scenarios.iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["dict_pop_key_absent", "dict_pop_key_present"]);
    assert!(report.all_passed());
    assert_eq!(report.to_string().lines().last(), Some("2 passed, 0 failed"));
}

#[test]
fn limits_fail_scenarios_without_panicking() {
    let harness = Harness::new(HarnessConfig {
        filter: Some("tuple_".to_owned()),
        fail_fast: false,
        limits: ResourceLimits::new().max_allocations(1),
    });
    let report = harness.run();
    assert!(!report.all_passed());
    let failure = report.failures().next().unwrap();
    assert_eq!(failure.outcome, Outcome::Failed);
    assert!(failure.detail.as_deref().unwrap().contains("allocation limit exceeded"));
}

#[test]
fn fail_fast_stops_at_first_failure() {
    let harness = Harness::new(HarnessConfig {
        filter: None,
        fail_fast: true,
        limits: ResourceLimits::new().max_allocations(1),
    });
    let report = harness.run();
    assert_eq!(report.scenarios.len(), 1);
    assert_eq!(report.failed(), 1);
}

#[test]
fn judge_compares_kind_and_message() {
    let harness = Harness::default();
    let scenario = harness.get("tuple_set_item_fails_out_of_range").unwrap();
    let result = harness.execute(scenario);
    assert!(scenario.expect.judge(&result).is_ok());
    assert!(Expect::Balanced.judge(&result).is_err());
    assert!(Expect::index_error("list assignment index out of range").judge(&result).is_err());
    assert!(Expect::bad_internal_call().judge(&result).is_err());
}

#[test]
fn report_json() {
    let report = Harness::default().run_matching("set_pop");
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["scenarios"][0]["name"], "set_pop");
    assert_eq!(json["scenarios"][0]["container"], "set");
    assert_eq!(json["scenarios"][0]["outcome"], "passed");
    assert!(json["scenarios"][0].get("detail").is_none());
}

#[test]
fn config_from_json() {
    let config: HarnessConfig =
        serde_json::from_str(r#"{"filter": "list_", "limits": {"max_allocations": 10}}"#).unwrap();
    assert_eq!(config.filter.as_deref(), Some("list_"));
    assert!(!config.fail_fast);
    assert_eq!(config.limits, ResourceLimits::new().max_allocations(10));
}
