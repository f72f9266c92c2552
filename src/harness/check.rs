use crate::exceptions::{RefError, RefResult, StealError};
use crate::heap::HeapId;
use crate::harness::{ScenarioError, ScenarioResult};
use crate::resource::ResourceTracker;
use crate::runtime::Runtime;
use crate::value::Ref;

/// Asserts the refcount of `r`.
pub fn expect_count<T: ResourceTracker>(
    rt: &Runtime<T>,
    step: &'static str,
    r: &Ref,
    expected: usize,
) -> ScenarioResult {
    expect_count_of(rt, step, r.id(), expected)
}

/// Asserts the refcount of an object known only by id.
///
/// A freed object counts as zero instead of panicking.
pub fn expect_count_of<T: ResourceTracker>(
    rt: &Runtime<T>,
    step: &'static str,
    id: HeapId,
    expected: usize,
) -> ScenarioResult {
    let actual = if rt.is_live(id) { rt.refcount_of(id) } else { 0 };
    if actual == expected {
        Ok(())
    } else {
        tracing::warn!(step, expected, actual, "refcount mismatch");
        Err(ScenarioError::CountMismatch { step, expected, actual })
    }
}

/// Asserts the length of a container.
pub fn expect_len<T: ResourceTracker>(rt: &Runtime<T>, step: &'static str, r: &Ref, expected: usize) -> ScenarioResult {
    let len = rt.len(r);
    expect_true(step, len == expected, || format!("length {len}, expected {expected}"))
}

pub fn expect_true(step: &'static str, condition: bool, detail: impl FnOnce() -> String) -> ScenarioResult {
    if condition {
        Ok(())
    } else {
        Err(ScenarioError::Check { step, detail: detail() })
    }
}

/// Unwraps the error of an operation the scenario expects to fail.
pub fn expect_failure(step: &'static str, result: RefResult<()>) -> Result<RefError, ScenarioError> {
    match result {
        Ok(()) => Err(ScenarioError::MissingError { step }),
        Err(err) => Ok(err),
    }
}

/// Unwraps the error of a steal the scenario expects to fail; the value comes
/// back with it.
pub fn expect_steal_failure(step: &'static str, result: Result<(), StealError>) -> Result<StealError, ScenarioError> {
    match result {
        Ok(()) => Err(ScenarioError::MissingError { step }),
        Err(err) => Ok(err),
    }
}

/// Tags an operation's error with the scenario step it happened in.
pub trait Step<V> {
    /// # Errors
    /// Any operation error becomes `ScenarioError::Unexpected`.
    fn step(self, step: &'static str) -> Result<V, ScenarioError>;
}

impl<V> Step<V> for RefResult<V> {
    fn step(self, step: &'static str) -> Result<V, ScenarioError> {
        self.map_err(|error| ScenarioError::Unexpected { step, error })
    }
}

impl<V> Step<V> for Result<V, StealError> {
    fn step(self, step: &'static str) -> Result<V, ScenarioError> {
        self.map_err(|err| {
            let (error, value) = err.into_parts();
            // the scenario is abandoned, so the handed-back value is leaked on purpose
            let leaked = value.leak();
            tracing::warn!(step, leaked, "abandoning value returned by a failed steal");
            ScenarioError::Unexpected { step, error }
        })
    }
}

/// Asserts a refcount inside a scenario, returning early on mismatch.
///
/// `expect_refcount!(rt, value, 2)` checks the `Ref` named `value`;
/// `expect_refcount!(rt, id value_id, 1)` checks an object known only by id.
#[macro_export]
macro_rules! expect_refcount {
    ($rt:expr, id $id:ident, $expected:expr) => {
        $crate::harness::expect_count_of(
            $rt,
            concat!(stringify!($id), " == ", stringify!($expected), " (line ", line!(), ")"),
            $id,
            $expected,
        )?
    };
    ($rt:expr, $r:ident, $expected:expr) => {
        $crate::harness::expect_count(
            $rt,
            concat!(stringify!($r), " == ", stringify!($expected), " (line ", line!(), ")"),
            &$r,
            $expected,
        )?
    };
}
