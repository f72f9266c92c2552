pub mod exceptions;
pub mod harness;
pub mod heap;
pub mod logging;
mod mutation;
pub mod resource;
mod runtime;
mod value;
pub mod values;

pub use crate::exceptions::{ErrorKind, ExcType, RefError, RefResult, StealError};
pub use crate::harness::{Expect, Harness, HarnessConfig, MessageMatch, Report, ScenarioError};
pub use crate::heap::{Heap, HeapData, HeapId};
pub use crate::mutation::SetDefault;
pub use crate::resource::{LimitedTracker, NoLimitTracker, ResourceError, ResourceLimits, ResourceTracker};
pub use crate::runtime::Runtime;
pub use crate::value::Ref;
