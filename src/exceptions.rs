use std::borrow::Cow;
use std::fmt;

use strum::{Display, EnumString, IntoStaticStr};

use crate::resource::ResourceError;
use crate::value::Ref;
use crate::values::str::string_repr_fmt;

/// The host-runtime exception class an error surfaces as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
pub enum ExcType {
    SystemError,
    IndexError,
    TypeError,
    MemoryError,
}

/// Classification of every failure a mutation operation can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The target is not the container kind the operation expects.
    TypeMismatch,
    /// A checked operation received an index outside `[0, len)`.
    IndexOutOfRange,
    /// A dict key or set member cannot be hashed.
    Unhashable,
    /// Allocation was refused by the heap's resource tracker.
    ResourceExhausted,
}

impl ErrorKind {
    #[must_use]
    pub fn exc_type(self) -> ExcType {
        match self {
            Self::TypeMismatch => ExcType::SystemError,
            Self::IndexOutOfRange => ExcType::IndexError,
            Self::Unhashable => ExcType::TypeError,
            Self::ResourceExhausted => ExcType::MemoryError,
        }
    }
}

/// A recoverable error raised by a checked operation.
///
/// The message strings are part of the external contract and are reproduced
/// byte for byte, e.g. `"tuple assignment index out of range"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefError {
    kind: ErrorKind,
    message: Cow<'static, str>,
}

pub type RefResult<T> = Result<T, RefError>;

impl RefError {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The target of `func` was not the container kind it operates on.
    pub(crate) fn bad_internal_call(func: &'static str) -> Self {
        Self::new(
            ErrorKind::TypeMismatch,
            format!("{func}: bad argument to internal function"),
        )
    }

    pub(crate) fn assignment_index_error(container: &'static str) -> Self {
        Self::new(
            ErrorKind::IndexOutOfRange,
            format!("{container} assignment index out of range"),
        )
    }

    pub(crate) fn index_error(container: &'static str) -> Self {
        Self::new(ErrorKind::IndexOutOfRange, format!("{container} index out of range"))
    }

    pub(crate) fn unhashable(type_name: &'static str) -> Self {
        Self::new(ErrorKind::Unhashable, format!("unhashable type: '{type_name}'"))
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn exc_type(&self) -> ExcType {
        self.kind.exc_type()
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Formats like the host's exception repr, e.g. `IndexError('tuple assignment index out of range')`.
impl fmt::Display for RefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.exc_type())?;
        string_repr_fmt(&self.message, f)?;
        write!(f, ")")
    }
}

impl std::error::Error for RefError {}

impl From<ResourceError> for RefError {
    fn from(err: ResourceError) -> Self {
        Self::new(ErrorKind::ResourceExhausted, err.to_string())
    }
}

/// Failure of a stealing operation.
///
/// A checked set validates before it mutates, so on failure the steal never
/// happened: the reference is handed back here, its count unchanged, and the
/// caller still owns it.
#[derive(Debug)]
pub struct StealError {
    pub error: RefError,
    pub value: Ref,
}

impl StealError {
    pub(crate) fn new(error: RefError, value: Ref) -> Self {
        Self { error, value }
    }

    #[must_use]
    pub fn into_parts(self) -> (RefError, Ref) {
        (self.error, self.value)
    }
}

impl fmt::Display for StealError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for StealError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
