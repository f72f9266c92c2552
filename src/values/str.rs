//! Python string type, the payload carried by probe objects.
use std::fmt::Write;

use ahash::AHashSet;

use crate::heap::{Heap, HeapId};
use crate::resource::ResourceTracker;
use crate::values::PyTrait;

/// Python string value stored on the heap.
///
/// Strings hold no references, are hashable and compare by content, which makes
/// them the natural dict key and set member.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Str(String);

impl Str {
    #[must_use]
    pub fn new(s: String) -> Self {
        Self(s)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Str {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Str {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl PyTrait for Str {
    fn py_type(&self) -> &'static str {
        "str"
    }

    fn py_estimate_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.0.len()
    }

    fn py_len(&self) -> usize {
        // codepoints, not bytes
        self.0.chars().count()
    }

    fn py_dec_ref_ids(&mut self, _stack: &mut Vec<HeapId>) {}

    fn py_repr_fmt<W: Write, T: ResourceTracker>(
        &self,
        f: &mut W,
        _heap: &Heap<T>,
        _heap_ids: &mut AHashSet<HeapId>,
    ) -> std::fmt::Result {
        string_repr_fmt(&self.0, f)
    }
}

/// Writes the Python repr of a string.
///
/// Uses double quotes when the string contains single quotes but no double quotes,
/// otherwise single quotes with any single quote escaped.
pub fn string_repr_fmt<W: Write>(s: &str, f: &mut W) -> std::fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    f.write_char(quote)?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c if c == quote => {
                f.write_char('\\')?;
                f.write_char(c)?;
            }
            _ => f.write_char(c)?,
        }
    }
    f.write_char(quote)
}

#[must_use]
pub fn string_repr(s: &str) -> String {
    let mut result = String::new();
    // writing to a String cannot fail
    let _ = string_repr_fmt(s, &mut result);
    result
}

#[cfg(test)]
mod tests {
    use super::string_repr;

    #[test]
    fn repr_quotes() {
        assert_eq!(string_repr("abc"), "'abc'");
        assert_eq!(string_repr("it's"), "\"it's\"");
        assert_eq!(string_repr("a'b\"c"), "'a\\'b\"c'");
        assert_eq!(string_repr("line\n"), "'line\\n'");
    }
}
