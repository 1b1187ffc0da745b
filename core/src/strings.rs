#![deny(missing_docs)]

//! # Interned String Pool
//!
//! Every textual identifier in the input metadata (names, packages, types,
//! tokens, tags, positions) is stored once in a flat table and referenced
//! everywhere else by a signed 1-based index. An index of zero or negative
//! means "absent"; the empty string is a legal interned value at a positive
//! index, so callers must not treat `""` itself as a sentinel.

use serde::{Deserialize, Serialize};

/// An index into a [`StringPool`]. Indices `<= 0` denote absence.
pub type StrIdx = i64;

/// Flat, append-only table of interned strings, 1-indexed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StringPool(Vec<String>);

impl StringPool {
    /// Builds a pool from an already-ordered list of strings (index 1 is
    /// `entries[0]`).
    pub fn new(entries: Vec<String>) -> Self {
        StringPool(entries)
    }

    /// Interns `s`, returning its 1-based index. Repeated calls with equal
    /// strings return distinct indices; the pool never deduplicates on
    /// insert, matching the producer's append-only contract.
    pub fn intern(&mut self, s: impl Into<String>) -> StrIdx {
        self.0.push(s.into());
        self.0.len() as StrIdx
    }

    /// Resolves `idx` to its string, or `""` when `idx <= 0` or out of
    /// range. Never panics.
    pub fn get(&self, idx: StrIdx) -> &str {
        if idx <= 0 {
            return "";
        }
        self.0.get((idx - 1) as usize).map(String::as_str).unwrap_or("")
    }

    /// Number of entries in the pool.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the pool holds no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_negative_are_absent() {
        let pool = StringPool::new(vec!["a".into(), "b".into()]);
        assert_eq!(pool.get(0), "");
        assert_eq!(pool.get(-5), "");
    }

    #[test]
    fn positive_index_resolves() {
        let pool = StringPool::new(vec!["first".into(), "second".into()]);
        assert_eq!(pool.get(1), "first");
        assert_eq!(pool.get(2), "second");
    }

    #[test]
    fn empty_string_is_a_legal_positive_entry() {
        let pool = StringPool::new(vec!["first".into(), "".into()]);
        assert_eq!(pool.get(2), "");
        assert_ne!(pool.get(2), pool.get(3)); // idx 3 is out of range => also "" but absent
    }

    #[test]
    fn out_of_range_is_absent_not_panic() {
        let pool = StringPool::new(vec!["only".into()]);
        assert_eq!(pool.get(99), "");
    }

    #[test]
    fn intern_appends_and_returns_index() {
        let mut pool = StringPool::default();
        let a = pool.intern("alpha");
        let b = pool.intern("beta");
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(pool.get(a), "alpha");
        assert_eq!(pool.get(b), "beta");
    }
}
