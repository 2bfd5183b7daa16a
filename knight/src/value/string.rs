//! Runtime string handles

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::num::NonZeroU32;
use std::sync::Arc;

use super::cache::Cache;

/// Compact identifier handed out to every interned string.
///
/// Tags are unique across every cache in the process, so one tag always
/// denotes one text. Within a single cache the converse holds too, and a tag
/// comparison stands in for a byte comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(NonZeroU32);

impl Tag {
    pub(crate) fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Tag)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// Identity of one string instance, used as a cache key by consumers that
/// must distinguish instances rather than contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Interned: one live instance per tag.
    Tag(Tag),
    /// Unique allocation, identified by address.
    Addr(usize),
}

struct Inner {
    text: Box<str>,
    tag: Option<Tag>,
    // Id of the cache that assigned `tag`; 0 when untagged.
    pool: u32,
}

/// Immutable, cheaply clonable runtime string.
///
/// Strings at or below the intern threshold are shared through the
/// process-wide [`Cache`] and carry a [`Tag`]; longer strings are unique
/// allocations without one.
#[derive(Clone)]
pub struct Str(Arc<Inner>);

impl Str {
    pub(crate) fn tagged(text: Box<str>, tag: Tag, pool: u32) -> Self {
        Str(Arc::new(Inner {
            text,
            tag: Some(tag),
            pool,
        }))
    }

    /// Build a string that is never interned and carries no tag.
    pub fn unique(text: impl Into<Box<str>>) -> Self {
        Str(Arc::new(Inner {
            text: text.into(),
            tag: None,
            pool: 0,
        }))
    }

    /// Build a string through the process-wide cache.
    pub fn new(text: &str) -> Self {
        Cache::global().string(text)
    }

    /// Like [`Str::new`] but reuses the allocation when the text is too long
    /// to intern.
    pub fn from_string(text: String) -> Self {
        Cache::global().owned_string(text)
    }

    /// Canonical decimal form of an integer.
    pub fn from_int(n: i64) -> Self {
        Cache::global().int_string(n)
    }

    /// Substring over the byte range `[start, end)`, memoized for tagged
    /// sources. `None` if the range is out of bounds or splits a character.
    pub fn substring(&self, start: usize, end: usize) -> Option<Str> {
        Cache::global().substring(self, start, end)
    }

    /// Concatenation, memoized when both sides are tagged.
    pub fn concat(&self, rhs: &Str) -> Str {
        Cache::global().concat(self, rhs)
    }

    pub fn as_str(&self) -> &str {
        &self.0.text
    }

    pub fn tag(&self) -> Option<Tag> {
        self.0.tag
    }

    pub fn len(&self) -> usize {
        self.0.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.text.is_empty()
    }

    pub fn identity(&self) -> Identity {
        match self.0.tag {
            Some(tag) => Identity::Tag(tag),
            None => Identity::Addr(Arc::as_ptr(&self.0) as usize),
        }
    }

    /// True when both handles denote the same instance.
    pub fn same(&self, other: &Str) -> bool {
        self.identity() == other.identity()
    }
}

impl PartialEq for Str {
    fn eq(&self, other: &Self) -> bool {
        match (self.0.tag, other.0.tag) {
            (Some(a), Some(b)) if a == b => true,
            // One cache never holds two tags for the same text.
            (Some(_), Some(_)) if self.0.pool == other.0.pool => false,
            _ => self.0.text == other.0.text,
        }
    }
}

impl Eq for Str {}

// Hashes the contents so that `Borrow<str>` lookups agree with `Eq`.
impl Hash for Str {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl Borrow<str> for Str {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.tag {
            Some(tag) => write!(f, "Str#{}({:?})", tag.get(), self.as_str()),
            None => write!(f, "Str({:?})", self.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_has_no_tag() {
        let s = Str::unique("foo");
        assert!(s.tag().is_none());
        assert!(matches!(s.identity(), Identity::Addr(_)));
    }

    #[test]
    fn test_equality_falls_back_to_contents() {
        let interned = Str::new("foo");
        let unique = Str::unique("foo");
        assert!(interned.tag().is_some());
        assert_eq!(interned, unique);
        assert!(!interned.same(&unique));
        assert_ne!(Str::unique("foo"), Str::unique("bar"));
    }

    #[test]
    fn test_same_instance_for_unique_clone() {
        let a = Str::unique("a long string that is unique");
        let b = a.clone();
        assert!(a.same(&b));
        assert!(!a.same(&Str::unique("a long string that is unique")));
    }

    #[test]
    fn test_display_and_debug() {
        assert_eq!(format!("{}", Str::unique("foo bar")), "foo bar");
        assert_eq!(format!("{:?}", Str::unique("foo")), "Str(\"foo\")");
    }
}
