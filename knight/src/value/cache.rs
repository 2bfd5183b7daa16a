//! Interning and memoization pools
//!
//! One [`Cache`] serves the whole process. It interns short strings (handing
//! each new one a sequential [`Tag`]), memoizes substrings and concatenations
//! of tagged strings by tag, and keeps the canonical decimal form of every
//! integer it has been asked to print. Nothing is ever evicted.

use std::sync::LazyLock;
use std::sync::atomic::{AtomicU32, Ordering};

use rustc_hash::{FxHashMap, FxHashSet};

use super::string::{Str, Tag};
use super::sync::{Active, Guarded, Strategy};

/// Longest string, in bytes, that is interned.
pub const MAX_INTERN_STRING_LENGTH: usize = 32;

/// Smallest integer in the pre-warmed range.
pub const MIN_INTERN_INT: i64 = -10;

/// Largest integer in the pre-warmed range.
pub const MAX_INTERN_INT: i64 = u8::MAX as i64;

/// Limits for a [`Cache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// Strings longer than this are built uniquely, without a tag.
    pub max_string_len: usize,
    /// Inclusive integer range whose string forms are built up front.
    pub min_int: i64,
    pub max_int: i64,
}

impl Default for CacheOptions {
    fn default() -> Self {
        CacheOptions {
            max_string_len: MAX_INTERN_STRING_LENGTH,
            min_int: MIN_INTERN_INT,
            max_int: MAX_INTERN_INT,
        }
    }
}

// Shared by every cache, so a tag never names two different texts and the
// tag-keyed memos stay sound for strings from any cache.
static NEXT_TAG: AtomicU32 = AtomicU32::new(1);
static NEXT_POOL: AtomicU32 = AtomicU32::new(1);

/// Next process-wide tag, or `None` once the counter is exhausted.
fn next_tag() -> Option<Tag> {
    NEXT_TAG
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_add(1))
        .ok()
        .and_then(Tag::new)
}

struct StringPool {
    data: FxHashSet<Str>,
    id: u32,
}

impl StringPool {
    fn new() -> Self {
        StringPool {
            data: FxHashSet::default(),
            id: NEXT_POOL.fetch_add(1, Ordering::Relaxed),
        }
    }

    fn intern(&mut self, text: &str) -> Str {
        if let Some(s) = self.data.get(text) {
            return s.clone();
        }
        // Out of tags: keep working, just without interning.
        let Some(tag) = next_tag() else {
            return Str::unique(text);
        };
        let s = Str::tagged(text.into(), tag, self.id);
        self.data.insert(s.clone());
        s
    }
}

/// Pack a substring request into one key.
///
/// `None` when a bound does not fit in 16 bits.
fn substring_key(tag: Tag, start: usize, end: usize) -> Option<u64> {
    let start = u16::try_from(start).ok()?;
    let end = u16::try_from(end).ok()?;
    Some(u64::from(tag.get()) << 32 | u64::from(start) << 16 | u64::from(end))
}

// Tags are 32 bits wide, so a pair always packs.
fn concat_key(lhs: Tag, rhs: Tag) -> u64 {
    u64::from(lhs.get()) << 32 | u64::from(rhs.get())
}

/// The interning/caching service.
pub struct Cache<S: Strategy = Active> {
    options: CacheOptions,
    strings: S::Cell<StringPool>,
    substrings: S::Cell<FxHashMap<u64, Str>>,
    substrings_slow: S::Cell<FxHashMap<Tag, FxHashMap<(usize, usize), Str>>>,
    concats: S::Cell<FxHashMap<u64, Str>>,
    int_strings: S::Cell<FxHashMap<i64, Str>>,
    empty: Str,
    null: Str,
    true_: Str,
    false_: Str,
}

static GLOBAL: LazyLock<Cache> = LazyLock::new(Cache::new);

impl Cache {
    /// The process-wide cache every runtime value is built through.
    pub fn global() -> &'static Cache {
        &GLOBAL
    }
}

impl<S: Strategy> Cache<S> {
    pub fn new() -> Self {
        Self::with_options(CacheOptions::default())
    }

    pub fn with_options(options: CacheOptions) -> Self {
        let mut pool = StringPool::new();
        let empty = pool.intern("");
        let null = pool.intern("null");
        let true_ = pool.intern("true");
        let false_ = pool.intern("false");

        Cache {
            options,
            strings: Guarded::new(pool),
            substrings: Guarded::new(FxHashMap::default()),
            substrings_slow: Guarded::new(FxHashMap::default()),
            concats: Guarded::new(FxHashMap::default()),
            int_strings: Guarded::new(FxHashMap::default()),
            empty,
            null,
            true_,
            false_,
        }
    }

    /// Intern `text` if it is short enough, otherwise build it uniquely.
    pub fn string(&self, text: &str) -> Str {
        if text.len() > self.options.max_string_len {
            return Str::unique(text);
        }
        self.strings.with(|pool| pool.intern(text))
    }

    /// Owned variant of [`Cache::string`]; long strings keep their buffer.
    pub fn owned_string(&self, text: String) -> Str {
        if text.len() > self.options.max_string_len {
            return Str::unique(text);
        }
        self.string(&text)
    }

    /// Substring of `s` over the byte range `[start, end)`.
    ///
    /// Results for tagged sources are memoized per `(tag, start, end)`, so
    /// repeating a request returns the same instance. Returns `None` when the
    /// range is out of bounds or not on character boundaries.
    pub fn substring(&self, s: &Str, start: usize, end: usize) -> Option<Str> {
        let text = s.as_str().get(start..end)?;
        let Some(tag) = s.tag() else {
            return Some(self.string(text));
        };

        if let Some(key) = substring_key(tag, start, end) {
            return Some(
                self.substrings
                    .with(|map| map.entry(key).or_insert_with(|| self.string(text)).clone()),
            );
        }

        Some(self.substrings_slow.with(|map| {
            map.entry(tag)
                .or_default()
                .entry((start, end))
                .or_insert_with(|| self.string(text))
                .clone()
        }))
    }

    /// `lhs` followed by `rhs`, memoized per tag pair when both are tagged.
    pub fn concat(&self, lhs: &Str, rhs: &Str) -> Str {
        match (lhs.tag(), rhs.tag()) {
            (Some(l), Some(r)) => self.concats.with(|map| {
                map.entry(concat_key(l, r))
                    .or_insert_with(|| self.joined(lhs, rhs))
                    .clone()
            }),
            _ => self.joined(lhs, rhs),
        }
    }

    fn joined(&self, lhs: &Str, rhs: &Str) -> Str {
        let mut text = String::with_capacity(lhs.len() + rhs.len());
        text.push_str(lhs.as_str());
        text.push_str(rhs.as_str());
        self.owned_string(text)
    }

    /// Canonical decimal form of `n`.
    pub fn int_string(&self, n: i64) -> Str {
        self.int_strings
            .with(|map| map.entry(n).or_insert_with(|| self.string(&n.to_string())).clone())
    }

    /// Build the string forms of the whole configured integer range.
    pub fn warm(&self) {
        for n in self.options.min_int..=self.options.max_int {
            self.int_string(n);
        }
    }

    pub fn empty(&self) -> Str {
        self.empty.clone()
    }

    pub fn null_str(&self) -> Str {
        self.null.clone()
    }

    pub fn bool_str(&self, b: bool) -> Str {
        if b { self.true_.clone() } else { self.false_.clone() }
    }

    /// Number of interned strings.
    pub fn interned(&self) -> usize {
        self.strings.with(|pool| pool.data.len())
    }
}

impl<S: Strategy> Default for Cache<S> {
    fn default() -> Self {
        Self::new()
    }
}
