//! Lock strategies for the shared caches and the variable store.
//!
//! Every piece of process-wide mutable state is held in a [`Guarded`] cell
//! chosen by a [`Strategy`]. The strategy is picked once, at build time:
//!
//! - [`Safe`] (default): each cell is a `parking_lot::Mutex`.
//! - [`Reckless`] (`--features reckless`): each cell is a bare `UnsafeCell`
//!   and the caller promises that only one thread ever touches it.
//!
//! Call sites never branch on the mode; they only see [`Cell`].

use std::cell::UnsafeCell;
use std::fmt;

/// Interior-mutable cell whose access discipline is set by a [`Strategy`].
pub trait Guarded<T>: Send + Sync {
    fn new(value: T) -> Self;

    /// Run `f` with exclusive access to the contents.
    ///
    /// `f` must not re-enter the same cell.
    fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R;
}

/// Selects the cell type used for shared state.
pub trait Strategy: Send + Sync + 'static {
    type Cell<T: Send>: Guarded<T>;

    /// Human-readable name, used in version output and logs.
    const NAME: &'static str;
}

/// Mutual exclusion on every access.
#[derive(Debug, Clone, Copy, Default)]
pub struct Safe;

impl Strategy for Safe {
    type Cell<T: Send> = parking_lot::Mutex<T>;

    const NAME: &'static str = "safe";
}

impl<T: Send> Guarded<T> for parking_lot::Mutex<T> {
    fn new(value: T) -> Self {
        parking_lot::Mutex::new(value)
    }

    #[inline]
    fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.lock())
    }
}

/// No synchronisation at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reckless;

impl Strategy for Reckless {
    type Cell<T: Send> = Unguarded<T>;

    const NAME: &'static str = "reckless";
}

/// A cell with no locking, used by [`Reckless`] builds.
pub struct Unguarded<T>(UnsafeCell<T>);

// SAFETY: reckless builds are only sound when a single thread accesses the
// shared state; that is the contract of the `reckless` feature.
unsafe impl<T: Send> Sync for Unguarded<T> {}

impl<T: Send> Guarded<T> for Unguarded<T> {
    fn new(value: T) -> Self {
        Unguarded(UnsafeCell::new(value))
    }

    #[inline]
    fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        // SAFETY: no concurrent access (see the `Sync` impl) and `with` is
        // never re-entered for the same cell, so this is the only live
        // reference to the contents.
        f(unsafe { &mut *self.0.get() })
    }
}

impl<T> fmt::Debug for Unguarded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Unguarded(..)")
    }
}

/// The strategy selected for this build.
#[cfg(not(feature = "reckless"))]
pub type Active = Safe;

/// The strategy selected for this build.
#[cfg(feature = "reckless")]
pub type Active = Reckless;

/// Cell type of the active strategy.
pub type Cell<T> = <Active as Strategy>::Cell<T>;
