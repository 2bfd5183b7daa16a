//! Build-time options

use crate::value::sync::{Active, Strategy};

/// Whether the lock-free strategy was compiled in (`--features reckless`).
pub const RECKLESS: bool = cfg!(feature = "reckless");

/// Name of the active lock strategy.
pub fn strategy_name() -> &'static str {
    <Active as Strategy>::NAME
}

/// Version string shown by `--version`.
#[cfg(not(feature = "reckless"))]
pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (safe)");
#[cfg(feature = "reckless")]
pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (reckless)");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_matches_feature() {
        if RECKLESS {
            assert_eq!(strategy_name(), "reckless");
        } else {
            assert_eq!(strategy_name(), "safe");
        }
    }

    #[test]
    fn test_version_mentions_strategy() {
        assert!(VERSION.starts_with(env!("CARGO_PKG_VERSION")));
        assert!(VERSION.ends_with(&format!("({})", strategy_name())));
    }
}
