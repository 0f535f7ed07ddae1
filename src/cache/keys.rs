//! Key types accepted by [`BoundedCache`](super::BoundedCache).

use std::hash::Hash;

/// A cache key, together with the sentinel values the cache refuses to store.
pub trait CacheKey: Hash + Eq + Clone {
    /// Whether this key is the forbidden "empty" sentinel.
    fn is_blank(&self) -> bool {
        false
    }
}

impl CacheKey for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl CacheKey for &'static str {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl CacheKey for i64 {}
impl CacheKey for u64 {}
impl CacheKey for i32 {}
impl CacheKey for u32 {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_are_sentinels() {
        assert!(String::new().is_blank());
        assert!(" \t".to_string().is_blank());
        assert!(!"ada".to_string().is_blank());
        assert!("".is_blank());
    }

    #[test]
    fn integers_are_never_sentinels() {
        assert!(!0_i64.is_blank());
        assert!(!0_u32.is_blank());
    }
}
