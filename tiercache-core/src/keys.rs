/// Trait for types that can be used as cache keys.
///
/// The string produced by [`to_cache_key`](CacheableKey::to_cache_key) is the
/// raw identifier; the cache always passes it through [`normalize_key`] before
/// using it, so implementations don't need to worry about forbidden characters.
///
/// # Examples
///
/// ```
/// use tiercache_core::CacheableKey;
///
/// struct UserId(u64);
///
/// impl CacheableKey for UserId {
///     fn to_cache_key(&self) -> String {
///         format!("user:{}", self.0)
///     }
/// }
///
/// assert_eq!(UserId(7).to_cache_key(), "user:7");
/// ```
pub trait CacheableKey {
    /// Renders this value as a raw (not yet normalized) cache key.
    fn to_cache_key(&self) -> String;
}

impl CacheableKey for str {
    fn to_cache_key(&self) -> String {
        self.to_string()
    }
}

impl CacheableKey for String {
    fn to_cache_key(&self) -> String {
        self.clone()
    }
}

impl<T: CacheableKey + ?Sized> CacheableKey for &T {
    fn to_cache_key(&self) -> String {
        (**self).to_cache_key()
    }
}

macro_rules! impl_cacheable_key_display {
    ($($t:ty),* $(,)?) => {
        $(
            impl CacheableKey for $t {
                fn to_cache_key(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_cacheable_key_display!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, char, bool
);

/// Maps a raw identifier to its canonical cache key.
///
/// Every character outside `[A-Za-z0-9_-]` is replaced with `_`. The function
/// is pure and total: any string is accepted and there is no error path.
///
/// # Examples
///
/// ```
/// use tiercache_core::normalize_key;
///
/// assert_eq!(normalize_key("user:42/profile"), "user_42_profile");
/// assert_eq!(normalize_key("already_ok-1"), "already_ok-1");
/// ```
pub fn normalize_key(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Renders and normalizes any [`CacheableKey`].
pub fn canonical_key<K: CacheableKey + ?Sized>(key: &K) -> String {
    normalize_key(&key.to_cache_key())
}
