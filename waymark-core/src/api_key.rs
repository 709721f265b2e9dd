//! Uniform-random selection across a pool of API keys.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A fixed pool of credentials shared by every concurrent call.
///
/// Each call draws a key uniformly at random. The lock is held only for the
/// draw itself.
///
/// # Examples
///
/// ```
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use waymark_core::ApiKeyPicker;
///
/// let picker = ApiKeyPicker::with_rng(vec!["a".into(), "b".into()], StdRng::seed_from_u64(1));
/// let key = picker.next_api_key().expect("pool is not empty");
/// assert!(key == "a" || key == "b");
/// assert!(ApiKeyPicker::new(Vec::new()).next_api_key().is_none());
/// ```
pub struct ApiKeyPicker {
    keys: Vec<String>,
    rng: Mutex<StdRng>,
}

impl ApiKeyPicker {
    /// A picker seeded from the operating system.
    #[must_use]
    pub fn new(keys: Vec<String>) -> Self {
        Self::with_rng(keys, StdRng::from_entropy())
    }

    /// A picker drawing from a caller-supplied random source.
    #[must_use]
    pub fn with_rng(keys: Vec<String>, rng: StdRng) -> Self {
        Self {
            keys,
            rng: Mutex::new(rng),
        }
    }

    /// Draw a key, or `None` when the pool is empty.
    #[must_use]
    pub fn next_api_key(&self) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }
        let index = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(0..self.keys.len());
        self.keys.get(index).map(String::as_str)
    }

    /// Number of keys in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the pool holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for ApiKeyPicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyPicker")
            .field("keys", &self.keys.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![expect(
        clippy::expect_used,
        reason = "tests should fail fast when setup breaks"
    )]

    use super::*;
    use rstest::{fixture, rstest};
    use std::collections::HashSet;
    use std::sync::Arc;

    #[fixture]
    fn picker() -> ApiKeyPicker {
        ApiKeyPicker::with_rng(
            vec!["k1".into(), "k2".into(), "k3".into()],
            StdRng::seed_from_u64(42),
        )
    }

    #[rstest]
    fn draws_every_key_eventually(picker: ApiKeyPicker) {
        let seen: HashSet<&str> = (0..300).filter_map(|_| picker.next_api_key()).collect();
        assert_eq!(seen, HashSet::from(["k1", "k2", "k3"]));
    }

    #[rstest]
    fn single_key_is_always_returned() {
        let picker = ApiKeyPicker::new(vec!["only".into()]);
        assert!((0..10).all(|_| picker.next_api_key() == Some("only")));
    }

    #[rstest]
    fn empty_pool_yields_none() {
        let picker = ApiKeyPicker::new(Vec::new());
        assert!(picker.is_empty());
        assert_eq!(picker.next_api_key(), None);
    }

    #[rstest]
    fn debug_output_hides_keys(picker: ApiKeyPicker) {
        let rendered = format!("{picker:?}");
        assert!(!rendered.contains("k1"));
    }

    #[rstest]
    fn concurrent_draws_stay_in_pool(picker: ApiKeyPicker) {
        let picker = Arc::new(picker);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&picker);
                std::thread::spawn(move || {
                    (0..100).all(|_| shared.next_api_key().is_some_and(|k| k.starts_with('k')))
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().expect("thread completes"));
        }
    }
}
