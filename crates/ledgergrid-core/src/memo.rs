//! # Memoization
//!
//! Single-slot caches keyed by input revisions. A derived value is
//! recomputed only when its key changes.

/// Monotonic revision counter for one input of a derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Revision(u64);

impl Revision {
    /// Record a change.
    pub fn bump(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// One cached value and the key it was computed for.
#[derive(Debug, Clone)]
pub struct Memo<K, V> {
    slot: Option<(K, V)>,
    computations: u64,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            slot: None,
            computations: 0,
        }
    }
}

impl<K: PartialEq, V> Memo<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `key`, computing it on a miss.
    pub fn get_or_compute(&mut self, key: K, compute: impl FnOnce() -> V) -> &V {
        let entry = match self.slot.take() {
            Some((cached, value)) if cached == key => (cached, value),
            _ => {
                self.computations = self.computations.wrapping_add(1);
                (key, compute())
            }
        };
        &self.slot.insert(entry).1
    }

    /// Number of recomputations so far.
    #[must_use]
    pub fn computations(&self) -> u64 {
        self.computations
    }

    pub fn invalidate(&mut self) {
        self.slot = None;
    }
}
