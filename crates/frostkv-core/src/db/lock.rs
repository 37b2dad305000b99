use parking_lot::{Mutex, MutexGuard};
use xxhash_rust::xxh3::xxh3_64;

///
/// RecordLocks
///
/// Striped in-process locks keyed by primary key. Holding the stripe for a
/// key serializes the read-diff-write of save and delete for that record
/// against other writers in this process. Writers in other processes are
/// not covered.
///

pub struct RecordLocks {
    stripes: Vec<Mutex<()>>,
}

impl RecordLocks {
    /// Build a lock table with `stripes` stripes (at least one).
    #[must_use]
    pub fn new(stripes: usize) -> Self {
        Self {
            stripes: (0..stripes.max(1)).map(|_| Mutex::new(())).collect(),
        }
    }

    #[must_use]
    pub fn stripe_count(&self) -> usize {
        self.stripes.len()
    }

    fn stripe_of(&self, key: &str) -> usize {
        (xxh3_64(key.as_bytes()) % self.stripes.len() as u64) as usize
    }

    /// Lock the stripe owning `key`.
    pub fn lock(&self, key: &str) -> MutexGuard<'_, ()> {
        self.stripes[self.stripe_of(key)].lock()
    }

    /// Lock every stripe owning one of `keys`.
    ///
    /// Stripes are taken once each, in ascending order, so concurrent
    /// multi-record writers cannot deadlock.
    pub fn lock_many<'k>(&self, keys: impl IntoIterator<Item = &'k str>) -> Vec<MutexGuard<'_, ()>> {
        let mut stripes: Vec<usize> = keys.into_iter().map(|key| self.stripe_of(key)).collect();
        stripes.sort_unstable();
        stripes.dedup();

        stripes.into_iter().map(|i| self.stripes[i].lock()).collect()
    }
}

///
/// TESTS
///
