use crate::{
    config::MemoryConfig,
    store::{Batch, Command, Connection, Store, StoreError, TransportError},
};
use parking_lot::Mutex;
use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet, HashMap},
};

///
/// MemoryData
///
/// Keyspace with Redis typing rules: one key holds one structure, and a
/// structure that becomes empty disappears.
///

#[derive(Debug, Default)]
struct MemoryData {
    hashes: HashMap<String, BTreeMap<String, String>>,
    sets: HashMap<String, BTreeSet<String>>,
    zsets: HashMap<String, BTreeMap<String, f64>>,
}

impl MemoryData {
    fn type_of(&self, key: &str) -> Option<&'static str> {
        if self.hashes.contains_key(key) {
            Some("hash")
        } else if self.sets.contains_key(key) {
            Some("set")
        } else if self.zsets.contains_key(key) {
            Some("zset")
        } else {
            None
        }
    }

    fn expect_type(&self, key: &str, expected: &'static str) -> Result<(), TransportError> {
        match self.type_of(key) {
            Some(found) if found != expected => Err(TransportError::new(format!(
                "WRONGTYPE operation against key '{key}' holding a {found}, expected {expected}"
            ))),
            _ => Ok(()),
        }
    }

    // Copy of whatever is stored under `keys`.
    fn subset<'k>(&self, keys: impl IntoIterator<Item = &'k str>) -> Self {
        let mut part = Self::default();
        for key in keys {
            if let Some(hash) = self.hashes.get(key) {
                part.hashes.insert(key.to_string(), hash.clone());
            }
            if let Some(set) = self.sets.get(key) {
                part.sets.insert(key.to_string(), set.clone());
            }
            if let Some(zset) = self.zsets.get(key) {
                part.zsets.insert(key.to_string(), zset.clone());
            }
        }

        part
    }

    // Replace everything under `keys` with the structures of `staged`.
    fn merge<'k>(&mut self, keys: impl IntoIterator<Item = &'k str>, mut staged: Self) {
        for key in keys {
            self.hashes.remove(key);
            self.sets.remove(key);
            self.zsets.remove(key);

            if let Some(hash) = staged.hashes.remove(key) {
                self.hashes.insert(key.to_string(), hash);
            }
            if let Some(set) = staged.sets.remove(key) {
                self.sets.insert(key.to_string(), set);
            }
            if let Some(zset) = staged.zsets.remove(key) {
                self.zsets.insert(key.to_string(), zset);
            }
        }
    }

    fn apply(&mut self, command: &Command) -> Result<(), TransportError> {
        match command {
            Command::HSet { key, fields } => {
                self.expect_type(key, "hash")?;
                if fields.is_empty() {
                    return Err(TransportError::new(format!(
                        "wrong number of arguments for HSET on '{key}'"
                    )));
                }
                let hash = self.hashes.entry(key.clone()).or_default();
                for (field, value) in fields {
                    hash.insert(field.clone(), value.clone());
                }
            }
            Command::HDel { key, fields } => {
                self.expect_type(key, "hash")?;
                if let Some(hash) = self.hashes.get_mut(key) {
                    for field in fields {
                        hash.remove(field);
                    }
                    if hash.is_empty() {
                        self.hashes.remove(key);
                    }
                }
            }
            Command::Del { key } => {
                self.hashes.remove(key);
                self.sets.remove(key);
                self.zsets.remove(key);
            }
            Command::SAdd { key, member } => {
                self.expect_type(key, "set")?;
                self.sets
                    .entry(key.clone())
                    .or_default()
                    .insert(member.clone());
            }
            Command::SRem { key, member } => {
                self.expect_type(key, "set")?;
                if let Some(set) = self.sets.get_mut(key) {
                    set.remove(member);
                    if set.is_empty() {
                        self.sets.remove(key);
                    }
                }
            }
            Command::ZAdd { key, score, member } => {
                self.expect_type(key, "zset")?;
                if score.is_nan() {
                    return Err(TransportError::new("value is not a valid float"));
                }
                self.zsets
                    .entry(key.clone())
                    .or_default()
                    .insert(member.clone(), *score);
            }
            Command::ZRem { key, member } => {
                self.expect_type(key, "zset")?;
                if let Some(zset) = self.zsets.get_mut(key) {
                    zset.remove(member);
                    if zset.is_empty() {
                        self.zsets.remove(key);
                    }
                }
            }
        }

        Ok(())
    }
}

///
/// Faults
/// One-shot failures injected by tests.
///

#[derive(Debug, Default)]
struct Faults {
    next_exec: Option<String>,
    next_read: Option<String>,
}

///
/// MemoryStore
///
/// In-process store implementing the store port: a bounded connection pool
/// over one shared keyspace. A batch is applied to a copy of the keys it
/// touches, which is merged back only when every command succeeds.
///

#[derive(Debug)]
pub struct MemoryStore {
    data: Mutex<MemoryData>,
    max_connections: usize,
    in_use: Mutex<usize>,
    faults: Mutex<Faults>,
}

impl MemoryStore {
    pub const DEFAULT_MAX_CONNECTIONS: usize = 16;

    #[must_use]
    pub fn new() -> Self {
        Self::with_max_connections(Self::DEFAULT_MAX_CONNECTIONS)
    }

    #[must_use]
    pub fn with_max_connections(max_connections: usize) -> Self {
        Self {
            data: Mutex::new(MemoryData::default()),
            max_connections,
            in_use: Mutex::new(0),
            faults: Mutex::new(Faults::default()),
        }
    }

    #[must_use]
    pub fn from_config(config: &MemoryConfig) -> Self {
        Self::with_max_connections(config.max_connections)
    }

    /// Connections currently checked out of the pool.
    #[must_use]
    pub fn in_use(&self) -> usize {
        *self.in_use.lock()
    }

    /// Fail the next batch submission with a transport error.
    pub fn fail_next_exec(&self, message: impl Into<String>) {
        self.faults.lock().next_exec = Some(message.into());
    }

    /// Fail the next read command with a transport error.
    pub fn fail_next_read(&self, message: impl Into<String>) {
        self.faults.lock().next_read = Some(message.into());
    }

    //
    // Inspection
    //

    /// Sorted list of every key in the keyspace.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let data = self.data.lock();
        let mut keys: Vec<String> = data
            .hashes
            .keys()
            .chain(data.sets.keys())
            .chain(data.zsets.keys())
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    #[must_use]
    pub fn hash(&self, key: &str) -> Option<BTreeMap<String, String>> {
        self.data.lock().hashes.get(key).cloned()
    }

    #[must_use]
    pub fn set_members(&self, key: &str) -> Vec<String> {
        self.data
            .lock()
            .sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn score(&self, key: &str, member: &str) -> Option<f64> {
        self.data
            .lock()
            .zsets
            .get(key)
            .and_then(|zset| zset.get(member).copied())
    }

    /// Members of a sorted set with their scores, in index order.
    #[must_use]
    pub fn zset(&self, key: &str) -> Vec<(String, f64)> {
        let data = self.data.lock();
        let Some(zset) = data.zsets.get(key) else {
            return Vec::new();
        };

        let mut entries: Vec<(String, f64)> =
            zset.iter().map(|(m, s)| (m.clone(), *s)).collect();
        entries.sort_by(|a, b| cmp_entry((&a.0, a.1), (&b.0, b.1)));
        entries
    }

    fn take_read_fault(&self) -> Result<(), TransportError> {
        match self.faults.lock().next_read.take() {
            Some(message) => Err(TransportError::new(message)),
            None => Ok(()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn connection(&self) -> Result<Box<dyn Connection + '_>, StoreError> {
        let mut in_use = self.in_use.lock();
        if *in_use >= self.max_connections {
            return Err(StoreError::PoolExhausted {
                max: self.max_connections,
            });
        }
        *in_use += 1;

        Ok(Box::new(MemoryConnection { store: self }))
    }
}

fn cmp_entry(a: (&String, f64), b: (&String, f64)) -> Ordering {
    a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0))
}

///
/// MemoryConnection
/// Pool guard; returns its slot on drop.
///

struct MemoryConnection<'a> {
    store: &'a MemoryStore,
}

impl Drop for MemoryConnection<'_> {
    fn drop(&mut self) {
        let mut in_use = self.store.in_use.lock();
        *in_use = in_use.saturating_sub(1);
    }
}

impl Connection for MemoryConnection<'_> {
    fn hget_all(&mut self, key: &str) -> Result<Vec<(String, String)>, TransportError> {
        self.store.take_read_fault()?;
        let data = self.store.data.lock();
        data.expect_type(key, "hash")?;

        Ok(data
            .hashes
            .get(key)
            .map(|hash| hash.iter().map(|(f, v)| (f.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    fn hmget(
        &mut self,
        key: &str,
        fields: &[&str],
    ) -> Result<Vec<Option<String>>, TransportError> {
        self.store.take_read_fault()?;
        let data = self.store.data.lock();
        data.expect_type(key, "hash")?;
        let hash = data.hashes.get(key);

        Ok(fields
            .iter()
            .map(|field| hash.and_then(|h| h.get(*field).cloned()))
            .collect())
    }

    fn sismember(&mut self, key: &str, member: &str) -> Result<bool, TransportError> {
        self.store.take_read_fault()?;
        let data = self.store.data.lock();
        data.expect_type(key, "set")?;

        Ok(data.sets.get(key).is_some_and(|set| set.contains(member)))
    }

    fn smembers(&mut self, key: &str) -> Result<Vec<String>, TransportError> {
        self.store.take_read_fault()?;
        let data = self.store.data.lock();
        data.expect_type(key, "set")?;

        Ok(data
            .sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn scard(&mut self, key: &str) -> Result<u64, TransportError> {
        self.store.take_read_fault()?;
        let data = self.store.data.lock();
        data.expect_type(key, "set")?;

        Ok(data.sets.get(key).map_or(0, |set| set.len() as u64))
    }

    fn zrange_by_score(
        &mut self,
        key: &str,
        min: f64,
        max: f64,
    ) -> Result<Vec<String>, TransportError> {
        self.store.take_read_fault()?;
        let data = self.store.data.lock();
        data.expect_type(key, "zset")?;
        let Some(zset) = data.zsets.get(key) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<(&String, f64)> = zset
            .iter()
            .filter(|(_, score)| **score >= min && **score <= max)
            .map(|(member, score)| (member, *score))
            .collect();
        hits.sort_by(|a, b| cmp_entry(*a, *b));

        Ok(hits.into_iter().map(|(member, _)| member.clone()).collect())
    }

    fn exec(&mut self, batch: &Batch) -> Result<(), TransportError> {
        if let Some(message) = self.store.faults.lock().next_exec.take() {
            return Err(TransportError::new(message));
        }

        let keys: BTreeSet<&str> = batch.iter().map(Command::key).collect();

        let mut data = self.store.data.lock();
        let mut staged = data.subset(keys.iter().copied());
        for command in batch {
            staged.apply(command)?;
        }
        data.merge(keys.iter().copied(), staged);

        Ok(())
    }
}

///
/// TESTS
///
