pub mod executor;
pub mod index;
pub mod keys;
pub mod lock;
pub mod registry;

use crate::{
    config::Config,
    db::{
        executor::{Context, DeleteExecutor, LoadExecutor, LookupExecutor, SaveExecutor},
        keys::{all_ids_key, checked_primary_key},
        lock::RecordLocks,
        registry::Registry,
    },
    error::Error,
    model::ModelSpec,
    obs::{GlobalMetricsSink, MetricsSink},
    store::Store,
    traits::Model,
    value::Value,
};
use std::{fmt, sync::Arc};

///
/// Db
///
/// Entry point for registering models and persisting records.
///
/// Owns the model registry, so every registration is scoped to this
/// handle and dropped with it. `Db` is `Send + Sync`; share it behind an
/// `Arc` and call it from any thread. Each operation checks out its own
/// pooled connection.
///

pub struct Db {
    store: Arc<dyn Store>,
    registry: Registry,
    config: Config,
    locks: Option<RecordLocks>,
    sink: Arc<dyn MetricsSink>,
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Db {
    /// Build a handle over `store`, reporting metrics to the global sink.
    pub fn new(store: Arc<dyn Store>, config: Config) -> Result<Self, Error> {
        config.validate()?;
        let locks = config
            .record_locks
            .then(|| RecordLocks::new(config.lock_stripes));

        Ok(Self {
            store,
            registry: Registry::new(),
            config,
            locks,
            sink: Arc::new(GlobalMetricsSink),
        })
    }

    /// Replace the metrics sink.
    #[must_use]
    pub fn with_metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.sink = sink;
        self
    }

    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub(crate) fn sink(&self) -> &dyn MetricsSink {
        self.sink.as_ref()
    }

    pub(crate) const fn locks(&self) -> Option<&RecordLocks> {
        self.locks.as_ref()
    }

    // ─────────────────────────────────────────────
    // REGISTRATION
    // ─────────────────────────────────────────────

    /// Register `M` under its type name.
    pub fn register<M: Model>(&self) -> Result<Arc<ModelSpec>, Error> {
        self.registry.register::<M>()
    }

    /// Register `M` under an explicit model name.
    pub fn register_name<M: Model>(&self, name: &str) -> Result<Arc<ModelSpec>, Error> {
        self.registry.register_name::<M>(name)
    }

    pub fn unregister<M: Model>(&self) -> Result<Arc<ModelSpec>, Error> {
        self.registry.unregister::<M>()
    }

    pub fn unregister_name(&self, name: &str) -> Result<Arc<ModelSpec>, Error> {
        self.registry.unregister_name(name)
    }

    // ─────────────────────────────────────────────
    // WRITES
    // ─────────────────────────────────────────────

    /// Save `record`, assigning a fresh id when it has none.
    ///
    /// On a store failure the assigned id stays on the record; the store
    /// itself is left as before the call.
    pub fn save<M: Model>(&self, record: &mut M) -> Result<(), Error> {
        SaveExecutor::new(Context::for_type::<M>(self)?).save(record)
    }

    /// Save many records of one type in a single atomic batch.
    pub fn msave<M: Model>(&self, records: &mut [M]) -> Result<(), Error> {
        SaveExecutor::new(Context::for_type::<M>(self)?).msave(records)
    }

    pub fn delete<M: Model>(&self, id: &str) -> Result<(), Error> {
        DeleteExecutor::new(Context::for_type::<M>(self)?).delete(id)
    }

    pub fn mdelete<M: Model, S: AsRef<str>>(&self, ids: &[S]) -> Result<(), Error> {
        DeleteExecutor::new(Context::for_type::<M>(self)?).mdelete(ids)
    }

    /// Delete every record of `M`; returns the number deleted.
    pub fn delete_all<M: Model>(&self) -> Result<u64, Error> {
        DeleteExecutor::new(Context::for_type::<M>(self)?).delete_all()
    }

    // ─────────────────────────────────────────────
    // READS
    // ─────────────────────────────────────────────

    pub fn find<M: Model>(&self, id: &str) -> Result<M, Error> {
        let mut record = M::default();
        self.find_into(id, &mut record)?;

        Ok(record)
    }

    /// Load record `id` into `dest`, replacing every field.
    pub fn find_into<M: Model>(&self, id: &str, dest: &mut M) -> Result<(), Error> {
        LoadExecutor::new(Context::for_type::<M>(self)?).find_into(id, dest)
    }

    /// Load record `id` of the model registered as `name`.
    ///
    /// Fails with a type mismatch when `name` describes a type other
    /// than `M`.
    pub fn find_by_name<M: Model>(
        &self,
        name: &str,
        id: &str,
        dest: &mut M,
    ) -> Result<(), Error> {
        LoadExecutor::new(Context::for_name::<M>(self, name)?).find_into(id, dest)
    }

    pub fn mfind<M: Model, S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<M>, Error> {
        LoadExecutor::new(Context::for_type::<M>(self)?).mfind(ids)
    }

    pub fn find_all<M: Model>(&self) -> Result<Vec<M>, Error> {
        LoadExecutor::new(Context::for_type::<M>(self)?).find_all()
    }

    pub fn count<M: Model>(&self) -> Result<u64, Error> {
        LoadExecutor::new(Context::for_type::<M>(self)?).count()
    }

    // ─────────────────────────────────────────────
    // INDEX LOOKUPS
    // ─────────────────────────────────────────────

    /// Ids whose numeric or boolean `field` lies in `min..=max`.
    pub fn ids_by_score<M: Model>(
        &self,
        field: &str,
        min: f64,
        max: f64,
    ) -> Result<Vec<String>, Error> {
        LookupExecutor::new(Context::for_type::<M>(self)?).ids_by_score(field, min, max)
    }

    pub fn ids_equal<M: Model>(
        &self,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<Vec<String>, Error> {
        LookupExecutor::new(Context::for_type::<M>(self)?).ids_equal(field, &value.into())
    }

    pub fn ids_with_prefix<M: Model>(
        &self,
        field: &str,
        prefix: &str,
    ) -> Result<Vec<String>, Error> {
        LookupExecutor::new(Context::for_type::<M>(self)?).ids_with_prefix(field, prefix)
    }

    // ─────────────────────────────────────────────
    // INTROSPECTION
    // ─────────────────────────────────────────────

    /// Primary key of `record`; fails for an unsaved record.
    pub fn key_for_model<M: Model>(&self, record: &M) -> Result<String, Error> {
        let spec = self.registry.try_get::<M>()?;

        checked_primary_key(&spec, record.id())
    }

    /// Key of the all-ids set of `M`.
    pub fn key_for_all<M: Model>(&self) -> Result<String, Error> {
        let spec = self.registry.try_get::<M>()?;

        Ok(all_ids_key(spec.name()))
    }
}
