use crate::{
    db::{
        Db,
        executor::{ExecutorError, OpState},
        index::IndexedValues,
        keys::{all_ids_key, primary_key},
    },
    error::Error,
    model::{ModelSpec, field::FieldModel},
    obs::{MetricsEvent, MetricsSink},
    store::{Batch, Connection, StoreError},
    traits::Model,
    value::{Value, ValueError, decode},
};
use parking_lot::MutexGuard;
use std::sync::Arc;
use tracing::{debug, info, warn};

///
/// Context
/// Spec and store access shared by every executor of one call.
///

pub(crate) struct Context<'a> {
    pub(crate) db: &'a Db,
    pub(crate) spec: Arc<ModelSpec>,
}

impl<'a> Context<'a> {
    /// Resolve the spec registered for `M`.
    pub(crate) fn for_type<M: Model>(db: &'a Db) -> Result<Self, Error> {
        let spec = db.registry().try_get::<M>()?;

        Ok(Self { db, spec })
    }

    /// Resolve the spec registered under `name`, which must describe `M`.
    pub(crate) fn for_name<M: Model>(db: &'a Db, name: &str) -> Result<Self, Error> {
        let spec = db.registry().try_get_name(name)?;
        if !spec.is_for::<M>() {
            return Err(ExecutorError::TypeMismatch {
                model: spec.name().to_string(),
                expected: spec.type_name(),
                found: M::TYPE_NAME,
            }
            .into());
        }

        Ok(Self { db, spec })
    }

    pub(crate) fn model(&self) -> &str {
        self.spec.name()
    }

    pub(crate) fn sink(&self) -> &'a dyn MetricsSink {
        self.db.sink()
    }

    pub(crate) fn all_ids_key(&self) -> String {
        all_ids_key(self.model())
    }

    pub(crate) fn primary_key(&self, id: &str) -> String {
        primary_key(self.model(), id)
    }

    // ------------------------------------------------------------------
    // Store access
    // ------------------------------------------------------------------

    pub(crate) fn connection(&self) -> Result<Box<dyn Connection + 'a>, Error> {
        Ok(self.db.store().connection()?)
    }

    /// Lock the stripes of `keys` when record locks are enabled.
    pub(crate) fn lock<'k>(
        &self,
        keys: impl IntoIterator<Item = &'k str>,
    ) -> Vec<MutexGuard<'a, ()>> {
        match self.db.locks() {
            Some(locks) => locks.lock_many(keys),
            None => Vec::new(),
        }
    }

    pub(crate) fn exists(&self, conn: &mut dyn Connection, id: &str) -> Result<bool, Error> {
        Ok(conn
            .sismember(&self.all_ids_key(), id)
            .map_err(StoreError::from)?)
    }

    /// Fail with `KeyNotFound` unless the record exists.
    pub(crate) fn require(&self, conn: &mut dyn Connection, id: &str) -> Result<(), Error> {
        if self.exists(conn, id)? {
            Ok(())
        } else {
            Err(StoreError::KeyNotFound {
                key: self.primary_key(id),
            }
            .into())
        }
    }

    /// Stored values of every indexed field, or `None` when the record
    /// does not exist yet.
    pub(crate) fn read_indexed(
        &self,
        conn: &mut dyn Connection,
        id: &str,
    ) -> Result<Option<IndexedValues>, Error> {
        if !self.exists(conn, id)? {
            return Ok(None);
        }

        let fields: Vec<&FieldModel> = self.spec.indexed_fields().collect();
        let names: Vec<&str> = fields.iter().map(|f| f.redis_name).collect();
        let key = self.primary_key(id);
        let raw = conn.hmget(&key, &names).map_err(StoreError::from)?;

        let mut values = IndexedValues::new();
        for (field, raw) in fields.into_iter().zip(raw) {
            let value = match raw {
                Some(raw) => self.decode_field(&key, field, &raw)?,
                None => Value::Null,
            };
            values.insert(field.name, value);
        }

        Ok(Some(values))
    }

    pub(crate) fn decode_field(
        &self,
        key: &str,
        field: &FieldModel,
        raw: &str,
    ) -> Result<Value, Error> {
        decode(field.shape, raw).map_err(|err| {
            StoreError::Corrupt {
                message: format!("{key} field '{}': {err}", field.redis_name),
            }
            .into()
        })
    }

    /// Current value of every stored field of `record`, in spec order.
    pub(crate) fn record_values<M: Model>(
        &self,
        record: &M,
    ) -> Result<Vec<(&FieldModel, Value)>, Error> {
        self.spec
            .fields()
            .iter()
            .map(|field| match record.get_value(field.name) {
                Ok(value) => Ok((field, value)),
                Err(ValueError::UnknownField) => Err(ExecutorError::MissingField {
                    model: self.model().to_string(),
                    field: field.name,
                }
                .into()),
                Err(source) => Err(ExecutorError::FieldUnencodable {
                    model: self.model().to_string(),
                    field: field.name,
                    source,
                }
                .into()),
            })
            .collect()
    }

    /// Submit `batch` atomically. An empty batch is not sent.
    pub(crate) fn submit(&self, conn: &mut dyn Connection, batch: &Batch) -> Result<(), Error> {
        if batch.is_empty() {
            return Ok(());
        }

        let max = self.db.config().max_batch_commands;
        if max > 0 && batch.len() > max {
            return Err(ExecutorError::BatchTooLarge {
                commands: batch.len(),
                max,
            }
            .into());
        }

        match conn.exec(batch) {
            Ok(()) => {
                self.sink().record(MetricsEvent::BatchSubmitted {
                    model: self.model(),
                    commands: batch.len() as u64,
                });

                Ok(())
            }
            Err(err) => {
                warn!(
                    model = self.model(),
                    commands = batch.len(),
                    error = %err,
                    "batch submission failed"
                );
                self.sink().record(MetricsEvent::BatchFailed {
                    model: self.model(),
                });

                Err(StoreError::from(err).into())
            }
        }
    }

    // ------------------------------------------------------------------
    // Tracing
    // ------------------------------------------------------------------

    pub(crate) fn trace(&self, op: &'static str, state: OpState, id: &str) {
        if self.db.config().debug {
            info!(op, model = self.model(), id, %state, "record state");
        } else {
            debug!(op, model = self.model(), id, %state, "record state");
        }
    }

    pub(crate) fn trace_batch(&self, op: &'static str, state: OpState, records: usize) {
        if self.db.config().debug {
            info!(op, model = self.model(), records, %state, "batch state");
        } else {
            debug!(op, model = self.model(), records, %state, "batch state");
        }
    }
}
