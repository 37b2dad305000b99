use crate::{
    db::{
        executor::{Context, ExecutorError, OpState},
        index::plan_delete,
        keys::checked_primary_key,
    },
    error::Error,
    obs::{ExecKind, MetricsEvent, sink::Span},
    store::{Batch, StoreError},
};
use std::collections::HashSet;

const OP: &str = "delete";

///
/// DeleteExecutor
///
/// Deletion is a read-then-write: existence is checked before the batch is
/// built, so a missing record fails with `KeyNotFound` instead of silently
/// succeeding.
///

pub(crate) struct DeleteExecutor<'a> {
    ctx: Context<'a>,
}

impl<'a> DeleteExecutor<'a> {
    #[must_use]
    pub(crate) const fn new(ctx: Context<'a>) -> Self {
        Self { ctx }
    }

    pub(crate) fn delete(&self, id: &str) -> Result<(), Error> {
        let ctx = &self.ctx;
        let mut span = Span::new(ctx.sink(), ExecKind::Delete, ctx.model());
        ctx.trace(OP, OpState::Validated, id);
        let key = checked_primary_key(&ctx.spec, id)?;

        let _guards = ctx.lock([key.as_str()]);
        let mut conn = ctx.connection()?;
        ctx.require(&mut *conn, id)?;

        let mut batch = Batch::new();
        batch.extend(plan_delete(&ctx.spec, id));
        ctx.trace(OP, OpState::BatchBuilt, id);

        ctx.trace(OP, OpState::Submitted, id);
        if let Err(err) = ctx.submit(&mut *conn, &batch) {
            ctx.trace(OP, OpState::Failed, id);
            return Err(err);
        }
        ctx.trace(OP, OpState::Committed, id);

        self.record_removes(1);
        span.set_rows(1);

        Ok(())
    }

    /// Delete every id in one atomic batch. Any missing id fails the call
    /// before anything is sent.
    pub(crate) fn mdelete<S: AsRef<str>>(&self, ids: &[S]) -> Result<(), Error> {
        let ctx = &self.ctx;
        let mut span = Span::new(ctx.sink(), ExecKind::Delete, ctx.model());
        if ids.is_empty() {
            return Ok(());
        }
        ctx.trace_batch(OP, OpState::Validated, ids.len());

        let mut seen = HashSet::with_capacity(ids.len());
        let mut keys = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.as_ref();
            if !seen.insert(id) {
                return Err(ExecutorError::DuplicateKey {
                    model: ctx.model().to_string(),
                    id: id.to_string(),
                }
                .into());
            }
            keys.push(checked_primary_key(&ctx.spec, id)?);
        }

        let _guards = ctx.lock(keys.iter().map(String::as_str));
        let mut conn = ctx.connection()?;
        for id in ids {
            ctx.require(&mut *conn, id.as_ref())?;
        }

        let mut batch = Batch::new();
        for id in ids {
            batch.extend(plan_delete(&ctx.spec, id.as_ref()));
        }
        ctx.trace_batch(OP, OpState::BatchBuilt, ids.len());

        ctx.trace_batch(OP, OpState::Submitted, ids.len());
        if let Err(err) = ctx.submit(&mut *conn, &batch) {
            ctx.trace_batch(OP, OpState::Failed, ids.len());
            return Err(err);
        }
        ctx.trace_batch(OP, OpState::Committed, ids.len());

        self.record_removes(ids.len() as u64);
        span.set_rows(ids.len() as u64);

        Ok(())
    }

    /// Delete every record in the all-ids set; returns how many were removed.
    pub(crate) fn delete_all(&self) -> Result<u64, Error> {
        let ctx = &self.ctx;
        let mut span = Span::new(ctx.sink(), ExecKind::Delete, ctx.model());

        let mut conn = ctx.connection()?;
        let ids = conn
            .smembers(&ctx.all_ids_key())
            .map_err(StoreError::from)?;
        if ids.is_empty() {
            return Ok(0);
        }
        ctx.trace_batch(OP, OpState::Validated, ids.len());

        let keys: Vec<String> = ids.iter().map(|id| ctx.primary_key(id)).collect();
        let _guards = ctx.lock(keys.iter().map(String::as_str));

        let mut batch = Batch::new();
        for id in &ids {
            batch.extend(plan_delete(&ctx.spec, id));
        }
        ctx.trace_batch(OP, OpState::BatchBuilt, ids.len());

        ctx.trace_batch(OP, OpState::Submitted, ids.len());
        if let Err(err) = ctx.submit(&mut *conn, &batch) {
            ctx.trace_batch(OP, OpState::Failed, ids.len());
            return Err(err);
        }
        ctx.trace_batch(OP, OpState::Committed, ids.len());

        let deleted = ids.len() as u64;
        self.record_removes(deleted);
        span.set_rows(deleted);

        Ok(deleted)
    }

    fn record_removes(&self, records: u64) {
        let per_record = self.ctx.spec.indexed_fields().count() as u64;
        if per_record > 0 {
            self.ctx.sink().record(MetricsEvent::IndexDelta {
                model: self.ctx.model(),
                inserts: 0,
                removes: per_record * records,
            });
        }
    }
}
