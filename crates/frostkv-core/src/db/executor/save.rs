use crate::{
    db::{
        executor::{Context, ExecutorError, OpState},
        index::{IndexedValues, plan_save},
        keys::checked_primary_key,
    },
    error::Error,
    obs::{ExecKind, MetricsEvent, sink::Span},
    store::{Batch, Command, Connection},
    traits::Model,
    value::encode,
};
use std::collections::HashSet;
use ulid::Ulid;

const OP: &str = "save";

///
/// IndexDelta
///

#[derive(Clone, Copy, Debug, Default)]
struct IndexDelta {
    inserts: u64,
    removes: u64,
}

///
/// SaveExecutor
///

pub(crate) struct SaveExecutor<'a> {
    ctx: Context<'a>,
}

impl<'a> SaveExecutor<'a> {
    #[must_use]
    pub(crate) const fn new(ctx: Context<'a>) -> Self {
        Self { ctx }
    }

    /// Save one record, assigning an id first when it has none.
    pub(crate) fn save<M: Model>(&self, record: &mut M) -> Result<(), Error> {
        let ctx = &self.ctx;
        let mut span = Span::new(ctx.sink(), ExecKind::Save, ctx.model());
        ctx.trace(OP, OpState::Validated, record.id());

        assign_id(ctx, record);
        let id = record.id().to_string();
        let key = checked_primary_key(&ctx.spec, &id)?;

        let _guards = ctx.lock([key.as_str()]);
        let mut conn = ctx.connection()?;

        let mut batch = Batch::new();
        let delta = self.plan_record(&mut *conn, record, &id, &mut batch)?;
        ctx.trace(OP, OpState::BatchBuilt, &id);

        ctx.trace(OP, OpState::Submitted, &id);
        if let Err(err) = ctx.submit(&mut *conn, &batch) {
            ctx.trace(OP, OpState::Failed, &id);
            return Err(err);
        }
        ctx.trace(OP, OpState::Committed, &id);

        self.record_delta(delta);
        span.set_rows(1);

        Ok(())
    }

    /// Save many records in one atomic batch, in input order.
    ///
    /// Duplicate or reserved ids are rejected before any id is assigned or
    /// any command is sent.
    pub(crate) fn msave<M: Model>(&self, records: &mut [M]) -> Result<(), Error> {
        let ctx = &self.ctx;
        let mut span = Span::new(ctx.sink(), ExecKind::Save, ctx.model());
        if records.is_empty() {
            return Ok(());
        }
        ctx.trace_batch(OP, OpState::Validated, records.len());

        let mut seen = HashSet::with_capacity(records.len());
        for record in records.iter() {
            let id = record.id();
            if id.is_empty() {
                continue;
            }
            checked_primary_key(&ctx.spec, id)?;
            if !seen.insert(id.to_string()) {
                return Err(ExecutorError::DuplicateKey {
                    model: ctx.model().to_string(),
                    id: id.to_string(),
                }
                .into());
            }
        }

        for record in records.iter_mut() {
            assign_id(ctx, record);
        }
        let keys = records
            .iter()
            .map(|record| checked_primary_key(&ctx.spec, record.id()))
            .collect::<Result<Vec<_>, _>>()?;

        let _guards = ctx.lock(keys.iter().map(String::as_str));
        let mut conn = ctx.connection()?;

        let mut batch = Batch::new();
        let mut delta = IndexDelta::default();
        for record in records.iter() {
            let id = record.id().to_string();
            let part = self.plan_record(&mut *conn, record, &id, &mut batch)?;
            delta.inserts += part.inserts;
            delta.removes += part.removes;
        }
        ctx.trace_batch(OP, OpState::BatchBuilt, records.len());

        ctx.trace_batch(OP, OpState::Submitted, records.len());
        if let Err(err) = ctx.submit(&mut *conn, &batch) {
            ctx.trace_batch(OP, OpState::Failed, records.len());
            return Err(err);
        }
        ctx.trace_batch(OP, OpState::Committed, records.len());

        self.record_delta(delta);
        span.set_rows(records.len() as u64);

        Ok(())
    }

    // Append the primary-hash write, all-ids membership and index diff
    // of one record to `batch`.
    fn plan_record<M: Model>(
        &self,
        conn: &mut dyn Connection,
        record: &M,
        id: &str,
        batch: &mut Batch,
    ) -> Result<IndexDelta, Error> {
        let ctx = &self.ctx;
        let key = ctx.primary_key(id);

        let mut stored = Vec::new();
        let mut cleared = Vec::new();
        let mut indexed = IndexedValues::new();
        for (field, value) in ctx.record_values(record)? {
            match encode(&value) {
                Some(raw) => stored.push((field.redis_name.to_string(), raw)),
                None => cleared.push(field.redis_name.to_string()),
            }
            if field.is_indexed() {
                indexed.insert(field.name, value);
            }
        }

        let old = if ctx.spec.has_indexes() {
            ctx.read_indexed(conn, id)?
        } else {
            None
        };
        let ops = plan_save(&ctx.spec, id, old.as_ref(), &indexed)?;

        if !stored.is_empty() {
            batch.push(Command::HSet {
                key: key.clone(),
                fields: stored,
            });
        }
        if !cleared.is_empty() {
            batch.push(Command::HDel {
                key,
                fields: cleared,
            });
        }
        batch.push(Command::SAdd {
            key: ctx.all_ids_key(),
            member: id.to_string(),
        });

        let mut delta = IndexDelta::default();
        for op in ops {
            if op.is_add() {
                delta.inserts += 1;
            } else {
                delta.removes += 1;
            }
            batch.push(op.into());
        }

        Ok(delta)
    }

    fn record_delta(&self, delta: IndexDelta) {
        if delta.inserts > 0 || delta.removes > 0 {
            self.ctx.sink().record(MetricsEvent::IndexDelta {
                model: self.ctx.model(),
                inserts: delta.inserts,
                removes: delta.removes,
            });
        }
    }
}

fn assign_id<M: Model>(ctx: &Context<'_>, record: &mut M) {
    if record.id().is_empty() {
        record.set_id(Ulid::new().to_string());
        ctx.trace(OP, OpState::IdAssigned, record.id());
    }
}
