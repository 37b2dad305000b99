use crate::{
    db::{
        executor::{Context, ExecutorError},
        keys::checked_primary_key,
    },
    error::Error,
    obs::{ExecKind, sink::Span},
    store::{Connection, StoreError},
    traits::Model,
};
use std::collections::HashMap;

///
/// LoadExecutor
///

pub(crate) struct LoadExecutor<'a> {
    ctx: Context<'a>,
}

impl<'a> LoadExecutor<'a> {
    #[must_use]
    pub(crate) const fn new(ctx: Context<'a>) -> Self {
        Self { ctx }
    }

    /// Overwrite `dest` with the stored record `id`.
    pub(crate) fn find_into<M: Model>(&self, id: &str, dest: &mut M) -> Result<(), Error> {
        let ctx = &self.ctx;
        let mut span = Span::new(ctx.sink(), ExecKind::Load, ctx.model());
        checked_primary_key(&ctx.spec, id)?;

        let mut conn = ctx.connection()?;
        self.load(&mut *conn, id, dest)?;
        span.set_rows(1);

        Ok(())
    }

    /// Load every id in order; any miss fails the whole call.
    pub(crate) fn mfind<M: Model, S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<M>, Error> {
        let ctx = &self.ctx;
        let mut span = Span::new(ctx.sink(), ExecKind::Load, ctx.model());
        for id in ids {
            checked_primary_key(&ctx.spec, id.as_ref())?;
        }
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = ctx.connection()?;
        let records = self.load_many(&mut *conn, ids.iter().map(AsRef::as_ref))?;
        span.set_rows(records.len() as u64);

        Ok(records)
    }

    /// Load every record listed in the all-ids set.
    pub(crate) fn find_all<M: Model>(&self) -> Result<Vec<M>, Error> {
        let ctx = &self.ctx;
        let mut span = Span::new(ctx.sink(), ExecKind::Load, ctx.model());

        let mut conn = ctx.connection()?;
        let ids = conn
            .smembers(&ctx.all_ids_key())
            .map_err(StoreError::from)?;
        let records = self.load_many(&mut *conn, ids.iter().map(String::as_str))?;
        span.set_rows(records.len() as u64);

        Ok(records)
    }

    /// Cardinality of the all-ids set.
    pub(crate) fn count(&self) -> Result<u64, Error> {
        let ctx = &self.ctx;
        let _span = Span::new(ctx.sink(), ExecKind::Count, ctx.model());

        let mut conn = ctx.connection()?;
        let count = conn.scard(&ctx.all_ids_key()).map_err(StoreError::from)?;

        Ok(count)
    }

    fn load_many<'i, M: Model>(
        &self,
        conn: &mut dyn Connection,
        ids: impl Iterator<Item = &'i str>,
    ) -> Result<Vec<M>, Error> {
        let mut records = Vec::new();
        for id in ids {
            let mut record = M::default();
            self.load(conn, id, &mut record)?;
            records.push(record);
        }

        Ok(records)
    }

    fn load<M: Model>(
        &self,
        conn: &mut dyn Connection,
        id: &str,
        dest: &mut M,
    ) -> Result<(), Error> {
        let ctx = &self.ctx;
        let key = ctx.primary_key(id);

        let stored: HashMap<String, String> = conn
            .hget_all(&key)
            .map_err(StoreError::from)?
            .into_iter()
            .collect();

        // A record whose fields are all null has no hash, only membership.
        if stored.is_empty() {
            ctx.require(conn, id)?;
        }

        *dest = M::default();
        dest.set_id(id.to_string());

        for field in ctx.spec.fields() {
            let Some(raw) = stored.get(field.redis_name) else {
                continue;
            };
            let value = ctx.decode_field(&key, field, raw)?;
            if !dest.set_value(field.name, &value) {
                return Err(ExecutorError::FieldRejected {
                    model: ctx.model().to_string(),
                    field: field.name,
                    value: value.label(),
                }
                .into());
            }
        }

        Ok(())
    }
}
