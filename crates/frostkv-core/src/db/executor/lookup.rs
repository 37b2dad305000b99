use crate::{
    db::{
        executor::{Context, ExecutorError},
        index::{prefix_rank_bounds, score},
        keys::index_key,
    },
    error::Error,
    model::field::{FieldModel, IndexKind},
    obs::{ExecKind, sink::Span},
    store::{Connection, StoreError},
    value::Value,
};

///
/// LookupExecutor
///
/// Id lookups served from the secondary indexes, never by scanning
/// records. Results are in index order: score, then id.
///

pub(crate) struct LookupExecutor<'a> {
    ctx: Context<'a>,
}

impl<'a> LookupExecutor<'a> {
    #[must_use]
    pub(crate) const fn new(ctx: Context<'a>) -> Self {
        Self { ctx }
    }

    /// Ids whose numeric or boolean score lies in `min..=max`.
    pub(crate) fn ids_by_score(
        &self,
        field: &str,
        min: f64,
        max: f64,
    ) -> Result<Vec<String>, Error> {
        let ctx = &self.ctx;
        let mut span = Span::new(ctx.sink(), ExecKind::Lookup, ctx.model());

        let field = self.indexed_field(field)?;
        if !matches!(field.index_kind, IndexKind::Numeric | IndexKind::Boolean) {
            return Err(self.kind_mismatch(field, "range"));
        }

        let mut conn = ctx.connection()?;
        let ids = self.range(&mut *conn, field, min, max)?;
        span.set_rows(ids.len() as u64);

        Ok(ids)
    }

    /// Ids whose stored value equals `value`.
    ///
    /// Alphabetical ranks only cover a prefix, so candidates are checked
    /// against the stored text.
    pub(crate) fn ids_equal(&self, field: &str, value: &Value) -> Result<Vec<String>, Error> {
        let ctx = &self.ctx;
        let mut span = Span::new(ctx.sink(), ExecKind::Lookup, ctx.model());

        let field = self.indexed_field(field)?;
        let compatible = matches!(
            (field.index_kind, value),
            (_, Value::Null)
                | (IndexKind::Numeric, Value::Int(_) | Value::Uint(_) | Value::Float(_))
                | (IndexKind::Boolean, Value::Bool(_))
                | (IndexKind::Alphabetical, Value::Text(_))
        );
        if !compatible {
            return Err(self.kind_mismatch(field, "equality"));
        }

        // Null values have no index entry.
        let Some(target) = score(field.index_kind, value)? else {
            return Ok(Vec::new());
        };

        let mut conn = ctx.connection()?;
        let mut ids = self.range(&mut *conn, field, target, target)?;
        if let Value::Text(expected) = value {
            ids = self.verify(&mut *conn, field, ids, |stored| stored == expected.as_str())?;
        }
        span.set_rows(ids.len() as u64);

        Ok(ids)
    }

    /// Ids whose alphabetical value starts with `prefix`.
    pub(crate) fn ids_with_prefix(
        &self,
        field: &str,
        prefix: &str,
    ) -> Result<Vec<String>, Error> {
        let ctx = &self.ctx;
        let mut span = Span::new(ctx.sink(), ExecKind::Lookup, ctx.model());

        let field = self.indexed_field(field)?;
        if field.index_kind != IndexKind::Alphabetical {
            return Err(self.kind_mismatch(field, "prefix"));
        }

        let (min, max) = prefix_rank_bounds(prefix);
        let mut conn = ctx.connection()?;
        let candidates = self.range(&mut *conn, field, min, max)?;
        let ids = self.verify(&mut *conn, field, candidates, |stored| {
            stored.starts_with(prefix)
        })?;
        span.set_rows(ids.len() as u64);

        Ok(ids)
    }

    fn indexed_field(&self, name: &str) -> Result<&FieldModel, Error> {
        self.ctx
            .spec
            .field(name)
            .filter(|field| field.is_indexed())
            .ok_or_else(|| {
                ExecutorError::FieldNotIndexed {
                    model: self.ctx.model().to_string(),
                    field: name.to_string(),
                }
                .into()
            })
    }

    fn kind_mismatch(&self, field: &FieldModel, lookup: &'static str) -> Error {
        ExecutorError::IndexKindMismatch {
            model: self.ctx.model().to_string(),
            field: field.name.to_string(),
            kind: field.index_kind,
            lookup,
        }
        .into()
    }

    fn range(
        &self,
        conn: &mut dyn Connection,
        field: &FieldModel,
        min: f64,
        max: f64,
    ) -> Result<Vec<String>, Error> {
        let key = index_key(self.ctx.model(), field.redis_name, field.index_kind);

        Ok(conn
            .zrange_by_score(&key, min, max)
            .map_err(StoreError::from)?)
    }

    // Keep the candidates whose stored field value satisfies `keep`.
    fn verify(
        &self,
        conn: &mut dyn Connection,
        field: &FieldModel,
        candidates: Vec<String>,
        keep: impl Fn(&str) -> bool,
    ) -> Result<Vec<String>, Error> {
        let mut ids = Vec::with_capacity(candidates.len());
        for id in candidates {
            let key = self.ctx.primary_key(&id);
            let stored = conn
                .hmget(&key, &[field.redis_name])
                .map_err(StoreError::from)?;
            if stored.first().and_then(Option::as_deref).is_some_and(&keep) {
                ids.push(id);
            }
        }

        Ok(ids)
    }
}
