//! Scoring rules for sorted-set indexes.
//!
//! Alphabetical rank (wire contract): the first `RANK_BYTES` bytes of the
//! UTF-8 string, right-padded with `0x00`, read as a big-endian integer and
//! stored as `f64`. 48 bits fit the 53-bit mantissa, so the score is exact
//! and byte order is preserved. Strings sharing a 6-byte prefix tie.

use crate::{error::Error, model::field::IndexKind, value::Value};

/// Leading bytes of a string that contribute to its rank.
pub const RANK_BYTES: usize = 6;

/// Rank of a string in an alphabetical index.
#[must_use]
pub fn text_rank(s: &str) -> f64 {
    rank_with_padding(s.as_bytes(), 0x00)
}

/// Inclusive score range covering every string that starts with `prefix`.
#[must_use]
pub fn prefix_rank_bounds(prefix: &str) -> (f64, f64) {
    let bytes = prefix.as_bytes();

    (rank_with_padding(bytes, 0x00), rank_with_padding(bytes, 0xFF))
}

fn rank_with_padding(bytes: &[u8], pad: u8) -> f64 {
    let mut buf = [pad; RANK_BYTES];
    let len = bytes.len().min(RANK_BYTES);
    buf[..len].copy_from_slice(&bytes[..len]);

    let mut wide = [0_u8; 8];
    wide[8 - RANK_BYTES..].copy_from_slice(&buf);

    u64::from_be_bytes(wide) as f64
}

/// Score of `value` in an index of `kind`; `None` when the value is null
/// and so has no index entry.
pub fn score(kind: IndexKind, value: &Value) -> Result<Option<f64>, Error> {
    let score = match (kind, value) {
        (_, Value::Null) => return Ok(None),
        (IndexKind::Numeric, Value::Int(v)) => *v as f64,
        (IndexKind::Numeric, Value::Uint(v)) => *v as f64,
        (IndexKind::Numeric, Value::Float(v)) => {
            if v.is_nan() {
                return Err(Error::index_unsupported("NaN cannot be stored in a numeric index"));
            }
            *v
        }
        (IndexKind::Boolean, Value::Bool(b)) => f64::from(u8::from(*b)),
        (IndexKind::Alphabetical, Value::Text(s)) => text_rank(s),
        (IndexKind::None, _) => {
            return Err(Error::index_invariant(format!(
                "cannot score {} value for a field that is not indexed",
                value.label()
            )));
        }
        (kind, value) => {
            return Err(Error::index_invariant(format!(
                "{} value in a {kind} index",
                value.label()
            )));
        }
    };

    Ok(Some(score))
}

///
/// TESTS
///
