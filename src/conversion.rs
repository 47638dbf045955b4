//! Parameter normalization.
//!
//! Turns caller-supplied [`RawValue`]s into [`SqlValue`]s that a parameter binder
//! accepts: null markers and NaN become NULL, narrow numbers widen to 64 bits,
//! nanosecond timestamps become microsecond `NaiveDateTime`s.

use std::ops::Deref;

use chrono::{DateTime, NaiveDateTime};

use crate::types::{NOT_A_TIME, RawValue, SqlValue};

/// Normalize a single value.
///
/// ```rust
/// use sql_secret_helper::prelude::*;
///
/// assert_eq!(normalize_value(RawValue::Float32(f32::NAN)), SqlValue::Null);
/// assert_eq!(normalize_value(RawValue::Int32(3)), SqlValue::Int(3));
/// assert_eq!(normalize_value("3".into()), SqlValue::Text("3".into()));
/// ```
#[must_use]
pub fn normalize_value(value: RawValue) -> SqlValue {
    if is_null_like(&value) {
        return SqlValue::Null;
    }
    match value {
        RawValue::Float32(f) => SqlValue::Float(f64::from(f)),
        RawValue::Int32(i) => SqlValue::Int(i64::from(i)),
        RawValue::Int16(i) => SqlValue::Int(i64::from(i)),
        RawValue::Int8(i) => SqlValue::Int(i64::from(i)),
        RawValue::UInt32(i) => SqlValue::Int(i64::from(i)),
        RawValue::UInt16(i) => SqlValue::Int(i64::from(i)),
        RawValue::UInt8(i) => SqlValue::Int(i64::from(i)),
        RawValue::NullableInt(Some(i)) | RawValue::Int(i) => SqlValue::Int(i),
        RawValue::TimestampNanos(nanos) => SqlValue::Timestamp(nanos_to_datetime(nanos)),
        RawValue::Float(f) => SqlValue::Float(f),
        RawValue::Opaque(v) => v,
        RawValue::Null | RawValue::NullableInt(None) => SqlValue::Null,
    }
}

/// Normalize every value, keeping order and length.
#[must_use]
pub fn normalize_params<I>(values: I) -> SqlParams
where
    I: IntoIterator,
    I::Item: Into<RawValue>,
{
    SqlParams(
        values
            .into_iter()
            .map(|v| normalize_value(v.into()))
            .collect(),
    )
}

fn is_null_like(value: &RawValue) -> bool {
    match value {
        RawValue::Null | RawValue::NullableInt(None) | RawValue::Opaque(SqlValue::Null) => true,
        RawValue::Float(f) | RawValue::Opaque(SqlValue::Float(f)) => f.is_nan(),
        RawValue::Float32(f) => f.is_nan(),
        RawValue::TimestampNanos(nanos) => *nanos == NOT_A_TIME,
        _ => false,
    }
}

// Sub-microsecond digits are dropped, not rounded. Every `i64 / 1_000` microsecond count
// is inside chrono's range, so the fallback arm only guards the `Option`.
fn nanos_to_datetime(nanos: i64) -> NaiveDateTime {
    match DateTime::from_timestamp_micros(nanos.div_euclid(1_000)) {
        Some(dt) => dt.naive_utc(),
        None => DateTime::from_timestamp_nanos(nanos).naive_utc(),
    }
}

/// An ordered, immutable list of normalized parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlParams(Box<[SqlValue]>);

impl SqlParams {
    #[must_use]
    pub fn as_slice(&self) -> &[SqlValue] {
        &self.0
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<SqlValue> {
        self.0.into_vec()
    }
}

impl Deref for SqlParams {
    type Target = [SqlValue];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<SqlValue>> for SqlParams {
    fn from(values: Vec<SqlValue>) -> Self {
        SqlParams(values.into_boxed_slice())
    }
}

impl<'a> IntoIterator for &'a SqlParams {
    type Item = &'a SqlValue;
    type IntoIter = std::slice::Iter<'a, SqlValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
