use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

/// Values in the form a SQL parameter binder accepts.
///
/// This is what the normalizer produces. Every variant binds directly into a
/// `tokio-postgres` statement (see [`crate::SqlParams::as_refs`]):
/// ```rust
/// use sql_secret_helper::prelude::*;
///
/// let params = vec![
///     SqlValue::Int(1),
///     SqlValue::Text("alice".into()),
///     SqlValue::Null,
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value
    Null,
    /// Floating point value (64-bit)
    Float(f64),
    /// Integer value (64-bit)
    Int(i64),
    /// Timestamp value, microsecond precision
    Timestamp(NaiveDateTime),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// JSON value
    Json(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let SqlValue::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let SqlValue::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let SqlValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let SqlValue::Timestamp(value) = self {
            Some(*value)
        } else {
            None
        }
    }
}

/// Nanosecond timestamp value that marks "not a time".
pub const NOT_A_TIME: i64 = i64::MIN;

/// A scalar as it arrives from the caller, before normalization.
///
/// The variants form a closed set: native-width numbers, narrower numeric types
/// that widen, a nullable integer, a nanosecond timestamp, the null marker, and
/// `Opaque` for anything already in binder form.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    /// Native double; NaN is treated as null.
    Float(f64),
    /// Native integer.
    Int(i64),
    Float32(f32),
    Int32(i32),
    Int16(i16),
    Int8(i8),
    UInt32(u32),
    UInt16(u16),
    UInt8(u8),
    /// Integer column that carries its own missing-value marker (`None`).
    NullableInt(Option<i64>),
    /// Nanoseconds since the Unix epoch (UTC). [`NOT_A_TIME`] is null.
    TimestampNanos(i64),
    Opaque(SqlValue),
}

impl RawValue {
    /// Nanosecond timestamp for `dt`. Dates outside the range a 64-bit nanosecond count
    /// can represent are kept as an opaque [`SqlValue::Timestamp`].
    #[must_use]
    pub fn timestamp(dt: NaiveDateTime) -> Self {
        match dt.and_utc().timestamp_nanos_opt() {
            Some(nanos) => RawValue::TimestampNanos(nanos),
            None => RawValue::Opaque(SqlValue::Timestamp(dt)),
        }
    }
}

macro_rules! raw_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for RawValue {
                fn from(value: $ty) -> Self {
                    RawValue::$variant(value)
                }
            }
        )*
    };
}

raw_value_from!(
    f64 => Float,
    i64 => Int,
    f32 => Float32,
    i32 => Int32,
    i16 => Int16,
    i8 => Int8,
    u32 => UInt32,
    u16 => UInt16,
    u8 => UInt8,
    Option<i64> => NullableInt,
    SqlValue => Opaque,
);

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Opaque(SqlValue::Text(value.to_string()))
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Opaque(SqlValue::Text(value))
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Opaque(SqlValue::Bool(value))
    }
}

impl From<NaiveDateTime> for RawValue {
    fn from(value: NaiveDateTime) -> Self {
        RawValue::Opaque(SqlValue::Timestamp(value))
    }
}

impl From<JsonValue> for RawValue {
    fn from(value: JsonValue) -> Self {
        RawValue::Opaque(SqlValue::Json(value))
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(value: Vec<u8>) -> Self {
        RawValue::Opaque(SqlValue::Blob(value))
    }
}
