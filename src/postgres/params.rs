use std::error::Error;

use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use tokio_util::bytes;

use crate::conversion::SqlParams;
use crate::error::SqlHelperError;
use crate::types::SqlValue;

impl SqlParams {
    /// Borrow the parameters in the shape `tokio_postgres::Client::query` expects.
    #[must_use]
    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        let mut references = Vec::with_capacity(self.len());
        for p in self {
            references.push(p as &(dyn ToSql + Sync));
        }
        references
    }
}

impl ToSql for SqlValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Int(i) => int_to_sql(*i, ty, out),
            SqlValue::Float(f) => match *ty {
                Type::FLOAT8 => f.to_sql(ty, out),
                // Widened float32 values round-trip exactly; other values round like a
                // server-side assignment cast.
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                Type::INT2 | Type::INT4 | Type::INT8 => int_to_sql(integral(*f, ty)?, ty, out),
                _ => Err(mismatch(self, ty).into()),
            },
            SqlValue::Timestamp(dt) => match *ty {
                Type::TIMESTAMP => dt.to_sql(ty, out),
                Type::TIMESTAMPTZ => dt.and_utc().to_sql(ty, out),
                Type::DATE => dt.date().to_sql(ty, out),
                _ => Err(mismatch(self, ty).into()),
            },
            SqlValue::Text(s) => checked(s, self, ty, out),
            SqlValue::Bool(b) => checked(b, self, ty, out),
            SqlValue::Json(jsval) => checked(jsval, self, ty, out),
            SqlValue::Blob(bytes) => checked(bytes, self, ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::TEXT
                | Type::VARCHAR
                | Type::BPCHAR
                | Type::NAME
                | Type::BOOL
                | Type::TIMESTAMP
                | Type::TIMESTAMPTZ
                | Type::DATE
                | Type::JSON
                | Type::JSONB
                | Type::BYTEA
        )
    }

    to_sql_checked!();
}

// Largest magnitude an f64 holds without losing integer precision.
const F64_EXACT_INT: i64 = 1 << 53;

fn int_to_sql(
    value: i64,
    ty: &Type,
    out: &mut bytes::BytesMut,
) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    match *ty {
        Type::INT2 => narrow::<i16>(value, ty)?.to_sql(ty, out),
        Type::INT4 => narrow::<i32>(value, ty)?.to_sql(ty, out),
        Type::INT8 => value.to_sql(ty, out),
        Type::FLOAT8 if (-F64_EXACT_INT..=F64_EXACT_INT).contains(&value) => {
            (value as f64).to_sql(ty, out)
        }
        Type::FLOAT4 if (-(1 << 24)..=(1 << 24)).contains(&value) => {
            (value as f32).to_sql(ty, out)
        }
        Type::FLOAT4 | Type::FLOAT8 => Err(SqlHelperError::ParameterError(format!(
            "{value} cannot be stored exactly in column type {ty}"
        ))
        .into()),
        _ => Err(mismatch(&SqlValue::Int(value), ty).into()),
    }
}

// Bind through the inner value only when its own `ToSql` accepts the column type.
fn checked<T: ToSql>(
    inner: &T,
    value: &SqlValue,
    ty: &Type,
    out: &mut bytes::BytesMut,
) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    if T::accepts(ty) {
        inner.to_sql(ty, out)
    } else {
        Err(mismatch(value, ty).into())
    }
}

fn integral(value: f64, ty: &Type) -> Result<i64, SqlHelperError> {
    // -2^63 and 2^63 are exact in f64; the range is half-open at the top.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if value.fract() == 0.0 && (-LIMIT..LIMIT).contains(&value) {
        Ok(value as i64)
    } else {
        Err(SqlHelperError::ParameterError(format!(
            "{value} is not an integer that fits column type {ty}"
        )))
    }
}

fn narrow<T: TryFrom<i64>>(value: i64, ty: &Type) -> Result<T, SqlHelperError> {
    T::try_from(value).map_err(|_| {
        SqlHelperError::ParameterError(format!("{value} does not fit column type {ty}"))
    })
}

fn mismatch(value: &SqlValue, ty: &Type) -> SqlHelperError {
    SqlHelperError::ParameterError(format!("cannot bind {} to column type {ty}", kind(value)))
}

fn kind(value: &SqlValue) -> &'static str {
    match value {
        SqlValue::Null => "null",
        SqlValue::Float(_) => "a float",
        SqlValue::Int(_) => "an integer",
        SqlValue::Timestamp(_) => "a timestamp",
        SqlValue::Text(_) => "text",
        SqlValue::Bool(_) => "a boolean",
        SqlValue::Json(_) => "JSON",
        SqlValue::Blob(_) => "bytes",
    }
}
