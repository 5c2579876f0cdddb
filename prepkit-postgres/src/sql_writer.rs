use prepkit_core::{SqlWriter, Value};
use std::fmt::Write;

pub struct PostgresSqlWriter {}

impl SqlWriter for PostgresSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn write_column_type(&self, out: &mut String, value: &Value) {
        match value {
            Value::Boolean(..) => out.push_str("BOOLEAN"),
            Value::Int8(..) => out.push_str("SMALLINT"),
            Value::Int16(..) => out.push_str("SMALLINT"),
            Value::Int32(..) => out.push_str("INTEGER"),
            Value::Int64(..) => out.push_str("BIGINT"),
            Value::Float32(..) => out.push_str("REAL"),
            Value::Float64(..) => out.push_str("DOUBLE PRECISION"),
            Value::Decimal(..) => out.push_str("NUMERIC"),
            Value::Varchar(..) => out.push_str("TEXT"),
            Value::Blob(..) => out.push_str("BYTEA"),
            Value::Date(..) => out.push_str("DATE"),
            Value::Time(..) => out.push_str("TIME"),
            Value::Timestamp(..) => out.push_str("TIMESTAMP"),
            Value::TimestampWithTimezone(..) => out.push_str("TIMESTAMP WITH TIME ZONE"),
            Value::Uuid(..) => out.push_str("UUID"),
            Value::List(.., inner) => {
                self.write_column_type(out, inner);
                out.push_str("[]");
            }
            Value::Null | Value::Unknown(..) => {}
        };
    }

    fn write_cast_suffix(&self, out: &mut String, value: &Value) {
        let mut ty = String::new();
        self.write_column_type(&mut ty, value);
        if !ty.is_empty() && !ty.starts_with('[') {
            out.push_str("::");
            out.push_str(&ty);
        }
    }

    fn write_value_blob(&self, out: &mut String, value: &[u8]) {
        out.push_str("'\\x");
        for b in value {
            let _ = write!(out, "{:02X}", b);
        }
        out.push_str("'::BYTEA");
    }
}
