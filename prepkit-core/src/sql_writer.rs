use crate::{
    Condition, ModelDescriptor, Ordering, Param, QueryKind, Value, separated_by,
    util::backend_statement_name,
};
use std::fmt::Write;
use time::{Date, Time, UtcOffset};

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}
macro_rules! write_float {
    ($this:ident, $out:ident, $value:expr, $type:expr) => {{
        if $value.is_finite() {
            let mut buffer = ryu::Buffer::new();
            $out.push_str(buffer.format($value));
        } else {
            $this.write_value_string(
                $out,
                if $value.is_nan() {
                    "NaN"
                } else if $value.is_sign_positive() {
                    "Infinity"
                } else {
                    "-Infinity"
                },
            );
            $this.write_cast_suffix($out, &$type);
        }
    }};
}

/// Parts of a select produced by the query builder.
#[derive(Debug, Clone, Copy)]
pub struct SelectQuery<'a> {
    pub model: &'static ModelDescriptor,
    pub kind: QueryKind,
    pub conditions: &'a [Condition],
    pub ordering: &'a [Ordering],
    pub limit: Option<u32>,
}

/// Dialect specific SQL generation.
///
/// Values are always written as literals: `EXECUTE` does not accept bind parameters,
/// the arguments are part of the statement text.
pub trait SqlWriter: Send + Sync {
    fn as_dyn(&self) -> &dyn SqlWriter;

    fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(out, value, '"', r#""""#);
        out.push('"');
    }

    fn write_table_ref(&self, out: &mut String, model: &ModelDescriptor) {
        if !model.schema.is_empty() {
            self.write_identifier_quoted(out, model.schema);
            out.push('.');
        }
        self.write_identifier_quoted(out, model.table);
    }

    fn write_column_ref(&self, out: &mut String, name: &str) {
        self.write_identifier_quoted(out, name);
    }

    /// Type name used in casts, empty when the dialect has none for the value.
    fn write_column_type(&self, _out: &mut String, _value: &Value) {}

    /// Cast appended to a literal whose type would be ambiguous otherwise.
    fn write_cast_suffix(&self, _out: &mut String, _value: &Value) {}

    fn write_value(&self, out: &mut String, value: &Value) {
        match value {
            v if v.is_null() => self.write_value_none(out),
            Value::Boolean(Some(v)) => self.write_value_bool(out, *v),
            Value::Int8(Some(v)) => write_integer!(out, *v),
            Value::Int16(Some(v)) => write_integer!(out, *v),
            Value::Int32(Some(v)) => write_integer!(out, *v),
            Value::Int64(Some(v)) => write_integer!(out, *v),
            Value::Float32(Some(v)) => write_float!(self, out, *v, Value::Float32(None)),
            Value::Float64(Some(v)) => write_float!(self, out, *v, Value::Float64(None)),
            Value::Decimal(Some(v)) => {
                let _ = write!(out, "{}", v);
            }
            Value::Varchar(Some(v)) | Value::Unknown(Some(v)) => self.write_value_string(out, v),
            Value::Blob(Some(v)) => self.write_value_blob(out, v.as_ref()),
            Value::Date(Some(v)) => {
                out.push('\'');
                self.write_value_date(out, v);
                out.push('\'');
                self.write_cast_suffix(out, value);
            }
            Value::Time(Some(v)) => {
                out.push('\'');
                self.write_value_time(out, v);
                out.push('\'');
                self.write_cast_suffix(out, value);
            }
            Value::Timestamp(Some(v)) => {
                out.push('\'');
                self.write_value_date(out, &v.date());
                out.push(' ');
                self.write_value_time(out, &v.time());
                out.push('\'');
                self.write_cast_suffix(out, value);
            }
            Value::TimestampWithTimezone(Some(v)) => {
                out.push('\'');
                self.write_value_date(out, &v.date());
                out.push(' ');
                self.write_value_time(out, &v.time());
                self.write_value_offset(out, v.offset());
                out.push('\'');
                self.write_cast_suffix(out, value);
            }
            Value::Uuid(Some(v)) => {
                let _ = write!(out, "'{}'", v);
                self.write_cast_suffix(out, value);
            }
            Value::List(Some(v), ..) => self.write_value_list(out, v, value),
            _ => self.write_value_none(out),
        };
    }

    fn write_value_none(&self, out: &mut String) {
        out.push_str("NULL");
    }

    fn write_value_bool(&self, out: &mut String, value: bool) {
        out.push_str(["false", "true"][value as usize]);
    }

    fn write_value_string(&self, out: &mut String, value: &str) {
        out.push('\'');
        self.write_escaped(out, value, '\'', "''");
        out.push('\'');
    }

    fn write_value_blob(&self, out: &mut String, value: &[u8]) {
        out.push_str("'\\x");
        for b in value {
            let _ = write!(out, "{:02X}", b);
        }
        out.push('\'');
    }

    fn write_value_date(&self, out: &mut String, value: &Date) {
        let _ = write!(
            out,
            "{:04}-{:02}-{:02}",
            value.year(),
            value.month() as u8,
            value.day()
        );
    }

    fn write_value_time(&self, out: &mut String, value: &Time) {
        let mut subsecond = value.nanosecond();
        let mut width = 9;
        while width > 1 && subsecond % 10 == 0 {
            subsecond /= 10;
            width -= 1;
        }
        let _ = write!(
            out,
            "{:02}:{:02}:{:02}.{:0width$}",
            value.hour(),
            value.minute(),
            value.second(),
            subsecond
        );
    }

    fn write_value_offset(&self, out: &mut String, value: UtcOffset) {
        let (hours, minutes, _) = value.as_hms();
        let _ = write!(
            out,
            "{}{:02}:{:02}",
            if value.is_negative() { '-' } else { '+' },
            hours.unsigned_abs(),
            minutes.unsigned_abs()
        );
    }

    fn write_value_list(&self, out: &mut String, values: &[Value], list: &Value) {
        if values.is_empty() {
            out.push_str("'{}'");
            self.write_cast_suffix(out, list);
            return;
        }
        out.push_str("ARRAY[");
        separated_by(out, values, |out, v| self.write_value(out, v), ",");
        out.push(']');
    }

    fn write_prepare(&self, out: &mut String, name: &str, query: &str) {
        out.push_str("PREPARE ");
        out.push_str(&backend_statement_name(name));
        out.push_str(" AS ");
        out.push_str(query.trim_end().trim_end_matches(';'));
        out.push(';');
    }

    fn write_execute(&self, out: &mut String, name: &str, args: &[Value]) {
        out.push_str("EXECUTE ");
        out.push_str(&backend_statement_name(name));
        if !args.is_empty() {
            out.push('(');
            separated_by(out, args, |out, v| self.write_value(out, v), ", ");
            out.push(')');
        }
        out.push(';');
    }

    fn write_deallocate(&self, out: &mut String, name: &str) {
        out.push_str("DEALLOCATE ");
        out.push_str(&backend_statement_name(name));
        out.push(';');
    }

    /// Query returning a single row with the number of statements named `name` in the
    /// current session.
    fn write_check_prepared(&self, out: &mut String, name: &str) {
        out.push_str("SELECT COUNT(*) FROM pg_prepared_statements WHERE name = ");
        self.write_value_string(out, &backend_statement_name(name));
        out.push(';');
    }

    /// Writes a select with a `%s` marker for every entry pushed to `params`.
    fn write_select(&self, out: &mut String, params: &mut Vec<Param>, query: SelectQuery) {
        out.push_str("SELECT ");
        if query.kind == QueryKind::Count {
            out.push_str("COUNT(*)");
        } else {
            separated_by(
                out,
                query.model.columns,
                |out, c| self.write_column_ref(out, c.name),
                ", ",
            );
        }
        out.push_str(" FROM ");
        self.write_table_ref(out, query.model);
        if !query.conditions.is_empty() {
            out.push_str(" WHERE ");
            separated_by(
                out,
                query.conditions,
                |out, c| self.write_condition(out, params, c, query.conditions.len() > 1),
                " AND ",
            );
        }
        if query.kind != QueryKind::Count {
            if !query.ordering.is_empty() {
                out.push_str(" ORDER BY ");
                separated_by(
                    out,
                    query.ordering,
                    |out, o| {
                        self.write_column_ref(out, &o.column.0);
                        out.push_str(if o.descending { " DESC" } else { " ASC" });
                    },
                    ", ",
                );
            }
            if let Some(limit) = query.limit {
                let _ = write!(out, " LIMIT {}", limit);
            }
        }
        out.push(';');
    }

    fn write_marker(&self, out: &mut String, params: &mut Vec<Param>, param: &Param) {
        out.push_str("%s");
        params.push(param.clone());
    }

    fn write_condition(
        &self,
        out: &mut String,
        params: &mut Vec<Param>,
        condition: &Condition,
        nested: bool,
    ) {
        match condition {
            Condition::Compare { column, op, value } => {
                self.write_column_ref(out, &column.0);
                out.push(' ');
                out.push_str(op.as_str());
                out.push(' ');
                self.write_marker(out, params, value);
            }
            Condition::In { column, values } => {
                self.write_column_ref(out, &column.0);
                out.push_str(" IN (");
                self.write_marker(out, params, values);
                out.push(')');
            }
            Condition::Contains { column, pattern } => {
                out.push_str("UPPER(");
                self.write_column_ref(out, &column.0);
                out.push_str(") LIKE UPPER(");
                self.write_marker(out, params, pattern);
                out.push(')');
            }
            Condition::IsNull(column) => {
                self.write_column_ref(out, &column.0);
                out.push_str(" IS NULL");
            }
            Condition::And(v) | Condition::Or(v) if v.is_empty() => {
                out.push_str(if matches!(condition, Condition::And(..)) {
                    "TRUE"
                } else {
                    "FALSE"
                });
            }
            Condition::And(v) | Condition::Or(v) => {
                let separator = if matches!(condition, Condition::And(..)) {
                    " AND "
                } else {
                    " OR "
                };
                if nested {
                    out.push('(');
                }
                separated_by(
                    out,
                    v,
                    |out, c| self.write_condition(out, params, c, true),
                    separator,
                );
                if nested {
                    out.push(')');
                }
            }
            Condition::Not(v) => {
                out.push_str("NOT (");
                self.write_condition(out, params, v, false);
                out.push(')');
            }
        }
    }
}

/// Writer for the SQL shared by the supported dialects.
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericSqlWriter;

impl GenericSqlWriter {
    pub fn new() -> Self {
        Self
    }
}

impl SqlWriter for GenericSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}
