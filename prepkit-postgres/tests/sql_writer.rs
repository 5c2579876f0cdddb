#[cfg(test)]
mod tests {
    use prepkit_core::{SqlWriter, Value};
    use prepkit_postgres::PostgresSqlWriter;
    use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

    const WRITER: PostgresSqlWriter = PostgresSqlWriter {};

    fn literal(value: Value) -> String {
        let mut out = String::new();
        WRITER.write_value(&mut out, &value);
        out
    }

    #[test]
    fn typed_literals() {
        let date = Date::from_calendar_date(2024, Month::February, 29).unwrap();
        let time = Time::from_hms(18, 30, 0).unwrap();
        assert_eq!(literal(Value::Int32(Some(7))), "7");
        assert_eq!(literal(Value::Varchar(Some("it's".into()))), "'it''s'");
        assert_eq!(literal(Value::Date(Some(date))), "'2024-02-29'::DATE");
        assert_eq!(literal(Value::Time(Some(time))), "'18:30:00.0'::TIME");
        assert_eq!(
            literal(Value::Timestamp(Some(PrimitiveDateTime::new(date, time)))),
            "'2024-02-29 18:30:00.0'::TIMESTAMP"
        );
        assert_eq!(
            literal(Value::TimestampWithTimezone(Some(OffsetDateTime::new_utc(
                date, time
            )))),
            "'2024-02-29 18:30:00.0+00:00'::TIMESTAMP WITH TIME ZONE"
        );
        assert_eq!(
            literal(Value::Blob(Some(vec![0x00u8, 0xFF].into()))),
            r"'\x00FF'::BYTEA"
        );
        assert_eq!(
            literal(Value::Float64(Some(f64::INFINITY))),
            "'Infinity'::DOUBLE PRECISION"
        );
        assert_eq!(literal(Value::Float32(Some(0.25))), "0.25");
    }

    #[test]
    fn list_literals() {
        assert_eq!(
            literal(Value::List(
                Some(vec![Value::Int64(Some(1)), Value::Int64(Some(3))]),
                Box::new(Value::Int64(None))
            )),
            "ARRAY[1,3]"
        );
        assert_eq!(
            literal(Value::List(Some(vec![]), Box::new(Value::Int32(None)))),
            "'{}'::INTEGER[]"
        );
        assert_eq!(
            literal(Value::List(Some(vec![]), Box::new(Value::Varchar(None)))),
            "'{}'::TEXT[]"
        );
        assert_eq!(
            literal(Value::List(Some(vec![]), Box::new(Value::Unknown(None)))),
            "'{}'"
        );
    }

    #[test]
    fn column_types() {
        let mut out = String::new();
        WRITER.write_column_type(
            &mut out,
            &Value::List(None, Box::new(Value::List(None, Box::new(Value::Uuid(None))))),
        );
        assert_eq!(out, "UUID[][]");
    }
}
