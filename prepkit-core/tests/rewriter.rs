#[cfg(test)]
mod tests {
    use prepkit_core::{RewriteResult, StatementError, marker_name, rewrite};

    #[test]
    fn positional_markers() {
        let result = rewrite("SELECT * FROM species WHERE lifespan > %s AND name = %s;")
            .expect("Could not rewrite");
        assert_eq!(
            result,
            RewriteResult {
                text: "select * from species where lifespan > $1 and name = $2;".into(),
                parameter_count: 2,
                named_parameters: None,
            }
        );
    }

    #[test]
    fn named_markers() {
        let result = rewrite("SELECT * FROM species WHERE id = %(Record_Id)s AND name = %(name)s")
            .expect("Could not rewrite");
        assert_eq!(result.text, "select * from species where id = $1 and name = $2;");
        assert_eq!(result.parameter_count, 2);
        assert_eq!(
            result.named_parameters,
            Some(vec!["%(record_id)s".to_string(), "%(name)s".to_string()])
        );
    }

    #[test]
    fn repeated_named_marker() {
        let result = rewrite("SELECT %(a)s + %(a)s, %(b)s").expect("Could not rewrite");
        assert_eq!(result.text, "select $1 + $2, $3;");
        assert_eq!(result.parameter_count, 3);
        assert_eq!(
            result.named_parameters.as_deref(),
            Some(["%(a)s".to_string(), "%(a)s".into(), "%(b)s".into()].as_slice())
        );
    }

    #[test]
    fn markers_inside_tokens() {
        let result = rewrite("SELECT * FROM t WHERE (a, b) IN ((%s,%s)) AND c=%s::int")
            .expect("Could not rewrite");
        assert_eq!(
            result.text,
            "select * from t where (a, b) in (($1,$2)) and c=$3::int;"
        );
        assert_eq!(result.parameter_count, 3);

        let result = rewrite("SELECT x FROM t WHERE y=%(y)s::text").expect("Could not rewrite");
        assert_eq!(result.text, "select x from t where y=$1::text;");
    }

    #[test]
    fn mixed_markers() {
        for query in [
            "SELECT * FROM t WHERE a = %s AND b = %(b)s",
            "SELECT * FROM t WHERE b = %(b)s AND a = %s",
        ] {
            let error = rewrite(query).expect_err("Mixed markers must be rejected");
            assert_eq!(
                error.downcast_ref::<StatementError>(),
                Some(&StatementError::MixedPlaceholderStyle)
            );
        }
    }

    #[test]
    fn no_markers() {
        let result = rewrite("SELECT\n    COUNT(*)\n\tFROM species").expect("Could not rewrite");
        assert_eq!(
            result,
            RewriteResult {
                text: "select count(*) from species;".into(),
                parameter_count: 0,
                named_parameters: None,
            }
        );
    }

    #[test]
    fn single_trailing_semicolon() {
        let result = rewrite("SELECT 1;;").expect("Could not rewrite");
        assert_eq!(result.text, "select 1;;");
        let result = rewrite("  SELECT 1 ;  ").expect("Could not rewrite");
        assert_eq!(result.text, "select 1;");
    }

    #[test]
    fn empty_text() {
        let result = rewrite("").expect("Could not rewrite");
        assert_eq!(result.text, "");
        assert_eq!(result.parameter_count, 0);
        assert_eq!(result.named_parameters, None);
    }

    #[test]
    fn literals_are_not_special() {
        let result = rewrite("SELECT 'Big  %s Cat' WHERE a = %s").expect("Could not rewrite");
        assert_eq!(result.text, "select 'big $1 cat' where a = $2;");
        assert_eq!(result.parameter_count, 2);
    }

    #[test]
    fn marker_names() {
        assert_eq!(marker_name("%(record_id)s"), "record_id");
        assert_eq!(marker_name("%(a-b)s"), "a-b");
        assert_eq!(marker_name("%s"), "%s");
    }
}
