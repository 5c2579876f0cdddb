mod mock;

#[cfg(test)]
mod tests {
    use crate::mock::Species;
    use indoc::indoc;
    use prepkit_core::{
        BuilderQuery, CompiledQuery, Condition, GenericSqlWriter, ListPlaceholder, Param,
        PartialMatch, Placeholder, QueryKind, QuerySet, RowNames, StatementError, Value, col,
    };

    const WRITER: GenericSqlWriter = GenericSqlWriter;

    fn placeholder(name: &'static str) -> Placeholder {
        Placeholder::new(name).expect("Valid placeholder name")
    }

    #[test]
    fn select_all() {
        let query = QuerySet::<Species>::all();
        let rendered = query.render(&WRITER).expect("Could not render");
        assert_eq!(
            rendered.text,
            r#"SELECT "id", "name", "lifespan" FROM "zoo"."species";"#
        );
        assert!(rendered.params.is_empty());
        assert_eq!(query.kind(), QueryKind::Set);
        assert!(query.supports_deferred_values());
        assert_eq!(query.model().name, "Species");
        assert_eq!(
            query.compiled(),
            CompiledQuery {
                columns: RowNames::from(["id".to_string(), "name".into(), "lifespan".into()])
            }
        );
    }

    #[test]
    fn filters() {
        let query = QuerySet::<Species>::all()
            .filter(col("lifespan").gt(20))
            .filter(col("name").contains(placeholder("fragment")))
            .order_by_desc("lifespan")
            .order_by("name")
            .limit(10);
        let rendered = query.render(&WRITER).expect("Could not render");
        assert_eq!(
            rendered.text,
            indoc! {r#"
                SELECT "id", "name", "lifespan" FROM "zoo"."species" WHERE "lifespan" > %s AND UPPER("name") LIKE UPPER(%s) ORDER BY "lifespan" DESC, "name" ASC LIMIT 10;
            "#}
            .trim_end()
        );
        assert_eq!(
            rendered.params,
            [
                Param::Constant(Value::Int32(Some(20))),
                Param::PartialMatch(PartialMatch::contains(&placeholder("fragment"))),
            ]
        );
    }

    #[test]
    fn constant_partial_match() {
        let rendered = QuerySet::<Species>::all()
            .filter(col("name").contains("ar"))
            .render(&WRITER)
            .unwrap();
        assert_eq!(
            rendered.params,
            [Param::Constant(Value::Varchar(Some("%ar%".into())))]
        );
    }

    #[test]
    fn nested_conditions() {
        let query = QuerySet::<Species>::all()
            .filter(Condition::or([
                col("id").eq(placeholder("first")),
                col("id").eq(placeholder("second")),
            ]))
            .filter(Condition::not(col("lifespan").is_null()));
        let rendered = query.render(&WRITER).unwrap();
        assert_eq!(
            rendered.text,
            indoc! {r#"
                SELECT "id", "name", "lifespan" FROM "zoo"."species" WHERE ("id" = %s OR "id" = %s) AND NOT ("lifespan" IS NULL);
            "#}
            .trim_end()
        );
        assert_eq!(rendered.params.len(), 2);

        let rendered = QuerySet::<Species>::all()
            .filter(Condition::or([
                col("id").le(1),
                Condition::and([col("id").ge(3), col("name").ne("Mayfly")]),
            ]))
            .render(&WRITER)
            .unwrap();
        assert_eq!(
            rendered.text,
            r#"SELECT "id", "name", "lifespan" FROM "zoo"."species" WHERE "id" <= %s OR ("id" >= %s AND "name" <> %s);"#
        );

        let rendered = QuerySet::<Species>::all()
            .filter(Condition::and([]))
            .filter(Condition::or([]))
            .render(&WRITER)
            .unwrap();
        assert_eq!(
            rendered.text,
            r#"SELECT "id", "name", "lifespan" FROM "zoo"."species" WHERE TRUE AND FALSE;"#
        );
    }

    #[test]
    fn set_membership() {
        let rendered = QuerySet::<Species>::all()
            .filter(col("id").is_in(ListPlaceholder::new("ids").unwrap()))
            .render(&WRITER)
            .unwrap();
        assert_eq!(
            rendered.text,
            r#"SELECT "id", "name", "lifespan" FROM "zoo"."species" WHERE "id" IN (%s);"#
        );
        assert!(matches!(rendered.params.as_slice(), [Param::List(..)]));

        let rendered = QuerySet::<Species>::all()
            .filter(col("id").is_in(vec![1, 2]))
            .render(&WRITER)
            .unwrap();
        assert!(matches!(
            rendered.params.as_slice(),
            [Param::Constant(Value::List(Some(..), ..))]
        ));
    }

    #[test]
    fn single_rows() {
        let query = QuerySet::<Species>::all().get(col("id").eq(placeholder("pk")));
        assert_eq!(query.kind(), QueryKind::Single);
        assert_eq!(
            query.render(&WRITER).unwrap().text,
            r#"SELECT "id", "name", "lifespan" FROM "zoo"."species" WHERE "id" = %s;"#
        );

        let query = QuerySet::<Species>::all().order_by("name").first();
        assert_eq!(query.kind(), QueryKind::Single);
        assert_eq!(
            query.render(&WRITER).unwrap().text,
            r#"SELECT "id", "name", "lifespan" FROM "zoo"."species" ORDER BY "id" ASC LIMIT 1;"#
        );

        let query = QuerySet::<Species>::all().last();
        assert_eq!(
            query.render(&WRITER).unwrap().text,
            r#"SELECT "id", "name", "lifespan" FROM "zoo"."species" ORDER BY "id" DESC LIMIT 1;"#
        );
    }

    #[test]
    fn count() {
        let query = QuerySet::<Species>::all()
            .filter(col("lifespan").ge(placeholder("years")))
            .order_by("name")
            .limit(3)
            .count();
        assert_eq!(query.kind(), QueryKind::Count);
        assert_eq!(
            query.render(&WRITER).unwrap().text,
            r#"SELECT COUNT(*) FROM "zoo"."species" WHERE "lifespan" >= %s;"#
        );
        assert!(query.compiled().columns.is_empty());
    }

    #[test]
    fn invalid_queries() {
        let error = QuerySet::<Species>::all()
            .filter(col("id").eq(placeholder("pk")))
            .filter(col("lifespan").gt(placeholder("pk")))
            .render(&WRITER)
            .expect_err("The placeholder is repeated");
        assert_eq!(
            error.downcast_ref::<StatementError>(),
            Some(&StatementError::DuplicatePlaceholderName("pk".into()))
        );

        let error = QuerySet::<Species>::all()
            .filter(col("weight").gt(10))
            .render(&WRITER)
            .expect_err("The column does not exist");
        assert!(matches!(
            error.downcast_ref::<StatementError>(),
            Some(StatementError::InvalidInput(..))
        ));

        let error = QuerySet::<Species>::all()
            .order_by("weight")
            .render(&WRITER)
            .expect_err("The column does not exist");
        assert!(matches!(
            error.downcast_ref::<StatementError>(),
            Some(StatementError::InvalidInput(..))
        ));
    }

    #[test]
    fn unsupported_operations() {
        let query = QuerySet::<Species>::all();
        for (operation, result) in [
            ("aggregate", query.aggregate()),
            ("in_bulk", query.in_bulk()),
            ("create", query.create()),
            ("bulk_create", query.bulk_create()),
            ("bulk_update", query.bulk_update()),
            ("get_or_create", query.get_or_create()),
            ("update_or_create", query.update_or_create()),
            ("delete", query.delete()),
            ("update", query.update()),
            ("exists", query.exists()),
            ("explain", query.explain()),
            ("prefetch_related", query.prefetch_related()),
            ("values_list", query.values_list()),
        ] {
            let error = result.expect_err("Operation must be rejected");
            assert_eq!(
                error.downcast_ref::<StatementError>(),
                Some(&StatementError::UnsupportedOperation(operation))
            );
        }
    }
}
