use crate::animals::{Species, catalog_count};
use prepkit::{
    Args, Executor, FailureBehaviour, Registry, StatementError, StatementOutput, Value, args,
    prepare_sql, register_prepared_sql,
};
use std::sync::LazyLock;
use tokio::sync::Mutex;

fn species_by_id_and_name() -> &'static str {
    "SELECT id, name, lifespan FROM species WHERE id = %s AND name = %s;"
}

fn species_longer_lived() -> String {
    "select id, name, lifespan from species where lifespan > %(years)s or lifespan = %(years)s order by id"
        .into()
}

fn species_count() -> &'static str {
    "SELECT COUNT(*) FROM species"
}

pub async fn sql_statements<E: Executor>(executor: &mut E) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;
    let registry = Registry::new();

    // Positional markers
    let name = prepare_sql!(registry, executor, species_by_id_and_name)
        .await
        .expect("Could not prepare species_by_id_and_name");
    assert!(name.ends_with("::species_by_id_and_name"));
    assert_eq!(catalog_count(executor, &name).await, 1);
    let species: Vec<Species> = registry
        .fetch_all(executor, &name, args![1, "carp"])
        .await
        .expect("Could not execute species_by_id_and_name");
    assert!(species.is_empty(), "Arguments are not lower cased");
    let species: Species = registry
        .fetch_one(executor, &name, args![1, "Carp"])
        .await
        .expect("Could not execute species_by_id_and_name");
    assert_eq!(
        species,
        Species {
            id: 1,
            name: "Carp".into(),
            lifespan: Some(20),
        }
    );
    let description = registry
        .describe(&name)
        .await
        .expect("Statement should be described");
    assert_eq!(
        description.rewritten_text.as_deref(),
        Some("select id, name, lifespan from species where id = $1 and name = $2;")
    );
    assert_eq!(
        description.execute_template.as_deref(),
        Some(format!("EXECUTE {}(%s, %s)", description.backend_name).as_str())
    );

    // Round trip: same rows as the query run directly
    let direct = executor
        .fetch_all("SELECT id, name, lifespan FROM species WHERE id = 1 AND name = 'Carp';".into())
        .await
        .expect("Could not run the query directly");
    let StatementOutput::Rows(prepared) = registry
        .execute(executor, &name, args![1, "Carp"])
        .await
        .expect("Could not execute species_by_id_and_name")
    else {
        panic!("Expected rows");
    };
    assert_eq!(
        direct.iter().map(|r| r.values().to_vec()).collect::<Vec<_>>(),
        prepared.iter().map(|r| r.values().to_vec()).collect::<Vec<_>>(),
    );

    // Wrong number of arguments
    let error = registry
        .execute(executor, &name, args![1])
        .await
        .expect_err("One argument is missing");
    assert!(matches!(
        error.downcast_ref::<StatementError>(),
        Some(StatementError::InsufficientParameters {
            expected: 2,
            supplied: 1
        })
    ));

    // Named markers, the repeated one takes the same value
    let name = register_prepared_sql!(registry, species_longer_lived);
    assert!(registry.is_registered(&name));
    assert!(!registry.is_prepared(&name).await);
    registry
        .prepare_sql_stmt(executor, &name, false, FailureBehaviour::Error)
        .await
        .expect("Could not prepare species_longer_lived");
    let species: Vec<Species> = registry
        .fetch_all(executor, &name, args![years = 25])
        .await
        .expect("Could not execute species_longer_lived");
    assert_eq!(
        species.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        ["Eagle", "Tortoise"]
    );
    let error = registry
        .execute(executor, &name, args![years = 25, months = 3])
        .await
        .expect_err("months is not a parameter");
    assert_eq!(
        error.downcast_ref::<StatementError>(),
        Some(&StatementError::UnknownParameters(vec!["months".into()]))
    );
    let error = registry
        .execute(executor, &name, Args::new())
        .await
        .expect_err("years is required");
    assert_eq!(
        error.downcast_ref::<StatementError>(),
        Some(&StatementError::MissingParameter("years".into()))
    );

    // No markers
    let name = prepare_sql!(registry, executor, species_count)
        .await
        .expect("Could not prepare species_count");
    let StatementOutput::Rows(rows) = registry
        .execute(executor, &name, args![])
        .await
        .expect("Could not execute species_count")
    else {
        panic!("Expected rows");
    };
    assert_eq!(rows[0].values()[0].as_i64(), Some(4));

    // Null argument
    registry.register_sql("species_without_lifespan", || {
        "SELECT name FROM species WHERE lifespan IS NOT DISTINCT FROM %s::INTEGER"
    });
    registry
        .prepare_sql_stmt(
            executor,
            "species_without_lifespan",
            false,
            FailureBehaviour::Error,
        )
        .await
        .expect("Could not prepare species_without_lifespan");
    let StatementOutput::Rows(rows) = registry
        .execute(
            executor,
            "species_without_lifespan",
            args![Value::Int32(None)],
        )
        .await
        .expect("Could not execute species_without_lifespan")
    else {
        panic!("Expected rows");
    };
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_column("name"), Some(&Value::Varchar(Some("Mayfly".into()))));

    registry
        .destroy(executor)
        .await
        .expect("Could not destroy the registry");
    assert!(registry.registered_names().is_empty());
    assert_eq!(catalog_count(executor, "species_without_lifespan").await, 0);
}
