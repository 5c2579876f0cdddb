use crate::{
    animals::{Species, catalog_count},
    silent_logs,
};
use prepkit::{
    Driver, Executor, FailureBehaviour, Placeholder, PrepareOptions, QuerySet, Registry,
    SqlWriter, StatementError, args, col,
};
use std::sync::LazyLock;
use tokio::sync::Mutex;

fn eagle() -> &'static str {
    "SELECT id, name, lifespan FROM species WHERE id = 2"
}

fn by_pk_twice() -> QuerySet<Species> {
    QuerySet::all()
        .filter(col("id").eq(Placeholder::new("pk").unwrap()))
        .filter(col("lifespan").gt(Placeholder::new("pk").unwrap()))
}

pub async fn lifecycle<E: Executor>(executor: &mut E) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;
    let registry = Registry::new();

    // Execute before prepare
    let error = registry
        .execute(executor, "eagle", args![])
        .await
        .expect_err("Nothing is prepared yet");
    assert_eq!(
        error.downcast_ref::<StatementError>(),
        Some(&StatementError::NotPrepared("eagle".into()))
    );

    // Prepare before register
    let error = registry
        .prepare_sql_stmt(executor, "eagle", false, FailureBehaviour::Error)
        .await
        .expect_err("Nothing is registered yet");
    assert_eq!(
        error.downcast_ref::<StatementError>(),
        Some(&StatementError::NotRegistered("eagle".into()))
    );

    // Registering does not touch the database
    registry.register_sql("eagle", eagle);
    assert_eq!(catalog_count(executor, "eagle").await, 0);
    assert_eq!(registry.registered_names(), ["eagle"]);

    // Prepare twice
    registry
        .prepare_sql_stmt(executor, "eagle", false, FailureBehaviour::Error)
        .await
        .expect("Could not prepare eagle");
    assert_eq!(catalog_count(executor, "eagle").await, 1);
    let error = registry
        .prepare_sql_stmt(executor, "eagle", false, FailureBehaviour::Error)
        .await
        .expect_err("eagle is already prepared");
    assert_eq!(
        error.downcast_ref::<StatementError>(),
        Some(&StatementError::AlreadyPrepared("eagle".into()))
    );
    for _ in 0..2 {
        registry
            .prepare_sql_stmt(executor, "eagle", true, FailureBehaviour::Error)
            .await
            .expect("Could not prepare eagle again");
    }
    assert_eq!(catalog_count(executor, "eagle").await, 1);
    assert_eq!(registry.prepared_names().await, ["eagle"]);
    let species: Species = registry
        .fetch_one(executor, "eagle", args![])
        .await
        .expect("Could not execute eagle");
    assert_eq!(species.id, 2);

    // The statement disappears from the session
    let mut query = String::new();
    executor
        .driver()
        .sql_writer()
        .write_deallocate(&mut query, "eagle");
    executor
        .execute(query)
        .await
        .expect("Could not deallocate eagle behind the registry");
    assert_eq!(catalog_count(executor, "eagle").await, 0);
    let species: Species = registry
        .fetch_one(executor, "eagle", args![])
        .await
        .expect("eagle should be prepared again transparently");
    assert_eq!(species.name, "Eagle");
    assert_eq!(catalog_count(executor, "eagle").await, 1);

    // A real error is not mistaken for a missing statement
    registry.register_sql("division", || "SELECT 1 / %s");
    registry
        .prepare_sql_stmt(executor, "division", false, FailureBehaviour::Error)
        .await
        .expect("Could not prepare division");
    silent_logs! {
        let error = registry
            .execute(executor, "division", args![0])
            .await
            .expect_err("Division by zero");
        assert!(error.downcast_ref::<StatementError>().is_none(), "{error:#}");
    }
    assert_eq!(catalog_count(executor, "division").await, 1);

    // Duplicate placeholder names
    registry.register_qs("by_pk_twice", by_pk_twice);
    let error = registry
        .prepare_qs_stmt(executor, "by_pk_twice", false, FailureBehaviour::Error)
        .await
        .expect_err("pk is used twice");
    assert_eq!(
        error.downcast_ref::<StatementError>(),
        Some(&StatementError::DuplicatePlaceholderName("pk".into()))
    );
    assert!(!registry.is_prepared("by_pk_twice").await);
    registry
        .destroy(executor)
        .await
        .expect("Could not destroy the registry");

    // Warn leaves the statement to be prepared on first use
    registry.register_sql("missing_table", || "SELECT * FROM not_yet_migrated");
    registry.register_sql("eagle", eagle);
    silent_logs! {
        registry
            .startup(executor)
            .await
            .expect("Startup only warns");
    }
    assert_eq!(catalog_count(executor, "missing_table").await, 0);
    assert_eq!(catalog_count(executor, "eagle").await, 1);
    silent_logs! {
        let error = registry
            .execute(executor, "missing_table", args![])
            .await
            .expect_err("The table does not exist");
        assert_eq!(
            error.downcast_ref::<StatementError>(),
            Some(&StatementError::StatementWillNotPrepare(
                "missing_table".into()
            ))
        );
        let error = registry
            .prepare_all(executor, PrepareOptions::default())
            .await
            .expect_err("Error fails on the missing table");
        assert!(error.downcast_ref::<StatementError>().is_none(), "{error:#}");
    }

    // Reset between tests
    executor
        .execute("CREATE TABLE not_yet_migrated (id INTEGER);".into())
        .await
        .expect("Could not create not_yet_migrated");
    registry.reset(executor).await.expect("Could not reset");
    assert_eq!(catalog_count(executor, "missing_table").await, 1);
    assert_eq!(catalog_count(executor, "eagle").await, 1);
    registry
        .destroy(executor)
        .await
        .expect("Could not destroy the registry");
    executor
        .execute("DROP TABLE not_yet_migrated;".into())
        .await
        .expect("Could not drop not_yet_migrated");
}
