mod init;

#[cfg(test)]
mod tests {
    use super::init::init;
    use prepkit_core::{
        Args, Connection, Driver, Executor, FailureBehaviour, Registry, StatementOutput,
        Transaction,
    };
    use prepkit_postgres::{PostgresConnection, PostgresDriver};
    use prepkit_tests::{execute_tests, init_logs, silent_logs};
    use std::sync::{Mutex, PoisonError};

    static MUTEX: Mutex<()> = Mutex::new(());

    #[tokio::test]
    async fn postgres() {
        init_logs();
        let _guard = MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
        let (url, container) = init().await;
        let error_msg = format!("Could not connect to `{url}`");
        let connection = PostgresConnection::connect(url.into())
            .await
            .expect(&error_msg);
        execute_tests(connection).await;
        drop(container);
    }

    #[tokio::test]
    async fn session_swap() {
        init_logs();
        let _guard = MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
        let (url, container) = init().await;
        let mut first = PostgresConnection::connect(url.clone().into())
            .await
            .expect("Could not connect");
        let mut second = PostgresConnection::connect(url.into())
            .await
            .expect("Could not connect");
        let registry = Registry::new();
        registry.register_sql("answer", || "SELECT %s::INTEGER + 1 AS answer");
        registry
            .prepare_sql_stmt(&mut first, "answer", false, FailureBehaviour::Error)
            .await
            .expect("Could not prepare answer");
        // The second session never saw the PREPARE
        let StatementOutput::Rows(rows) = registry
            .execute(&mut second, "answer", Args::new().push(41))
            .await
            .expect("answer should be prepared in the second session")
        else {
            panic!("Expected rows");
        };
        assert_eq!(rows[0].get_column("answer").and_then(|v| v.as_i64()), Some(42));
        let StatementOutput::Rows(rows) = registry
            .execute(&mut first, "answer", Args::new().push(1))
            .await
            .expect("answer is still prepared in the first session")
        else {
            panic!("Expected rows");
        };
        assert_eq!(rows[0].get_column("answer").and_then(|v| v.as_i64()), Some(2));
        drop(container);
    }

    #[tokio::test]
    async fn failure_keeps_transaction() {
        init_logs();
        let _guard = MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
        let (url, container) = init().await;
        let mut connection = PostgresConnection::connect(url.into())
            .await
            .expect("Could not connect");
        let registry = Registry::new();
        registry.register_sql("broken", || "SELECT * FROM no_such_table WHERE id = %s");
        registry.register_sql("one", || "SELECT 1 AS one");
        let mut transaction = connection.begin().await.expect("Could not begin");
        silent_logs! {
            assert!(
                registry
                    .prepare_sql_stmt(&mut transaction, "broken", false, FailureBehaviour::Error)
                    .await
                    .is_err()
            );
        }
        registry
            .prepare_sql_stmt(&mut transaction, "one", false, FailureBehaviour::Error)
            .await
            .expect("The transaction should still be usable");
        let StatementOutput::Rows(rows) = registry
            .execute(&mut transaction, "one", Args::new())
            .await
            .expect("Could not execute one")
        else {
            panic!("Expected rows");
        };
        assert_eq!(rows.len(), 1);
        transaction.commit().await.expect("Could not commit");
        drop(container);
    }

    #[tokio::test]
    async fn stale_statement_is_recognized() {
        init_logs();
        let _guard = MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
        let (url, container) = init().await;
        let mut connection = PostgresConnection::connect(url.into())
            .await
            .expect("Could not connect");
        silent_logs! {
            let error = connection
                .fetch_all("EXECUTE never_prepared;".into())
                .await
                .expect_err("never_prepared does not exist");
            assert!(PostgresDriver::new().is_stale_statement(&error));
            let error = connection
                .fetch_all("SELECT * FROM no_such_table;".into())
                .await
                .expect_err("no_such_table does not exist");
            assert!(!PostgresDriver::new().is_stale_statement(&error));
        }
        drop(container);
    }

    #[tokio::test]
    async fn long_multibyte_argument() {
        init_logs();
        let _guard = MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
        let (url, container) = init().await;
        let mut connection = PostgresConnection::connect(url.into())
            .await
            .expect("Could not connect");
        let registry = Registry::new();
        registry.register_sql("echo", || "SELECT %s::TEXT AS echo");
        registry
            .prepare_sql_stmt(&mut connection, "echo", false, FailureBehaviour::Error)
            .await
            .expect("Could not prepare echo");
        // The EXECUTE text has a two bytes character across byte 497
        let value = format!("{}é", "a".repeat(482));
        let StatementOutput::Rows(rows) = registry
            .execute(&mut connection, "echo", Args::new().push(value.clone()))
            .await
            .expect("Could not execute echo")
        else {
            panic!("Expected rows");
        };
        assert_eq!(
            rows[0].get_column("echo"),
            Some(&prepkit_core::Value::Varchar(Some(value)))
        );
        drop(container);
    }

    #[tokio::test]
    async fn wrong_url() {
        silent_logs! {
            assert!(
                PostgresConnection::connect("mysql://some_url".into())
                    .await
                    .is_err()
            );
        }
    }
}
