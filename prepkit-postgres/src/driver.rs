use crate::{PostgresConnection, PostgresSqlWriter, PostgresTransaction};
use prepkit_core::{Driver, Error};
use tokio_postgres::error::SqlState;

#[derive(Default, Debug, Clone, Copy)]
pub struct PostgresDriver {}

impl PostgresDriver {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Driver for PostgresDriver {
    type Connection = PostgresConnection;
    type SqlWriter = PostgresSqlWriter;
    type Transaction<'c> = PostgresTransaction<'c>;

    const NAME: &'static str = "postgres";

    fn sql_writer(&self) -> PostgresSqlWriter {
        PostgresSqlWriter {}
    }

    fn is_stale_statement(&self, error: &Error) -> bool {
        error.chain().any(|e| {
            e.downcast_ref::<tokio_postgres::Error>()
                .and_then(tokio_postgres::Error::code)
                == Some(&SqlState::INVALID_SQL_STATEMENT_NAME)
        })
    }
}
