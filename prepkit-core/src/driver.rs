use crate::{Connection, Error, SqlWriter, Transaction};

pub trait Driver: Send + Sync {
    type Connection: Connection;
    type SqlWriter: SqlWriter;
    type Transaction<'c>: Transaction<'c>;

    const NAME: &'static str;

    fn sql_writer(&self) -> Self::SqlWriter;

    /// True when `error` is the backend reporting an unknown prepared statement name.
    fn is_stale_statement(&self, error: &Error) -> bool;
}
