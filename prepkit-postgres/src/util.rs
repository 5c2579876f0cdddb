use crate::{PostgresDriver, ValueHolder};
use async_stream::try_stream;
use postgres_types::ToSql;
use prepkit_core::{
    Driver, Error, QueryResult, Result, Row, RowLabeled, RowNames, RowsAffected,
    stream::{Stream, StreamExt},
};
use std::{iter, pin::pin};

pub(crate) fn row_to_prepkit_row(row: tokio_postgres::Row) -> Result<Row> {
    (0..row.len())
        .map(|i| match row.try_get::<_, ValueHolder>(i) {
            Ok(v) => Ok(v.0),
            Err(e) => {
                let col = &row.columns()[i];
                Err(Error::new(e).context(format!(
                    "Could not deserialize column {} `{}`: {}",
                    i,
                    col.name(),
                    col.type_()
                )))
            }
        })
        .collect()
}

/// Rows of `query` followed by the number of rows it affected.
pub(crate) fn stream_query<'t>(
    transaction: &'t tokio_postgres::Transaction<'_>,
    query: String,
) -> impl Stream<Item = Result<QueryResult>> + Send + 't {
    try_stream! {
        let stream = transaction
            .query_raw(&query, iter::empty::<&(dyn ToSql + Sync)>())
            .await?;
        let mut stream = pin!(stream);
        let mut labels: Option<RowNames> = None;
        while let Some(row) = stream.next().await.transpose()? {
            let labels = labels.get_or_insert_with(|| {
                row.columns().iter().map(|c| c.name().to_string()).collect()
            });
            yield RowLabeled {
                labels: labels.clone(),
                values: row_to_prepkit_row(row)?,
            }
            .into();
        }
        yield RowsAffected {
            rows_affected: stream.rows_affected().unwrap_or_default(),
        }
        .into();
    }
}

/// Attach the query to the error and log it. Statements missing from the session are
/// recovered by the caller and logged at debug level only.
pub(crate) fn query_error(error: Error, context: &str) -> Error {
    let error = error.context(context.to_string());
    if PostgresDriver::new().is_stale_statement(&error) {
        log::debug!("{:#}", error);
    } else {
        log::error!("{:#}", error);
    }
    error
}
