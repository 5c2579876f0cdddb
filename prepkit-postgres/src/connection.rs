use crate::{
    PostgresDriver, PostgresTransaction,
    util::{query_error, stream_query},
};
use async_stream::try_stream;
use openssl::ssl::{SslConnector, SslFiletype, SslMethod, SslVerifyMode};
use postgres_openssl::MakeTlsConnector;
use prepkit_core::{
    Connection, Context, Driver, Error, Executor, QueryResult, Result,
    stream::{Stream, StreamExt, TryStreamExt},
    truncate_long,
};
use std::{borrow::Cow, env, path::Path, pin::pin};
use tokio::spawn;
use tokio_postgres::NoTls;
use url::Url;
use urlencoding::decode;

/// A single database session. Prepared statements live as long as it does.
pub struct PostgresConnection {
    pub(crate) client: tokio_postgres::Client,
}

impl Executor for PostgresConnection {
    type Driver = PostgresDriver;

    fn driver(&self) -> &Self::Driver {
        &PostgresDriver {}
    }

    fn run(&mut self, query: String) -> impl Stream<Item = Result<QueryResult>> + Send {
        let context = format!("While running the query:\n{}", truncate_long!(query));
        try_stream! {
            let transaction = self.client.transaction().await?;
            {
                let mut stream = pin!(stream_query(&transaction, query));
                while let Some(value) = stream.next().await.transpose()? {
                    yield value;
                }
            }
            transaction.commit().await?;
        }
        .map_err(move |e: Error| query_error(e, &context))
    }
}

impl Connection for PostgresConnection {
    #[allow(refining_impl_trait)]
    async fn connect(url: Cow<'static, str>) -> Result<PostgresConnection> {
        let context = || format!("While trying to connect to `{}`", url);
        let url = decode(&url).with_context(context)?;
        let prefix = format!("{}://", <Self::Driver as Driver>::NAME);
        if !url.starts_with(&prefix) {
            let error = Error::msg(format!(
                "Postgres connection url must start with `{}`",
                &prefix
            ))
            .context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        let mut url = Url::parse(&url).with_context(context)?;
        let mut take_url_param = |key: &str, env_var: &str| {
            let mut value = None;
            let mut pairs: Vec<(String, String)> = url
                .query_pairs()
                .map(|(k, v)| (k.into(), v.into()))
                .collect();
            if let Some(pos) = pairs.iter().position(|(k, _)| k == key) {
                let (_, v) = pairs.remove(pos);
                value = Some(v);
            }
            if pairs.is_empty() {
                url.set_query(None);
            } else {
                url.query_pairs_mut()
                    .clear()
                    .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            }
            value.or_else(|| env::var(env_var).ok())
        };
        let sslmode = take_url_param("sslmode", "PGSSLMODE").unwrap_or("disable".into());
        let client = if sslmode == "disable" {
            let (client, connection) = tokio_postgres::connect(url.as_str(), NoTls)
                .await
                .with_context(context)?;
            spawn(async move {
                if let Err(e) = connection.await
                    && !e.is_closed()
                {
                    log::error!("Postgres connection error: {:#}", e);
                }
            });
            client
        } else {
            let mut builder = SslConnector::builder(SslMethod::tls())?;
            if let Some(path) = take_url_param("sslrootcert", "PGSSLROOTCERT")
                .as_deref()
                .map(Path::new)
                && path.exists()
            {
                builder.set_ca_file(path)?;
            }
            if let Some(path) = take_url_param("sslcert", "PGSSLCERT")
                .as_deref()
                .map(Path::new)
                && path.exists()
            {
                builder.set_certificate_chain_file(path)?;
            }
            if let Some(path) = take_url_param("sslkey", "PGSSLKEY")
                .as_deref()
                .map(Path::new)
                && path.exists()
            {
                builder.set_private_key_file(path, SslFiletype::PEM)?;
            }
            builder.set_verify(match &*sslmode {
                "require" | "prefer" | "allow" => SslVerifyMode::NONE,
                _ => SslVerifyMode::PEER,
            });
            let connector = MakeTlsConnector::new(builder.build());
            let (client, connection) = tokio_postgres::connect(url.as_str(), connector)
                .await
                .with_context(context)?;
            spawn(async move {
                if let Err(e) = connection.await
                    && !e.is_closed()
                {
                    log::error!("Postgres connection error: {:#}", e);
                }
            });
            client
        };
        Ok(Self { client })
    }

    #[allow(refining_impl_trait)]
    fn begin(&mut self) -> impl Future<Output = Result<PostgresTransaction<'_>>> {
        PostgresTransaction::new(self)
    }
}
