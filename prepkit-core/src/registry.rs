use crate::{
    Args, BuilderQuery, Driver, Error, Executor, Model, OrmStatement, QueryKind, Result,
    RowLabeled, SqlWriter, Statement, StatementError,
};
use std::{
    collections::{BTreeMap, HashMap},
    env,
    str::FromStr,
    sync::{Arc, PoisonError, RwLock},
};
use tokio::sync::Mutex;

/// What to do when the database refuses a `PREPARE`.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureBehaviour {
    /// Return the database error.
    #[default]
    Error,
    /// Log the error and leave the statement unprepared, it is prepared again when first
    /// executed.
    Warn,
}

impl FromStr for FailureBehaviour {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(FailureBehaviour::Error),
            "warn" | "warning" => Ok(FailureBehaviour::Warn),
            _ => Err(StatementError::InvalidInput(format!(
                "Unknown failure behaviour `{s}`, expected `error` or `warn`"
            ))
            .into()),
        }
    }
}

/// Options of a bulk preparation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepareOptions {
    /// Prepare again statements that are already active.
    pub force: bool,
    pub on_failure: FailureBehaviour,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            force: true,
            on_failure: FailureBehaviour::Error,
        }
    }
}

impl PrepareOptions {
    /// Used when the process starts: tables may not exist yet while migrations run.
    pub fn startup() -> Self {
        Self {
            force: true,
            on_failure: FailureBehaviour::Warn,
        }
    }

    /// Default options overridden by `PREPKIT_ON_FAILURE` and `PREPKIT_FORCE`.
    pub fn from_env() -> Result<Self> {
        let mut result = Self::default();
        if let Ok(value) = env::var("PREPKIT_ON_FAILURE") {
            result.on_failure = value.parse()?;
        }
        if let Ok(value) = env::var("PREPKIT_FORCE") {
            result.force = match value.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => {
                    return Err(StatementError::InvalidInput(format!(
                        "PREPKIT_FORCE must be a boolean, got `{value}`"
                    ))
                    .into());
                }
            };
        }
        Ok(result)
    }
}

/// Output of executing a registered statement.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementOutput {
    Rows(Vec<RowLabeled>),
    Count(i64),
    Single(RowLabeled),
}

/// Snapshot of an active statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementInfo {
    pub name: String,
    pub backend_name: String,
    pub input_text: String,
    pub rewritten_text: Option<String>,
    pub execute_template: Option<String>,
    /// `None` for statements built from SQL text.
    pub kind: Option<QueryKind>,
}

#[derive(Debug)]
enum Handle {
    Sql(Statement),
    Orm(OrmStatement),
}

impl Handle {
    fn statement(&self) -> &Statement {
        match self {
            Handle::Sql(v) => v,
            Handle::Orm(v) => v.statement(),
        }
    }
    async fn prepare<E: Executor>(
        &mut self,
        executor: &mut E,
        on_failure: FailureBehaviour,
    ) -> Result<()> {
        match self {
            Handle::Sql(v) => v.prepare(executor, on_failure).await,
            Handle::Orm(v) => v.prepare(executor, on_failure).await,
        }
    }
    async fn execute<E: Executor>(
        &mut self,
        executor: &mut E,
        args: Args,
    ) -> Result<StatementOutput> {
        match self {
            Handle::Sql(v) => v.execute(executor, args).await.map(StatementOutput::Rows),
            Handle::Orm(v) => v.execute(executor, args).await,
        }
    }
    fn info(&self) -> StatementInfo {
        let statement = self.statement();
        StatementInfo {
            name: statement.name().to_string(),
            backend_name: statement.backend_name().to_string(),
            input_text: statement.input_text().to_string(),
            rewritten_text: statement.rewritten_text().map(ToString::to_string),
            execute_template: statement.execute_template().map(ToString::to_string),
            kind: match self {
                Handle::Sql(..) => None,
                Handle::Orm(v) => Some(v.kind()),
            },
        }
    }
}

type SqlGenerator = Arc<dyn Fn() -> String + Send + Sync>;
type QueryGenerator = Arc<dyn Fn() -> Result<Box<dyn BuilderQuery>> + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Source {
    Sql,
    Query,
}

/// Named prepared statements of a process.
///
/// Generators are registered first and called only when their statement is prepared.
/// Prepared statements are the active handles, looked up by name on execution. Build
/// one registry at startup and share it (`Arc<Registry>`) with whatever registers or
/// executes statements.
#[derive(Default)]
pub struct Registry {
    sql: RwLock<BTreeMap<String, SqlGenerator>>,
    queries: RwLock<BTreeMap<String, QueryGenerator>>,
    active: Mutex<HashMap<String, Arc<Mutex<Handle>>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a generator of SQL text, called when the statement is prepared.
    pub fn register_sql<F, S>(&self, name: impl Into<String>, generator: F)
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: Into<String>,
    {
        self.sql
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), Arc::new(move || generator().into()));
    }

    /// Register a generator of builder queries, called when the statement is prepared.
    pub fn register_qs<F, Q>(&self, name: impl Into<String>, generator: F)
    where
        F: Fn() -> Q + Send + Sync + 'static,
        Q: BuilderQuery + 'static,
    {
        self.register_qs_fallible(name, move || Ok(generator()));
    }

    /// Like `register_qs`, for generators that can fail (e.g. on an unsupported
    /// operation).
    pub fn register_qs_fallible<F, Q>(&self, name: impl Into<String>, generator: F)
    where
        F: Fn() -> Result<Q> + Send + Sync + 'static,
        Q: BuilderQuery + 'static,
    {
        self.queries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                name.into(),
                Arc::new(move || generator().map(|q| Box::new(q) as Box<dyn BuilderQuery>)),
            );
    }

    /// Register and return the name, to keep it for later executions.
    pub fn register_prepared_sql<F, S>(&self, name: impl Into<String>, generator: F) -> String
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: Into<String>,
    {
        let name = name.into();
        self.register_sql(name.clone(), generator);
        name
    }

    pub fn register_prepared_qs<F, Q>(&self, name: impl Into<String>, generator: F) -> String
    where
        F: Fn() -> Q + Send + Sync + 'static,
        Q: BuilderQuery + 'static,
    {
        let name = name.into();
        self.register_qs(name.clone(), generator);
        name
    }

    /// Register and prepare right away.
    pub async fn prepare_sql<E, F, S>(
        &self,
        executor: &mut E,
        name: impl Into<String>,
        generator: F,
    ) -> Result<String>
    where
        E: Executor,
        F: Fn() -> S + Send + Sync + 'static,
        S: Into<String>,
    {
        let name = self.register_prepared_sql(name, generator);
        self.prepare_sql_stmt(executor, &name, false, FailureBehaviour::Error)
            .await?;
        Ok(name)
    }

    pub async fn prepare_qs<E, F, Q>(
        &self,
        executor: &mut E,
        name: impl Into<String>,
        generator: F,
    ) -> Result<String>
    where
        E: Executor,
        F: Fn() -> Q + Send + Sync + 'static,
        Q: BuilderQuery + 'static,
    {
        let name = self.register_prepared_qs(name, generator);
        self.prepare_qs_stmt(executor, &name, false, FailureBehaviour::Error)
            .await?;
        Ok(name)
    }

    pub async fn prepare_sql_stmt<E: Executor>(
        &self,
        executor: &mut E,
        name: &str,
        force: bool,
        on_failure: FailureBehaviour,
    ) -> Result<()> {
        self.prepare_stmt(executor, name, Source::Sql, force, on_failure)
            .await
    }

    pub async fn prepare_qs_stmt<E: Executor>(
        &self,
        executor: &mut E,
        name: &str,
        force: bool,
        on_failure: FailureBehaviour,
    ) -> Result<()> {
        self.prepare_stmt(executor, name, Source::Query, force, on_failure)
            .await
    }

    async fn prepare_stmt<E: Executor>(
        &self,
        executor: &mut E,
        name: &str,
        source: Source,
        force: bool,
        on_failure: FailureBehaviour,
    ) -> Result<()> {
        let mut active = self.active.lock().await;
        if let Some(handle) = active.get(name).cloned() {
            if !force {
                return Err(StatementError::AlreadyPrepared(name.to_string()).into());
            }
            handle.lock().await.statement().deallocate(executor).await?;
            active.remove(name);
        }
        let mut handle = match source {
            Source::Sql => {
                let generator = self
                    .sql
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get(name)
                    .cloned();
                let Some(generator) = generator else {
                    return Err(StatementError::NotRegistered(name.to_string()).into());
                };
                Handle::Sql(Statement::new(name, generator()))
            }
            Source::Query => {
                let generator = self
                    .queries
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get(name)
                    .cloned();
                let Some(generator) = generator else {
                    return Err(StatementError::NotRegistered(name.to_string()).into());
                };
                let query = generator()?;
                let writer = executor.driver().sql_writer();
                Handle::Orm(OrmStatement::new(name, query.as_ref(), writer.as_dyn())?)
            }
        };
        handle.prepare(executor, on_failure).await?;
        active.insert(name.to_string(), Arc::new(Mutex::new(handle)));
        Ok(())
    }

    /// Prepare every registered statement.
    ///
    /// Without `force`, a statement that is already active fails with
    /// `StatementError::AlreadyPrepared`.
    pub async fn prepare_all<E: Executor>(
        &self,
        executor: &mut E,
        options: PrepareOptions,
    ) -> Result<()> {
        let mut names: Vec<(String, Source)> = self
            .sql
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .map(|k| (k.clone(), Source::Sql))
            .collect();
        names.extend(
            self.queries
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .keys()
                .map(|k| (k.clone(), Source::Query)),
        );
        for (name, source) in names {
            self.prepare_stmt(executor, &name, source, options.force, options.on_failure)
                .await?;
        }
        Ok(())
    }

    pub async fn execute<E: Executor>(
        &self,
        executor: &mut E,
        name: &str,
        args: Args,
    ) -> Result<StatementOutput> {
        let handle = self.handle(name).await?;
        let mut handle = handle.lock().await;
        handle.execute(executor, args).await
    }

    /// Execute and decode every row as `M`.
    pub async fn fetch_all<M: Model, E: Executor>(
        &self,
        executor: &mut E,
        name: &str,
        args: Args,
    ) -> Result<Vec<M>> {
        match self.execute(executor, name, args).await? {
            StatementOutput::Rows(rows) => rows.into_iter().map(M::from_row).collect(),
            StatementOutput::Single(row) => Ok(vec![M::from_row(row)?]),
            StatementOutput::Count(..) => Err(StatementError::InvalidInput(format!(
                "Statement {name} returns a count, not rows"
            ))
            .into()),
        }
    }

    /// Execute and decode exactly one row as `M`.
    pub async fn fetch_one<M: Model, E: Executor>(
        &self,
        executor: &mut E,
        name: &str,
        args: Args,
    ) -> Result<M> {
        let model = M::model().name;
        match self.execute(executor, name, args).await? {
            StatementOutput::Single(row) => M::from_row(row),
            StatementOutput::Rows(mut rows) => match rows.len() {
                0 => Err(StatementError::NotFound(model).into()),
                1 => M::from_row(rows.remove(0)),
                n => Err(StatementError::MultipleResults(model, n).into()),
            },
            StatementOutput::Count(..) => Err(StatementError::InvalidInput(format!(
                "Statement {name} returns a count, not rows"
            ))
            .into()),
        }
    }

    pub async fn count<E: Executor>(
        &self,
        executor: &mut E,
        name: &str,
        args: Args,
    ) -> Result<i64> {
        match self.execute(executor, name, args).await? {
            StatementOutput::Count(v) => Ok(v),
            _ => Err(StatementError::InvalidInput(format!(
                "Statement {name} does not return a count"
            ))
            .into()),
        }
    }

    /// Deallocate every active statement and forget them, failures are only logged.
    pub async fn deallocate_all<E: Executor>(&self, executor: &mut E) -> Result<()> {
        let handles: Vec<_> = self.active.lock().await.drain().collect();
        for (name, handle) in handles {
            if let Err(e) = handle.lock().await.statement().deallocate(executor).await {
                log::warn!("Could not deallocate statement {}: {:#}", name, e);
            }
        }
        Ok(())
    }

    /// Deallocate and prepare again every statement.
    pub async fn reset<E: Executor>(&self, executor: &mut E) -> Result<()> {
        self.deallocate_all(executor).await?;
        self.prepare_all(executor, PrepareOptions::default()).await
    }

    /// Deallocate every statement and forget every generator.
    pub async fn destroy<E: Executor>(&self, executor: &mut E) -> Result<()> {
        self.deallocate_all(executor).await?;
        self.sql
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.queries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }

    /// Prepare everything when the process starts, only warning about failures.
    pub async fn startup<E: Executor>(&self, executor: &mut E) -> Result<()> {
        self.prepare_all(executor, PrepareOptions::startup()).await
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.sql
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
            || self
                .queries
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .contains_key(name)
    }

    /// True when `name` is active in the registry, the database session is not queried.
    pub async fn is_prepared(&self, name: &str) -> bool {
        self.active.lock().await.contains_key(name)
    }

    pub fn registered_names(&self) -> Vec<String> {
        let mut result: Vec<String> = self
            .sql
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        result.extend(
            self.queries
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .keys()
                .cloned(),
        );
        result.sort();
        result
    }

    pub async fn prepared_names(&self) -> Vec<String> {
        let mut result: Vec<String> = self.active.lock().await.keys().cloned().collect();
        result.sort();
        result
    }

    pub async fn describe(&self, name: &str) -> Option<StatementInfo> {
        let handle = self.active.lock().await.get(name).cloned()?;
        let handle = handle.lock().await;
        Some(handle.info())
    }

    async fn handle(&self, name: &str) -> Result<Arc<Mutex<Handle>>> {
        self.active
            .lock()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| StatementError::NotPrepared(name.to_string()).into())
    }
}

/// Register a function returning SQL text under its qualified name, evaluates to the
/// name.
#[macro_export]
macro_rules! register_prepared_sql {
    ($registry:expr, $func:ident) => {
        $registry.register_prepared_sql($crate::statement_name!($func), $func)
    };
}

/// Register a function returning a builder query under its qualified name, evaluates to
/// the name.
#[macro_export]
macro_rules! register_prepared_qs {
    ($registry:expr, $func:ident) => {
        $registry.register_prepared_qs($crate::statement_name!($func), $func)
    };
}

/// Register and prepare a function returning SQL text, evaluates to a future of the
/// name.
#[macro_export]
macro_rules! prepare_sql {
    ($registry:expr, $executor:expr, $func:ident) => {
        $registry.prepare_sql($executor, $crate::statement_name!($func), $func)
    };
}

#[macro_export]
macro_rules! prepare_qs {
    ($registry:expr, $executor:expr, $func:ident) => {
        $registry.prepare_qs($executor, $crate::statement_name!($func), $func)
    };
}
