use crate::{
    Args, Driver, ExecuteOutcome, Executor, FailureBehaviour, Result, RewriteResult, RowLabeled,
    SqlWriter, StatementError, Value, marker_name, rewrite, separated_by,
    util::backend_statement_name,
};
use std::collections::BTreeMap;

/// One named server side prepared statement built from SQL text.
///
/// The text uses `%s` positional markers or `%(name)s` named markers, never both. It
/// is translated into numbered parameters when the statement is prepared.
#[derive(Debug, Clone)]
pub struct Statement {
    name: String,
    backend_name: String,
    input: String,
    rewritten: Option<RewriteResult>,
    execute_template: Option<String>,
}

impl Statement {
    pub fn new(name: impl Into<String>, input: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            backend_name: backend_statement_name(&name).into_owned(),
            name,
            input: input.into(),
            rewritten: None,
            execute_template: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    /// Identifier of the statement in the database session.
    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }
    pub fn input_text(&self) -> &str {
        &self.input
    }
    pub fn rewritten_text(&self) -> Option<&str> {
        self.rewritten.as_ref().map(|v| v.text.as_str())
    }
    /// `EXECUTE` shape with the markers the arguments are bound to.
    pub fn execute_template(&self) -> Option<&str> {
        self.execute_template.as_deref()
    }
    pub fn parameter_count(&self) -> Option<usize> {
        self.rewritten.as_ref().map(|v| v.parameter_count)
    }

    fn rewritten(&mut self) -> Result<&RewriteResult> {
        let result = match self.rewritten.take() {
            Some(v) => v,
            None => {
                let result = rewrite(&self.input)?;
                let mut template = format!("EXECUTE {}", self.backend_name);
                if result.parameter_count > 0 {
                    template.push('(');
                    match &result.named_parameters {
                        Some(named) => separated_by(
                            &mut template,
                            named,
                            |out, v| out.push_str(v),
                            ", ",
                        ),
                        None => separated_by(
                            &mut template,
                            0..result.parameter_count,
                            |out, _| out.push_str("%s"),
                            ", ",
                        ),
                    }
                    template.push(')');
                }
                self.execute_template = Some(template);
                result
            }
        };
        Ok(self.rewritten.insert(result))
    }

    /// Translate the text and issue the `PREPARE`.
    ///
    /// Text that cannot be translated is always an error. A database failure is
    /// returned with `FailureBehaviour::Error` and only logged with
    /// `FailureBehaviour::Warn`, leaving the statement unprepared.
    pub async fn prepare<E: Executor>(
        &mut self,
        executor: &mut E,
        on_failure: FailureBehaviour,
    ) -> Result<()> {
        let text = self.rewritten()?.text.clone();
        let mut query = String::with_capacity(text.len() + 32);
        executor
            .driver()
            .sql_writer()
            .write_prepare(&mut query, &self.name, &text);
        match executor.execute(query).await {
            Ok(..) => {
                log::debug!("Prepared statement {}", self.backend_name);
                Ok(())
            }
            Err(e) => match on_failure {
                FailureBehaviour::Warn => {
                    log::warn!("Statement {} could not be prepared: {:#}", self.name, e);
                    Ok(())
                }
                FailureBehaviour::Error => {
                    Err(e.context(format!("While preparing statement {}", self.name)))
                }
            },
        }
    }

    /// Argument values in parameter order.
    ///
    /// Named markers take their values from `args.named` (names compared lower cased,
    /// like the text), a name repeated in the text takes the same value every time.
    /// Positional markers take `args.positional` in order.
    pub fn bind(&mut self, args: Args) -> Result<Vec<Value>> {
        let name = self.name.clone();
        let rewritten = self.rewritten()?;
        let Some(markers) = &rewritten.named_parameters else {
            if !args.named.is_empty() {
                return Err(
                    StatementError::UnknownParameters(args.named.into_keys().collect()).into(),
                );
            }
            let (expected, supplied) = (rewritten.parameter_count, args.positional.len());
            if supplied < expected {
                return Err(StatementError::InsufficientParameters { expected, supplied }.into());
            }
            if supplied > expected {
                return Err(StatementError::ExcessParameters { expected, supplied }.into());
            }
            return Ok(args.positional);
        };
        if !args.positional.is_empty() {
            return Err(StatementError::ExcessParameters {
                expected: 0,
                supplied: args.positional.len(),
            }
            .into());
        }
        let mut named: BTreeMap<String, Value> = args
            .named
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        let mut values = Vec::with_capacity(markers.len());
        for marker in markers {
            let key = marker_name(marker);
            let Some(value) = named.get(key) else {
                return Err(StatementError::MissingParameter(key.to_string()).into());
            };
            values.push(value.clone());
        }
        for marker in markers {
            named.remove(marker_name(marker));
        }
        if !named.is_empty() {
            return Err(StatementError::UnknownParameters(named.into_keys().collect()).into());
        }
        log::trace!("Bound {} arguments for statement {}", values.len(), name);
        Ok(values)
    }

    pub async fn execute<E: Executor>(
        &mut self,
        executor: &mut E,
        args: Args,
    ) -> Result<Vec<RowLabeled>> {
        let values = self.bind(args)?;
        self.run(executor, &values).await
    }

    /// Execute with already bound values, re-preparing once if the statement is missing
    /// from the session.
    pub async fn run<E: Executor>(
        &mut self,
        executor: &mut E,
        values: &[Value],
    ) -> Result<Vec<RowLabeled>> {
        let mut query = String::with_capacity(64);
        executor
            .driver()
            .sql_writer()
            .write_execute(&mut query, &self.name, values);
        let error = match executor.execute_prepared(query.clone()).await {
            ExecuteOutcome::Rows(rows) => return Ok(rows),
            ExecuteOutcome::Failed(e) => return Err(e),
            ExecuteOutcome::Stale(e) => e,
        };
        if self.check_prepared(executor).await? {
            return Err(error);
        }
        log::warn!(
            "Statement {} is not prepared in the current session, preparing it again",
            self.name
        );
        self.prepare(executor, FailureBehaviour::Error)
            .await
            .map_err(|e| e.context(StatementError::StatementWillNotPrepare(self.name.clone())))?;
        if !self.check_prepared(executor).await? {
            return Err(StatementError::StatementWillNotPrepare(self.name.clone()).into());
        }
        executor.fetch_all(query).await
    }

    /// True when the current session has a statement with this name.
    pub async fn check_prepared<E: Executor>(&self, executor: &mut E) -> Result<bool> {
        let mut query = String::with_capacity(96);
        executor
            .driver()
            .sql_writer()
            .write_check_prepared(&mut query, &self.name);
        let rows = executor.fetch_all(query).await?;
        Ok(rows
            .first()
            .and_then(|row| row.values().first())
            .and_then(Value::as_i64)
            == Some(1))
    }

    /// Remove the statement from the session. Does nothing if it is not prepared, a
    /// failure of the `DEALLOCATE` itself is ignored.
    pub async fn deallocate<E: Executor>(&self, executor: &mut E) -> Result<()> {
        if !self.check_prepared(executor).await? {
            return Ok(());
        }
        let mut query = String::with_capacity(32);
        executor
            .driver()
            .sql_writer()
            .write_deallocate(&mut query, &self.name);
        if let Err(e) = executor.execute(query).await {
            log::debug!("Could not deallocate statement {}: {:#}", self.name, e);
        }
        Ok(())
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)?;
        if let Some(template) = &self.execute_template {
            f.write_str(": ")?;
            f.write_str(template)?;
        }
        Ok(())
    }
}
