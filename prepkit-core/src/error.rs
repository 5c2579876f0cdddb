use thiserror::Error;

/// Misuse and binding failures raised by the statement machinery.
///
/// Backend failures are not represented here, they travel as the original driver
/// error wrapped in an [`anyhow::Error`] with context. Use
/// `error.downcast_ref::<StatementError>()` to tell the two apart.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatementError {
    #[error("Placeholder `{0}` is invalid: placeholders cannot contain the % symbol")]
    InvalidPlaceholderName(String),
    #[error("Cannot mix named and unnamed placeholder values in a prepared statement")]
    MixedPlaceholderStyle,
    #[error("Repeated placeholder name: {0}. All placeholders in a query must have unique names.")]
    DuplicatePlaceholderName(String),
    #[error("Statement {0} has not been registered before preparation")]
    NotRegistered(String),
    #[error("Statement {0} has already been prepared")]
    AlreadyPrepared(String),
    #[error("Statement {0} has not been prepared prior to execution")]
    NotPrepared(String),
    #[error(
        "Cannot use {0} with prepared querysets. Please use an ordinary ORM queryset or use SQL for the prepared query."
    )]
    UnsupportedOperation(&'static str),
    #[error("{0}")]
    InvalidInput(String),
    #[error("Missing parameter {0} is required to execute prepared statement")]
    MissingParameter(String),
    #[error("Unknown parameters supplied for prepared statement: {}", .0.join(" , "))]
    UnknownParameters(Vec<String>),
    #[error("Not enough parameters supplied to execute prepared statement")]
    InsufficientParameters { expected: usize, supplied: usize },
    #[error("Too many parameters supplied to execute prepared statement: expected {expected}, got {supplied}")]
    ExcessParameters { expected: usize, supplied: usize },
    #[error("Statement {0} will not be prepared!")]
    StatementWillNotPrepare(String),
    #[error("{0} matching query does not exist.")]
    NotFound(&'static str),
    #[error("get() returned more than one {0} -- it returned {1}!")]
    MultipleResults(&'static str, usize),
}
