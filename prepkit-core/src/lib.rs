mod args;
mod as_value;
mod builder;
mod connection;
mod driver;
mod error;
mod executor;
mod model;
mod orm_statement;
mod placeholder;
mod query;
mod registry;
mod rewriter;
mod sql_writer;
mod statement;
mod transaction;
mod util;
mod value;

pub use ::anyhow::Context;
pub use args::*;
pub use as_value::*;
pub use builder::*;
pub use connection::*;
pub use driver::*;
pub use error::*;
pub use executor::*;
pub use model::*;
pub use orm_statement::*;
pub use placeholder::*;
pub use query::*;
pub use registry::*;
pub use rewriter::*;
pub use sql_writer::*;
pub use statement::*;
pub use transaction::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
