use crate::{Executor, Result, Transaction};
use std::{borrow::Cow, future::Future};

pub trait Connection: Executor {
    /// Establish a connection to the given URL
    fn connect(url: Cow<'static, str>) -> impl Future<Output = Result<impl Connection>>;

    /// Start a transaction, statements executed on it run inside savepoints.
    fn begin(&mut self) -> impl Future<Output = Result<impl Transaction<'_>>>;

    fn disconnect(self) -> impl Future<Output = Result<()>> {
        async { Ok(()) }
    }
}
