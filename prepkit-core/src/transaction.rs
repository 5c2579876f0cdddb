use crate::{Executor, Result};
use std::future::Future;

pub trait Transaction<'c>: Executor {
    fn commit(self) -> impl Future<Output = Result<()>>;
    fn rollback(self) -> impl Future<Output = Result<()>>;
}
