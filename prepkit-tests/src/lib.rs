mod animals;
mod lifecycle;
mod orm_statements;
mod sql_statements;

use animals::setup_animals;
use lifecycle::lifecycle;
use log::LevelFilter;
use orm_statements::orm_statements;
use prepkit::Connection;
use sql_statements::sql_statements;
use std::env;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

pub async fn execute_tests<C: Connection>(mut connection: C) {
    setup_animals(&mut connection).await;
    sql_statements(&mut connection).await;
    orm_statements(&mut connection).await;
    lifecycle(&mut connection).await;
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
