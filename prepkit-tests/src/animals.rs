use indoc::indoc;
use prepkit::{Driver, Executor, Model, SqlWriter, Value};

#[derive(Model, Debug, Clone, PartialEq)]
#[table_name("species")]
pub struct Species {
    #[primary_key]
    pub id: i32,
    pub name: String,
    pub lifespan: Option<i32>,
}

#[derive(Model, Debug, Clone, PartialEq)]
#[table_name("animal")]
pub struct Animal {
    #[primary_key]
    pub id: i64,
    #[column_name("species_id")]
    pub species: i32,
    pub nickname: String,
}

pub async fn setup_animals<E: Executor>(executor: &mut E) {
    for query in [
        "DROP TABLE IF EXISTS animal;",
        "DROP TABLE IF EXISTS species;",
        indoc! {"
            CREATE TABLE species (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                lifespan INTEGER
            );
        "},
        indoc! {"
            CREATE TABLE animal (
                id BIGINT PRIMARY KEY,
                species_id INTEGER NOT NULL REFERENCES species(id),
                nickname TEXT NOT NULL
            );
        "},
        indoc! {"
            INSERT INTO species (id, name, lifespan) VALUES
                (1, 'Carp', 20),
                (2, 'Eagle', 25),
                (3, 'Tortoise', 150),
                (4, 'Mayfly', NULL);
        "},
        indoc! {"
            INSERT INTO animal (id, species_id, nickname) VALUES
                (10, 1, 'Goldie'),
                (11, 1, 'Bubbles'),
                (12, 2, 'Sky'),
                (13, 3, 'Sheldon');
        "},
    ] {
        executor
            .execute(query.to_string())
            .await
            .expect("Could not set up the animal tables");
    }
}

/// Number of statements named `name` in the current session, as the database sees it.
pub async fn catalog_count<E: Executor>(executor: &mut E, name: &str) -> i64 {
    let mut query = String::new();
    executor
        .driver()
        .sql_writer()
        .write_check_prepared(&mut query, name);
    let rows = executor
        .fetch_all(query)
        .await
        .expect("Could not query the prepared statements catalog");
    let Some(count) = rows
        .first()
        .and_then(|r| r.values().first())
        .and_then(Value::as_i64)
    else {
        panic!("Unexpected catalog rows: {rows:?}");
    };
    count
}
