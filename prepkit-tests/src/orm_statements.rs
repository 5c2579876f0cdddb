use crate::animals::{Animal, Species};
use prepkit::{
    Condition, Executor, ListPlaceholder, Placeholder, QuerySet, Registry, StatementError,
    StatementOutput, args, col, prepare_qs,
};
use std::sync::LazyLock;
use tokio::sync::Mutex;

fn species_named_like() -> QuerySet<Species> {
    QuerySet::all()
        .filter(col("name").contains(Placeholder::new("fragment").unwrap()))
        .order_by("id")
}

fn species_in_set() -> QuerySet<Species> {
    QuerySet::all()
        .filter(col("id").is_in(ListPlaceholder::new("ids").unwrap()))
        .order_by_desc("id")
}

fn species_get() -> QuerySet<Species> {
    QuerySet::all().get(col("id").eq(Placeholder::new("pk").unwrap()))
}

fn species_with_lifespan_count() -> QuerySet<Species> {
    QuerySet::all()
        .filter(Condition::not(col("lifespan").is_null()))
        .count()
}

fn oldest_species() -> QuerySet<Species> {
    QuerySet::all()
        .filter(col("lifespan").ge(100))
        .last()
}

fn animals_of_species() -> QuerySet<Animal> {
    QuerySet::all()
        .filter(Condition::or([
            col("species_id").eq(Placeholder::new("species").unwrap()),
            col("nickname").eq(Placeholder::new("nickname").unwrap()),
        ]))
        .order_by("id")
}

pub async fn orm_statements<E: Executor>(executor: &mut E) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;
    let registry = Registry::new();

    // Partial match
    let name = prepare_qs!(registry, executor, species_named_like)
        .await
        .expect("Could not prepare species_named_like");
    let species: Vec<Species> = registry
        .fetch_all(executor, &name, args![fragment = "AR"])
        .await
        .expect("Could not execute species_named_like");
    assert_eq!(
        species.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        ["Carp"]
    );
    let species: Vec<Species> = registry
        .fetch_all(executor, &name, args![fragment = "e"])
        .await
        .expect("Could not execute species_named_like");
    assert_eq!(
        species.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        ["Eagle", "Tortoise"]
    );

    // Set membership bound with a single list
    let name = prepare_qs!(registry, executor, species_in_set)
        .await
        .expect("Could not prepare species_in_set");
    let description = registry.describe(&name).await.expect("Should be active");
    assert!(
        description
            .rewritten_text
            .as_deref()
            .is_some_and(|v| v.contains("= any($1)")),
        "{description:?}"
    );
    let species: Vec<Species> = registry
        .fetch_all(executor, &name, args![ids = vec![1, 3, 99]])
        .await
        .expect("Could not execute species_in_set");
    assert_eq!(
        species.iter().map(|s| s.id).collect::<Vec<_>>(),
        [3, 1]
    );
    let species: Vec<Species> = registry
        .fetch_all(executor, &name, args![ids = Vec::<i32>::new()])
        .await
        .expect("Could not execute species_in_set with an empty list");
    assert!(species.is_empty());

    // Single row
    let name = prepare_qs!(registry, executor, species_get)
        .await
        .expect("Could not prepare species_get");
    let tortoise: Species = registry
        .fetch_one(executor, &name, args![pk = 3])
        .await
        .expect("Could not execute species_get");
    assert_eq!(tortoise.name, "Tortoise");
    assert_eq!(tortoise.lifespan, Some(150));
    let error = registry
        .fetch_one::<Species, _>(executor, &name, args![pk = 42])
        .await
        .expect_err("There is no species 42");
    assert_eq!(
        error.downcast_ref::<StatementError>(),
        Some(&StatementError::NotFound("Species"))
    );
    let error = registry
        .execute(executor, &name, args![])
        .await
        .expect_err("pk is required");
    assert!(matches!(
        error.downcast_ref::<StatementError>(),
        Some(StatementError::InsufficientParameters { .. })
    ));

    // Count
    let name = prepare_qs!(registry, executor, species_with_lifespan_count)
        .await
        .expect("Could not prepare species_with_lifespan_count");
    assert_eq!(
        registry
            .count(executor, &name, args![])
            .await
            .expect("Could not count"),
        3
    );

    // Constants only
    let name = prepare_qs!(registry, executor, oldest_species)
        .await
        .expect("Could not prepare oldest_species");
    let StatementOutput::Single(row) = registry
        .execute(executor, &name, args![])
        .await
        .expect("Could not execute oldest_species")
    else {
        panic!("Expected a single row");
    };
    assert_eq!(row.get_column("name").cloned(), Some("Tortoise".into()));

    // Two placeholders, one missing
    let name = prepare_qs!(registry, executor, animals_of_species)
        .await
        .expect("Could not prepare animals_of_species");
    let animals: Vec<Animal> = registry
        .fetch_all(executor, &name, args![species = 1, nickname = "Sky"])
        .await
        .expect("Could not execute animals_of_species");
    assert_eq!(
        animals.iter().map(|a| a.nickname.as_str()).collect::<Vec<_>>(),
        ["Goldie", "Bubbles", "Sky"]
    );
    assert_eq!(animals[0].species, 1);
    let error = registry
        .execute(executor, &name, args![species = 1])
        .await
        .expect_err("nickname is missing");
    assert_eq!(
        error.downcast_ref::<StatementError>(),
        Some(&StatementError::MissingParameter("nickname".into()))
    );

    registry
        .deallocate_all(executor)
        .await
        .expect("Could not deallocate");
    assert!(registry.prepared_names().await.is_empty());
}
