//! Proposal submission against a live Postgres.
//!
//! Needs `DATABASE_URL`; run with `cargo test -p database -- --ignored`.

use database::{models::NewProposal, Database, Error};
use sqlx::Executor;

async fn setup() -> (sqlx::PgPool, String) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = sqlx::PgPool::connect(&url).await.expect("database connection");
    pool.execute(
        "
        create table if not exists proposte (
            id serial primary key,
            user_id integer not null,
            titolo text not null,
            autore text not null,
            link_youtube text
        )
    ",
    )
    .await
    .expect("create proposte");

    (pool, url)
}

fn batch(prefix: &str) -> Vec<NewProposal> {
    (1..=3)
        .map(|index| NewProposal::new(&format!("{prefix} {index}"), "Mina"))
        .collect()
}

#[tokio::test]
#[ignore = "requires a running postgres (DATABASE_URL)"]
async fn concurrent_submissions_store_one_batch() {
    let (pool, url) = setup().await;
    let member = 900_000 + std::process::id() as i64;
    sqlx::query("delete from proposte where user_id = $1")
        .bind(member)
        .execute(&pool)
        .await
        .unwrap();

    let first = Database::connect(&url).await.unwrap();
    let second = Database::connect(&url).await.unwrap();
    let first_batch = batch("first");
    let second_batch = batch("second");
    let (a, b) = tokio::join!(
        first.submit_proposals(member, &first_batch),
        second.submit_proposals(member, &second_batch),
    );

    let rejected = [&a, &b]
        .iter()
        .filter(|result| matches!(result, Err(Error::ProposalsAlreadySubmitted(id)) if *id == member))
        .count();
    assert_eq!(rejected, 1, "results: {a:?} {b:?}");
    assert!(a.is_ok() || b.is_ok());

    let (stored,): (i64,) = sqlx::query_as("select count(*) from proposte where user_id = $1")
        .bind(member)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, 3);

    sqlx::query("delete from proposte where user_id = $1")
        .bind(member)
        .execute(&pool)
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires a running postgres (DATABASE_URL)"]
async fn second_submission_is_rejected() {
    let (pool, url) = setup().await;
    let member = 800_000 + std::process::id() as i64;
    sqlx::query("delete from proposte where user_id = $1")
        .bind(member)
        .execute(&pool)
        .await
        .unwrap();

    let database = Database::connect(&url).await.unwrap();
    database.submit_proposals(member, &batch("first")).await.unwrap();
    let again = database.submit_proposals(member, &batch("again")).await;

    assert!(matches!(again, Err(Error::ProposalsAlreadySubmitted(id)) if id == member));
    assert_eq!(database.proposal_count(member).await.unwrap(), 3);

    sqlx::query("delete from proposte where user_id = $1")
        .bind(member)
        .execute(&pool)
        .await
        .unwrap();
}
