//! Integration tests against a live PostgreSQL
//!
//! Run with `cargo test -p common -- --ignored` once `DATABASE_URL` points at
//! a disposable database.

use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
use sqlx::Row;

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn migrations_create_the_schema() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    run_migrations(&pool).await?;
    // A second run is a no-op
    run_migrations(&pool).await?;

    let row = sqlx::query(
        "SELECT count(*) AS tables FROM information_schema.tables \
         WHERE table_schema = 'public' \
         AND table_name IN ('users', 'collection_records', 'schedules', 'payments', 'reports')",
    )
    .fetch_one(&pool)
    .await?;

    let tables: i64 = row.get("tables");
    assert_eq!(tables, 5, "Expected every table to exist after migrating");

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn email_uniqueness_ignores_case() -> Result<(), Box<dyn std::error::Error>> {
    let pool = init_pool(&DatabaseConfig::from_env()?).await?;
    run_migrations(&pool).await?;

    let insert = "INSERT INTO users (id, name, email, password_hash) \
                  VALUES (gen_random_uuid(), 'Case', $1, 'x')";
    let email = format!("case-{}@example.com", std::process::id());

    sqlx::query(insert).bind(&email).execute(&pool).await?;
    let duplicate = sqlx::query(insert)
        .bind(email.to_uppercase())
        .execute(&pool)
        .await;
    assert!(duplicate.is_err(), "Upper-cased duplicate email was accepted");

    sqlx::query("DELETE FROM users WHERE lower(email) = $1")
        .bind(&email)
        .execute(&pool)
        .await?;
    Ok(())
}
