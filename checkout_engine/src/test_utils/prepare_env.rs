//! Test harness for the sqlite backend.
//!
//! Each test gets its own throwaway database file under `data/`, created (and recreated if a stale
//! copy exists) and migrated by [`prepare_test_env`]. [`seed_product`] stocks the catalogue directly,
//! bypassing the public API, and commits before returning so the row is visible to every pool
//! connection immediately.

use log::*;
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

use crate::SqliteDatabase;

/// Creates a fresh database at `url`, runs the migrations, and initialises logging.
pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    recreate_database(url).await;
    run_migrations(url).await;
}

/// A unique sqlite url under `data/`, so parallel tests never share a database file.
pub fn random_db_path() -> String {
    format!("sqlite://../data/test_shop_{}", rand::random::<u64>())
}

async fn recreate_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("Error dropping database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("🚀️ Created Sqlite database {url}");
}

async fn run_migrations(url: &str) {
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    migrate!("./src/sqlite/migrations").run(db.pool()).await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
}

/// Inserts a product row directly, bypassing the public API. Tests use this to stock the catalogue.
/// The insert is committed before the id is returned.
pub async fn seed_product(db: &SqliteDatabase, name: &str, price: i64, quantity: i64) -> i64 {
    let mut tx = db.pool().begin().await.expect("Error starting transaction");
    let (id,): (i64,) =
        sqlx::query_as("INSERT INTO products (name, price, quantity) VALUES ($1, $2, $3) RETURNING id")
            .bind(name)
            .bind(price)
            .bind(quantity)
            .fetch_one(&mut *tx)
            .await
            .expect("Error seeding product");
    tx.commit().await.expect("Error committing product seed");
    debug!("🚀️ Seeded product {name} (#{id}) at {price}, {quantity} in stock");
    id
}
