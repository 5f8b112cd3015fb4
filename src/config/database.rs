//! Database configuration module for the order desk.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs without hand-written SQL.

use crate::config::optional_env;
use crate::entities::{Order, OrderItem, Product, ProductVariant};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/order_desk.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or returns
/// the default local `SQLite` path.
///
/// # Errors
/// Returns `EnvVar` if `DATABASE_URL` is set but not valid unicode.
pub fn get_database_url() -> Result<String> {
    Ok(optional_env("DATABASE_URL")?.unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()))
}

/// Establishes a connection to the database named by [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url()?;
    tracing::debug!("Connecting to database at {database_url}");
    ensure_sqlite_directory(&database_url)?;
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates the parent directory of a file-backed `SQLite` database.
fn ensure_sqlite_directory(database_url: &str) -> Result<()> {
    let Some(path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Creates all tables that do not exist yet: products, variants, orders and order items.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    create_table(db, Product).await?;
    create_table(db, ProductVariant).await?;
    create_table(db, Order).await?;
    create_table(db, OrderItem).await?;
    Ok(())
}

async fn create_table<C, E>(db: &C, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}
