use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, sqlx::PgPool};
use tracing::info;

/// Connects and brings the schema up to date.
pub async fn connect(options: impl Into<ConnectOptions>) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

pub async fn setup_database(db_url: &str) -> anyhow::Result<(DatabaseConnection, PgPool)> {
    let db = connect(db_url).await?;
    info!("database migrated");

    let pool = PgPool::connect(db_url).await?;

    Ok((db, pool))
}
