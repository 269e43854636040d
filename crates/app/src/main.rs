use clap::Parser;
use migration::{Migrator, MigratorTrait};
use settings::{Database, Settings};

mod auth;
mod cli;
mod error;
mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = cli::Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "stockroom={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let db = connect_database(&settings.database).await?;
    let engine = engine::Engine::builder()
        .database(db)
        .config(settings.ledger)
        .build()
        .await?;
    let session = engine::Session::new(engine);

    if let Err(err) = cli::run(cli.command, &session).await {
        tracing::error!("command failed: {err}");
        return Err(err.into());
    }
    Ok(())
}

async fn connect_database(config: &Database) -> error::Result<sea_orm::DatabaseConnection> {
    tracing::debug!(url = %config.url(), "connecting to database");
    let database = sea_orm::Database::connect(config.url()).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
