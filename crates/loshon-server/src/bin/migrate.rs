//! Applies the schema in `migrations/` to `DATABASE_URL`.

use loshon_server::{config, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();
    loshon_server::init_tracing("migrate=info,sqlx=warn");

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let pool = db::create_pool(&database_url, 1).await?;

    db::run_migrations(&pool).await?;
    tracing::info!("migrations applied");

    Ok(())
}
