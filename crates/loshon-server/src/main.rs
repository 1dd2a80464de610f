use std::net::SocketAddr;
use std::sync::Arc;

use loshon_server::{
    config::{self, Config},
    db,
    repository::PgDocumentRepository,
    routes::{self, AppState},
    search,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();
    loshon_server::init_tracing("loshon_server=debug,tower_http=debug");

    let config = Config::from_env()?;
    let pool = db::create_pool(&config.database_url, config.max_connections).await?;

    let state = AppState {
        repo: Arc::new(PgDocumentRepository::new(pool)),
        search: search::from_config(config.search.as_ref())?,
        config: config.clone(),
    };
    let app = routes::create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
