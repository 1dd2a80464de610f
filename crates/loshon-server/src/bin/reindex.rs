//! Pushes the search projection of every document, deleted ones included,
//! to the configured index. Repairs an index left stale by failed syncs.

use anyhow::Context;
use loshon_server::{
    config::{self, Config},
    db,
    repository::{DeletedScope, DocumentFilter, DocumentRepository, PgDocumentRepository},
    search::{AlgoliaClient, SearchSync},
};
use loshon_shared::SearchObject;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();
    loshon_server::init_tracing("reindex=info,loshon_server=info");

    let config = Config::from_env()?;
    let search_config = config
        .search
        .as_ref()
        .context("SEARCH_APP_ID and SEARCH_API_KEY must be set to reindex")?;
    let client = AlgoliaClient::new(search_config)?;

    let pool = db::create_pool(&config.database_url, config.max_connections).await?;
    let repo = PgDocumentRepository::new(pool);

    let documents = repo
        .get(&DocumentFilter::default().deleted(DeletedScope::Include))
        .await?;
    let objects: Vec<SearchObject> = documents.iter().map(|d| d.to_search_object()).collect();

    client.save_objects(&objects).await?;
    tracing::info!(count = objects.len(), index = %search_config.index, "index rebuilt");

    Ok(())
}
