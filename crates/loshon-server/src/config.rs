use std::env;

use anyhow::Context;

/// Loads `.env.<ENV>` (ENV defaults to `development`), then `.env`.
/// Variables already set in the process environment win.
pub fn load_dotenv() {
    let env_name = env::var("ENV").unwrap_or_else(|_| "development".to_string());
    dotenvy::from_filename(format!(".env.{}", env_name)).ok();
    dotenvy::dotenv().ok();
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub app_id: String,
    pub api_key: String,
    pub index: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub port: u16,
    pub max_connections: u32,
    /// `None` disables search sync.
    pub search: Option<SearchConfig>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("PORT must be a port number")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a number")?,
            search: search_from_env()?,
        })
    }
}

fn search_from_env() -> anyhow::Result<Option<SearchConfig>> {
    let (Ok(app_id), Ok(api_key)) = (env::var("SEARCH_APP_ID"), env::var("SEARCH_API_KEY")) else {
        return Ok(None);
    };

    Ok(Some(SearchConfig {
        app_id,
        api_key,
        index: env::var("SEARCH_INDEX").unwrap_or_else(|_| "documents".to_string()),
        timeout_secs: env::var("SEARCH_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string()) // seconds
            .parse()
            .context("SEARCH_TIMEOUT_SECS must be a number")?,
    }))
}
