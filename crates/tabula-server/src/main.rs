//! tabula server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) and the process
//! environment, opens the SQLite store and serves the API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use tabula_server::{
  AppState, ServerConfig, auth::AuthConfig, completion::OpenAiClient,
  cors_layer, rate_limit::SubjectRateLimiter,
};
use tabula_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Tabula file API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = ServerConfig::load(Some(cli.config), config::Environment::default())
    .context("failed to load configuration")?;

  let store_path = expand_tilde(&cfg.database_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let upstream = OpenAiClient::new(&cfg.openai_base_url, &cfg.openai_api_key)
    .context("failed to build completion client")?;
  if cfg.openai_api_key.is_empty() {
    tracing::warn!("OPENAI_API_KEY is not set; completion requests will be rejected upstream");
  }

  let limiter = Arc::new(
    SubjectRateLimiter::new(cfg.rate_limit_ai_requests_max, cfg.rate_limit_window())
      .context("invalid rate limit configuration")?,
  );

  let state = AppState {
    store:    Arc::new(store),
    upstream: Arc::new(upstream),
    auth:     Arc::new(AuthConfig::hs256(
      cfg.auth_jwt_secret.as_bytes(),
      cfg.auth_audience.as_deref(),
      cfg.auth_issuer.as_deref(),
    )),
    limiter:  limiter.clone(),
  };

  // Forget subjects whose allowance has fully refilled.
  let window = cfg.rate_limit_window();
  tokio::spawn(async move {
    let mut interval = tokio::time::interval(window);
    loop {
      interval.tick().await;
      limiter.retain_recent();
    }
  });

  let cors = cors_layer(&cfg.cors)
    .with_context(|| format!("invalid CORS origin {:?}", cfg.cors))?;
  let app = tabula_server::router(state, cors);
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
