//! cabinet-api server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) plus
//! `CABINET_*` environment overrides, opens the catalog store in the
//! configured layout, and serves the catalog API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use cabinet_api::{AppState, CatalogService, ServerConfig};
use cabinet_core::embed::Embedder;
use cabinet_embed::TokenHashEmbedder;
use cabinet_ingest::webpage::WebFetcher;
use cabinet_store_sqlite::SqliteCatalogStore;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Cabinet catalog server")]
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

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("CABINET"))
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in storage paths.
  server_cfg.data_dir = expand_tilde(&server_cfg.data_dir);
  server_cfg.org_database_dir =
    server_cfg.org_database_dir.map(|p| expand_tilde(&p));

  let store = SqliteCatalogStore::with_acquire_timeout(
    server_cfg.layout(),
    Duration::from_millis(server_cfg.acquire_timeout_ms),
  );
  let fetcher = WebFetcher::new(Duration::from_secs(server_cfg.fetch_timeout_secs))
    .context("failed to build HTTP fetcher")?;
  let embedder: Option<Arc<dyn Embedder>> = server_cfg
    .embedding
    .then(|| Arc::new(TokenHashEmbedder::new()) as Arc<dyn Embedder>);

  let state = AppState {
    service: Arc::new(CatalogService::new(Arc::new(store), fetcher, embedder)),
  };

  let app = cabinet_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

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
