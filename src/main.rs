use std::sync::Arc;

use backlog_webhook_receiver::config::Config;
use backlog_webhook_receiver::http_server::{self, AppState};
use backlog_webhook_receiver::store::FsStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        bucket = %config.bucket.display(),
        namespace = %config.namespace,
        signature_check = config.webhook_secret.is_some(),
        "starting webhook receiver"
    );

    let store = Arc::new(FsStore::new(config.bucket.clone()));
    let state = Arc::new(AppState::new(&config, store));
    http_server::serve(state, config.bind_addr).await?;
    Ok(())
}
