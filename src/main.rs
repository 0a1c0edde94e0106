use anyhow::Context;
use localserve::{Config, LocalServer};

const CONFIG_ENV: &str = "LOCALSERVE_CONFIG";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = match std::env::var(CONFIG_ENV) {
        Ok(path) => Config::load(&path).with_context(|| format!("loading {path}"))?,
        Err(_) => Config::default(),
    };

    let server = LocalServer::with_config(&cfg.root, cfg.server.clone())?;
    let port = server.start()?;

    match server.url_for(&cfg.entry, &cfg.query) {
        Some(url) => tracing::info!(%url, root = %server.resource_root().path().display(), "Ready"),
        None => tracing::info!(port, root = %server.resource_root().path().display(), "Ready"),
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    server.stop();
    Ok(())
}
