//! Roja chat router: forwards chat turns to hosted inference models.

mod config;
mod error;
mod gateway;
mod intent;
mod models;
mod normalize;
mod payload;
mod request_context;
mod router;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::AppConfig;
use router::{run_router, RouterState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "roja=info,tower_http=info".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = AppConfig::from_env().context("failed to load configuration")?;
  info!(
    text_model = %config.text_model,
    caption_model = %config.caption_model,
    image_model = %config.image_model,
    timeout_secs = config.timeout_secs,
    "Roja starting up"
  );

  let addr = config.bind_addr();
  let state = RouterState::new(config)?;
  let listener = tokio::net::TcpListener::bind(&addr)
    .await
    .with_context(|| format!("failed to bind {addr}"))?;
  info!("Listening on http://{}", addr);

  run_router(listener, state, shutdown_signal()).await
}

async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(err) = signal::ctrl_c().await {
      tracing::error!("failed to listen for Ctrl+C: {err}");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(err) => {
        tracing::error!("failed to install SIGTERM handler: {err}");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
    _ = terminate => info!("Received SIGTERM, shutting down"),
  }
}
