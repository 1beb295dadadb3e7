use std::sync::Arc;

use wod_timer::llm::ClaudeClient;
use wod_timer::server::{self, AppState};

const DEFAULT_PORT: u16 = 8787;

#[tokio::main]
async fn main() {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    )
    .init();

  // Without a key the service still runs, deterministic-only
  let client = match ClaudeClient::from_env() {
    Ok(client) => Some(Arc::new(client)),
    Err(e) => {
      tracing::warn!(error = %e, "Claude client unavailable, running deterministic-only");
      None
    }
  };

  let port = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .unwrap_or(DEFAULT_PORT);

  let app = server::router(AppState { client });

  let addr = format!("0.0.0.0:{}", port);
  let listener = match tokio::net::TcpListener::bind(&addr).await {
    Ok(listener) => listener,
    Err(e) => {
      tracing::error!(error = %e, addr = %addr, "failed to bind listener");
      std::process::exit(1);
    }
  };
  tracing::info!("wod-timer listening on http://{}", addr);

  if let Err(e) = axum::serve(listener, app).await {
    tracing::error!(error = %e, "server terminated with error");
    std::process::exit(1);
  }
}
