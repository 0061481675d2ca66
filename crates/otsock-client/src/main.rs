//! otsock demo client.
//!
//! - Config: `OTSOCK_CONFIG` (default `otsock.yaml`), strict parsing
//! - Connects with the reconnect supervisor and joins under the configured name
//! - Logs OT callbacks in place of a real editor engine
//! - Ctrl-C: log roster + metrics, close

use std::sync::Arc;

use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

use otsock_client::adapter::EditorCallbacks;
use otsock_client::app_state::AppContext;
use otsock_client::config;
use otsock_core::error::{OtSockError, Result};

/// Stand-in OT engine that only logs what it is told.
struct LoggingEditor;

impl EditorCallbacks for LoggingEditor {
    fn client_left(&self, client_id: &str) {
        tracing::info!(client_id, "client left");
    }
    fn set_name(&self, client_id: &str, username: &str) {
        tracing::info!(client_id, username, "client named");
    }
    fn ack(&self) {
        tracing::info!("operation acknowledged");
    }
    fn operation(&self, operation: &Value) {
        tracing::info!(%operation, "remote operation");
    }
    fn selection(&self, client_id: &str, selection: &Value) {
        tracing::debug!(client_id, %selection, "remote selection");
    }
    fn reconnect(&self) {
        tracing::warn!("reconnected; editor must resynchronise");
    }
}

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, code = e.code().as_str(), "otsock-client failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::var("OTSOCK_CONFIG").unwrap_or_else(|_| "otsock.yaml".into());
    let cfg = config::load_from_file(&path)?;
    let url = cfg.ws_url()?;

    tracing::info!(%url, username = %cfg.client.username, "otsock-client starting");
    let app = AppContext::connect(&cfg)?;
    app.adapter().register_callbacks(Arc::new(LoggingEditor));

    // Queued until the socket opens.
    app.join(&cfg.client.username)?;

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| OtSockError::Internal(format!("signal handler failed: {e}")))?;

    tracing::info!(
        members = ?app.roster(),
        revision = app.document().revision,
        own_id = ?app.own_client_id(),
        "shutting down"
    );
    tracing::info!("metrics\n{}", app.metrics().render());
    app.close();
    Ok(())
}
