//! Board server command: `tackboard serve`.

use std::path::PathBuf;

use anyhow::Result;

use tackboard::board::server::start_server;
use tackboard::config::BoardConfig;

/// Flags that override the file/env configuration for one run.
pub struct ServeOverrides {
    pub port: Option<u16>,
    pub host: Option<String>,
    pub db_path: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
    pub dev: bool,
    pub strict: bool,
    pub open: bool,
}

pub async fn cmd_serve(config: &BoardConfig, overrides: ServeOverrides) -> Result<()> {
    let mut server = config.server_config();
    if let Some(port) = overrides.port {
        server.port = port;
    }
    if let Some(host) = overrides.host {
        server.host = host;
    }
    if let Some(db_path) = overrides.db_path {
        server.db_path = db_path;
    }
    if let Some(static_dir) = overrides.static_dir {
        server.static_dir = Some(static_dir);
    }
    server.dev_mode |= overrides.dev;
    server.strict_reorder |= overrides.strict;

    // Spawn browser open before starting the server (which blocks).
    // Skipped in dev mode, where the frontend runs on its own dev server.
    if overrides.open && !server.dev_mode {
        let url = format!("http://localhost:{}", server.port);
        tokio::spawn(async move {
            // Small delay to let the server start binding
            tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
            if let Err(e) = open::that(&url) {
                tracing::warn!(error = %e, "Failed to open browser");
            }
        });
    }

    start_server(server).await
}
