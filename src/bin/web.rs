//! filabel webhook server
//!
//! Serves the index page and the GitHub webhook endpoint. Configuration
//! comes from `FILABEL_CONFIG` (colon-separated INI files carrying the
//! token, webhook secret, and labels table); a `WEBHOOK_SECRET` env var
//! overrides the file secret.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use tracing::info;
use tracing_subscriber::EnvFilter;

use filabel::config::WebConfig;
use filabel::github::GitHubClient;
use filabel::sync::Context;
use filabel::webhook::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = WebConfig::from_env().context("loading configuration from environment")?;

    let github = GitHubClient::new(&config.token)?;
    let username = github
        .authenticated_user()
        .await
        .context("resolving the token's user")?;
    info!(%username, "authenticated against GitHub");

    let state = Arc::new(AppState {
        ctx: Context {
            github,
            rules: config.rules,
        },
        username,
        secret: config.secret,
    });

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(5000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(%addr, "listening");

    axum::serve(listener, router(state)).await?;
    Ok(())
}
