//! Webhook Endpoint
//!
//! GitHub webhook receiver with HMAC-SHA1 signature verification, plus a
//! small HTML index page

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha1::Sha1;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::config::Reposlug;
use crate::sync::{process_repository, Context, Options, UnitStatus};

type HmacSha1 = Hmac<Sha1>;

/// Shared webhook application state, constructed once at startup
#[derive(Debug, Clone)]
pub struct AppState {
    pub ctx: Context,
    pub username: String,
    pub secret: String,
}

/// Build the webhook router
///
/// The webhook POST is registered on both `/` and `/webhook`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index).post(webhook))
        .route("/webhook", post(webhook))
        .with_state(state)
}

/// Verify an `X-Hub-Signature` header against the raw request body
///
/// The header carries `sha1=` followed by the hex HMAC-SHA1 of the body
/// keyed with the shared secret. Comparison is constant-time.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Some(digest) = signature.strip_prefix("sha1=") else {
        return false;
    };
    let Ok(expected) = hex::decode(digest) else {
        return false;
    };
    let Ok(mut mac) = HmacSha1::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    let computed = mac.finalize().into_bytes();
    computed.as_slice().ct_eq(&expected).into()
}

#[derive(Debug, Deserialize)]
struct PingPayload {
    zen: String,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    pull_request: PullRequestEvent,
}

#[derive(Debug, Deserialize)]
struct PullRequestEvent {
    head: Head,
}

#[derive(Debug, Deserialize)]
struct Head {
    repo: HeadRepo,
}

#[derive(Debug, Deserialize)]
struct HeadRepo {
    full_name: String,
}

fn bad_request<S: Into<String>>(message: S) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, message.into())
}

async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_index(&state))
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Render the index page: who the tool runs as and which rules are loaded
fn render_index(state: &AppState) -> String {
    let mut rows = String::new();
    for (label, patterns) in state.ctx.rules.iter() {
        let patterns = patterns
            .iter()
            .map(|p| escape_html(p.as_str()))
            .collect::<Vec<_>>()
            .join("<br>");
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>\n",
            escape_html(label),
            patterns
        ));
    }
    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>filabel</title></head>\n<body>\n\
         <h1>filabel</h1>\n\
         <p>Running as <strong>{}</strong></p>\n\
         <table>\n<tr><th>Label</th><th>Patterns</th></tr>\n{}</table>\n\
         </body>\n</html>\n",
        escape_html(&state.username),
        rows
    )
}

async fn webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<String, (StatusCode, String)> {
    let event = headers
        .get("X-GitHub-Event")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| bad_request("X-GitHub-Event is missing"))?;
    let signature = headers
        .get("X-Hub-Signature")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| bad_request("X-Hub-Signature is missing"))?;

    if !verify_signature(&state.secret, &body, signature) {
        warn!(event, "webhook signature mismatch");
        return Err(bad_request("signature is wrong"));
    }

    match event {
        "ping" => {
            let payload: PingPayload = serde_json::from_slice(&body)
                .map_err(|_| bad_request("content is not valid JSON"))?;
            info!(zen = %payload.zen, "received ping");
            Ok(format!("Pong - {}", payload.zen))
        }
        "pull_request" => {
            let payload: PullRequestPayload = serde_json::from_slice(&body)
                .map_err(|_| bad_request("content is not valid JSON"))?;
            let slug: Reposlug = payload
                .pull_request
                .head
                .repo
                .full_name
                .parse()
                .map_err(|err: crate::Error| bad_request(err.to_string()))?;

            info!(%slug, "received pull_request event");
            // Webhook runs are unfiltered and never delete labels
            let opts = Options::default();
            let report = process_repository(&state.ctx, &slug, &opts).await;
            match report.status {
                UnitStatus::Done => Ok(format!("Labeled - {}", slug)),
                UnitStatus::Failed(message) => Err(bad_request(message)),
            }
        }
        _ => Err(bad_request(format!("unknown event: {}", event))),
    }
}
