//! HTTP surface for remote clients
//!
//! - `POST /request` with form fields `instructions` and optional `checksum`
//!   returns the output string.
//! - `GET /<checksum>/` and `GET /<checksum>.<ext>` permanently redirect to
//!   the materialized file.
//! - `GET <blob_base_url>/<name>` serves stored files when enabled.
//!
//! The server always derives in-process; it is the remote endpoint that
//! other processor fronts forward to.

use crate::checksum::Checksum;
use crate::config::Config;
use crate::dispatch::LocalExecutor;
use crate::error::{FileProcessorError, FileProcessorResult};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub executor: LocalExecutor,
}

/// Form body of `POST /request`
#[derive(Debug, Deserialize)]
pub struct RequestForm {
    pub instructions: Option<String>,
    pub checksum: Option<String>,
}

impl FileProcessorError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::ChecksumMismatch { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ChecksumCollision { .. } => StatusCode::CONFLICT,
            Self::SourceUnavailable { .. } | Self::RemoteUnavailable { .. } => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FileProcessorError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_client_error() {
            debug!("Request rejected: {}", self);
        } else {
            warn!("Request failed: {}", self);
        }

        let body = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "internal error".to_string()
        } else {
            self.to_string()
        };
        (status, body).into_response()
    }
}

/// Build the router with `blob_base_url` served from the blob store
/// when `server.serve_blobs` is set and the base URL is a local path.
pub fn router(state: AppState, config: &Config) -> Router {
    let mut app = Router::new()
        .route("/request", post(handle_request))
        .route("/:name/", get(handle_redirect))
        .route("/:name", get(handle_redirect));

    let base = config.storage.blob_base_url.trim_end_matches('/');
    if config.server.serve_blobs && base.starts_with('/') && !base.is_empty() {
        app = app.route(&format!("{}/:name", base), get(handle_blob));
    }

    app.with_state(state)
}

/// `POST /request`
async fn handle_request(
    State(state): State<AppState>,
    Form(form): Form<RequestForm>,
) -> Result<String, FileProcessorError> {
    let instructions = form
        .instructions
        .filter(|i| !i.is_empty())
        .ok_or_else(|| FileProcessorError::invalid_input("missing instructions"))?;

    let supplied = match form.checksum.as_deref().filter(|c| !c.is_empty()) {
        Some(raw) => Some(Checksum::parse(raw)?),
        None => None,
    };

    if let Some(ref checksum) = supplied {
        if let Some(output) = state.executor.cached_output(checksum).await? {
            debug!("Served cached output for {}", checksum);
            return Ok(output);
        }
    }

    let computed = state.executor.checksum(&instructions)?;
    if let Some(supplied) = supplied {
        if supplied != computed {
            return Err(FileProcessorError::ChecksumMismatch {
                expected: supplied.to_string(),
                computed: computed.to_string(),
            });
        }
    }

    state.executor.get_output(&instructions).await
}

/// `GET /<checksum>/` or `GET /<checksum>.<ext>`
async fn handle_redirect(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, FileProcessorError> {
    let basename = name.split_once('.').map(|(base, _)| base).unwrap_or(&name);
    let checksum = Checksum::parse(basename)
        .map_err(|_| FileProcessorError::NotFound(format!("no record for {}", name)))?;

    let url = state.executor.get_file_url(&checksum).await?;
    debug!("Redirecting {} to {}", checksum, url);

    Ok((StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, url)]).into_response())
}

/// `GET <blob_base_url>/<name>`
async fn handle_blob(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, FileProcessorError> {
    let bytes = state
        .executor
        .backends()
        .blobs
        .read(&name)
        .await
        .map_err(|_| FileProcessorError::NotFound(name.clone()))?
        .ok_or_else(|| FileProcessorError::NotFound(name.clone()))?;

    Ok(([(header::CONTENT_TYPE, content_type_for(&name))], bytes).into_response())
}

fn content_type_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "gif" => "image/gif",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "html" => "text/html; charset=utf-8",
        "txt" => "text/plain; charset=utf-8",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Run the HTTP server until Ctrl-C
pub async fn serve(config: &Config, bind: &str) -> FileProcessorResult<()> {
    let addr: SocketAddr = bind
        .parse()
        .map_err(|e| FileProcessorError::invalid_input(format!("invalid bind address '{}': {}", bind, e)))?;

    let executor = LocalExecutor::from_config(config)?;
    let app = router(AppState { executor }, config);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| FileProcessorError::io(format!("binding {}", addr), e))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| FileProcessorError::io("serving HTTP", e))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
