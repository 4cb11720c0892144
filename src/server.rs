//! JSON HTTP server for remote note editing.
//!
//! Wraps the [`NoteStore`] operations in a small set of handlers. Every
//! endpoint except `/health` requires the shared secret in the
//! `Proxy-Authorization` header, encoded as HTTP Basic credentials:
//!
//! ```text
//! Proxy-Authorization: Basic base64(secret)
//! ```
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version, no auth) |
//! | `GET`/`POST` | `/connect` | Connectivity and credential check |
//! | `GET`/`POST` | `/newNote` | Blank note carrying today's date stamp |
//! | `POST` | `/dir` | List a directory under the notes root |
//! | `POST` | `/getFile` | Read a note |
//! | `POST` | `/saveNote` | Create or overwrite a note (or `config.json`) |
//! | `POST` | `/deleteNote` | Delete a note (never the config file) |
//! | `GET`/`POST` | `/settings` | Raw text of the server's config file |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "not found: ./todo.txt" } }
//! ```
//!
//! Error codes: `unauthorized` (401), `bad_request` (400), `not_found` (404),
//! `conflict` (409), `internal` (500).
//!
//! # CORS
//!
//! Any origin may call the API with `GET` or `POST`.
//!
//! # Config file
//!
//! The note name `config.json` always means the server's config file:
//! `/getFile` returns it, `/saveNote` validates and reloads it, and
//! `/deleteNote` refuses it. Any other note location that lands on the
//! config file (for example with `paths.notes = "./"` and a custom config
//! name) is rejected by `/saveNote` and `/deleteNote`.

use anyhow::{bail, Context};
use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{header::PROXY_AUTHORIZATION, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::{self, Config};
use crate::error::NoteError;
use crate::models::{Directory, Note};
use crate::notes::NoteStore;
use crate::registrar;

/// Note name that addresses the server's own config file on every endpoint.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    /// Live configuration; replaced when a client saves `config.json`.
    config: Arc<RwLock<Config>>,
    /// Expected `Proxy-Authorization` header value.
    expected_auth: Arc<String>,
}

impl AppState {
    async fn store(&self) -> NoteStore {
        NoteStore::from_config(&*self.config.read().await)
    }
}

/// Whether `note` names the config file, either by [`CONFIG_FILE_NAME`] or
/// because its location resolves onto the config file itself.
fn targets_config(store: &NoteStore, config: &Config, note: &Note) -> bool {
    if note.file_name == CONFIG_FILE_NAME {
        return true;
    }
    let Ok(path) = store.resolve(&note.path, &note.file_name) else {
        return false;
    };
    match (
        std::fs::canonicalize(path),
        std::fs::canonicalize(config.source_path()),
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn config_note(config: &Config) -> Result<Note, AppError> {
    let path = config.source_path();
    let text = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            NoteError::NotFound(path.to_path_buf())
        } else {
            e.into()
        }
    })?;

    Ok(Note {
        path: "./".to_string(),
        file_name: CONFIG_FILE_NAME.to_string(),
        text,
    })
}

/// The header value a client must send for `secret`.
pub fn basic_auth_value(secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(secret.as_bytes()))
}

/// Builds the application router without binding a socket.
pub fn router(config: Config, secret: &str) -> Router {
    let state = AppState {
        config: Arc::new(RwLock::new(config)),
        expected_auth: Arc::new(basic_auth_value(secret)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let protected = Router::new()
        .route("/connect", get(handle_connect).post(handle_connect))
        .route("/newNote", get(handle_new_note).post(handle_new_note))
        .route("/dir", post(handle_dir))
        .route("/getFile", post(handle_get_file))
        .route("/saveNote", post(handle_save_note))
        .route("/deleteNote", post(handle_delete_note))
        .route("/settings", get(handle_settings).post(handle_settings))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(handle_health))
        .merge(protected)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Starts the note server.
///
/// Binds to `[server].bind`, registers with the configured registrar (if
/// any), and serves until the process is terminated. Refuses to start with
/// an empty secret, since every client would then authenticate trivially.
pub async fn run_server(config: &Config, secret: &str) -> anyhow::Result<()> {
    if secret.is_empty() {
        bail!("shared secret is empty; set PROXYAUTH before starting the server");
    }

    let bind_addr = config.server.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    let local_addr = listener.local_addr()?;

    if let Some(reg) = &config.server.registrar {
        match registrar::register(reg, local_addr).await {
            Ok(address) => {
                tracing::info!(service = %reg.service, address = %address, "registered with registrar")
            }
            Err(e) => tracing::warn!(error = %e, "registration failed; serving anyway"),
        }
    }

    tracing::info!(
        addr = %local_addr,
        notes = %config.notes_dir().display(),
        "note server listening"
    );

    let app = router(config.clone(), secret);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Auth ============

async fn require_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(PROXY_AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if provided != Some(state.expected_auth.as_str()) {
        tracing::warn!(uri = %req.uri(), "rejected request with invalid authorization");
        return Err(unauthorized("Invalid Authorization"));
    }
    Ok(next.run(req).await)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn unauthorized(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::UNAUTHORIZED,
        code: "unauthorized",
        message: message.into(),
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

impl From<NoteError> for AppError {
    fn from(err: NoteError) -> Self {
        let message = err.to_string();
        let (status, code) = match err {
            NoteError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            NoteError::AlreadyExists(_) => (StatusCode::CONFLICT, "conflict"),
            NoteError::InvalidName(_)
            | NoteError::InvalidPath(_)
            | NoteError::InvalidConfig(_)
            | NoteError::Json(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            NoteError::Io(_) => {
                tracing::error!(error = %message, "filesystem error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };
        AppError {
            status,
            code,
            message,
        }
    }
}

/// Parses a JSON request body. An empty body yields the default value, so
/// `/dir` with no body lists the notes root.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| bad_request(format!("invalid request body: {}", e)))
}

// ============ Handlers ============

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
}

fn ok() -> Json<StatusResponse> {
    Json(StatusResponse { status: "ok" })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn handle_connect() -> Json<StatusResponse> {
    ok()
}

async fn handle_new_note(State(state): State<AppState>) -> Result<Json<Note>, AppError> {
    Ok(Json(state.store().await.template()?))
}

async fn handle_dir(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Directory>, AppError> {
    let req: Directory = parse_body(&body)?;
    let files = state.store().await.list(&req.root)?;
    Ok(Json(Directory {
        root: req.root,
        files,
    }))
}

async fn handle_get_file(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Note>, AppError> {
    let req: Note = parse_body(&body)?;
    let config = state.config.read().await;
    if req.file_name == CONFIG_FILE_NAME {
        return Ok(Json(config_note(&config)?));
    }
    let store = NoteStore::from_config(&config);
    Ok(Json(store.read(&req.path, &req.file_name)?))
}

/// Saves a note. A note named `config.json` replaces the server's config
/// file instead and takes effect for subsequent requests.
async fn handle_save_note(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StatusResponse>, AppError> {
    let req: Note = parse_body(&body)?;

    if req.file_name == CONFIG_FILE_NAME {
        let mut current = state.config.write().await;
        let updated = config::save_raw(current.source_path(), &req.text)?;
        *current = updated;
        tracing::info!("configuration reloaded");
        return Ok(ok());
    }

    let config = state.config.read().await;
    let store = NoteStore::from_config(&config);
    if targets_config(&store, &config, &req) {
        return Err(bad_request(format!(
            "save the server config under the name {}",
            CONFIG_FILE_NAME
        )));
    }
    store.update(&req.path, &req.file_name, &req.text)?;
    Ok(ok())
}

async fn handle_delete_note(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StatusResponse>, AppError> {
    let req: Note = parse_body(&body)?;
    let config = state.config.read().await;
    let store = NoteStore::from_config(&config);
    if targets_config(&store, &config, &req) {
        return Err(bad_request("the server config cannot be deleted"));
    }
    store.delete(&req.path, &req.file_name)?;
    Ok(ok())
}

async fn handle_settings(State(state): State<AppState>) -> Result<Json<Note>, AppError> {
    let config = state.config.read().await;
    Ok(Json(config_note(&config)?))
}
