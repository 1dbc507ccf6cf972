//! HTTP server and API handlers.
//!
//! - `GET /` - health and row count
//! - `GET /spare-parts` - filtered, sorted, paginated listing
//! - `GET /spare-parts/:sn` - every row whose identifier contains `sn`
//! - `POST /reload` - re-read the source file and swap the served table

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;

use crate::data::query::{lookup_by_sn, query};
use crate::data::{LoadError, QueryError, QueryParams};
use crate::state::AppState;

/// Build the API router over shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/spare-parts", get(list_handler))
        .route("/spare-parts/:sn", get(lookup_handler))
        .route("/reload", post(reload_handler))
        .with_state(state)
}

/// Serve until SIGINT/SIGTERM, letting in-flight requests finish.
pub async fn run_server(state: Arc<AppState>, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigint, mut sigterm) = match (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    ) {
        (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
        (Err(e), _) | (_, Err(e)) => {
            log::warn!("Cannot install signal handlers ({e}), falling back to Ctrl-C");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = sigint.recv() => log::info!("Received SIGINT, shutting down"),
        _ = sigterm.recv() => log::info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    log::info!("Received Ctrl-C, shutting down");
}

// --- Errors ---

/// Handler failure, rendered as `{"error": "..."}`.
#[derive(Debug)]
enum ApiError {
    BadRequest(QueryError),
    Reload(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Reload(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        ApiError::BadRequest(e)
    }
}

impl From<LoadError> for ApiError {
    fn from(e: LoadError) -> Self {
        ApiError::Reload(format!("reload failed: {e}"))
    }
}

// --- Handlers ---

/// GET / - liveness plus the size of the served table.
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        rows_loaded: state.snapshot().len(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    rows_loaded: usize,
}

/// GET /spare-parts - filter, sort and paginate the current snapshot.
async fn list_handler(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let params = QueryParams::from_pairs(pairs);
    let table = state.snapshot();
    let page = query(&table, &params, state.default_page_size()).map_err(|e| {
        log::warn!("Rejected listing query: {e}");
        e
    })?;
    log::debug!(
        "Listing {:?}: {} match(es), page {}/{}",
        params,
        page.total,
        page.page,
        page.total_pages
    );
    Ok(Json(page).into_response())
}

/// GET /spare-parts/:sn - substring lookup on the identifier column.
async fn lookup_handler(
    State(state): State<Arc<AppState>>,
    Path(sn): Path<String>,
) -> Response {
    let table = state.snapshot();
    let lookup = lookup_by_sn(&table, &sn);
    log::debug!("Lookup {sn:?}: {} match(es)", lookup.total);
    Json(lookup).into_response()
}

/// POST /reload - re-read the source file; keep the old table on failure.
async fn reload_handler(State(state): State<Arc<AppState>>) -> Result<Json<ReloadResponse>, ApiError> {
    let worker = Arc::clone(&state);
    let result = tokio::task::spawn_blocking(move || worker.reload())
        .await
        .map_err(|e| ApiError::Reload(format!("reload task failed: {e}")))?;

    match result {
        Ok(table) => {
            log::info!(
                "Reloaded {}: {} rows",
                state.source().path.display(),
                table.len()
            );
            Ok(Json(ReloadResponse {
                status: "reloaded",
                rows: table.len(),
            }))
        }
        Err(e) => {
            log::warn!("Reload failed, keeping previous table: {e}");
            Err(e.into())
        }
    }
}

#[derive(Serialize)]
struct ReloadResponse {
    status: &'static str,
    rows: usize,
}

#[cfg(test)]
mod tests {
    use std::fs;

    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::data::SourceFile;

    const PARTS: &str = "name,price,sn\nBolt A,$12.50,SN1\nBolt B,,SN2\nWasher,0.10,WX-9\n";

    struct Fixture {
        _dir: tempfile::TempDir,
        path: std::path::PathBuf,
        state: Arc<AppState>,
    }

    fn fixture(contents: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("LE.txt");
        fs::write(&path, contents).unwrap();
        let state = Arc::new(AppState::load(SourceFile::new(&path), 30).unwrap());
        Fixture {
            _dir: dir,
            path,
            state,
        }
    }

    async fn call(state: &Arc<AppState>, method: Method, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = build_router(Arc::clone(state)).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_row_count() {
        let f = fixture(PARTS);
        let (status, body) = call(&f.state, Method::GET, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok", "rows_loaded": 3}));
    }

    #[tokio::test]
    async fn listing_applies_search_sort_and_paging() {
        let f = fixture(PARTS);
        let (status, body) = call(
            &f.state,
            Method::GET,
            "/spare-parts?search=bolt&sort=-price&page=1&page_size=1",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        assert_eq!(body["total_pages"], 2);
        assert_eq!(body["page"], 1);
        assert_eq!(body["page_size"], 1);
        assert_eq!(body["data"][0]["sn"], "SN1");
        assert_eq!(body["data"][0]["_price"], 12.5);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn listing_emits_derived_fields() {
        let f = fixture(PARTS);
        let (_, body) = call(&f.state, Method::GET, "/spare-parts?sn=WX").await;
        assert_eq!(
            body["data"],
            json!([{
                "name": "Washer", "price": "0.10", "sn": "WX-9",
                "_price": 0.1, "_name": "washer", "_sn": "WX-9"
            }])
        );
    }

    #[tokio::test]
    async fn listing_rejects_bad_pagination() {
        let f = fixture(PARTS);
        for uri in ["/spare-parts?page=abc", "/spare-parts?page_size=0", "/spare-parts?page_size=-1"] {
            let (status, body) = call(&f.state, Method::GET, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(body["error"].as_str().unwrap().contains("page"), "{uri}");
        }
    }

    #[tokio::test]
    async fn listing_tolerates_odd_filter_text() {
        let f = fixture(PARTS);
        let (status, body) = call(&f.state, Method::GET, "/spare-parts?name=%5B(*&sn=").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);
        assert_eq!(body["total_pages"], 1);
    }

    #[tokio::test]
    async fn repeated_parameter_uses_first_value() {
        let f = fixture(PARTS);
        let (status, body) = call(&f.state, Method::GET, "/spare-parts?name=bolt&name=x").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
    }

    #[tokio::test]
    async fn oversized_page_is_clamped() {
        let f = fixture(PARTS);
        let (status, body) = call(
            &f.state,
            Method::GET,
            "/spare-parts?page=99999999999999999999&page_size=2",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"], 2);
        assert_eq!(body["total_pages"], 2);
    }

    #[tokio::test]
    async fn lookup_by_identifier_substring() {
        let f = fixture(PARTS);
        let (status, body) = call(&f.state, Method::GET, "/spare-parts/SN").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        assert_eq!(body["data"][0]["sn"], "SN1");
        assert_eq!(body["data"][1]["sn"], "SN2");
        assert!(body.get("page").is_none());

        let (_, none) = call(&f.state, Method::GET, "/spare-parts/nothing").await;
        assert_eq!(none, json!({"total": 0, "data": []}));
    }

    #[tokio::test]
    async fn reload_picks_up_file_changes() {
        let f = fixture(PARTS);
        fs::write(&f.path, "sn,name\nN1,Nut\n").unwrap();

        let (status, body) = call(&f.state, Method::POST, "/reload").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "reloaded", "rows": 1}));

        let (_, health) = call(&f.state, Method::GET, "/").await;
        assert_eq!(health["rows_loaded"], 1);
    }

    #[tokio::test]
    async fn failed_reload_keeps_serving_previous_table() {
        let f = fixture(PARTS);
        fs::remove_file(&f.path).unwrap();

        let (status, body) = call(&f.state, Method::POST, "/reload").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().starts_with("reload failed"));

        let (_, listing) = call(&f.state, Method::GET, "/spare-parts?name=washer").await;
        assert_eq!(listing["total"], 1);
        let (_, health) = call(&f.state, Method::GET, "/").await;
        assert_eq!(health["rows_loaded"], 3);
    }
}
