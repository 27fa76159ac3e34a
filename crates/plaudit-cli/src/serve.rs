//! Feedback intake HTTP server.
//!
//! Routes:
//! - `POST /api/complaints/feedback/` stores a validated submission, sentiment unset
//! - `GET  /api/complaints/feedback/sentiment-stats/` returns [`SentimentStats`]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use plaudit_core::{FeedbackRecord, FeedbackSubmission, SentimentStats};
use plaudit_store::{FeedbackStore, StoreError};
use serde_json::json;
use tracing::{error, info, warn};

pub type SharedStore = Arc<Mutex<Box<dyn FeedbackStore + Send>>>;

#[derive(Clone)]
pub struct AppState {
    store: SharedStore,
}

pub fn router(store: Box<dyn FeedbackStore + Send>) -> Router {
    let state = AppState {
        store: Arc::new(Mutex::new(store)),
    };
    Router::new()
        .route("/api/complaints/feedback/", post(submit_feedback))
        .route("/api/complaints/feedback/sentiment-stats/", get(sentiment_stats))
        .with_state(state)
}

/// Serve until Ctrl+C on a dedicated tokio runtime.
pub fn serve(store: Box<dyn FeedbackStore + Send>, addr: SocketAddr) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding {addr}"))?;
        info!(%addr, "intake server listening");

        axum::serve(listener, router(store))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")?;

        info!("intake server stopped");
        Ok(())
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl+C, serving until killed");
        std::future::pending::<()>().await;
    }
    info!("received Ctrl+C, shutting down");
}

async fn submit_feedback(
    State(state): State<AppState>,
    body: Result<Json<FeedbackSubmission>, JsonRejection>,
) -> Response {
    let submission = match body {
        Ok(Json(s)) => s,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    if let Err(e) = submission.validate() {
        return bad_request(e.to_string());
    }

    let submitted_at = chrono::Utc::now().to_rfc3339();
    let result = with_store(state.store, move |store| {
        store.insert(&submission, &submitted_at)
    })
    .await;

    match result {
        Ok(record) => {
            info!(id = record.id, complaint_id = %record.complaint_id, "feedback stored");
            (StatusCode::CREATED, Json::<FeedbackRecord>(record)).into_response()
        }
        Err(e) => internal_error(e),
    }
}

async fn sentiment_stats(State(state): State<AppState>) -> Response {
    match with_store(state.store, |store| store.all()).await {
        Ok(records) => Json(SentimentStats::from_records(&records)).into_response(),
        Err(e) => internal_error(e),
    }
}

/// Run a store call on the blocking pool.
async fn with_store<T, F>(store: SharedStore, f: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce(&dyn FeedbackStore) -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let guard = store
            .lock()
            .map_err(|_| StoreError::Other("store lock poisoned".into()))?;
        f(&**guard)
    })
    .await
    .map_err(|e| StoreError::Other(format!("store task failed: {e}")))?
}

fn bad_request(message: String) -> Response {
    warn!(%message, "rejected submission");
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

fn internal_error(e: StoreError) -> Response {
    error!(error = %e, "store failure");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "failed to store feedback" })),
    )
        .into_response()
}
