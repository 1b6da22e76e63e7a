use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use episodic_core::error::ApiError;
use episodic_core::types::MediaItem;
use episodic_engine::display::{DisplayEntry, group_for_display};
use episodic_engine::reclassify::{DetectionReport, ReclassifyReport, ReclassifySession};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::error::{AppError, db_error};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_router() -> Router<AppState> {
    Router::new()
        // Display path
        .route("/catalog", get(get_grouped_catalog))
        .route("/catalog/items", post(create_item))
        .route("/catalog/items/{id}", get(get_item))
        // Admin reclassification
        .nest("/admin/series", admin_router())
}

fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/detect", get(detect_series))
        .route("/apply", post(apply_series))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    sqlx::query("SELECT 1")
        .execute(&state.db)
        .await
        .map_err(|e| ApiError::Internal(format!("database check failed: {e}")))?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

async fn get_grouped_catalog(
    State(state): State<AppState>,
) -> Result<Json<Vec<DisplayEntry>>, AppError> {
    let items = episodic_db::repo::items::list_catalog(&state.db)
        .await
        .map_err(db_error)?;

    let grouped = group_for_display(&items);
    debug!(
        items = items.len(),
        rows = grouped.entries.len(),
        ineligible = grouped.trace.count("ineligible"),
        overrides = grouped.trace.count("explicit_override"),
        "grouped catalog for display"
    );

    Ok(Json(grouped.entries))
}

async fn create_item(
    State(state): State<AppState>,
    Json(item): Json<MediaItem>,
) -> Result<(StatusCode, Json<MediaItem>), AppError> {
    if item.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is required".into()).into());
    }

    let stored = episodic_db::repo::items::insert_item(&state.db, &item)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .is_some_and(|d| d.is_unique_violation());
            if duplicate {
                AppError(ApiError::Conflict(format!("item {} already exists", item.id)))
            } else {
                db_error(e)
            }
        })?;

    Ok((StatusCode::CREATED, Json(stored)))
}

async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MediaItem>, AppError> {
    let item = episodic_db::repo::items::get_item(&state.db, &id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| ApiError::NotFound("item not found".into()))?;

    Ok(Json(item))
}

// ---------------------------------------------------------------------------
// Admin: series reclassification
// ---------------------------------------------------------------------------

/// Detect + Preview. Read-only.
async fn detect_series(State(state): State<AppState>) -> Result<Json<DetectionReport>, AppError> {
    let items = episodic_db::repo::items::list_catalog(&state.db)
        .await
        .map_err(db_error)?;

    let session = ReclassifySession::detect(&items);
    let preview = session.preview();
    info!(
        already_grouped = preview.already_grouped.len(),
        newly_detected = preview.newly_detected.len(),
        items = preview.detected_item_count(),
        "series detection preview"
    );

    Ok(Json(preview.clone()))
}

#[derive(Debug, Deserialize)]
struct ApplyRequest {
    #[serde(default)]
    confirm: bool,
}

/// Confirm + Apply + Report against a fresh Detect of the current catalog.
async fn apply_series(
    State(state): State<AppState>,
    Json(req): Json<ApplyRequest>,
) -> Result<Json<ReclassifyReport>, AppError> {
    if !req.confirm {
        return Err(ApiError::BadRequest("confirmation required".into()).into());
    }

    let _guard = state
        .apply_lock
        .try_lock()
        .map_err(|_| ApiError::Conflict("reclassification already running".into()))?;

    let items = episodic_db::repo::items::list_catalog(&state.db)
        .await
        .map_err(db_error)?;

    let mut session = ReclassifySession::detect(&items);
    let commands = session
        .confirm()
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .len();
    info!(commands, "series reclassification confirmed");

    session
        .apply(&state.catalog, &state.apply_pacing)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let report = session
        .report()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(report))
}
