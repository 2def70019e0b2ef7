use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
    routing::{any, get, post, put},
};
use serde::{Deserialize, de::DeserializeOwned};

use super::db::DbHandle;
#[cfg(test)]
use super::db::BoardDb;
use super::models::*;
use super::sanitize::{clean_tags, optional_text, required_text};
use crate::errors::BoardError;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub db: DbHandle,
    /// Fail a whole reorder batch when an entry names a missing row.
    pub strict_reorder: bool,
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

/// `orders` stays untyped until it is known to be an array, so a wrong
/// shape gets its own message instead of a generic decode error.
#[derive(Deserialize)]
pub struct ReorderRequest {
    #[serde(default)]
    pub orders: serde_json::Value,
}

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl ApiError {
    /// Map a storage failure to a response. Domain rejections carried inside
    /// the error keep their message; anything else is logged and reported
    /// as `message`.
    fn storage(err: anyhow::Error, message: &str) -> Self {
        match err.downcast_ref::<BoardError>() {
            Some(e) if e.is_not_found() => ApiError::NotFound(e.to_string()),
            Some(e @ (BoardError::LastColumn | BoardError::Validation(_))) => {
                ApiError::BadRequest(e.to_string())
            }
            _ => {
                tracing::error!(error = ?err, "{}", message);
                ApiError::Internal(message.to_string())
            }
        }
    }
}

impl From<BoardError> for ApiError {
    fn from(err: BoardError) -> Self {
        ApiError::storage(err.into(), "Internal server error")
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => {
                tracing::debug!(reason = %msg, "Rejected request");
                (StatusCode::BAD_REQUEST, msg)
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/board", get(get_board).put(update_board))
        .route("/api/board/export", get(export_board))
        .route("/api/board/download-db", get(download_db))
        .route("/api/export", get(export_redirect))
        .route("/api/columns", get(list_columns).post(create_column))
        .route("/api/columns/reorder", post(reorder_columns))
        .route("/api/columns/{id}", put(update_column).delete(delete_column))
        .route("/api/cards", get(list_cards).post(create_card))
        .route("/api/cards/reorder", post(reorder_cards))
        .route("/api/cards/{id}", put(update_card).delete(delete_card))
        .route("/api/members", get(list_members).post(create_member))
        .route("/api/members/{id}", put(update_member).delete(delete_member))
        .route("/api", any(api_not_found))
        .route("/api/{*rest}", any(api_not_found))
        .route("/health", get(health_check))
}

// ── Helpers ───────────────────────────────────────────────────────────

fn parse_orders<T: DeserializeOwned>(orders: serde_json::Value) -> Result<Vec<T>, ApiError> {
    if !orders.is_array() {
        return Err(ApiError::BadRequest("Orders must be an array".into()));
    }
    serde_json::from_value(orders)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order entry: {}", e)))
}

/// Positions are zero-based; a negative index is rejected before storage.
fn check_order_index(order_index: Option<i64>) -> Result<(), ApiError> {
    match order_index {
        Some(index) if index < 0 => Err(ApiError::BadRequest(format!(
            "Order index must be a non-negative integer, got {}",
            index
        ))),
        _ => Ok(()),
    }
}

/// Reject a whole reorder batch when any `(id, order_index)` entry is negative.
fn check_batch_indices(entries: impl IntoIterator<Item = (i64, i64)>) -> Result<(), ApiError> {
    match entries.into_iter().find(|(_, index)| *index < 0) {
        Some((id, index)) => Err(ApiError::BadRequest(format!(
            "Invalid order index {} for id {}",
            index, id
        ))),
        None => Ok(()),
    }
}

fn card_changes(req: CardRequest) -> CardChanges {
    CardChanges {
        column_id: req.column_id,
        // A blank title keeps the current one
        title: optional_text(req.title.as_deref()),
        description: optional_text(req.description.as_deref()),
        assignee_id: req.assignee_id,
        color: optional_text(req.color.as_deref()),
        emoji: optional_text(req.emoji.as_deref()),
        tags: req.tags.as_deref().map(clean_tags),
        due_date: optional_text(req.due_date.as_deref()),
        order_index: req.order_index,
    }
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn api_not_found() -> ApiError {
    ApiError::NotFound("Not found".into())
}

async fn get_board(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .db
        .call(|db| db.get_board_view())
        .await
        .map_err(|e| ApiError::storage(e, "Failed to fetch board"))?;
    Ok(Json(view))
}

async fn update_board(
    State(state): State<SharedState>,
    payload: Result<Json<UpdateBoardRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let name = required_text(req.name.as_deref(), "Name")?;
    let theme = req
        .theme
        .as_deref()
        .and_then(|t| Theme::from_str(t).ok())
        .unwrap_or_default();
    let board = state
        .db
        .call(move |db| db.update_board(&name, theme))
        .await
        .map_err(|e| ApiError::storage(e, "Failed to update board"))?;
    Ok(Json(board))
}

async fn export_board(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let export = state
        .db
        .call(|db| db.export_board())
        .await
        .map_err(|e| ApiError::storage(e, "Failed to export board"))?;
    Ok((
        [(
            header::CONTENT_DISPOSITION,
            "attachment; filename=kanban-export.json",
        )],
        Json(export),
    ))
}

async fn export_redirect() -> Redirect {
    Redirect::temporary("/api/board/export")
}

async fn download_db(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let backup = state
        .db
        .call(|db| {
            let filename = db
                .path()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "board.db".to_string());
            Ok(db.backup_bytes()?.map(|bytes| (bytes, filename)))
        })
        .await
        .map_err(|e| ApiError::storage(e, "Failed to download database"))?;
    let Some((bytes, filename)) = backup else {
        return Err(ApiError::NotFound("Database file not found".into()));
    };
    Ok((
        [
            (header::CONTENT_TYPE, "application/x-sqlite3".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", filename),
            ),
        ],
        bytes,
    ))
}

// Columns

async fn list_columns(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let columns = state
        .db
        .call(|db| db.list_columns())
        .await
        .map_err(|e| ApiError::storage(e, "Failed to fetch columns"))?;
    Ok(Json(columns))
}

async fn create_column(
    State(state): State<SharedState>,
    payload: Result<Json<ColumnRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let title = required_text(req.title.as_deref(), "Title")?;
    check_order_index(req.order_index)?;
    let order_index = req.order_index;
    let column = state
        .db
        .call(move |db| db.create_column(&title, order_index))
        .await
        .map_err(|e| ApiError::storage(e, "Failed to create column"))?;
    Ok((StatusCode::CREATED, Json(column)))
}

async fn update_column(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    payload: Result<Json<ColumnRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let title = required_text(req.title.as_deref(), "Title")?;
    check_order_index(req.order_index)?;
    let order_index = req.order_index;
    let column = state
        .db
        .call(move |db| db.update_column(id, &title, order_index))
        .await
        .map_err(|e| ApiError::storage(e, "Failed to update column"))?;
    Ok(Json(column))
}

async fn delete_column(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .call(move |db| db.delete_column(id))
        .await
        .map_err(|e| ApiError::storage(e, "Failed to delete column"))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reorder_columns(
    State(state): State<SharedState>,
    payload: Result<Json<ReorderRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let orders: Vec<ColumnOrder> = parse_orders(req.orders)?;
    check_batch_indices(orders.iter().map(|o| (o.id, o.order_index)))?;
    let strict = state.strict_reorder;
    tracing::info!(entries = orders.len(), strict, "Applying column reorder batch");
    let columns = state
        .db
        .call(move |db| db.reorder_columns(&orders, strict))
        .await
        .map_err(|e| ApiError::storage(e, "Failed to reorder columns"))?;
    Ok(Json(columns))
}

// Cards

async fn list_cards(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let cards = state
        .db
        .call(|db| db.list_cards())
        .await
        .map_err(|e| ApiError::storage(e, "Failed to fetch cards"))?;
    Ok(Json(cards))
}

async fn create_card(
    State(state): State<SharedState>,
    payload: Result<Json<CardRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let title = required_text(req.title.as_deref(), "Title")?;
    let column_id = req
        .column_id
        .ok_or_else(|| ApiError::BadRequest("Column ID is required".into()))?;
    check_order_index(req.order_index)?;
    let new_card = NewCard {
        column_id,
        title,
        description: optional_text(req.description.as_deref()),
        assignee_id: req.assignee_id,
        color: optional_text(req.color.as_deref()),
        emoji: optional_text(req.emoji.as_deref()),
        tags: req.tags.as_deref().map(clean_tags).unwrap_or_default(),
        due_date: optional_text(req.due_date.as_deref()),
        order_index: req.order_index,
    };
    let card = state
        .db
        .call(move |db| db.create_card(&new_card))
        .await
        .map_err(|e| ApiError::storage(e, "Failed to create card"))?;
    Ok((StatusCode::CREATED, Json(card)))
}

async fn update_card(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    payload: Result<Json<CardRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    check_order_index(req.order_index)?;
    let changes = card_changes(req);
    let card = state
        .db
        .call(move |db| db.update_card(id, &changes))
        .await
        .map_err(|e| ApiError::storage(e, "Failed to update card"))?;
    Ok(Json(card))
}

async fn delete_card(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .db
        .call(move |db| db.delete_card(id))
        .await
        .map_err(|e| ApiError::storage(e, "Failed to delete card"))?;
    match deleted {
        true => Ok(StatusCode::NO_CONTENT),
        false => Err(ApiError::NotFound(format!("Card {} not found", id))),
    }
}

async fn reorder_cards(
    State(state): State<SharedState>,
    payload: Result<Json<ReorderRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let orders: Vec<CardOrder> = parse_orders(req.orders)?;
    check_batch_indices(orders.iter().map(|o| (o.id, o.order_index)))?;
    let strict = state.strict_reorder;
    tracing::info!(entries = orders.len(), strict, "Applying card reorder batch");
    let cards = state
        .db
        .call(move |db| db.reorder_cards(&orders, strict))
        .await
        .map_err(|e| ApiError::storage(e, "Failed to reorder cards"))?;
    Ok(Json(cards))
}

// Members

async fn list_members(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let members = state
        .db
        .call(|db| db.list_members())
        .await
        .map_err(|e| ApiError::storage(e, "Failed to fetch members"))?;
    Ok(Json(members))
}

async fn create_member(
    State(state): State<SharedState>,
    payload: Result<Json<MemberRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let name = required_text(req.name.as_deref(), "Name")?;
    let color = optional_text(req.color.as_deref());
    let avatar = optional_text(req.avatar.as_deref());
    let member = state
        .db
        .call(move |db| db.create_member(&name, color.as_deref(), avatar.as_deref()))
        .await
        .map_err(|e| ApiError::storage(e, "Failed to create member"))?;
    Ok((StatusCode::CREATED, Json(member)))
}

async fn update_member(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    payload: Result<Json<MemberRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let name = required_text(req.name.as_deref(), "Name")?;
    let color = optional_text(req.color.as_deref());
    let avatar = optional_text(req.avatar.as_deref());
    let member = state
        .db
        .call(move |db| db.update_member(id, &name, color.as_deref(), avatar.as_deref()))
        .await
        .map_err(|e| ApiError::storage(e, "Failed to update member"))?;
    Ok(Json(member))
}

async fn delete_member(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .db
        .call(move |db| db.delete_member(id))
        .await
        .map_err(|e| ApiError::storage(e, "Failed to delete member"))?;
    match deleted {
        true => Ok(StatusCode::NO_CONTENT),
        false => Err(ApiError::NotFound(format!("Member {} not found", id))),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
