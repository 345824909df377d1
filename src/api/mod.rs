use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{OriginalUri, Path, Query};
use axum::http::header;
use axum::response::IntoResponse;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::Deserialize;

use crate::error::{ApiError, AppError};
use crate::models::*;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TodoQueryParams {
    #[serde(default)]
    only_not_done: bool,
    page: Option<i64>,
    size: Option<i64>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/todo", get(list_todos).post(create_todo))
        .route("/todo/{id}", get(get_todo).patch(update_todo))
        .with_state(state)
}

/// Extractor failures are reported in the same body shape as service errors.
fn rejected(path: &str, reason: String) -> ApiError {
    AppError::InvalidInput(reason).at(path)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn list_todos(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    params: Result<Query<TodoQueryParams>, QueryRejection>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let Query(params) = params.map_err(|e| rejected(uri.path(), e.body_text()))?;
    let (Some(page), Some(size)) = (params.page, params.size) else {
        return Err(rejected(
            uri.path(),
            "Both the page and size query parameters are required".to_string(),
        ));
    };

    let todos = state
        .todos
        .list_items(params.only_not_done, page, size)
        .await
        .map_err(|e| e.at(uri.path()))?;
    Ok(Json(todos))
}

async fn create_todo(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    payload: Result<Json<NewTodoRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload.map_err(|e| rejected(uri.path(), e.body_text()))?;
    let todo = state
        .todos
        .add_item(req)
        .await
        .map_err(|e| e.at(uri.path()))?;
    let location = format!("/todo/{}", todo.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(todo)))
}

async fn get_todo(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Todo>, ApiError> {
    let Path(id) = id.map_err(|e| rejected(uri.path(), e.body_text()))?;
    let todo = state
        .todos
        .get_by_id(id)
        .await
        .map_err(|e| e.at(uri.path()))?;
    Ok(Json(todo))
}

async fn update_todo(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Json<Todo>, ApiError> {
    let Path(id) = id.map_err(|e| rejected(uri.path(), e.body_text()))?;
    let Json(req) = payload.map_err(|e| rejected(uri.path(), e.body_text()))?;
    let todo = state
        .todos
        .update_item(id, req)
        .await
        .map_err(|e| e.at(uri.path()))?;
    Ok(Json(todo))
}
