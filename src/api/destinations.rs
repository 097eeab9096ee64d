use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde_json::Value;

use crate::api::create::process_create;
use crate::api::listing::{id_filter, process_get, process_list};
use crate::api::query::{destination_query, Filter, ListParams};
use crate::api::reshape::Resource;
use crate::api::response::{ItemResponse, ListResponse, PaginationKeys};
use crate::db::models::Destination;
use crate::db::repository::EntityRepository;
use crate::error::AppError;
use crate::state::AppState;

/// Core logic for `GET /api/destinations`.
pub async fn process_list_destinations(
    repo: &dyn EntityRepository<Destination>,
    params: &ListParams,
) -> Result<ListResponse<Resource<Destination>>, AppError> {
    let query = destination_query(params)?;
    process_list(repo, query, PaginationKeys::Long).await
}

/// Core logic for `GET /api/destinations/{id}`. Inactive destinations are hidden.
pub async fn process_get_destination(
    repo: &dyn EntityRepository<Destination>,
    id: &str,
) -> Result<ItemResponse<Resource<Destination>>, AppError> {
    let filter = id_filter::<Destination>(id)?.with(Filter::equals("isActive", true));
    process_get(repo, filter).await
}

/// Axum handler for `GET /api/destinations`.
pub async fn list_destinations_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<axum::Json<ListResponse<Resource<Destination>>>, AppError> {
    let params = ListParams::new(params);
    let response = process_list_destinations(state.destinations.as_ref(), &params).await?;
    Ok(axum::Json(response))
}

/// Axum handler for `GET /api/destinations/{id}`.
pub async fn get_destination_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<axum::Json<ItemResponse<Resource<Destination>>>, AppError> {
    let response = process_get_destination(state.destinations.as_ref(), &id).await?;
    Ok(axum::Json(response))
}

/// Axum handler for `POST /api/destinations`.
pub async fn create_destination_handler(
    State(state): State<AppState>,
    body: Result<axum::Json<Value>, JsonRejection>,
) -> Result<(StatusCode, axum::Json<ItemResponse<Resource<Destination>>>), AppError> {
    let axum::Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let response = process_create(state.destinations.as_ref(), body).await?;
    Ok((StatusCode::CREATED, axum::Json(response)))
}
