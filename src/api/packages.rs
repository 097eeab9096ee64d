use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde_json::Value;

use crate::api::create::process_create;
use crate::api::listing::{id_filter, process_get, process_list};
use crate::api::query::{package_query, ListParams};
use crate::api::reshape::Resource;
use crate::api::response::{ItemResponse, ListResponse, PaginationKeys};
use crate::db::models::TourPackage;
use crate::db::repository::EntityRepository;
use crate::error::AppError;
use crate::state::AppState;

/// Core logic for `GET /api/packages`.
pub async fn process_list_packages(
    repo: &dyn EntityRepository<TourPackage>,
    params: &ListParams,
) -> Result<ListResponse<Resource<TourPackage>>, AppError> {
    let query = package_query(params)?;
    process_list(repo, query, PaginationKeys::Long).await
}

/// Core logic for `GET /api/packages/{id}`.
pub async fn process_get_package(
    repo: &dyn EntityRepository<TourPackage>,
    id: &str,
) -> Result<ItemResponse<Resource<TourPackage>>, AppError> {
    process_get(repo, id_filter::<TourPackage>(id)?).await
}

/// Axum handler for `GET /api/packages`.
pub async fn list_packages_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<axum::Json<ListResponse<Resource<TourPackage>>>, AppError> {
    let params = ListParams::new(params);
    let response = process_list_packages(state.packages.as_ref(), &params).await?;
    Ok(axum::Json(response))
}

/// Axum handler for `GET /api/packages/{id}`.
pub async fn get_package_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<axum::Json<ItemResponse<Resource<TourPackage>>>, AppError> {
    let response = process_get_package(state.packages.as_ref(), &id).await?;
    Ok(axum::Json(response))
}

/// Axum handler for `POST /api/packages`.
pub async fn create_package_handler(
    State(state): State<AppState>,
    body: Result<axum::Json<Value>, JsonRejection>,
) -> Result<(StatusCode, axum::Json<ItemResponse<Resource<TourPackage>>>), AppError> {
    let axum::Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let response = process_create(state.packages.as_ref(), body).await?;
    Ok((StatusCode::CREATED, axum::Json(response)))
}
