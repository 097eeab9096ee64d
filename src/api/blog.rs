use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde_json::Value;

use crate::api::create::process_create;
use crate::api::listing::{process_get, process_list};
use crate::api::query::{post_query, Filter, FilterSpec, ListParams};
use crate::api::reshape::Resource;
use crate::api::response::{ItemResponse, ListResponse, PaginationKeys};
use crate::db::models::{BlogPost, BlogPostView};
use crate::db::repository::EntityRepository;
use crate::error::AppError;
use crate::state::AppState;

/// Core logic for `GET /api/blog`. The blog uses the short pagination keys.
pub async fn process_list_posts(
    repo: &dyn EntityRepository<BlogPost>,
    params: &ListParams,
) -> Result<ListResponse<Resource<BlogPostView>>, AppError> {
    let query = post_query(params)?;
    process_list(repo, query, PaginationKeys::Short).await
}

/// Core logic for `GET /api/blog/{slug}`. Only active posts are readable.
pub async fn process_get_post(
    repo: &dyn EntityRepository<BlogPost>,
    slug: &str,
) -> Result<ItemResponse<Resource<BlogPostView>>, AppError> {
    let filter = FilterSpec::new()
        .with(Filter::equals("slug", slug))
        .with(Filter::equals("isActive", true));
    process_get(repo, filter).await
}

/// Axum handler for `GET /api/blog`.
pub async fn list_posts_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<axum::Json<ListResponse<Resource<BlogPostView>>>, AppError> {
    let params = ListParams::new(params);
    let response = process_list_posts(state.posts.as_ref(), &params).await?;
    Ok(axum::Json(response))
}

/// Axum handler for `GET /api/blog/{slug}`.
pub async fn get_post_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<axum::Json<ItemResponse<Resource<BlogPostView>>>, AppError> {
    let response = process_get_post(state.posts.as_ref(), &slug).await?;
    Ok(axum::Json(response))
}

/// Axum handler for `POST /api/blog`.
pub async fn create_post_handler(
    State(state): State<AppState>,
    body: Result<axum::Json<Value>, JsonRejection>,
) -> Result<(StatusCode, axum::Json<ItemResponse<Resource<BlogPostView>>>), AppError> {
    let axum::Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let response = process_create(state.posts.as_ref(), body).await?;
    Ok((StatusCode::CREATED, axum::Json(response)))
}
