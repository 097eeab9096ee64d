use mongodb::bson::oid::ObjectId;

use crate::api::query::{Filter, FilterSpec, ListQuery};
use crate::api::reshape::{reshape, reshape_all, Resource};
use crate::api::response::{ItemResponse, ListResponse, Pagination, PaginationKeys};
use crate::db::models::Entity;
use crate::db::repository::EntityRepository;
use crate::error::AppError;

/// Run a list query and wrap the page with its pagination block.
pub async fn process_list<T: Entity>(
    repo: &dyn EntityRepository<T>,
    query: ListQuery,
    keys: PaginationKeys,
) -> Result<ListResponse<Resource<T::View>>, AppError> {
    let page = repo.find_page(&query).await?;

    tracing::debug!(
        collection = T::COLLECTION,
        returned = page.items.len(),
        total = page.total,
        "Listed documents"
    );

    let pagination = Pagination::new(query.window, page.total, keys);
    Ok(ListResponse::new(reshape_all(page.items), pagination))
}

fn not_found<T: Entity>() -> AppError {
    AppError::NotFound(format!("{} not found", T::LABEL))
}

/// Fetch a single entity matching `filter`, 404 when there is none.
pub async fn process_get<T: Entity>(
    repo: &dyn EntityRepository<T>,
    filter: FilterSpec,
) -> Result<ItemResponse<Resource<T::View>>, AppError> {
    let stored = repo.find_one(&filter).await?.ok_or_else(not_found::<T>)?;
    Ok(ItemResponse::new(reshape(stored)))
}

/// Filter selecting one entity by its hex identifier. A malformed identifier
/// cannot match anything and is reported as not found.
pub fn id_filter<T: Entity>(id: &str) -> Result<FilterSpec, AppError> {
    let oid = ObjectId::parse_str(id).map_err(|_| not_found::<T>())?;
    Ok(FilterSpec::new().with(Filter::equals("_id", oid)))
}
