use serde_json::Value;

use crate::api::reshape::{reshape, Resource};
use crate::api::response::ItemResponse;
use crate::db::models::Entity;
use crate::db::repository::EntityRepository;
use crate::error::AppError;

/// A required field counts as missing when absent, null or an empty string.
fn is_missing(body: &serde_json::Map<String, Value>, field: &str) -> bool {
    match body.get(field) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// First required field missing from `body`, in declaration order.
pub fn missing_required_field<'a>(
    body: &serde_json::Map<String, Value>,
    required: &[&'a str],
) -> Option<&'a str> {
    required.iter().copied().find(|field| is_missing(body, field))
}

/// Turn a request body into a validated, normalized entity.
///
/// Missing required fields are reported before anything else; type errors
/// and rule violations come back as validation failures.
pub fn parse_entity<T: Entity>(body: Value) -> Result<T, AppError> {
    let Value::Object(map) = body else {
        return Err(AppError::BadRequest(
            "Request body must be a JSON object".to_string(),
        ));
    };

    if let Some(field) = missing_required_field(&map, T::REQUIRED_FIELDS) {
        return Err(AppError::BadRequest(format!(
            "Missing required field: {field}"
        )));
    }

    let mut entity: T = serde_json::from_value(Value::Object(map))
        .map_err(|e| AppError::Validation(vec![e.to_string()]))?;
    entity.normalize();

    let errors = entity.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    Ok(entity)
}

/// Core logic for every create endpoint, separated from the HTTP layer.
pub async fn process_create<T: Entity>(
    repo: &dyn EntityRepository<T>,
    body: Value,
) -> Result<ItemResponse<Resource<T::View>>, AppError> {
    let entity = parse_entity::<T>(body)?;
    let stored = repo.insert(entity).await?;

    tracing::info!(collection = T::COLLECTION, id = %stored.id, "{} created", T::LABEL);

    Ok(ItemResponse::with_message(
        reshape(stored),
        format!("{} created successfully", T::LABEL),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock::MockRepo;
    use crate::db::models::{BlogPost, Destination, TourPackage};
    use serde_json::json;

    fn destination_body() -> Value {
        json!({
            "name": "Bali",
            "country": "Indonesia",
            "region": "Asia",
            "description": "Island of the gods.",
            "startingPrice": 899,
            "tags": ["Beach", "Culture"]
        })
    }

    fn post_body() -> Value {
        json!({
            "title": "Ten Days in Patagonia",
            "slug": "ten-days-in-patagonia",
            "excerpt": "Wind, granite and glaciers.",
            "content": "Day one starts in El Chalten.",
            "author": { "name": "Lucia" },
            "category": "Adventure"
        })
    }

    #[tokio::test]
    async fn test_create_destination_returns_reshaped_payload() {
        let repo = MockRepo::<Destination>::new();

        let response = process_create(&repo, destination_body()).await.unwrap();

        assert_eq!(response.message.as_deref(), Some("Destination created successfully"));
        let json = serde_json::to_value(&response.data).unwrap();
        assert!(json["id"].is_string());
        assert!(json.get("_id").is_none());
        assert_eq!(json["name"], "Bali");
        assert_eq!(json["tags"], json!(["beach", "culture"]));
        assert_eq!(json["currency"], "USD");
        assert_eq!(json["isActive"], true);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_required_field_is_rejected_without_write() {
        let repo = MockRepo::<Destination>::new();
        let mut body = destination_body();
        body.as_object_mut().unwrap().remove("country");

        let err = process_create(&repo, body).await.unwrap_err();

        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Missing required field: country"));
        assert_eq!(repo.len(), 0);
    }

    #[tokio::test]
    async fn test_null_and_empty_string_count_as_missing() {
        let repo = MockRepo::<BlogPost>::new();

        let mut body = post_body();
        body["excerpt"] = Value::Null;
        let err = process_create(&repo, body).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("excerpt")));

        let mut body = post_body();
        body["slug"] = json!("");
        let err = process_create(&repo, body).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("slug")));

        assert_eq!(repo.len(), 0);
    }

    #[tokio::test]
    async fn test_first_missing_field_in_order_is_reported() {
        let repo = MockRepo::<TourPackage>::new();
        let err = process_create(&repo, json!({ "price": 10 })).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Missing required field: title"));
    }

    #[tokio::test]
    async fn test_type_errors_are_validation_failures() {
        let repo = MockRepo::<Destination>::new();
        let mut body = destination_body();
        body["startingPrice"] = json!("cheap");

        let err = process_create(&repo, body).await.unwrap_err();

        match err {
            AppError::Validation(details) => {
                assert_eq!(details.len(), 1);
                assert!(details[0].contains("cheap"), "{details:?}");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(repo.len(), 0);
    }

    #[tokio::test]
    async fn test_rule_violations_are_listed() {
        let repo = MockRepo::<Destination>::new();
        let mut body = destination_body();
        body["startingPrice"] = json!(-5);
        body["averageRating"] = json!(9);

        let err = process_create(&repo, body).await.unwrap_err();

        match err {
            AppError::Validation(details) => assert_eq!(details.len(), 2, "{details:?}"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_package_category_is_rejected() {
        let repo = MockRepo::<TourPackage>::new();
        let body = json!({
            "title": "Arctic Cruise",
            "destination": "Svalbard",
            "duration": "8 Days",
            "price": 4200,
            "description": "Polar bears and pack ice.",
            "difficulty": "Moderate",
            "category": "Expedition"
        });

        let err = process_create(&repo, body).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_post_read_time_is_derived() {
        let repo = MockRepo::<BlogPost>::new();

        let response = process_create(&repo, post_body()).await.unwrap();

        assert_eq!(response.data.fields.read_time, 1);
        assert_eq!(response.message.as_deref(), Some("Blog post created successfully"));
    }

    #[tokio::test]
    async fn test_non_object_body_is_rejected() {
        let repo = MockRepo::<BlogPost>::new();
        let err = process_create(&repo, json!(["not", "an", "object"])).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces_as_server_error() {
        let repo = MockRepo::<Destination>::failing(|| AppError::Database("socket closed".into()));

        let err = process_create(&repo, destination_body()).await.unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_conflict_passes_through() {
        let repo = MockRepo::<BlogPost>::failing(|| {
            AppError::Conflict(BlogPost::CONFLICT_MESSAGE.to_string())
        });

        let err = process_create(&repo, post_body()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg.contains("slug")));
    }
}
