use serde::Deserialize;
use serde_json::Value;

use crate::api::create::parse_entity;
use crate::api::query::FilterSpec;
use crate::db::models::Entity;
use crate::db::repository::EntityRepository;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
struct DemoCatalog {
    #[serde(default)]
    destinations: Vec<Value>,
    #[serde(default)]
    packages: Vec<Value>,
    #[serde(default)]
    posts: Vec<Value>,
}

/// Insert the bundled demo catalog into every collection that is still empty.
///
/// Entries go through the same parsing and validation as API writes. Failures
/// are logged and skipped; seeding never aborts startup.
pub async fn seed_demo_data(state: &AppState) {
    tracing::info!("Starting demo data seeding...");

    // Embedded so the binary can seed without extra files on disk.
    let catalog: DemoCatalog =
        match serde_json::from_str(include_str!("../demo_data/catalog.json")) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::error!("Failed to parse demo catalog: {}", e);
                return;
            }
        };

    seed_collection(state.destinations.as_ref(), catalog.destinations).await;
    seed_collection(state.packages.as_ref(), catalog.packages).await;
    seed_collection(state.posts.as_ref(), catalog.posts).await;

    tracing::info!("Demo data seeding completed.");
}

/// Seed one collection, returning how many entries were inserted.
pub async fn seed_collection<T: Entity>(repo: &dyn EntityRepository<T>, entries: Vec<Value>) -> usize {
    match repo.count(&FilterSpec::new()).await {
        Ok(0) => {}
        Ok(existing) => {
            tracing::info!(
                "Collection '{}' already has {} documents, skipping.",
                T::COLLECTION,
                existing
            );
            return 0;
        }
        Err(e) => {
            tracing::error!("Failed to inspect collection '{}': {}", T::COLLECTION, e);
            return 0;
        }
    }

    let mut inserted = 0;
    for (idx, entry) in entries.into_iter().enumerate() {
        match insert_entry(repo, entry).await {
            Ok(()) => inserted += 1,
            Err(e) => tracing::error!(
                "Failed to seed {} entry #{} into '{}': {}",
                T::LABEL,
                idx,
                T::COLLECTION,
                e
            ),
        }
    }

    tracing::info!("Seeded {} documents into '{}'.", inserted, T::COLLECTION);
    inserted
}

async fn insert_entry<T: Entity>(repo: &dyn EntityRepository<T>, entry: Value) -> Result<(), AppError> {
    let entity = parse_entity::<T>(entry)?;
    repo.insert(entity).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock::MockRepo;
    use crate::db::models::{BlogPost, Destination, TourPackage};

    fn bundled() -> DemoCatalog {
        serde_json::from_str(include_str!("../demo_data/catalog.json")).unwrap()
    }

    #[test]
    fn test_bundled_catalog_is_valid() {
        let catalog = bundled();
        assert!(!catalog.destinations.is_empty());
        for entry in catalog.destinations {
            parse_entity::<Destination>(entry).unwrap();
        }
        for entry in catalog.packages {
            parse_entity::<TourPackage>(entry).unwrap();
        }
        for entry in catalog.posts {
            parse_entity::<BlogPost>(entry).unwrap();
        }
    }

    #[tokio::test]
    async fn test_seeds_empty_collection() {
        let repo = MockRepo::<Destination>::new();
        let expected = bundled().destinations.len();

        let inserted = seed_collection(&repo, bundled().destinations).await;

        assert_eq!(inserted, expected);
        assert_eq!(repo.len(), expected);
    }

    #[tokio::test]
    async fn test_skips_populated_collection() {
        let repo = MockRepo::<BlogPost>::new();
        seed_collection(&repo, bundled().posts).await;
        let before = repo.len();

        let inserted = seed_collection(&repo, bundled().posts).await;

        assert_eq!(inserted, 0);
        assert_eq!(repo.len(), before);
    }

    #[tokio::test]
    async fn test_invalid_entries_are_skipped() {
        let repo = MockRepo::<TourPackage>::new();
        let mut entries = bundled().packages;
        entries.push(serde_json::json!({ "title": "Incomplete" }));
        let valid = entries.len() - 1;

        let inserted = seed_collection(&repo, entries).await;

        assert_eq!(inserted, valid);
    }
}
