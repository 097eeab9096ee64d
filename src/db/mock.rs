//! In-memory repository used by unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};

use crate::api::query::{Filter, FilterSpec, ListQuery};
use crate::db::models::{Entity, Stored};
use crate::db::repository::{EntityRepository, Page};
use crate::error::AppError;

/// Stores entities in a `Vec`. `Equals`, `Range` and `AnyOf` filters are
/// evaluated, text search matches everything; list queries return insertion
/// order with the page window applied.
pub struct MockRepo<T> {
    pub items: Mutex<Vec<Stored<T>>>,
    pub queries: Mutex<Vec<ListQuery>>,
    pub fail_with: Option<fn() -> AppError>,
}

impl<T> MockRepo<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(vec![]),
            queries: Mutex::new(vec![]),
            fail_with: None,
        }
    }

    /// A repository whose every call fails with the given error.
    pub fn failing(error: fn() -> AppError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::new()
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), AppError> {
        match self.fail_with {
            Some(error) => Err(error()),
            None => Ok(()),
        }
    }
}

fn matches<T: Entity>(stored: &Stored<T>, filter: &FilterSpec) -> bool {
    let doc = mongodb::bson::to_document(stored).unwrap();
    filter.filters().iter().all(|f| match f {
        Filter::Equals { field, value } => doc.get(field) == Some(value),
        Filter::Range { field, min, max } => match number(&doc, field) {
            Some(n) => min.map_or(true, |min| n >= min) && max.map_or(true, |max| n <= max),
            None => false,
        },
        Filter::AnyOf { field, values } => match doc.get_array(field) {
            Ok(items) => items
                .iter()
                .any(|item| matches!(item, Bson::String(s) if values.contains(s))),
            Err(_) => false,
        },
        Filter::TextSearch(_) => true,
    })
}

fn number(doc: &Document, field: &str) -> Option<f64> {
    match doc.get(field)? {
        Bson::Double(n) => Some(*n),
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        _ => None,
    }
}

#[async_trait]
impl<T: Entity> EntityRepository<T> for MockRepo<T> {
    async fn insert(&self, entity: T) -> Result<Stored<T>, AppError> {
        self.check()?;
        let stored = Stored::new(entity);
        self.items.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn find_page(&self, query: &ListQuery) -> Result<Page<T>, AppError> {
        self.check()?;
        self.queries.lock().unwrap().push(query.clone());

        let matching: Vec<Stored<T>> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|s| matches(*s, &query.filter))
            .cloned()
            .collect();
        let total = matching.len() as u64;

        let skip = query.window.skip().unwrap_or(0) as usize;
        let take = if query.window.limit == 0 {
            usize::MAX
        } else {
            query.window.limit.unsigned_abs() as usize
        };
        let items = matching.into_iter().skip(skip).take(take).collect();

        Ok(Page { items, total })
    }

    async fn find_one(&self, filter: &FilterSpec) -> Result<Option<Stored<T>>, AppError> {
        self.check()?;
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .find(|s| matches(*s, filter))
            .cloned())
    }

    async fn count(&self, filter: &FilterSpec) -> Result<u64, AppError> {
        self.check()?;
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|s| matches(*s, filter))
            .count() as u64)
    }

    async fn ensure_indexes(&self) -> Result<(), AppError> {
        self.check()
    }
}
