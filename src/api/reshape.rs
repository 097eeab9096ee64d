use serde::{Deserialize, Serialize};

use crate::db::models::{Entity, Stored, Timestamp};

/// An entity as returned to API callers: the storage identifier becomes a
/// plain `id` string and storage-internal fields are dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource<V> {
    pub id: String,
    #[serde(flatten)]
    pub fields: V,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Project a stored entity into its public shape. Used for both single-item
/// and list responses.
pub fn reshape<T: Entity>(stored: Stored<T>) -> Resource<T::View> {
    Resource {
        id: stored.id.to_hex(),
        fields: stored.entity.into_view(),
        created_at: stored.created_at,
        updated_at: stored.updated_at,
    }
}

pub fn reshape_all<T: Entity>(stored: Vec<Stored<T>>) -> Vec<Resource<T::View>> {
    stored.into_iter().map(reshape).collect()
}
