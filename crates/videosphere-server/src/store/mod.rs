//! Video records and the storage seam
//!
//! Handlers only see [`VideoStore`]; [`InMemoryVideoStore`] is the one
//! implementation shipped. A persistent backend slots in behind the same trait.

mod memory;

pub use memory::{InMemoryVideoStore, SAMPLE_OWNER};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A video entry
///
/// `id` is chosen by the client and is not checked for uniqueness.
/// `user_id` is the owner's subject, always assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    /// Caller-supplied identifier
    pub id: i64,
    /// Display title
    pub title: String,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// Location of the media
    pub url: String,
    /// Owner subject
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Store errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No matching record, or the record belongs to someone else
    #[error("Video {id} not found")]
    NotFound {
        /// Requested id
        id: i64,
    },
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Video persistence
#[async_trait]
pub trait VideoStore: Send + Sync + std::fmt::Debug {
    /// Every record, in insertion order
    async fn list_all(&self) -> Vec<Video>;

    /// Records owned by `owner`, in insertion order
    async fn list_by_owner(&self, owner: &str) -> Vec<Video>;

    /// First record with `id`
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when no record has this id.
    async fn get_by_id(&self, id: i64) -> StoreResult<Video>;

    /// Append `video` with its owner forced to `owner`, returning the stored record
    async fn create(&self, video: Video, owner: &str) -> Video;

    /// Remove the first record matching both `id` and `owner`
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the id is absent or owned by another
    /// subject. The two cases are indistinguishable.
    async fn delete_by_id_and_owner(&self, id: i64, owner: &str) -> StoreResult<Video>;
}
