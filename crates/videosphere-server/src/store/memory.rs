//! In-memory video store

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};

use super::{StoreError, StoreResult, Video, VideoStore};

/// Owner of the seeded sample videos
pub const SAMPLE_OWNER: &str = "user_123";

/// Ordered, lock-guarded list of videos
///
/// Every operation holds the lock for its whole duration, so concurrent
/// requests observe the same serial order a single-threaded list would.
#[derive(Debug, Default)]
pub struct InMemoryVideoStore {
    videos: RwLock<Vec<Video>>,
}

impl InMemoryVideoStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `videos`, order kept
    pub fn with_videos(videos: Vec<Video>) -> Self {
        Self {
            videos: RwLock::new(videos),
        }
    }

    /// Store seeded with the two demo videos owned by [`SAMPLE_OWNER`]
    pub fn sample() -> Self {
        Self::with_videos(vec![
            Video {
                id: 1,
                title: "Sample Video 1".to_string(),
                description: Some("This is a sample video".to_string()),
                url: "https://example.com/video1".to_string(),
                user_id: Some(SAMPLE_OWNER.to_string()),
            },
            Video {
                id: 2,
                title: "Sample Video 2".to_string(),
                description: Some("Another sample video".to_string()),
                url: "https://example.com/video2".to_string(),
                user_id: Some(SAMPLE_OWNER.to_string()),
            },
        ])
    }

    /// Number of stored videos
    pub fn len(&self) -> usize {
        self.videos.read().len()
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.videos.read().is_empty()
    }
}

#[async_trait]
impl VideoStore for InMemoryVideoStore {
    async fn list_all(&self) -> Vec<Video> {
        self.videos.read().clone()
    }

    async fn list_by_owner(&self, owner: &str) -> Vec<Video> {
        self.videos
            .read()
            .iter()
            .filter(|v| v.user_id.as_deref() == Some(owner))
            .cloned()
            .collect()
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Video> {
        self.videos
            .read()
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or(StoreError::NotFound { id })
    }

    async fn create(&self, mut video: Video, owner: &str) -> Video {
        if let Some(claimed) = video.user_id.as_deref()
            && claimed != owner
        {
            debug!(claimed, owner, "Ignoring client-supplied owner");
        }
        video.user_id = Some(owner.to_string());

        self.videos.write().push(video.clone());
        info!(id = video.id, owner, "Video created");
        video
    }

    async fn delete_by_id_and_owner(&self, id: i64, owner: &str) -> StoreResult<Video> {
        let mut videos = self.videos.write();
        let index = videos
            .iter()
            .position(|v| v.id == id && v.user_id.as_deref() == Some(owner))
            .ok_or_else(|| {
                debug!(id, owner, "No video owned by caller with this id");
                StoreError::NotFound { id }
            })?;

        let removed = videos.remove(index);
        info!(id, owner, "Video deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: i64, owner: Option<&str>) -> Video {
        Video {
            id,
            title: format!("Video {id}"),
            description: None,
            url: format!("https://example.com/{id}"),
            user_id: owner.map(str::to_string),
        }
    }

    fn two_owner_store() -> InMemoryVideoStore {
        InMemoryVideoStore::with_videos(vec![video(1, Some("u1")), video(2, Some("u2"))])
    }

    #[tokio::test]
    async fn test_sample_data() {
        let store = InMemoryVideoStore::sample();
        let all = store.list_all().await;

        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "Sample Video 1");
        assert_eq!(all[1].description.as_deref(), Some("Another sample video"));
        assert!(all.iter().all(|v| v.user_id.as_deref() == Some(SAMPLE_OWNER)));
    }

    #[tokio::test]
    async fn test_list_by_owner_filters_and_keeps_order() {
        let store = InMemoryVideoStore::with_videos(vec![
            video(3, Some("u1")),
            video(1, Some("u2")),
            video(2, Some("u1")),
            video(4, None),
        ]);

        let ids: Vec<i64> = store.list_by_owner("u1").await.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![3, 2]);
        assert_eq!(store.len(), 4);
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let store = two_owner_store();

        assert_eq!(store.get_by_id(2).await.unwrap().user_id.as_deref(), Some("u2"));
        assert_eq!(store.get_by_id(9).await, Err(StoreError::NotFound { id: 9 }));
    }

    #[tokio::test]
    async fn test_get_by_id_returns_first_duplicate() {
        let mut second = video(1, Some("u2"));
        second.title = "Second".into();
        let store = InMemoryVideoStore::with_videos(vec![video(1, Some("u1")), second]);

        assert_eq!(store.get_by_id(1).await.unwrap().title, "Video 1");
    }

    #[tokio::test]
    async fn test_create_forces_owner() {
        let store = InMemoryVideoStore::new();

        let stored = store.create(video(5, Some("evil_user")), "real_user").await;

        assert_eq!(stored.user_id.as_deref(), Some("real_user"));
        assert_eq!(store.list_all().await, vec![stored]);
        assert!(store.list_by_owner("evil_user").await.is_empty());
    }

    #[tokio::test]
    async fn test_create_allows_duplicate_ids() {
        let store = two_owner_store();
        store.create(video(1, None), "u3").await;

        let ids: Vec<i64> = store.list_all().await.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![1, 2, 1]);
    }

    #[tokio::test]
    async fn test_delete_foreign_record_is_not_found() {
        let store = two_owner_store();

        assert_eq!(
            store.delete_by_id_and_owner(2, "u1").await,
            Err(StoreError::NotFound { id: 2 })
        );
        assert_eq!(store.len(), 2);
        assert!(store.get_by_id(2).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_absent_and_foreign_look_identical() {
        let store = two_owner_store();

        let foreign = store.delete_by_id_and_owner(2, "u1").await.unwrap_err();
        let absent = store.delete_by_id_and_owner(99, "u1").await.unwrap_err();

        assert!(matches!(foreign, StoreError::NotFound { .. }));
        assert!(matches!(absent, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_own_record() {
        let store = two_owner_store();

        let removed = store.delete_by_id_and_owner(2, "u2").await.unwrap();

        assert_eq!(removed.id, 2);
        assert_eq!(store.list_all().await, vec![video(1, Some("u1"))]);
    }

    #[tokio::test]
    async fn test_delete_removes_only_first_match() {
        let store = InMemoryVideoStore::with_videos(vec![
            video(1, Some("u1")),
            video(1, Some("u1")),
        ]);

        store.delete_by_id_and_owner(1, "u1").await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_unowned_records_cannot_be_deleted() {
        let store = InMemoryVideoStore::with_videos(vec![video(4, None)]);

        assert!(store.delete_by_id_and_owner(4, "").await.is_err());
        assert!(!store.is_empty());
    }
}
