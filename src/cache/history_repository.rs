use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::{LocalFileStorage, StoredImage, compute_hash};
use crate::error::Result;

const USER_IMAGE_DIR: &str = "user_images";

/// Persisted per-user generation history.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Rows for `user_id`, most recent first.
    async fn list_user_images(&self, user_id: &str) -> Result<Vec<StoredImage>>;

    async fn insert(&self, image: &StoredImage) -> Result<()>;
}

/// One JSON file per row under `user_images/<user hash>/`.
#[derive(Clone, Debug)]
pub struct FileHistoryRepository {
    storage: Arc<LocalFileStorage>,
}

impl FileHistoryRepository {
    pub fn new(storage: Arc<LocalFileStorage>) -> Self {
        Self { storage }
    }

    fn user_dir(user_id: &str) -> String {
        format!("{USER_IMAGE_DIR}/{}", compute_hash(user_id))
    }
}

#[async_trait]
impl HistoryRepository for FileHistoryRepository {
    async fn list_user_images(&self, user_id: &str) -> Result<Vec<StoredImage>> {
        let keys = self.storage.list_keys(&Self::user_dir(user_id), "json").await?;
        let mut rows = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(bytes) = self.storage.get(&key).await? else {
                continue;
            };
            match serde_json::from_slice::<StoredImage>(&bytes) {
                Ok(row) => rows.push(row),
                Err(err) => tracing::warn!("Skipping unreadable history row {}: {}", key, err),
            }
        }
        Ok(rows)
    }

    async fn insert(&self, image: &StoredImage) -> Result<()> {
        let created_at = image.created_at.format("%Y%m%dT%H%M%S%9fZ");
        let hash = compute_hash(&format!("{}:{}", image.id, image.image_url));
        let key = format!("{}/{created_at}_{hash}.json", Self::user_dir(&image.user_id));
        let payload = serde_json::to_vec_pretty(image)?;
        self.storage.put(&key, &payload).await?;
        tracing::debug!("Stored history row {} for user {}", image.id, image.user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn row(user_id: &str, id: &str, offset_secs: i64) -> StoredImage {
        StoredImage {
            id: id.to_string(),
            user_id: user_id.to_string(),
            prompt: format!("prompt {id}"),
            width: 1024,
            height: 768,
            inference_steps: 30,
            negative_prompt: None,
            image_url: format!("http://localhost/cache/generated/{id}.webp"),
            model: "stability-ai/sdxl".to_string(),
            style: Some("anime".to_string()),
            created_at: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    #[tokio::test]
    async fn test_list_is_most_recent_first_and_per_user() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(LocalFileStorage::new(
            dir.path().to_path_buf(),
            "http://localhost/cache".into(),
        ));
        let repository = FileHistoryRepository::new(storage);

        repository.insert(&row("alice", "old", 0)).await.unwrap();
        repository.insert(&row("alice", "new", 60)).await.unwrap();
        repository.insert(&row("bob", "other", 30)).await.unwrap();

        let rows = repository.list_user_images("alice").await.unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert_eq!(repository.list_user_images("bob").await.unwrap().len(), 1);
        assert!(repository.list_user_images("carol").await.unwrap().is_empty());
    }
}
