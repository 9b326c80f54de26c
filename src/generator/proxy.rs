use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::cache::{HistoryRepository, LocalFileStorage, StoredImage, compute_hash};
use crate::catalog::NO_STYLE;
use crate::error::{Result, StudioError};
use crate::generator::{GeneratedImage, ImageGenerator, NebiusClient};
use crate::image_processing;
use crate::request::SettingsPayload;

const GENERATED_DIR: &str = "generated";

/// Server-side half of generation: owns the API credential, the image file
/// store and the persisted history.
#[derive(Clone)]
pub struct GenerationProxy {
    client: NebiusClient,
    storage: Arc<LocalFileStorage>,
    repository: Arc<dyn HistoryRepository>,
}

impl GenerationProxy {
    pub fn new(
        client: NebiusClient,
        storage: Arc<LocalFileStorage>,
        repository: Arc<dyn HistoryRepository>,
    ) -> Self {
        Self {
            client,
            storage,
            repository,
        }
    }

    pub fn for_user(&self, user_id: impl Into<String>) -> UserGenerator {
        UserGenerator {
            proxy: self.clone(),
            user_id: user_id.into(),
        }
    }

    async fn generate(
        &self,
        user_id: &str,
        prompt: &str,
        settings: &SettingsPayload,
    ) -> Result<GeneratedImage> {
        if prompt.trim().is_empty() {
            return Err(StudioError::validation("Prompt is required"));
        }

        let bytes = self.client.generate_image(prompt, settings).await?;
        let format = image_processing::detect_format(&bytes)
            .ok_or_else(|| StudioError::remote("generated payload is not a supported image"))?;
        if format != settings.file_format {
            tracing::warn!(
                "Requested {} but received {}",
                settings.file_format.extension(),
                image_processing::mime_type(format)
            );
        }

        let created_at = Utc::now();
        let hash = compute_hash(&format!(
            "{user_id}:{}:{}:{prompt}",
            created_at.timestamp_nanos_opt().unwrap_or_default(),
            settings.seed
        ));
        let key = format!("{GENERATED_DIR}/{hash}.{}", format.extension());
        self.storage
            .put(&key, &bytes)
            .await
            .map_err(|err| StudioError::Storage(format!("saving generated image failed: {err}")))?;
        let image_url = self.storage.get_public_url(&key);

        let row = StoredImage {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            prompt: prompt.to_string(),
            width: settings.width,
            height: settings.height,
            inference_steps: settings.num_inference_steps,
            negative_prompt: Some(settings.negative_prompt.clone()).filter(|text| !text.is_empty()),
            image_url: image_url.clone(),
            model: settings.model.clone(),
            style: Some(settings.style.clone()).filter(|style| style != NO_STYLE),
            created_at,
        };
        if let Err(err) = self.repository.insert(&row).await {
            tracing::warn!("Recording generated image for {} failed: {}", user_id, err);
        }

        Ok(GeneratedImage {
            image_url,
            prompt: prompt.to_string(),
        })
    }
}

/// [`ImageGenerator`] bound to one signed-in user.
#[derive(Clone)]
pub struct UserGenerator {
    proxy: GenerationProxy,
    user_id: String,
}

#[async_trait]
impl ImageGenerator for UserGenerator {
    async fn invoke(&self, prompt: &str, settings: &SettingsPayload) -> Result<GeneratedImage> {
        self.proxy.generate(&self.user_id, prompt, settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FileHistoryRepository;
    use crate::settings::GenerationSettings;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3, 4];

    async fn proxy_for(server: &MockServer, dir: &tempfile::TempDir) -> (GenerationProxy, Arc<FileHistoryRepository>) {
        let storage = Arc::new(LocalFileStorage::new(
            dir.path().to_path_buf(),
            "http://localhost:3000/cache".into(),
        ));
        let repository = Arc::new(FileHistoryRepository::new(storage.clone()));
        let client = NebiusClient::new(server.uri(), "secret").unwrap();
        (GenerationProxy::new(client, storage, repository.clone()), repository)
    }

    #[tokio::test]
    async fn test_generate_stores_file_and_history_row() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "b64_json": STANDARD.encode(PNG_BYTES) }]
            })))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let (proxy, repository) = proxy_for(&server, &dir).await;

        let settings = GenerationSettings::default();
        let payload = SettingsPayload::new(&settings, 77);
        let image = proxy
            .for_user("alice")
            .invoke("a fox, anime style.", &payload)
            .await
            .unwrap();

        assert_eq!(image.prompt, "a fox, anime style.");
        assert!(image.image_url.starts_with("http://localhost:3000/cache/generated/"));
        assert!(image.image_url.ends_with(".png"));

        let rows = repository.list_user_images("alice").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].image_url, image.image_url);
        assert_eq!(rows[0].model, "stability-ai/sdxl");
        assert_eq!(rows[0].style, None);
        assert_eq!(rows[0].negative_prompt, None);

        let key = image.image_url.trim_start_matches("http://localhost:3000/cache/");
        assert_eq!(std::fs::read(dir.path().join(key)).unwrap(), PNG_BYTES);
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_without_remote_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let (proxy, _) = proxy_for(&server, &dir).await;

        let payload = SettingsPayload::new(&GenerationSettings::default(), 1);
        let err = proxy.for_user("alice").invoke("   ", &payload).await.unwrap_err();
        assert!(matches!(err, StudioError::Validation(_)));
    }

    #[tokio::test]
    async fn test_non_image_payload_is_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "b64_json": STANDARD.encode(b"plain text") }]
            })))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let (proxy, repository) = proxy_for(&server, &dir).await;

        let payload = SettingsPayload::new(&GenerationSettings::default(), 1);
        let err = proxy.for_user("alice").invoke("a fox", &payload).await.unwrap_err();
        assert!(matches!(err, StudioError::Remote(_)));
        assert!(repository.list_user_images("alice").await.unwrap().is_empty());
    }
}
