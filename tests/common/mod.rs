//! Fakes shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use image_studio::cache::{HistoryRepository, StoredImage};
use image_studio::generator::{GeneratedImage, GeneratorFactory, ImageGenerator};
use image_studio::orchestrator::{Notice, Notifier};
use image_studio::request::SettingsPayload;
use image_studio::{Result, StudioError};

/// Generator that fails on chosen call indices and records every call.
#[derive(Default)]
pub struct ScriptedGenerator {
    fail_on: HashSet<usize>,
    calls: Mutex<Vec<(String, SettingsPayload)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(indices: &[usize]) -> Self {
        Self {
            fail_on: indices.iter().copied().collect(),
            ..Self::default()
        }
    }

    /// Time each call takes; 5ms unless set.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<(String, SettingsPayload)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn seeds(&self) -> Vec<u64> {
        self.calls().into_iter().map(|(_, payload)| payload.seed).collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for ScriptedGenerator {
    async fn invoke(&self, prompt: &str, settings: &SettingsPayload) -> Result<GeneratedImage> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((prompt.to_string(), settings.clone()));
            calls.len() - 1
        };
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay.unwrap_or(Duration::from_millis(5))).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_on.contains(&index) {
            return Err(StudioError::remote(format!("slot {index} failed")));
        }
        Ok(GeneratedImage {
            image_url: format!("http://localhost/cache/generated/{index}.webp"),
            prompt: prompt.to_string(),
        })
    }
}

/// Wraps a [`ScriptedGenerator`] and records each success as a persisted
/// row, the way the real proxy does.
pub struct PersistingGenerator {
    inner: Arc<ScriptedGenerator>,
    repository: Arc<MemoryRepository>,
    user_id: String,
}

#[async_trait]
impl ImageGenerator for PersistingGenerator {
    async fn invoke(&self, prompt: &str, settings: &SettingsPayload) -> Result<GeneratedImage> {
        let image = self.inner.invoke(prompt, settings).await?;
        self.repository.push(StoredImage {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: self.user_id.clone(),
            prompt: image.prompt.clone(),
            width: settings.width,
            height: settings.height,
            inference_steps: settings.num_inference_steps,
            negative_prompt: None,
            image_url: image.image_url.clone(),
            model: settings.model.clone(),
            style: Some(settings.style.clone()),
            created_at: chrono::Utc::now(),
        });
        Ok(image)
    }
}

pub struct PersistingFactory {
    pub generator: Arc<ScriptedGenerator>,
    pub repository: Arc<MemoryRepository>,
}

impl GeneratorFactory for PersistingFactory {
    fn generator_for(&self, user_id: &str) -> Arc<dyn ImageGenerator> {
        Arc::new(PersistingGenerator {
            inner: self.generator.clone(),
            repository: self.repository.clone(),
            user_id: user_id.to_string(),
        })
    }
}

/// Repository kept in memory; can be switched to fail every call.
#[derive(Default)]
pub struct MemoryRepository {
    rows: Mutex<Vec<StoredImage>>,
    failing: std::sync::atomic::AtomicBool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn push(&self, row: StoredImage) {
        self.rows.lock().unwrap().insert(0, row);
    }
}

#[async_trait]
impl HistoryRepository for MemoryRepository {
    async fn list_user_images(&self, user_id: &str) -> Result<Vec<StoredImage>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StudioError::Storage("history backend unavailable".into()));
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, image: &StoredImage) -> Result<()> {
        self.push(image.clone());
        Ok(())
    }
}

/// Notifier that keeps everything it was sent.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}
