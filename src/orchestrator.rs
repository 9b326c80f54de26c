use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::generator::{GeneratedImage, ImageGenerator};
use crate::request::{SettingsPayload, build_request};
use crate::settings::GenerationSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Transient user-facing status message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notices kept for a page that is not polling; older ones are dropped.
pub const NOTICE_CAPACITY: usize = 32;

/// Buffers notices until the page drains them.
#[derive(Debug, Default)]
pub struct NoticeQueue {
    pending: Mutex<VecDeque<Notice>>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notice> {
        match self.pending.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        }
    }
}

impl Notifier for NoticeQueue {
    fn notify(&self, notice: Notice) {
        tracing::debug!(level = ?notice.level, "{}", notice.message);
        let mut pending = match self.pending.lock() {
            Ok(pending) => pending,
            Err(poisoned) => poisoned.into_inner(),
        };
        if pending.len() == NOTICE_CAPACITY {
            pending.pop_front();
        }
        pending.push_back(notice);
    }
}

pub struct Orchestrator {
    generator: Arc<dyn ImageGenerator>,
    notifier: Arc<dyn Notifier>,
}

impl Orchestrator {
    pub fn new(generator: Arc<dyn ImageGenerator>, notifier: Arc<dyn Notifier>) -> Self {
        Self { generator, notifier }
    }

    /// Runs `count` generation calls one at a time and returns the successful
    /// ones in index order. `on_progress(i, count)` fires before call `i` starts. A batch in
    /// which every call fails yields an empty vector.
    pub async fn generate_batch(
        &self,
        prompt: &str,
        settings: &GenerationSettings,
        count: usize,
        mut on_progress: Option<&mut (dyn FnMut(usize, usize) + Send)>,
    ) -> Vec<GeneratedImage> {
        if count == 0 {
            return Vec::new();
        }
        let plural = if count == 1 { "image" } else { "images" };
        self.notifier
            .notify(Notice::info(format!("Generating {count} {plural}...")));
        tracing::info!(count, model = %settings.model, "Starting generation batch");

        let mut results = Vec::with_capacity(count);
        for index in 0..count {
            if let Some(callback) = on_progress.as_deref_mut() {
                callback(index, count);
            }
            if count > 1 {
                self.notifier.notify(Notice::info(format!(
                    "Generating image {} of {count}...",
                    index + 1
                )));
            }

            let built = build_request(prompt, settings, index, &mut rand::rng());
            let payload = SettingsPayload::new(settings, built.effective_seed);
            match self.generator.invoke(&built.final_prompt, &payload).await {
                Ok(image) => {
                    tracing::debug!(index, seed = built.effective_seed, "Image generated");
                    results.push(GeneratedImage {
                        image_url: image.image_url,
                        prompt: built.final_prompt,
                    });
                }
                Err(err) => {
                    tracing::warn!(index, seed = built.effective_seed, "Image generation failed: {}", err);
                }
            }
        }

        match results.len() {
            0 => self
                .notifier
                .notify(Notice::error("Failed to generate images. Please try again.")),
            generated if generated == count => self
                .notifier
                .notify(Notice::success(format!("Generated {generated} {plural}!"))),
            generated => self.notifier.notify(Notice::error(format!(
                "Generated {generated} of {count} images; {} failed.",
                count - generated
            ))),
        }
        tracing::info!(generated = results.len(), count, "Generation batch finished");
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_queue_drains_in_order() {
        let queue = NoticeQueue::new();
        queue.notify(Notice::info("one"));
        queue.notify(Notice::error("two"));
        let drained = queue.drain();
        assert_eq!(drained, vec![Notice::info("one"), Notice::error("two")]);
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_notice_queue_drops_oldest_when_full() {
        let queue = NoticeQueue::new();
        for n in 0..NOTICE_CAPACITY + 3 {
            queue.notify(Notice::info(n.to_string()));
        }
        let drained = queue.drain();
        assert_eq!(drained.len(), NOTICE_CAPACITY);
        assert_eq!(drained[0], Notice::info("3"));
        assert_eq!(drained[NOTICE_CAPACITY - 1], Notice::info((NOTICE_CAPACITY + 2).to_string()));
    }
}
