use serde::Serialize;

use crate::error::{Result, StudioError};
use crate::generator::GeneratedImage;
use crate::history::{GeneratedImageRecord, HistoryStore, ImageRef};
use crate::settings::{GenerationSettings, SettingUpdate};

/// View state. Transitions return a new value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioState {
    pub prompt: String,
    pub settings: GenerationSettings,
    pub current_images: Vec<GeneratedImage>,
    pub history: HistoryStore,
    pub is_generating: bool,
}

impl StudioState {
    pub fn with_setting(&self, update: SettingUpdate) -> Result<Self> {
        Ok(Self {
            settings: self.settings.update_setting(update)?,
            ..self.clone()
        })
    }

    pub fn begin_generation(&self, prompt: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            current_images: Vec::new(),
            is_generating: true,
            ..self.clone()
        }
    }

    /// Ends a batch. A non-empty batch becomes the current images and is
    /// prepended to history as a single record.
    pub fn finish_generation(&self, images: Vec<GeneratedImage>) -> (Self, Option<GeneratedImageRecord>) {
        let mut next = Self {
            is_generating: false,
            ..self.clone()
        };
        let Some(first) = images.first() else {
            return (next, None);
        };
        let record = GeneratedImageRecord::new(
            first.prompt.clone(),
            images
                .iter()
                .map(|image| ImageRef {
                    image_url: image.image_url.clone(),
                })
                .collect(),
            self.settings.clone(),
        );
        next.history.prepend(record.clone());
        next.current_images = images;
        (next, Some(record))
    }

    pub fn with_history(&self, records: Vec<GeneratedImageRecord>) -> Self {
        let mut next = self.clone();
        next.history.replace_all(records);
        next
    }

    /// Restores the user prompt, images and the exact settings snapshot of a
    /// record.
    pub fn select_history(&self, id: &str) -> Result<Self> {
        let record = self
            .history
            .get(id)
            .ok_or_else(|| StudioError::NotFound(id.to_string()))?;
        Ok(Self {
            prompt: record.user_prompt().to_string(),
            settings: record.settings.clone(),
            current_images: record
                .images
                .iter()
                .map(|image| GeneratedImage {
                    image_url: image.image_url.clone(),
                    prompt: record.prompt.clone(),
                })
                .collect(),
            ..self.clone()
        })
    }
}
