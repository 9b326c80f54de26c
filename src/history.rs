use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::StoredImage;
use crate::catalog::{self, NO_STYLE};
use crate::settings::{FileFormat, GenerationSettings, RANDOM_SEED};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    pub image_url: String,
}

/// One generate action: every image it produced plus the settings used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImageRecord {
    pub id: String,
    /// Final prompt, style suffix included.
    pub prompt: String,
    pub images: Vec<ImageRef>,
    pub settings: GenerationSettings,
    pub created_at: DateTime<Utc>,
}

impl GeneratedImageRecord {
    pub fn new(prompt: String, images: Vec<ImageRef>, settings: GenerationSettings) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            prompt,
            images,
            settings,
            created_at: Utc::now(),
        }
    }

    /// The prompt as the user typed it, without the style suffix that was
    /// appended when the request was built.
    pub fn user_prompt(&self) -> &str {
        let suffix = catalog::style_suffix(&self.settings.style);
        self.prompt.strip_suffix(suffix).unwrap_or(&self.prompt)
    }

    /// Maps a persisted row. The seed is not persisted and comes back as `-1`.
    pub fn from_stored(row: StoredImage) -> Self {
        let model = catalog::find_model_by_remote_id(&row.model)
            .or_else(|| catalog::find_model(&row.model))
            .unwrap_or_else(catalog::default_model);
        let file_format = row
            .image_url
            .rsplit_once('.')
            .and_then(|(_, ext)| FileFormat::from_extension(ext))
            .unwrap_or_default();
        let settings = GenerationSettings {
            width: row.width,
            height: row.height,
            num_inference_steps: row.inference_steps,
            negative_prompt: row.negative_prompt.unwrap_or_default(),
            seed: RANDOM_SEED,
            file_format,
            style: row.style.unwrap_or_else(|| NO_STYLE.to_string()),
            model: model.id.to_string(),
        };
        Self {
            id: row.id,
            prompt: row.prompt,
            images: vec![ImageRef {
                image_url: row.image_url,
            }],
            settings,
            created_at: row.created_at,
        }
    }
}

/// Ordered history. Entries are never evicted here.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HistoryStore {
    records: Vec<GeneratedImageRecord>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prepend(&mut self, record: GeneratedImageRecord) {
        self.records.insert(0, record);
    }

    /// Replaces the whole sequence as given, without reordering or dedup.
    pub fn replace_all(&mut self, records: Vec<GeneratedImageRecord>) {
        self.records = records;
    }

    pub fn list(&self) -> &[GeneratedImageRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&GeneratedImageRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(id: &str) -> GeneratedImageRecord {
        GeneratedImageRecord {
            id: id.to_string(),
            prompt: format!("prompt {id}"),
            images: vec![ImageRef {
                image_url: format!("http://localhost/{id}.webp"),
            }],
            settings: GenerationSettings::default(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_prepend_is_most_recent_first() {
        let mut history = HistoryStore::new();
        history.prepend(record("a"));
        history.prepend(record("b"));
        let ids: Vec<&str> = history.list().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_replace_all_keeps_order_and_duplicates() {
        let mut history = HistoryStore::new();
        history.prepend(record("local"));
        let remote = vec![record("z"), record("a"), record("a")];
        history.replace_all(remote.clone());
        assert_eq!(history.list(), remote.as_slice());
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_from_stored_maps_fields_and_drops_seed() {
        let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let row = StoredImage {
            id: "row-1".into(),
            user_id: "alice".into(),
            prompt: "a fox in an anime style".into(),
            width: 1024,
            height: 576,
            inference_steps: 12,
            negative_prompt: Some("blurry".into()),
            image_url: "http://localhost/cache/generated/abc.png".into(),
            model: "black-forest-labs/flux-schnell".into(),
            style: Some("anime".into()),
            created_at,
        };
        let record = GeneratedImageRecord::from_stored(row);
        assert_eq!(record.id, "row-1");
        assert_eq!(record.created_at, created_at);
        assert_eq!(record.images.len(), 1);
        assert_eq!(
            record.settings,
            GenerationSettings {
                width: 1024,
                height: 576,
                num_inference_steps: 12,
                negative_prompt: "blurry".into(),
                seed: RANDOM_SEED,
                file_format: FileFormat::Png,
                style: "anime".into(),
                model: "flux-schnell".into(),
            }
        );
    }
}
