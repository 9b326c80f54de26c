use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted generation row, as kept by the history repository.
///
/// The seed is not part of the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredImage {
    pub id: String,
    pub user_id: String,
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub inference_steps: u32,
    pub negative_prompt: Option<String>,
    pub image_url: String,
    /// Remote model id, e.g. `stability-ai/sdxl`.
    pub model: String,
    pub style: Option<String>,
    pub created_at: DateTime<Utc>,
}
