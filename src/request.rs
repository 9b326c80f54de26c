use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::settings::{FileFormat, GenerationSettings};

/// Random seeds are drawn from `[0, MAX_RANDOM_SEED)`.
pub const MAX_RANDOM_SEED: u64 = 2_147_483_647;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltRequest {
    pub final_prompt: String,
    pub effective_seed: u64,
}

/// Builds the request for the image at `image_index`.
///
/// A pinned seed yields `seed + image_index`; the `-1` sentinel draws an
/// independent seed from `rng` for every image.
pub fn build_request<R: Rng>(
    prompt: &str,
    settings: &GenerationSettings,
    image_index: usize,
    rng: &mut R,
) -> BuiltRequest {
    let final_prompt = format!("{prompt}{}", catalog::style_suffix(&settings.style));
    let effective_seed = if settings.has_random_seed() || settings.seed < 0 {
        rng.random_range(0..MAX_RANDOM_SEED)
    } else {
        (settings.seed as u64).saturating_add(image_index as u64)
    };
    BuiltRequest {
        final_prompt,
        effective_seed,
    }
}

/// Settings as they cross the remote boundary. The seed is always concrete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPayload {
    pub width: u32,
    pub height: u32,
    pub num_inference_steps: u32,
    pub negative_prompt: String,
    pub seed: u64,
    pub file_format: FileFormat,
    pub style: String,
    /// Remote model id, e.g. `stability-ai/sdxl`.
    pub model: String,
}

impl SettingsPayload {
    pub fn new(settings: &GenerationSettings, effective_seed: u64) -> Self {
        let model = catalog::find_model(&settings.model).unwrap_or_else(catalog::default_model);
        Self {
            width: settings.width,
            height: settings.height,
            num_inference_steps: settings.num_inference_steps,
            negative_prompt: settings.negative_prompt.clone(),
            seed: effective_seed,
            file_format: settings.file_format,
            style: settings.style.clone(),
            model: model.remote_model_id.to_string(),
        }
    }
}
