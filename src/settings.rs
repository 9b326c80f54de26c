use serde::{Deserialize, Serialize};

use crate::catalog::{self, DEFAULT_MODEL_ID, MIN_INFERENCE_STEPS, NO_STYLE};
use crate::error::{Result, StudioError};

/// Seed sentinel meaning "pick a fresh random seed per image".
pub const RANDOM_SEED: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    #[default]
    Webp,
    Jpg,
    Png,
}

impl FileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Webp => "webp",
            FileFormat::Jpg => "jpg",
            FileFormat::Png => "png",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "webp" => Some(FileFormat::Webp),
            "jpg" | "jpeg" => Some(FileFormat::Jpg),
            "png" => Some(FileFormat::Png),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    pub width: u32,
    pub height: u32,
    pub num_inference_steps: u32,
    pub negative_prompt: String,
    pub seed: i64,
    pub file_format: FileFormat,
    pub style: String,
    pub model: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            num_inference_steps: 30,
            negative_prompt: String::new(),
            seed: RANDOM_SEED,
            file_format: FileFormat::default(),
            style: NO_STYLE.to_string(),
            model: DEFAULT_MODEL_ID.to_string(),
        }
    }
}

/// A single user edit of the settings panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "camelCase")]
pub enum SettingUpdate {
    /// Catalog dimension id; replaces width and height together.
    Dimension(String),
    Steps(u32),
    NegativePrompt(String),
    Seed(i64),
    ResetSeed,
    FileFormat(FileFormat),
    Style(String),
    Model(String),
}

impl GenerationSettings {
    pub fn max_steps(&self) -> u32 {
        catalog::find_model(&self.model)
            .unwrap_or_else(catalog::default_model)
            .max_steps
    }

    pub fn has_random_seed(&self) -> bool {
        self.seed == RANDOM_SEED
    }

    /// Returns the settings with `update` applied. `self` is never modified;
    /// a rejected update leaves the caller holding the previous settings.
    pub fn update_setting(&self, update: SettingUpdate) -> Result<GenerationSettings> {
        let mut next = self.clone();
        match update {
            SettingUpdate::Dimension(id) => {
                let dimension = catalog::find_dimension(&id).ok_or_else(|| {
                    StudioError::validation(format!("unsupported dimension: {id}"))
                })?;
                next.width = dimension.width;
                next.height = dimension.height;
            }
            SettingUpdate::Steps(steps) => {
                next.num_inference_steps = steps.clamp(MIN_INFERENCE_STEPS, next.max_steps());
            }
            SettingUpdate::NegativePrompt(text) => next.negative_prompt = text,
            SettingUpdate::Seed(seed) => {
                next.seed = if seed < 0 { RANDOM_SEED } else { seed };
            }
            SettingUpdate::ResetSeed => next.seed = RANDOM_SEED,
            SettingUpdate::FileFormat(format) => next.file_format = format,
            SettingUpdate::Style(id) => {
                if catalog::find_style(&id).is_none() {
                    return Err(StudioError::validation(format!("unknown style: {id}")));
                }
                next.style = id;
            }
            SettingUpdate::Model(id) => {
                let model = catalog::find_model(&id)
                    .ok_or_else(|| StudioError::validation(format!("unknown model: {id}")))?;
                next.model = id;
                if next.num_inference_steps > model.max_steps {
                    next.num_inference_steps = model.max_steps;
                }
            }
        }
        Ok(next)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(StudioError::validation("width and height must be positive"));
        }
        let model = catalog::find_model(&self.model)
            .ok_or_else(|| StudioError::validation(format!("unknown model: {}", self.model)))?;
        if self.num_inference_steps < MIN_INFERENCE_STEPS
            || self.num_inference_steps > model.max_steps
        {
            return Err(StudioError::validation(format!(
                "inference steps must be between {MIN_INFERENCE_STEPS} and {}",
                model.max_steps
            )));
        }
        if self.seed < RANDOM_SEED {
            return Err(StudioError::validation("seed must be -1 or non-negative"));
        }
        Ok(())
    }

    /// Brings settings restored from elsewhere back inside the catalog limits.
    pub fn normalized(mut self) -> Self {
        if catalog::find_model(&self.model).is_none() {
            self.model = DEFAULT_MODEL_ID.to_string();
        }
        if catalog::find_style(&self.style).is_none() {
            self.style = NO_STYLE.to_string();
        }
        self.num_inference_steps = self
            .num_inference_steps
            .clamp(MIN_INFERENCE_STEPS, self.max_steps());
        if self.seed < RANDOM_SEED {
            self.seed = RANDOM_SEED;
        }
        self
    }
}
