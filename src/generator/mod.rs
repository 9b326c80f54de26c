//! Remote image generation. The core only sees [`ImageGenerator`].

pub mod nebius;
pub mod proxy;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::request::SettingsPayload;

pub use nebius::NebiusClient;
pub use proxy::{GenerationProxy, UserGenerator};

/// One successfully generated image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub image_url: String,
    pub prompt: String,
}

/// Remote image generation. An error reply and a transport failure are both `Err`.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn invoke(&self, prompt: &str, settings: &SettingsPayload) -> Result<GeneratedImage>;
}

/// Hands out a generator bound to one signed-in user.
pub trait GeneratorFactory: Send + Sync {
    fn generator_for(&self, user_id: &str) -> Arc<dyn ImageGenerator>;
}

impl GeneratorFactory for GenerationProxy {
    fn generator_for(&self, user_id: &str) -> Arc<dyn ImageGenerator> {
        Arc::new(self.for_user(user_id))
    }
}
