use std::sync::Arc;

use crate::cache::HistoryRepository;
use crate::error::{Result, StudioError};
use crate::generator::{GeneratedImage, ImageGenerator};
use crate::history::GeneratedImageRecord;
use crate::orchestrator::{Notice, Notifier, Orchestrator};
use crate::settings::{GenerationSettings, SettingUpdate};
use crate::state::StudioState;

pub const MAX_BATCH_SIZE: usize = 4;

/// Owns the only mutable [`StudioState`] of a signed-in user.
pub struct StudioSession {
    user_id: String,
    state: StudioState,
    orchestrator: Orchestrator,
    repository: Arc<dyn HistoryRepository>,
    notifier: Arc<dyn Notifier>,
}

impl StudioSession {
    pub fn new(
        user_id: impl Into<String>,
        generator: Arc<dyn ImageGenerator>,
        repository: Arc<dyn HistoryRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            state: StudioState::default(),
            orchestrator: Orchestrator::new(generator, notifier.clone()),
            repository,
            notifier,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn state(&self) -> &StudioState {
        &self.state
    }

    pub fn update_setting(&mut self, update: SettingUpdate) -> Result<&GenerationSettings> {
        self.state = self.state.with_setting(update)?;
        Ok(&self.state.settings)
    }

    /// Generates `count` images for `prompt` with the current settings.
    ///
    /// Input is validated before any remote call. An empty result is not an
    /// error; it leaves history untouched.
    pub async fn generate(
        &mut self,
        prompt: &str,
        count: usize,
        on_progress: Option<&mut (dyn FnMut(usize, usize) + Send)>,
    ) -> Result<Vec<GeneratedImage>> {
        if prompt.trim().is_empty() {
            self.notifier.notify(Notice::error("Please enter a prompt"));
            return Err(StudioError::validation("prompt must not be empty"));
        }
        if !(1..=MAX_BATCH_SIZE).contains(&count) {
            return Err(StudioError::validation(format!(
                "image count must be between 1 and {MAX_BATCH_SIZE}"
            )));
        }
        self.state.settings.validate()?;

        self.state = self.state.begin_generation(prompt);
        let settings = self.state.settings.clone();
        let images = self
            .orchestrator
            .generate_batch(prompt, &settings, count, on_progress)
            .await;

        let (state, record) = self.state.finish_generation(images.clone());
        self.state = state;
        if record.is_some() {
            if let Err(err) = self.refresh_history().await {
                tracing::debug!("Keeping optimistic history after failed refresh: {}", err);
            }
        }
        Ok(images)
    }

    /// Replaces history with the persisted rows. On failure the current
    /// history is kept.
    pub async fn refresh_history(&mut self) -> Result<()> {
        match self.repository.list_user_images(&self.user_id).await {
            Ok(rows) => {
                let records = rows.into_iter().map(GeneratedImageRecord::from_stored).collect();
                self.state = self.state.with_history(records);
                Ok(())
            }
            Err(err) => {
                tracing::error!("Fetching history for {} failed: {}", self.user_id, err);
                self.notifier.notify(Notice::error("Could not refresh your history"));
                Err(err)
            }
        }
    }

    pub fn select_history(&mut self, id: &str) -> Result<&StudioState> {
        let mut state = self.state.select_history(id)?;
        state.settings = state.settings.normalized();
        self.state = state;
        Ok(&self.state)
    }
}
