use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock, watch};
use tower_http::services::ServeDir;

use crate::cache::HistoryRepository;
use crate::catalog::{self, CatalogView};
use crate::error::StudioError;
use crate::generator::{GeneratedImage, GeneratorFactory};
use crate::identity::{IdentityProvider, SignedIn};
use crate::orchestrator::{Notice, NoticeQueue};
use crate::session::StudioSession;
use crate::settings::{GenerationSettings, SettingUpdate};
use crate::state::StudioState;

const STUDIO_HTML: &str = include_str!("../templates/studio.html");

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// HTTP face of [`StudioError`].
pub struct ApiError(StudioError);

impl From<StudioError> for ApiError {
    fn from(err: StudioError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            StudioError::Validation(_) | StudioError::Authentication(_) => StatusCode::BAD_REQUEST,
            StudioError::Unauthorized => StatusCode::UNAUTHORIZED,
            StudioError::NotFound(_) => StatusCode::NOT_FOUND,
            StudioError::Busy => StatusCode::CONFLICT,
            StudioError::Remote(_) | StudioError::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        (status, Json(ErrorResponse { error: self.0.to_string() })).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub current: usize,
    pub total: usize,
    pub running: bool,
}

/// Everything kept for one signed-in user.
struct UserSlot {
    session: Arc<Mutex<StudioSession>>,
    notices: Arc<NoticeQueue>,
    progress: watch::Sender<BatchProgress>,
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppContext {
    identity: Arc<dyn IdentityProvider>,
    generators: Arc<dyn GeneratorFactory>,
    repository: Arc<dyn HistoryRepository>,
    slots: Arc<RwLock<HashMap<String, Arc<UserSlot>>>>,
}

impl AppContext {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        generators: Arc<dyn GeneratorFactory>,
        repository: Arc<dyn HistoryRepository>,
    ) -> Self {
        Self {
            identity,
            generators,
            repository,
            slots: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn slot_for(&self, headers: &HeaderMap) -> Result<Arc<UserSlot>, ApiError> {
        let token = bearer_token(headers).ok_or(StudioError::Unauthorized)?;
        let user = self
            .identity
            .current_user(token)
            .await
            .ok_or(StudioError::Unauthorized)?;

        if let Some(slot) = self.slots.read().await.get(&user.id) {
            return Ok(slot.clone());
        }

        let notices = Arc::new(NoticeQueue::new());
        let mut session = StudioSession::new(
            user.id.clone(),
            self.generators.generator_for(&user.id),
            self.repository.clone(),
            notices.clone(),
        );
        if let Err(err) = session.refresh_history().await {
            tracing::warn!("Starting {} with empty history: {}", user.email, err);
        }
        let slot = Arc::new(UserSlot {
            session: Arc::new(Mutex::new(session)),
            notices,
            progress: watch::Sender::new(BatchProgress::default()),
        });
        let mut slots = self.slots.write().await;
        Ok(slots.entry(user.id).or_insert(slot).clone())
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub fn router(context: AppContext, cache_dir: PathBuf) -> Router {
    Router::new()
        .route("/", get(studio_page))
        .route("/api/catalog", get(get_catalog))
        .route("/api/auth/sign-up", post(sign_up))
        .route("/api/auth/sign-in", post(sign_in))
        .route("/api/auth/sign-out", post(sign_out))
        .route("/api/state", get(get_state))
        .route("/api/progress", get(get_progress))
        .route("/api/notices", get(get_notices))
        .route("/api/settings", post(update_settings))
        .route("/api/generate", post(generate))
        .route("/api/history/refresh", post(refresh_history))
        .route("/api/history/{id}/select", post(select_history))
        .nest_service("/cache", ServeDir::new(cache_dir))
        .with_state(context)
}

pub async fn studio_page() -> Html<&'static str> {
    Html(STUDIO_HTML)
}

async fn get_catalog() -> Json<CatalogView> {
    Json(catalog::catalog_view())
}

#[derive(Deserialize)]
struct Credentials {
    email: String,
    password: String,
}

async fn sign_up(
    State(context): State<AppContext>,
    Json(credentials): Json<Credentials>,
) -> ApiResult<SignedIn> {
    let signed_in = context
        .identity
        .sign_up(&credentials.email, &credentials.password)
        .await?;
    Ok(Json(signed_in))
}

async fn sign_in(
    State(context): State<AppContext>,
    Json(credentials): Json<Credentials>,
) -> ApiResult<SignedIn> {
    let signed_in = context
        .identity
        .sign_in(&credentials.email, &credentials.password)
        .await?;
    Ok(Json(signed_in))
}

async fn sign_out(State(context): State<AppContext>, headers: HeaderMap) -> StatusCode {
    if let Some(token) = bearer_token(&headers) {
        if let Some(user) = context.identity.current_user(token).await {
            context.slots.write().await.remove(&user.id);
        }
        context.identity.sign_out(token).await;
    }
    StatusCode::NO_CONTENT
}

async fn get_state(State(context): State<AppContext>, headers: HeaderMap) -> ApiResult<StudioState> {
    let slot = context.slot_for(&headers).await?;
    let session = slot.session.try_lock().map_err(|_| StudioError::Busy)?;
    Ok(Json(session.state().clone()))
}

async fn get_progress(
    State(context): State<AppContext>,
    headers: HeaderMap,
) -> ApiResult<BatchProgress> {
    let slot = context.slot_for(&headers).await?;
    let progress = *slot.progress.borrow();
    Ok(Json(progress))
}

async fn get_notices(State(context): State<AppContext>, headers: HeaderMap) -> ApiResult<Vec<Notice>> {
    let slot = context.slot_for(&headers).await?;
    Ok(Json(slot.notices.drain()))
}

async fn update_settings(
    State(context): State<AppContext>,
    headers: HeaderMap,
    Json(update): Json<SettingUpdate>,
) -> ApiResult<GenerationSettings> {
    let slot = context.slot_for(&headers).await?;
    let mut session = slot.session.try_lock().map_err(|_| StudioError::Busy)?;
    let settings = session.update_setting(update)?.clone();
    Ok(Json(settings))
}

fn default_count() -> usize {
    1
}

#[derive(Deserialize)]
struct GenerateRequest {
    prompt: String,
    #[serde(default = "default_count")]
    count: usize,
}

#[derive(Serialize)]
struct GenerateResponse {
    images: Vec<GeneratedImage>,
    state: StudioState,
}

/// The batch runs on its own task holding the session lock, so it completes
/// and lands in history even if the client goes away mid-request.
async fn generate(
    State(context): State<AppContext>,
    headers: HeaderMap,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<GenerateResponse> {
    let slot = context.slot_for(&headers).await?;
    let mut session = slot
        .session
        .clone()
        .try_lock_owned()
        .map_err(|_| StudioError::Busy)?;

    let batch = tokio::spawn(async move {
        let progress = &slot.progress;
        let mut report = |current: usize, total: usize| {
            progress.send_replace(BatchProgress {
                current,
                total,
                running: true,
            });
        };
        let result = session
            .generate(&request.prompt, request.count, Some(&mut report))
            .await;
        progress.send_replace(BatchProgress::default());
        result.map(|images| GenerateResponse {
            images,
            state: session.state().clone(),
        })
    });

    let response = batch
        .await
        .map_err(|err| StudioError::Internal(format!("generation task failed: {err}")))??;
    Ok(Json(response))
}

async fn refresh_history(
    State(context): State<AppContext>,
    headers: HeaderMap,
) -> ApiResult<StudioState> {
    let slot = context.slot_for(&headers).await?;
    let mut session = slot.session.try_lock().map_err(|_| StudioError::Busy)?;
    session.refresh_history().await?;
    Ok(Json(session.state().clone()))
}

async fn select_history(
    State(context): State<AppContext>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<StudioState> {
    let slot = context.slot_for(&headers).await?;
    let mut session = slot.session.try_lock().map_err(|_| StudioError::Busy)?;
    let state = session.select_history(&id)?.clone();
    Ok(Json(state))
}
