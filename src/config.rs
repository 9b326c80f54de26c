use std::env;
use std::path::PathBuf;

use url::Url;

use crate::cache::storage::normalize_scheme;
use crate::error::{Result, StudioError};
use crate::generator::nebius::NEBIUS_BASE_URL;

const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub bind_address: String,
    pub cache_dir: PathBuf,
    /// Public base URL of the `/cache` route.
    pub cache_base_url: String,
    pub nebius_api_key: String,
    pub nebius_base_url: String,
}

impl StudioConfig {
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let bind_address = format!("0.0.0.0:{port}");

        let nebius_api_key = non_empty_var("NEBIUS_API_KEY")
            .ok_or_else(|| StudioError::Config("NEBIUS_API_KEY is not set".into()))?;
        let nebius_base_url =
            non_empty_var("NEBIUS_BASE_URL").unwrap_or_else(|| NEBIUS_BASE_URL.to_string());
        validate_http_url(&nebius_base_url)?;

        let cache_base_url = resolve_cache_base_url(&bind_address);
        validate_http_url(&cache_base_url)?;

        Ok(Self {
            bind_address,
            cache_dir: resolve_cache_dir(),
            cache_base_url,
            nebius_api_key,
            nebius_base_url,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn validate_http_url(raw: &str) -> Result<Url> {
    let parsed = Url::parse(raw.trim())
        .map_err(|err| StudioError::Config(format!("invalid URL {raw}: {err}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(StudioError::Config(format!(
            "only http and https URLs are allowed, got {scheme}"
        ))),
    }
}

fn resolve_cache_dir() -> PathBuf {
    if let Some(dir) = non_empty_var("CACHE_DIR") {
        return PathBuf::from(dir);
    }
    let mut base = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
    base.push("image-studio");
    base
}

fn resolve_cache_base_url(bind_address: &str) -> String {
    if let Some(cache_url) = non_empty_var("CACHE_URL") {
        return format!("{}/cache", cache_url.trim_end_matches('/'));
    }
    let domain = non_empty_var("DOMAIN").unwrap_or_else(|| bind_address.to_string());
    cache_base_url_for(&domain)
}

fn cache_base_url_for(domain: &str) -> String {
    let trimmed = domain.trim().trim_end_matches('/');
    let base = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        normalize_scheme(trimmed)
    } else {
        format!("http://{trimmed}")
    };
    format!("{base}/cache")
}
