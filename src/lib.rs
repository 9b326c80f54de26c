pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod generator;
pub mod history;
pub mod identity;
pub mod image_processing;
pub mod orchestrator;
pub mod request;
pub mod session;
pub mod settings;
pub mod state;
pub mod web_pages;

pub use error::{Result, StudioError};
