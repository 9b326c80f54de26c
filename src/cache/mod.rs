pub mod history_repository;
pub mod storage;
pub mod stored_image;

use sha2::{Digest, Sha256};

pub use history_repository::{FileHistoryRepository, HistoryRepository};
pub use storage::LocalFileStorage;
pub use stored_image::StoredImage;

pub fn compute_hash(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}
