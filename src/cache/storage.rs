use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::fs;

/// File store rooted at `base_dir`, whose files are served under `base_url`.
#[derive(Clone, Debug)]
pub struct LocalFileStorage {
    base_dir: PathBuf,
    base_url: String,
}

impl LocalFileStorage {
    pub fn new(base_dir: PathBuf, base_url: String) -> Self {
        Self { base_dir, base_url }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.resolve_path(key);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, data).await?;
        Ok(())
    }

    /// File names directly under `dir` with the given extension, newest key first.
    pub async fn list_keys(&self, dir: &str, extension: &str) -> Result<Vec<String>> {
        let dir_path = self.resolve_path(dir);
        let mut read_dir = match fs::read_dir(&dir_path).await {
            Ok(read_dir) => read_dir,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut keys = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                keys.push(format!("{}/{name}", dir.trim_end_matches('/')));
            }
        }
        keys.sort_by(|a, b| b.cmp(a));
        Ok(keys)
    }

    pub fn get_public_url(&self, key: &str) -> String {
        let base = normalize_scheme(self.base_url.trim_end_matches('/'));
        let key = key.trim_start_matches('/');
        format!("{base}/{key}")
    }

    pub fn resolve_path(&self, key: &str) -> PathBuf {
        let normalized = key.trim_start_matches('/');
        self.base_dir.join(Path::new(normalized))
    }
}

/// Collapses doubled scheme prefixes such as `http://https://host`.
pub fn normalize_scheme(raw: &str) -> String {
    const DOUBLED: [(&str, &str); 4] = [
        ("http://http://", "http://"),
        ("https://https://", "https://"),
        ("http://https://", "https://"),
        ("https://http://", "http://"),
    ];
    let mut base = raw.to_string();
    'outer: loop {
        for (doubled, single) in DOUBLED {
            if base.starts_with(doubled) {
                base = base.replacen(doubled, single, 1);
                continue 'outer;
            }
        }
        return base;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_collapses_schemes() {
        let storage = LocalFileStorage::new(
            PathBuf::from("/tmp"),
            "http://https://studio.example.com/cache/".to_string(),
        );
        assert_eq!(
            storage.get_public_url("/generated/a.webp"),
            "https://studio.example.com/cache/generated/a.webp"
        );
    }

    #[tokio::test]
    async fn test_put_get_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path().to_path_buf(), "http://localhost/cache".into());
        storage.put("rows/001.json", b"{}").await.unwrap();
        storage.put("rows/002.json", b"[]").await.unwrap();
        storage.put("rows/readme.txt", b"skip").await.unwrap();

        assert_eq!(storage.get("rows/002.json").await.unwrap(), Some(b"[]".to_vec()));
        assert_eq!(storage.get("rows/404.json").await.unwrap(), None);
        assert_eq!(
            storage.list_keys("rows", "json").await.unwrap(),
            vec!["rows/002.json".to_string(), "rows/001.json".to_string()]
        );
        assert!(storage.list_keys("missing", "json").await.unwrap().is_empty());
    }
}
