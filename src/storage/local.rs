use async_trait::async_trait;
use rand::Rng;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{ObjectStore, StorageError, StorageErrorCode};

/// Filesystem-backed store: key `a/b/c.json` lives at `{root}/a/b/c.json`.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() || key.starts_with('/') || key.contains('\\') {
            return Err(StorageError::new(
                StorageErrorCode::InvalidKey,
                format!("invalid object key '{key}'"),
            ));
        }
        let mut path = self.root.clone();
        for segment in key.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(StorageError::new(
                    StorageErrorCode::InvalidKey,
                    format!("invalid segment in object key '{key}'"),
                ));
            }
            path.push(segment);
        }
        Ok(path)
    }
}

fn io_error(key: &str, e: std::io::Error) -> StorageError {
    StorageError::new(StorageErrorCode::Io, format!("{key}: {e}"))
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, e)),
        }
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(key, e))?;
        }

        // Write beside the target and rename so readers never see a half-written object.
        let suffix: [u8; 6] = rand::rng().random();
        let mut tmp = path.clone().into_os_string();
        tmp.push(format!(".tmp-{}", hex::encode(suffix)));
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| io_error(key, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_error(key, e));
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_traversal_keys() {
        let store = LocalStore::new("/tmp/survey-root");
        for key in ["", "/etc/passwd", "companies/../secrets", "a//b", "./a", "a\\b"] {
            let err = store.path_for(key).expect_err(key);
            assert_eq!(err.code, StorageErrorCode::InvalidKey);
        }
    }

    #[test]
    fn maps_key_segments_under_root() {
        let store = LocalStore::new("/tmp/survey-root");
        let path = store.path_for("companies/acme/form.json").expect("path");
        assert_eq!(path, PathBuf::from("/tmp/survey-root/companies/acme/form.json"));
    }
}
