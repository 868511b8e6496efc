use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

use super::{ObjectStore, StorageError};

/// In-process store. Keeps content type alongside the bytes so tests can
/// assert on what an upload declared.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    puts: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn content_type(&self, key: &str) -> Option<String> {
        self.objects.lock().await.get(key).map(|(_, ct)| ct.clone())
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of successful `put` calls since creation.
    pub fn put_count(&self) -> u64 {
        self.puts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.objects.lock().await.get(key).map(|(bytes, _)| bytes.clone()))
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        self.objects
            .lock()
            .await
            .insert(key.to_string(), (bytes, content_type.to_string()));
        self.puts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
