use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Key/value backend that persisted sessions are written to
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Returns None when nothing was ever stored under the key
    async fn load(&self, key: &str) -> io::Result<Option<String>>;

    async fn save(&self, key: &str, value: &str) -> io::Result<()>;

    async fn remove(&self, key: &str) -> io::Result<()>;
}

/// One JSON file per key under a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys come from cookies; keep them to a safe file-name alphabet
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

#[async_trait]
impl SessionStorage for FileStorage {
    async fn load(&self, key: &str) -> io::Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn save(&self, key: &str, value: &str) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.path_for(key), value).await
    }

    async fn remove(&self, key: &str) -> io::Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Process-local storage, used in tests and when no storage directory is configured
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn load(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> io::Result<()> {
        self.values.lock().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> io::Result<()> {
        self.values.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_storage_round_trip() {
        let dir = std::env::temp_dir().join(format!("bo-storage-{}", uuid::Uuid::new_v4().simple()));
        let storage = FileStorage::new(&dir);

        assert_eq!(storage.load("auth-storage-abc").await.unwrap(), None);
        storage.save("auth-storage-abc", "{\"x\":1}").await.unwrap();
        assert_eq!(
            storage.load("auth-storage-abc").await.unwrap().as_deref(),
            Some("{\"x\":1}")
        );

        storage.remove("auth-storage-abc").await.unwrap();
        assert_eq!(storage.load("auth-storage-abc").await.unwrap(), None);
        // Removing twice is fine
        storage.remove("auth-storage-abc").await.unwrap();

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[test]
    fn test_file_storage_sanitizes_keys() {
        let storage = FileStorage::new("/tmp/sessions");
        let path = storage.path_for("../../etc/passwd");
        assert_eq!(path, PathBuf::from("/tmp/sessions/______etc_passwd.json"));
    }
}
