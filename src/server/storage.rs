//! Sorted message log backed by a single flat file

use crate::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

/// Shared message log.
///
/// The file holds one message per line, joined by `\n` with no trailing
/// terminator, and is kept fully sorted: every append reads the whole file,
/// adds the line, sorts everything and rewrites it. All operations take the
/// same lock so readers never observe a half-written file.
pub struct LogStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LogStore {
    /// Create a store for the file at `path`. Nothing is touched on disk.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncate the log to empty, creating the file if needed
    pub async fn reset(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        fs::write(&self.path, b"").await?;
        Ok(())
    }

    /// Add a message and re-sort the whole log
    pub async fn append(&self, message: &str) -> Result<()> {
        let _guard = self.lock.lock().await;

        let mut lines = self.load_lines().await?;
        lines.push(message.to_string());
        lines.sort();

        fs::write(&self.path, lines.join("\n")).await?;
        Ok(())
    }

    /// Full log contents
    pub async fn read_all(&self) -> Result<String> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    /// Log contents split into lines
    pub async fn read_lines(&self) -> Result<Vec<String>> {
        let _guard = self.lock.lock().await;
        self.load_lines().await
    }

    async fn load_lines(&self) -> Result<Vec<String>> {
        let content = self.load().await?;
        Ok(content.lines().map(str::to_string).collect())
    }

    // Caller must hold the lock.
    async fn load(&self) -> Result<String> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fs::File::create(&self.path).await?;
                Ok(String::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChatRelayError;
    use rand::seq::SliceRandom;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_append_keeps_file_sorted() {
        let dir = tempdir().unwrap();
        let store = LogStore::new(dir.path().join("chat.log"));
        store.reset().await.unwrap();

        store.append("zebra").await.unwrap();
        store.append("apple").await.unwrap();
        store.append("mango").await.unwrap();

        assert_eq!(store.read_all().await.unwrap(), "apple\nmango\nzebra");
    }

    #[tokio::test]
    async fn test_sort_is_case_sensitive_code_point_order() {
        let dir = tempdir().unwrap();
        let store = LogStore::new(dir.path().join("chat.log"));

        for message in ["banana", "Banana", "apple", "Zed", "ёлка", "éclair"] {
            store.append(message).await.unwrap();
        }

        assert_eq!(
            store.read_lines().await.unwrap(),
            vec!["Banana", "Zed", "apple", "banana", "éclair", "ёлка"]
        );
    }

    #[tokio::test]
    async fn test_two_appends_round_trip() {
        let dir = tempdir().unwrap();
        let store = LogStore::new(dir.path().join("chat.log"));

        store.append("m2").await.unwrap();
        store.append("m1").await.unwrap();

        assert_eq!(store.read_all().await.unwrap(), "m1\nm2");
    }

    #[tokio::test]
    async fn test_missing_file_is_created() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.log");
        let store = LogStore::new(&path);

        assert_eq!(store.read_all().await.unwrap(), "");
        assert!(path.exists());

        std::fs::remove_file(&path).unwrap();
        store.append("first").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first");
    }

    #[tokio::test]
    async fn test_reset_truncates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chat.log");
        std::fs::write(&path, "left over\nfrom last run").unwrap();

        let store = LogStore::new(&path);
        store.reset().await.unwrap();

        assert_eq!(store.read_all().await.unwrap(), "");
        assert!(store.read_lines().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_appends_lose_nothing() {
        let dir = tempdir().unwrap();
        let store = Arc::new(LogStore::new(dir.path().join("chat.log")));
        store.reset().await.unwrap();

        let mut messages: Vec<String> = (0..50).map(|i| format!("message-{:02}", i)).collect();
        messages.shuffle(&mut rand::thread_rng());

        let mut tasks = Vec::new();
        for message in messages.clone() {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move { store.append(&message).await }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let lines = store.read_lines().await.unwrap();
        messages.sort();
        assert_eq!(lines.len(), 50);
        assert_eq!(lines, messages);
        assert!(lines.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_unwritable_path_errors() {
        let dir = tempdir().unwrap();
        let store = LogStore::new(dir.path().join("no-such-dir").join("chat.log"));

        assert!(matches!(store.append("x").await, Err(ChatRelayError::Io(_))));
    }
}
