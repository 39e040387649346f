/* Directory-backed settings store: one file per record at
 * `<root>/<namespace>/<name>`, replaced atomically on every write. */

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use super::SettingsStore;

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn record_path(&self, namespace: &str, name: &str) -> PathBuf {
        self.root.join(namespace).join(name)
    }
}

#[async_trait]
impl SettingsStore for FileStore {
    async fn save_record(&self, namespace: &str, name: &str, bytes: &[u8]) -> Result<()> {
        let dir = self.root.join(namespace);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Creating settings directory {}", dir.display()))?;

        let path = self.record_path(namespace, name);
        let tmp = dir.join(format!(".{name}.tmp"));
        tokio::fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("Writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Replacing {}", path.display()))?;

        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    async fn load_records(&self, namespace: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let dir = self.root.join(namespace);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            /* Nothing saved yet */
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Reading {}", dir.display()));
            }
        };

        let mut records = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("Listing {}", dir.display()))?
        {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with('.') || !entry.file_type().await?.is_file() {
                continue;
            }
            let bytes = tokio::fs::read(entry.path())
                .await
                .with_context(|| format!("Reading {}", entry.path().display()))?;
            records.push((name, bytes));
        }

        records.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_directory_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(&dir.path().join("never-created"));
        assert!(store.load_records("custom_config").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store
            .save_record("custom_config", "state", &[5, 5, 5, 0, 0, 0, 0, 0])
            .await
            .unwrap();
        store
            .save_record("custom_config", "state", &[6, 5, 5, 0, 0, 0, 0, 0])
            .await
            .unwrap();
        store.save_record("other", "state", &[1]).await.unwrap();

        let records = store.load_records("custom_config").await.unwrap();
        assert_eq!(records, vec![("state".to_string(), vec![6, 5, 5, 0, 0, 0, 0, 0])]);
        assert!(!dir.path().join("custom_config").join(".state.tmp").exists());
    }

    #[tokio::test]
    async fn unwritable_root_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let store = FileStore::new(&blocker);
        assert!(store.save_record("custom_config", "state", &[0; 8]).await.is_err());
    }
}
