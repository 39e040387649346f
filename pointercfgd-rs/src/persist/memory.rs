/* In-process settings store used as a test double: counts successful
 * writes and can be told to reject them. */

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;

use super::SettingsStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<(String, String), Vec<u8>>>,
    saves: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /* Store pre-seeded with one record. */
    pub fn with_record(namespace: &str, name: &str, bytes: &[u8]) -> Self {
        let store = Self::new();
        if let Ok(mut records) = store.records.lock() {
            records.insert((namespace.to_string(), name.to_string()), bytes.to_vec());
        }
        store
    }

    pub fn record(&self, namespace: &str, name: &str) -> Option<Vec<u8>> {
        self.records
            .lock()
            .ok()?
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /* Number of successful writes so far. */
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /* Make every following write fail until switched off again. */
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn save_record(&self, namespace: &str, name: &str, bytes: &[u8]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("write to {namespace}/{name} refused");
        }
        self.records
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?
            .insert((namespace.to_string(), name.to_string()), bytes.to_vec());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load_records(&self, namespace: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let records = self
            .records
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(records
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|((_, name), bytes)| (name.clone(), bytes.clone()))
            .collect())
    }
}
