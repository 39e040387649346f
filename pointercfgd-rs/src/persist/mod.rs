/* Persistence bridge between the configuration core and a key/value
 * settings store: save scheduling (immediate or debounced) and the
 * load/commit bootstrap run once at startup. */

pub mod file;
pub mod memory;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::CustomConfig;
use crate::error::ConfigError;
use crate::state::ConfigState;

pub use file::FileStore;
pub use memory::MemoryStore;

/* Record key. */
pub const NAMESPACE: &str = "custom_config";
pub const RECORD_NAME: &str = "state";

/* Default debounce between the last change and the write. */
pub const DEFAULT_SAVE_DEBOUNCE: Duration = Duration::from_millis(60_000);

/* Opaque key/value persistence service. */
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn save_record(&self, namespace: &str, name: &str, bytes: &[u8]) -> Result<()>;

    /* Every record stored under `namespace`, as `(name, bytes)` pairs. */
    async fn load_records(&self, namespace: &str) -> Result<Vec<(String, Vec<u8>)>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePolicy {
    /* Write synchronously on every committed change. */
    Immediate,
    /* Restart a timer on every request; only its expiry writes. */
    Debounced(Duration),
}

impl Default for SavePolicy {
    fn default() -> Self {
        Self::Debounced(DEFAULT_SAVE_DEBOUNCE)
    }
}

struct PendingSave {
    snapshot: ConfigState,
    task: JoinHandle<()>,
}

/* Single-slot save timer in front of a `SettingsStore`. */
pub struct SaveScheduler {
    store: Arc<dyn SettingsStore>,
    policy: SavePolicy,
    pending: Option<PendingSave>,
}

impl SaveScheduler {
    pub fn new(store: Arc<dyn SettingsStore>, policy: SavePolicy) -> Self {
        Self {
            store,
            policy,
            pending: None,
        }
    }

    pub fn store(&self) -> Arc<dyn SettingsStore> {
        Arc::clone(&self.store)
    }

    /* True while a debounced write is waiting for its timer. */
    pub fn has_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.task.is_finished())
    }

    /* Ask for `snapshot` to be persisted according to the policy. */
    pub async fn request(&mut self, snapshot: ConfigState) -> Result<(), ConfigError> {
        match self.policy {
            SavePolicy::Immediate => write_record(self.store.as_ref(), &snapshot).await,
            SavePolicy::Debounced(delay) => {
                self.cancel_pending();

                let store = Arc::clone(&self.store);
                let task = tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    /* Errors are already logged; the next change retries. */
                    let _ = write_record(store.as_ref(), &snapshot).await;
                });

                debug!("Configuration save scheduled in {delay:?}");
                self.pending = Some(PendingSave { snapshot, task });
                Ok(())
            }
        }
    }

    /* Write `snapshot` now, dropping any pending timer. */
    pub async fn flush_now(&mut self, snapshot: ConfigState) -> Result<(), ConfigError> {
        self.cancel_pending();
        write_record(self.store.as_ref(), &snapshot).await
    }

    /* Write the snapshot of a pending timer now, if there is one. */
    pub async fn flush_pending(&mut self) -> Result<(), ConfigError> {
        match self.pending.take() {
            Some(pending) if !pending.task.is_finished() => {
                pending.task.abort();
                write_record(self.store.as_ref(), &pending.snapshot).await
            }
            _ => Ok(()),
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.task.abort();
        }
    }
}

impl Drop for SaveScheduler {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

async fn write_record(
    store: &dyn SettingsStore,
    snapshot: &ConfigState,
) -> Result<(), ConfigError> {
    match store
        .save_record(NAMESPACE, RECORD_NAME, &snapshot.to_record())
        .await
    {
        Ok(()) => {
            debug!("Saved {NAMESPACE}/{RECORD_NAME}: {snapshot:?}");
            Ok(())
        }
        Err(e) => {
            warn!("Failed to save {NAMESPACE}/{RECORD_NAME}: {e:#}");
            Err(ConfigError::PersistenceWriteFailure(format!("{e:#}")))
        }
    }
}

/* Startup path: hand every stored record of our namespace to the loader,
 * then run the commit phase, which falls back to defaults when nothing
 * valid was loaded. */
pub async fn bootstrap(config: &mut CustomConfig, store: &dyn SettingsStore) {
    let records = match store.load_records(NAMESPACE).await {
        Ok(records) => records,
        Err(e) => {
            warn!("Failed to enumerate {NAMESPACE} settings: {e:#}");
            Vec::new()
        }
    };

    for (name, bytes) in records {
        if name != RECORD_NAME {
            debug!("Ignoring unknown setting {NAMESPACE}/{name}");
            continue;
        }
        if let Err(e) = config.load_record(&bytes).await {
            warn!("Rejected stored {NAMESPACE}/{name}: {e}");
        }
    }

    if let Err(e) = config.commit_loaded().await {
        warn!("Commit phase could not persist defaults: {e}");
    }

    info!("Configuration ready: {:?}", config.get());
}
