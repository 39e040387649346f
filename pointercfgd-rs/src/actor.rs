/* Config Actor: the single owner of the configuration state.
 *
 * The actor task (`tokio::spawn`) owns the `CustomConfig` instance, so
 * every operation, load and save runs on one execution context. DBus
 * interface objects talk to it through an `mpsc` channel; readers that
 * only need the latest value subscribe to the observer's `watch` channel. */

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::behavior;
use crate::config::CustomConfig;
use crate::error::ConfigError;
use crate::persist;
use crate::state::ConfigState;

/* Commands that DBus interface objects can send to the config actor. */
#[derive(Debug)]
pub enum ActorMessage {
    /* Read the committed state. */
    Get {
        reply: oneshot::Sender<ConfigState>,
    },
    /* Run one operation code through the engine and report the outcome. */
    ApplyOp {
        code: u32,
        reply: oneshot::Sender<Result<(), ConfigError>>,
    },
    /* A key binding fired; failures are logged, never reported. */
    BindingPressed { param: u32 },
    /* Flush pending saves and stop. */
    Shutdown { reply: oneshot::Sender<()> },
}

/* Handle used by DBus objects to send commands to the config actor. */
#[derive(Debug, Clone)]
pub struct ActorHandle {
    tx: mpsc::Sender<ActorMessage>,
}

impl ActorHandle {
    pub async fn get(&self) -> Result<ConfigState, String> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(ActorMessage::Get { reply: reply_tx })
            .await
            .map_err(|_| "Config actor is no longer running".to_string())?;

        reply_rx
            .await
            .map_err(|_| "Config actor dropped the reply channel".to_string())
    }

    /* Apply an operation code. The outer error means the actor is gone,
     * the inner one is the engine's verdict. */
    pub async fn apply_op(&self, code: u32) -> Result<Result<(), ConfigError>, String> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(ActorMessage::ApplyOp {
                code,
                reply: reply_tx,
            })
            .await
            .map_err(|_| "Config actor is no longer running".to_string())?;

        reply_rx
            .await
            .map_err(|_| "Config actor dropped the reply channel".to_string())
    }

    pub async fn press(&self, param: u32) -> Result<(), String> {
        self.tx
            .send(ActorMessage::BindingPressed { param })
            .await
            .map_err(|_| "Config actor is no longer running".to_string())
    }

    /* Request the actor to shut down and wait until pending saves are written. */
    pub async fn shutdown(&self) {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .tx
            .send(ActorMessage::Shutdown { reply: reply_tx })
            .await
            .is_ok()
        {
            let _ = reply_rx.await;
        }
    }
}

struct ConfigActor {
    config: CustomConfig,
    rx: mpsc::Receiver<ActorMessage>,
}

impl ConfigActor {
    /* Main actor loop: process messages until shutdown or channel close. */
    async fn run(mut self) {
        info!("Config actor started");

        while let Some(msg) = self.rx.recv().await {
            match msg {
                ActorMessage::Get { reply } => {
                    let _ = reply.send(self.config.get());
                }
                ActorMessage::ApplyOp { code, reply } => {
                    let result = self.config.apply_op(code).await;
                    if let Err(e) = &result {
                        warn!("Operation {code} failed: {e}");
                    }
                    let _ = reply.send(result);
                }
                ActorMessage::BindingPressed { param } => {
                    behavior::binding_pressed(&mut self.config, param).await;
                }
                ActorMessage::Shutdown { reply } => {
                    info!("Config actor shutting down");
                    self.flush().await;
                    let _ = reply.send(());
                    return;
                }
            }
        }

        /* All handles dropped */
        self.flush().await;
        debug!("Config actor loop exited");
    }

    async fn flush(&mut self) {
        if let Err(e) = self.config.shutdown().await {
            warn!("Final configuration save failed: {e}");
        }
    }
}

/* Spawn the config actor.
 *
 * This function:
 * 1. Runs the load phase against the config's settings store.
 * 2. Runs the commit phase (defaults + save when nothing valid was stored).
 * 3. Spawns the actor task and returns a handle for DBus objects.
 *
 * Store failures during startup are logged and end in the defaults path,
 * so spawning itself cannot fail. */
pub async fn spawn_config_actor(mut config: CustomConfig) -> ActorHandle {
    let store = config.store();
    persist::bootstrap(&mut config, store.as_ref()).await;

    let (tx, rx) = mpsc::channel(16);

    let actor = ConfigActor { config, rx };

    tokio::spawn(async move {
        actor.run().await;
    });

    ActorHandle { tx }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::bail;
    use async_trait::async_trait;

    use super::*;
    use crate::ops::{CCFG_CPI_UP, CCFG_SDIV_UP};
    use crate::persist::{
        MemoryStore, NAMESPACE, RECORD_NAME, SavePolicy, SaveScheduler, SettingsStore,
    };
    use crate::state::ConfigProfile;

    async fn spawn(policy: SavePolicy) -> (ActorHandle, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let config = CustomConfig::new(
            ConfigProfile::default(),
            SaveScheduler::new(store.clone(), policy),
        );
        let handle = spawn_config_actor(config).await;
        (handle, store)
    }

    #[tokio::test]
    async fn startup_commits_defaults() {
        let (handle, store) = spawn(SavePolicy::Immediate).await;

        assert_eq!(handle.get().await.unwrap(), ConfigProfile::default().defaults());
        assert_eq!(store.save_count(), 1);
    }

    /* Store that cannot enumerate but accepts writes. */
    struct UnreadableStore(MemoryStore);

    #[async_trait]
    impl SettingsStore for UnreadableStore {
        async fn save_record(
            &self,
            namespace: &str,
            name: &str,
            bytes: &[u8],
        ) -> anyhow::Result<()> {
            self.0.save_record(namespace, name, bytes).await
        }

        async fn load_records(&self, _namespace: &str) -> anyhow::Result<Vec<(String, Vec<u8>)>> {
            bail!("settings directory unreadable")
        }
    }

    #[tokio::test]
    async fn unreadable_store_still_yields_running_actor() {
        let store = Arc::new(UnreadableStore(MemoryStore::new()));
        let config = CustomConfig::new(
            ConfigProfile::default(),
            SaveScheduler::new(store.clone(), SavePolicy::Immediate),
        );

        let handle = spawn_config_actor(config).await;

        assert_eq!(handle.get().await.unwrap(), ConfigProfile::default().defaults());
        assert_eq!(store.0.save_count(), 1);
    }

    #[tokio::test]
    async fn apply_op_round_trip() {
        let (handle, _store) = spawn(SavePolicy::Immediate).await;

        handle.apply_op(u32::from(CCFG_SDIV_UP)).await.unwrap().unwrap();
        assert_eq!(handle.get().await.unwrap().scroll_divisor_index, 6);

        let verdict = handle.apply_op(200).await.unwrap();
        assert_eq!(verdict, Err(ConfigError::UnsupportedOperation(200)));
    }

    #[tokio::test]
    async fn press_is_fire_and_forget() {
        let (handle, _store) = spawn(SavePolicy::Immediate).await;

        handle.press(u32::from(CCFG_CPI_UP)).await.unwrap();
        handle.press(77).await.unwrap();

        /* Messages are processed in order, so this read sees the press */
        assert_eq!(handle.get().await.unwrap().cpi_index, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_flushes_debounced_save() {
        let (handle, store) = spawn(SavePolicy::Debounced(Duration::from_secs(60))).await;
        assert_eq!(store.save_count(), 1);

        handle.apply_op(u32::from(CCFG_CPI_UP)).await.unwrap().unwrap();
        assert_eq!(store.save_count(), 1);

        handle.shutdown().await;
        assert_eq!(store.save_count(), 2);
        assert_eq!(store.record(NAMESPACE, RECORD_NAME).unwrap()[0], 6);
        assert!(handle.get().await.is_err());
    }
}
