/* The configuration core: owns the single canonical `ConfigState`, gates
 * every write through change suppression and notification, and runs the
 * operation engine on top of it. */

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::ConfigError;
use crate::hooks::{ConfigObserver, NoopObserver, NullSensor, SensorApply};
use crate::ops::Operation;
use crate::persist::{SaveScheduler, SettingsStore};
use crate::state::{ConfigProfile, ConfigState};

pub struct CustomConfig {
    profile: ConfigProfile,
    current: ConfigState,
    /* Set once a valid record was loaded or defaults were committed. */
    initialized: bool,
    observer: Box<dyn ConfigObserver>,
    sensor: Box<dyn SensorApply>,
    saver: SaveScheduler,
}

impl CustomConfig {
    /* Starts from the profile's compile-time values, without a sensor
     * and with a no-op observer. */
    pub fn new(profile: ConfigProfile, saver: SaveScheduler) -> Self {
        let current = profile.boot_state();
        Self {
            profile,
            current,
            initialized: false,
            observer: Box::new(NoopObserver),
            sensor: Box::new(NullSensor),
            saver,
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn ConfigObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_sensor(mut self, sensor: Box<dyn SensorApply>) -> Self {
        self.sensor = sensor;
        self
    }

    pub fn profile(&self) -> &ConfigProfile {
        &self.profile
    }

    pub fn store(&self) -> Arc<dyn SettingsStore> {
        self.saver.store()
    }

    pub fn get(&self) -> ConfigState {
        self.current
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn cpi_value(&self) -> u32 {
        self.profile.cpi_value(&self.current)
    }

    pub fn scroll_divisor_value(&self) -> u32 {
        self.profile.scroll_divisor_value(&self.current)
    }

    pub fn rotation_degrees(&self) -> i16 {
        self.profile.rotation_degrees(&self.current)
    }

    /* Replace the current state. Identical state is a no-op: no
     * notification and no save. */
    pub async fn set(&mut self, next: ConfigState) -> Result<(), ConfigError> {
        if next == self.current {
            debug!("Configuration unchanged, skipping update");
            return Ok(());
        }

        let previous = self.current;
        self.current = next;
        self.notify(Some(previous)).await;
        self.saver.request(self.current).await
    }

    /* Run one operation: copy, mutate, commit. */
    pub async fn apply_op(&mut self, code: u32) -> Result<(), ConfigError> {
        let op = Operation::try_from(code)?;
        debug!("Applying {op:?}");

        if op == Operation::Save {
            return self.saver.flush_now(self.current).await;
        }

        let next = op.apply(self.current, &self.profile);
        self.set(next).await
    }

    /* Loader for the persisted record. A valid blob always takes effect,
     * even when it equals the current state. */
    pub async fn load_record(&mut self, bytes: &[u8]) -> Result<(), ConfigError> {
        let loaded = ConfigState::from_record(bytes)?;
        let normalized = self.profile.limits.normalize(loaded);
        if normalized != loaded {
            warn!("Stored configuration had out-of-range indices, wrapped to {normalized:?}");
        }

        self.current = normalized;
        self.initialized = true;
        info!("Loaded stored configuration: {:?}", self.current);
        self.notify(None).await;
        Ok(())
    }

    /* Commit phase: without a valid load, fall back to defaults and write
     * them right away so a record exists from now on. */
    pub async fn commit_loaded(&mut self) -> Result<(), ConfigError> {
        if self.initialized {
            return Ok(());
        }

        self.profile.set_defaults(&mut self.current);
        self.initialized = true;
        info!("No stored configuration, using defaults: {:?}", self.current);
        self.notify(None).await;
        self.saver.flush_now(self.current).await
    }

    /* Write out a pending debounced save. */
    pub async fn shutdown(&mut self) -> Result<(), ConfigError> {
        self.saver.flush_pending().await
    }

    /* `previous == None` means the change did not come from an operation
     * (load or defaulting), so the sensor is programmed unconditionally. */
    async fn notify(&mut self, previous: Option<ConfigState>) {
        self.observer.on_config_changed(&self.current);

        let cpi_changed = previous.is_none_or(|p| p.cpi_index != self.current.cpi_index);
        if !cpi_changed {
            return;
        }

        let cpi = self.cpi_value();
        if let Err(e) = self.sensor.apply_cpi(cpi).await {
            let err = ConfigError::HardwareApplyFailure(format!("{e:#}"));
            warn!("{err}");
        }
    }
}
