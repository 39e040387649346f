/* Collaborators notified when the configuration changes: a synchronous
 * observer and the sensor that receives the physical CPI. */

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

use crate::state::ConfigState;

/* Called after every accepted change, including loads and defaulting. */
pub trait ConfigObserver: Send {
    fn on_config_changed(&self, cfg: &ConfigState);
}

/* Observer that ignores every change. */
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ConfigObserver for NoopObserver {
    fn on_config_changed(&self, _cfg: &ConfigState) {}
}

/* Fan-out to any number of subscribers holding a `watch::Receiver`. */
impl ConfigObserver for watch::Sender<ConfigState> {
    fn on_config_changed(&self, cfg: &ConfigState) {
        self.send_replace(*cfg);
    }
}

/* Device attribute sink for values derived from the configuration. */
#[async_trait]
pub trait SensorApply: Send + Sync {
    async fn apply_cpi(&self, cpi: u32) -> Result<()>;
}

/* Used when no sensor attribute is configured. */
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSensor;

#[async_trait]
impl SensorApply for NullSensor {
    async fn apply_cpi(&self, cpi: u32) -> Result<()> {
        debug!("No sensor attached, CPI {cpi} not applied");
        Ok(())
    }
}

/* Writes the CPI as decimal text to a device attribute file
 * (e.g. a sysfs node exported by the sensor driver). */
#[derive(Debug, Clone)]
pub struct AttrFileSensor {
    path: PathBuf,
}

impl AttrFileSensor {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

#[async_trait]
impl SensorApply for AttrFileSensor {
    async fn apply_cpi(&self, cpi: u32) -> Result<()> {
        tokio::fs::write(&self.path, format!("{cpi}\n"))
            .await
            .with_context(|| format!("Writing CPI {cpi} to {}", self.path.display()))?;
        debug!("Applied CPI {} via {}", cpi, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_observer_publishes_latest() {
        let (tx, rx) = watch::channel(ConfigState::default());
        let cfg = ConfigState {
            cpi_index: 9,
            ..ConfigState::default()
        };
        tx.on_config_changed(&cfg);
        assert_eq!(rx.borrow().cpi_index, 9);
    }

    #[tokio::test]
    async fn attr_file_sensor_writes_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cpi");
        let sensor = AttrFileSensor::new(&path);
        sensor.apply_cpi(1600).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1600\n");
    }

    #[tokio::test]
    async fn attr_file_sensor_reports_missing_node() {
        let dir = tempfile::tempdir().unwrap();
        let sensor = AttrFileSensor::new(&dir.path().join("missing").join("cpi"));
        assert!(sensor.apply_cpi(800).await.is_err());
    }
}
