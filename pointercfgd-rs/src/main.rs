/* pointercfgd: loads the daemon config, bootstraps the stored pointer
 * configuration, and serves it on the system bus until SIGINT/SIGTERM. */
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pointercfgd::actor;
use pointercfgd::daemon_config::{DEFAULT_CONFIG_PATH, DaemonConfig};
use pointercfgd::dbus;
use pointercfgd::hooks::{AttrFileSensor, NullSensor, SensorApply};
use pointercfgd::persist::{FileStore, SaveScheduler, SettingsStore};
use pointercfgd::CustomConfig;

fn config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var("POINTERCFGD_CONFIG").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

async fn shutdown_signal() -> Result<()> {
    let mut term = signal(SignalKind::terminate()).context("Installing SIGTERM handler")?;
    tokio::select! {
        r = tokio::signal::ctrl_c() => r.context("Waiting for SIGINT")?,
        _ = term.recv() => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = config_path();
    let settings = DaemonConfig::load(&path)
        .with_context(|| format!("Loading daemon config {}", path.display()))?;

    info!(
        "Settings stored under {} ({:?})",
        settings.storage_dir.display(),
        settings.save_policy
    );

    let store: Arc<dyn SettingsStore> = Arc::new(FileStore::new(&settings.storage_dir));
    let sensor: Box<dyn SensorApply> = match &settings.cpi_attribute {
        Some(attr) => {
            info!("Applying CPI changes via {}", attr.display());
            Box::new(AttrFileSensor::new(attr))
        }
        None => Box::new(NullSensor),
    };

    let profile = Arc::new(settings.profile.clone());
    let (changes_tx, changes_rx) = watch::channel(profile.boot_state());

    let config = CustomConfig::new(
        settings.profile,
        SaveScheduler::new(store, settings.save_policy),
    )
    .with_observer(Box::new(changes_tx))
    .with_sensor(sensor);

    let handle = actor::spawn_config_actor(config).await;

    tokio::select! {
        r = dbus::run_server(handle.clone(), profile, changes_rx) => {
            if let Err(e) = r {
                warn!("DBus server stopped: {e:#}");
            }
        }
        r = shutdown_signal() => {
            if let Err(e) = r {
                warn!("Signal handling failed: {e:#}");
            }
        }
    }

    handle.shutdown().await;
    info!("pointercfgd stopped");
    Ok(())
}
