pub mod config;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info};
use zbus::connection::Builder;
use zbus::object_server::InterfaceRef;

use crate::actor::ActorHandle;
use crate::state::{ConfigProfile, ConfigState};

pub const BUS_NAME: &str = "org.pointercfg1";
pub const OBJECT_PATH: &str = "/org/pointercfg1";

/* Emit PropertiesChanged for every field that differs between two states. */
async fn emit_changes(
    iface_ref: &InterfaceRef<config::PointerConfig>,
    old: &ConfigState,
    new: &ConfigState,
) -> zbus::Result<()> {
    let iface = iface_ref.get().await;
    let emitter = iface_ref.signal_emitter();

    if old.cpi_index != new.cpi_index {
        iface.cpi_index_changed(emitter).await?;
        iface.cpi_changed(emitter).await?;
    }
    if old.scroll_divisor_index != new.scroll_divisor_index {
        iface.scroll_divisor_index_changed(emitter).await?;
        iface.scroll_divisor_changed(emitter).await?;
    }
    if old.rotation_index != new.rotation_index {
        iface.rotation_index_changed(emitter).await?;
        iface.rotation_degrees_changed(emitter).await?;
    }
    if old.scroll_h_reverse != new.scroll_h_reverse {
        iface.scroll_h_reverse_changed(emitter).await?;
    }
    if old.scroll_v_reverse != new.scroll_v_reverse {
        iface.scroll_v_reverse_changed(emitter).await?;
    }
    if old.scaling_enabled != new.scaling_enabled {
        iface.scaling_enabled_changed(emitter).await?;
    }
    if old.scroll_trigger_layer_1 != new.scroll_trigger_layer_1 {
        iface.scroll_layer1_changed(emitter).await?;
    }
    if old.scroll_trigger_layer_2 != new.scroll_trigger_layer_2 {
        iface.scroll_layer2_changed(emitter).await?;
    }
    iface.snapshot_changed(emitter).await?;

    Ok(())
}

/* Starts the DBus server and registers the config interface. */
/*  */
/* This function blocks until the daemon is shut down. Every state the */
/* actor publishes on `changes` is turned into PropertiesChanged signals. */
pub async fn run_server(
    actor: ActorHandle,
    profile: Arc<ConfigProfile>,
    changes: watch::Receiver<ConfigState>,
) -> Result<()> {
    let iface = config::PointerConfig::new(actor, profile);

    let conn = Builder::system()?
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, iface)?
        .build()
        .await?;

    info!("DBus server ready on {BUS_NAME}");

    let iface_ref = conn
        .object_server()
        .interface::<_, config::PointerConfig>(OBJECT_PATH)
        .await?;

    let mut last = *changes.borrow();
    let mut stream = WatchStream::from_changes(changes);

    /* Main event loop: mirror configuration changes onto the bus */
    while let Some(state) = stream.next().await {
        if state == last {
            continue;
        }
        debug!("Publishing configuration change {state:?}");
        emit_changes(&iface_ref, &last, &state).await?;
        last = state;
    }

    info!("Configuration channel closed, shutting down");
    Ok(())
}
