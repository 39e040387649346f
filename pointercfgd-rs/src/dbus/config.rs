use std::sync::Arc;

use serde::Serialize;
use zbus::fdo;
use zbus::interface;

use crate::actor::ActorHandle;
use crate::error::ConfigError;
use crate::ops::{CCFG_RESET, CCFG_SAVE};
use crate::state::{ConfigProfile, ConfigState};

/* The org.pointercfg1.Config interface. */
/*  */
/* Exposes the stored indices, the physical values derived from them, and */
/* the operation codes a key binding would send. */
pub struct PointerConfig {
    actor: ActorHandle,
    profile: Arc<ConfigProfile>,
}

impl PointerConfig {
    pub fn new(actor: ActorHandle, profile: Arc<ConfigProfile>) -> Self {
        Self { actor, profile }
    }

    async fn state(&self) -> fdo::Result<ConfigState> {
        self.actor.get().await.map_err(fdo::Error::Failed)
    }

    async fn run_op(&self, code: u32) -> fdo::Result<()> {
        match self.actor.apply_op(code).await.map_err(fdo::Error::Failed)? {
            Ok(()) => Ok(()),
            Err(e @ ConfigError::UnsupportedOperation(_)) => {
                Err(fdo::Error::InvalidArgs(e.to_string()))
            }
            Err(e) => Err(fdo::Error::Failed(e.to_string())),
        }
    }
}

/* JSON view returned by the `Snapshot` property. */
#[derive(Debug, Serialize)]
struct Snapshot {
    #[serde(flatten)]
    state: ConfigState,
    cpi: u32,
    scroll_divisor: u32,
    rotation_degrees: i16,
}

#[interface(name = "org.pointercfg1.Config")]
impl PointerConfig {
    /* Sensitivity index (read-only). */
    #[zbus(property)]
    async fn cpi_index(&self) -> fdo::Result<u8> {
        Ok(self.state().await?.cpi_index)
    }

    /* Physical CPI derived from the index. */
    #[zbus(property)]
    async fn cpi(&self) -> fdo::Result<u32> {
        let state = self.state().await?;
        Ok(self.profile.cpi_value(&state))
    }

    #[zbus(property)]
    async fn scroll_divisor_index(&self) -> fdo::Result<u8> {
        Ok(self.state().await?.scroll_divisor_index)
    }

    #[zbus(property)]
    async fn scroll_divisor(&self) -> fdo::Result<u32> {
        let state = self.state().await?;
        Ok(self.profile.scroll_divisor_value(&state))
    }

    #[zbus(property)]
    async fn rotation_index(&self) -> fdo::Result<u8> {
        Ok(self.state().await?.rotation_index)
    }

    /* Rotation in degrees; 0 for an index outside the table. */
    #[zbus(property)]
    async fn rotation_degrees(&self) -> fdo::Result<i16> {
        let state = self.state().await?;
        Ok(self.profile.rotation_degrees(&state))
    }

    /* Full rotation table (constant). */
    #[zbus(property)]
    async fn rotation_angles(&self) -> Vec<i16> {
        self.profile.limits.rotation.angles().to_vec()
    }

    #[zbus(property)]
    async fn scroll_h_reverse(&self) -> fdo::Result<bool> {
        Ok(self.state().await?.scroll_h_reverse)
    }

    #[zbus(property)]
    async fn scroll_v_reverse(&self) -> fdo::Result<bool> {
        Ok(self.state().await?.scroll_v_reverse)
    }

    #[zbus(property)]
    async fn scaling_enabled(&self) -> fdo::Result<bool> {
        Ok(self.state().await?.scaling_enabled)
    }

    /* Stored layer id, not yet reduced by the live layer count. */
    #[zbus(property)]
    async fn scroll_layer1(&self) -> fdo::Result<u8> {
        Ok(self.state().await?.scroll_trigger_layer_1)
    }

    #[zbus(property)]
    async fn scroll_layer2(&self) -> fdo::Result<u8> {
        Ok(self.state().await?.scroll_trigger_layer_2)
    }

    /* Everything above as one JSON object. */
    #[zbus(property)]
    async fn snapshot(&self) -> fdo::Result<String> {
        let state = self.state().await?;
        let snapshot = Snapshot {
            state,
            cpi: self.profile.cpi_value(&state),
            scroll_divisor: self.profile.scroll_divisor_value(&state),
            rotation_degrees: self.profile.rotation_degrees(&state),
        };
        serde_json::to_string(&snapshot).map_err(|e| fdo::Error::Failed(e.to_string()))
    }

    /* Run one operation code. Unknown codes fail with InvalidArgs. */
    async fn apply_op(&self, code: u8) -> fdo::Result<()> {
        self.run_op(u32::from(code)).await
    }

    /* Simulate a key binding press carrying `param`. Never fails for a bad
     * code; the daemon logs it instead. */
    async fn press(&self, param: u32) -> fdo::Result<()> {
        self.actor.press(param).await.map_err(fdo::Error::Failed)
    }

    /* Write the current configuration to storage now. */
    async fn save(&self) -> fdo::Result<()> {
        self.run_op(u32::from(CCFG_SAVE)).await
    }

    /* Restore the configured defaults. */
    async fn reset(&self) -> fdo::Result<()> {
        self.run_op(u32::from(CCFG_RESET)).await
    }
}
