/* pointercfgctl DBus client: low-level helper for calling the org.pointercfg1 API, wrapping
 * property access and method calls on the Config object. */
//! Low-level DBus proxy client for `org.pointercfg1`.
//!
//! All communication with the daemon goes through this module.

use anyhow::{Context, Result, anyhow};
use zbus::Connection;
use zbus::zvariant::{OwnedValue, Value};

const BUS_NAME: &str = "org.pointercfg1";
const CONFIG_PATH: &str = "/org/pointercfg1";
const CONFIG_IFACE: &str = "org.pointercfg1.Config";

/// A client that talks to the `pointercfgd` daemon over the system DBus.
pub struct PointerCfgClient {
    conn: Connection,
}

impl PointerCfgClient {
    /// Connect to the system bus.
    pub async fn connect() -> Result<Self> {
        let conn = Connection::system()
            .await
            .context("Cannot connect to the system DBus")?;
        Ok(Self { conn })
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    pub async fn get_cpi_index(&self) -> Result<u8> {
        self.get_u8_property("CpiIndex").await
    }

    pub async fn get_cpi(&self) -> Result<u32> {
        self.get_u32_property("Cpi").await
    }

    pub async fn get_scroll_divisor_index(&self) -> Result<u8> {
        self.get_u8_property("ScrollDivisorIndex").await
    }

    pub async fn get_scroll_divisor(&self) -> Result<u32> {
        self.get_u32_property("ScrollDivisor").await
    }

    pub async fn get_rotation_index(&self) -> Result<u8> {
        self.get_u8_property("RotationIndex").await
    }

    pub async fn get_rotation_degrees(&self) -> Result<i16> {
        let val = self.get_property("RotationDegrees").await?;
        val.downcast_ref::<i16>()
            .context("Type mismatch for RotationDegrees")
    }

    /// Get the full rotation table.
    pub async fn get_rotation_angles(&self) -> Result<Vec<i16>> {
        let val = self.get_property("RotationAngles").await?;
        extract_i16_array(val).context("Failed to parse RotationAngles property")
    }

    pub async fn get_scroll_h_reverse(&self) -> Result<bool> {
        self.get_bool_property("ScrollHReverse").await
    }

    pub async fn get_scroll_v_reverse(&self) -> Result<bool> {
        self.get_bool_property("ScrollVReverse").await
    }

    pub async fn get_scaling_enabled(&self) -> Result<bool> {
        self.get_bool_property("ScalingEnabled").await
    }

    pub async fn get_scroll_layers(&self) -> Result<(u8, u8)> {
        Ok((
            self.get_u8_property("ScrollLayer1").await?,
            self.get_u8_property("ScrollLayer2").await?,
        ))
    }

    /// Get the whole configuration as a JSON document.
    pub async fn get_snapshot(&self) -> Result<String> {
        let val = self.get_property("Snapshot").await?;
        val.downcast_ref::<String>()
            .context("Type mismatch for Snapshot")
    }

    // -----------------------------------------------------------------------
    // Methods
    // -----------------------------------------------------------------------

    /// Run an operation code; the daemon rejects unknown codes.
    pub async fn apply_op(&self, code: u8) -> Result<()> {
        self.conn
            .call_method(Some(BUS_NAME), CONFIG_PATH, Some(CONFIG_IFACE), "ApplyOp", &(code,))
            .await
            .with_context(|| format!("ApplyOp({}) call failed", code))?;
        Ok(())
    }

    /// Send a key binding press; bad codes are only logged by the daemon.
    pub async fn press(&self, param: u32) -> Result<()> {
        self.conn
            .call_method(Some(BUS_NAME), CONFIG_PATH, Some(CONFIG_IFACE), "Press", &(param,))
            .await
            .with_context(|| format!("Press({}) call failed", param))?;
        Ok(())
    }

    pub async fn save(&self) -> Result<()> {
        self.conn
            .call_method(Some(BUS_NAME), CONFIG_PATH, Some(CONFIG_IFACE), "Save", &())
            .await
            .context("Save call failed")?;
        Ok(())
    }

    pub async fn reset(&self) -> Result<()> {
        self.conn
            .call_method(Some(BUS_NAME), CONFIG_PATH, Some(CONFIG_IFACE), "Reset", &())
            .await
            .context("Reset call failed")?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    async fn get_property(&self, prop: &str) -> Result<OwnedValue> {
        let reply = self
            .conn
            .call_method(
                Some(BUS_NAME),
                CONFIG_PATH,
                Some("org.freedesktop.DBus.Properties"),
                "Get",
                &(CONFIG_IFACE, prop),
            )
            .await
            .with_context(|| format!("Get {}.{} failed", CONFIG_IFACE, prop))?;
        let val: OwnedValue = reply.body().deserialize()?;
        Ok(val)
    }

    async fn get_u8_property(&self, prop: &str) -> Result<u8> {
        let val = self.get_property(prop).await?;
        val.downcast_ref::<u8>()
            .with_context(|| format!("Type mismatch for {}.{}", CONFIG_IFACE, prop))
    }

    async fn get_u32_property(&self, prop: &str) -> Result<u32> {
        let val = self.get_property(prop).await?;
        val.downcast_ref::<u32>()
            .with_context(|| format!("Type mismatch for {}.{}", CONFIG_IFACE, prop))
    }

    async fn get_bool_property(&self, prop: &str) -> Result<bool> {
        let val = self.get_property(prop).await?;
        val.downcast_ref::<bool>()
            .with_context(|| format!("Type mismatch for {}.{}", CONFIG_IFACE, prop))
    }
}

// ---------------------------------------------------------------------------
// Free-standing helpers for extracting arrays from OwnedValue
// ---------------------------------------------------------------------------

/// Extract a `Vec<i16>` from an `OwnedValue` that wraps an array of i16.
fn extract_i16_array(val: OwnedValue) -> Result<Vec<i16>> {
    let inner: Value<'_> = val.into();
    match inner {
        Value::Array(arr) => {
            let mut out = Vec::with_capacity(arr.len());
            for value in arr.iter() {
                if let Value::I16(number) = value {
                    out.push(*number);
                } else {
                    return Err(anyhow!("Array contains non-i16 value"));
                }
            }
            Ok(out)
        }
        _ => Err(anyhow!("Value is not an array of i16")),
    }
}
