/* pointercfgd: persisted tuning state for a pointing device (sensitivity,
 * scroll divisor, rotation, inversion flags, scroll trigger layers), the
 * operation engine that mutates it, and the adapters that consume it. */
pub mod actor;
pub mod behavior;
pub mod config;
pub mod daemon_config;
pub mod dbus;
pub mod error;
pub mod hooks;
pub mod ops;
pub mod persist;
pub mod scroll_gate;
pub mod state;
pub mod units;

pub use config::CustomConfig;
pub use error::ConfigError;
pub use state::{ConfigProfile, ConfigState};
