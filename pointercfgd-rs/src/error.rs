/* Error kinds raised by the configuration core. None of them is fatal: every
 * failure leaves the in-memory configuration consistent. */
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /* Operation code outside the command surface. State is unchanged. */
    #[error("unsupported operation code {0}")]
    UnsupportedOperation(u32),

    /* Persisted blob does not match the record layout. The load is ignored. */
    #[error("persisted record has {actual} bytes, expected {expected}")]
    InvalidRecordSize { expected: usize, actual: usize },

    /* The settings store refused the write. The in-memory state stays committed. */
    #[error("failed to persist configuration: {0}")]
    PersistenceWriteFailure(String),

    /* Pushing a derived value to the sensor failed. The configuration is kept. */
    #[error("failed to apply configuration to hardware: {0}")]
    HardwareApplyFailure(String),

    /* A daemon configuration key holds a value that cannot be used. */
    #[error("invalid setting {0}")]
    InvalidSetting(String),
}
