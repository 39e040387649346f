/* Key binding adapter: a bound key carries an operation code as its first
 * parameter and forwards it to the operation engine on press. */

use tracing::error;

use crate::config::CustomConfig;

/* What the keymap does with the press after the binding ran. */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingOutcome {
    /* The press is consumed; no further bindings see it. */
    Opaque,
}

/* Handle a binding press. A rejected code is logged and the press is still
 * consumed. */
pub async fn binding_pressed(config: &mut CustomConfig, param1: u32) -> BindingOutcome {
    if let Err(e) = config.apply_op(param1).await {
        error!("Failed to apply custom config op {param1}: {e}");
    }
    BindingOutcome::Opaque
}
