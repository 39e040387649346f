/* Operation codes accepted from key bindings and their bounded mutations. */

use crate::error::ConfigError;
use crate::state::{ConfigProfile, ConfigState};

pub const CCFG_CPI_UP: u8 = 1;
pub const CCFG_CPI_DN: u8 = 2;
pub const CCFG_SDIV_UP: u8 = 3;
pub const CCFG_SDIV_DN: u8 = 4;
pub const CCFG_ROT_UP: u8 = 5;
pub const CCFG_ROT_DN: u8 = 6;
pub const CCFG_SCALE_TOG: u8 = 7;
pub const CCFG_SCRH_TOG: u8 = 8;
pub const CCFG_SCRV_TOG: u8 = 9;
pub const CCFG_SCRL1_UP: u8 = 10;
pub const CCFG_SCRL2_UP: u8 = 11;
pub const CCFG_RESET: u8 = 12;
pub const CCFG_SAVE: u8 = 13;

/* Stored scroll trigger layer ids cycle through this many values. */
pub const LAYER_ID_LIMIT: u8 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CpiUp,
    CpiDown,
    ScrollDivisorUp,
    ScrollDivisorDown,
    RotationUp,
    RotationDown,
    ScalingToggle,
    ScrollHReverseToggle,
    ScrollVReverseToggle,
    ScrollLayer1Up,
    ScrollLayer2Up,
    Reset,
    Save,
}

impl TryFrom<u32> for Operation {
    type Error = ConfigError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        let op = match u8::try_from(code) {
            Ok(CCFG_CPI_UP) => Self::CpiUp,
            Ok(CCFG_CPI_DN) => Self::CpiDown,
            Ok(CCFG_SDIV_UP) => Self::ScrollDivisorUp,
            Ok(CCFG_SDIV_DN) => Self::ScrollDivisorDown,
            Ok(CCFG_ROT_UP) => Self::RotationUp,
            Ok(CCFG_ROT_DN) => Self::RotationDown,
            Ok(CCFG_SCALE_TOG) => Self::ScalingToggle,
            Ok(CCFG_SCRH_TOG) => Self::ScrollHReverseToggle,
            Ok(CCFG_SCRV_TOG) => Self::ScrollVReverseToggle,
            Ok(CCFG_SCRL1_UP) => Self::ScrollLayer1Up,
            Ok(CCFG_SCRL2_UP) => Self::ScrollLayer2Up,
            Ok(CCFG_RESET) => Self::Reset,
            Ok(CCFG_SAVE) => Self::Save,
            _ => return Err(ConfigError::UnsupportedOperation(code)),
        };
        Ok(op)
    }
}

impl Operation {
    pub fn code(self) -> u8 {
        match self {
            Self::CpiUp => CCFG_CPI_UP,
            Self::CpiDown => CCFG_CPI_DN,
            Self::ScrollDivisorUp => CCFG_SDIV_UP,
            Self::ScrollDivisorDown => CCFG_SDIV_DN,
            Self::RotationUp => CCFG_ROT_UP,
            Self::RotationDown => CCFG_ROT_DN,
            Self::ScalingToggle => CCFG_SCALE_TOG,
            Self::ScrollHReverseToggle => CCFG_SCRH_TOG,
            Self::ScrollVReverseToggle => CCFG_SCRV_TOG,
            Self::ScrollLayer1Up => CCFG_SCRL1_UP,
            Self::ScrollLayer2Up => CCFG_SCRL2_UP,
            Self::Reset => CCFG_RESET,
            Self::Save => CCFG_SAVE,
        }
    }

    /* Apply this operation to a working copy. `Save` leaves it untouched:
     * it acts on persistence, not on state. */
    pub fn apply(self, mut next: ConfigState, profile: &ConfigProfile) -> ConfigState {
        let limits = &profile.limits;
        match self {
            Self::CpiUp => next.cpi_index = wrap_increment(next.cpi_index, limits.cpi_max),
            Self::CpiDown => next.cpi_index = wrap_decrement(next.cpi_index, limits.cpi_max),
            Self::ScrollDivisorUp => {
                next.scroll_divisor_index =
                    wrap_increment(next.scroll_divisor_index, limits.scroll_div_max)
            }
            Self::ScrollDivisorDown => {
                next.scroll_divisor_index =
                    wrap_decrement(next.scroll_divisor_index, limits.scroll_div_max)
            }
            Self::RotationUp => {
                next.rotation_index =
                    wrap_increment(next.rotation_index, limits.rotation.entry_count())
            }
            Self::RotationDown => {
                next.rotation_index =
                    wrap_decrement(next.rotation_index, limits.rotation.entry_count())
            }
            Self::ScalingToggle => next.scaling_enabled = !next.scaling_enabled,
            Self::ScrollHReverseToggle => next.scroll_h_reverse = !next.scroll_h_reverse,
            Self::ScrollVReverseToggle => next.scroll_v_reverse = !next.scroll_v_reverse,
            Self::ScrollLayer1Up => {
                next.scroll_trigger_layer_1 =
                    wrap_increment(next.scroll_trigger_layer_1, LAYER_ID_LIMIT)
            }
            Self::ScrollLayer2Up => {
                next.scroll_trigger_layer_2 =
                    wrap_increment(next.scroll_trigger_layer_2, LAYER_ID_LIMIT)
            }
            Self::Reset => profile.set_defaults(&mut next),
            Self::Save => {}
        }
        next
    }
}

/* `(value + 1) mod max`; `max` must be non-zero. */
pub fn wrap_increment(value: u8, max: u8) -> u8 {
    ((u16::from(value) + 1) % u16::from(max)) as u8
}

/* `(value + max - 1) mod max`; `max` must be non-zero. */
pub fn wrap_decrement(value: u8, max: u8) -> u8 {
    ((u16::from(value) + u16::from(max) - 1) % u16::from(max)) as u8
}
