/* Canonical configuration record, its persisted byte layout, and the
 * build-time profile (limits, unit mapping, defaults policy) it lives under. */

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::units::{RotationTable, UnitMapping};

/* Size of the persisted record: one byte per field. */
pub const RECORD_SIZE: usize = 8;

pub const CPI_MAX: u8 = 32;
pub const SCROLL_DIV_MAX: u8 = 16;

pub const CPI_DEFAULT: u8 = 5;
pub const SCROLL_DIV_DEFAULT: u8 = 5;
pub const ROTATION_DEFAULT: u8 = 5;

/* Tuning state of the pointing device. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfigState {
    pub cpi_index: u8,
    pub scroll_divisor_index: u8,
    pub rotation_index: u8,
    pub scroll_h_reverse: bool,
    pub scroll_v_reverse: bool,
    pub scaling_enabled: bool,
    /* Layer ids are reduced modulo the live layer count only when used. */
    pub scroll_trigger_layer_1: u8,
    pub scroll_trigger_layer_2: u8,
}

impl ConfigState {
    /* Encode into the fixed persisted layout. */
    pub fn to_record(&self) -> [u8; RECORD_SIZE] {
        [
            self.cpi_index,
            self.scroll_divisor_index,
            self.rotation_index,
            u8::from(self.scroll_h_reverse),
            u8::from(self.scroll_v_reverse),
            u8::from(self.scaling_enabled),
            self.scroll_trigger_layer_1,
            self.scroll_trigger_layer_2,
        ]
    }

    /* Decode a persisted record. Any length but `RECORD_SIZE` is rejected. */
    pub fn from_record(bytes: &[u8]) -> Result<Self, ConfigError> {
        let buf: [u8; RECORD_SIZE] = bytes.try_into().map_err(|_| ConfigError::InvalidRecordSize {
            expected: RECORD_SIZE,
            actual: bytes.len(),
        })?;

        Ok(Self {
            cpi_index: buf[0],
            scroll_divisor_index: buf[1],
            rotation_index: buf[2],
            scroll_h_reverse: buf[3] != 0,
            scroll_v_reverse: buf[4] != 0,
            scaling_enabled: buf[5] != 0,
            scroll_trigger_layer_1: buf[6],
            scroll_trigger_layer_2: buf[7],
        })
    }
}

/* Upper bounds of the bounded fields. Every bound is non-zero. */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    pub cpi_max: u8,
    pub scroll_div_max: u8,
    pub rotation: RotationTable,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            cpi_max: CPI_MAX,
            scroll_div_max: SCROLL_DIV_MAX,
            rotation: RotationTable::default(),
        }
    }
}

impl Limits {
    /* Wrap any out-of-range index back into its range. */
    pub fn normalize(&self, mut state: ConfigState) -> ConfigState {
        state.cpi_index %= self.cpi_max;
        state.scroll_divisor_index %= self.scroll_div_max;
        state.rotation_index %= self.rotation.entry_count();
        state
    }
}

/* Compile-time baseline values. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedDefaults {
    pub cpi_index: u8,
    pub scroll_divisor_index: u8,
    pub rotation_index: u8,
}

impl Default for FixedDefaults {
    fn default() -> Self {
        Self {
            cpi_index: CPI_DEFAULT,
            scroll_divisor_index: SCROLL_DIV_DEFAULT,
            rotation_index: ROTATION_DEFAULT,
        }
    }
}

/* Optional values taken from the static hardware description of the sensor. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HardwareDescription {
    pub scroll_threshold: Option<u16>,
    pub rotation_angle: Option<i16>,
    pub invert_x: Option<bool>,
    pub invert_y: Option<bool>,
    pub scaling_mode: Option<bool>,
}

/* How `set_defaults` fills a record. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultsPolicy {
    /* Fixed constants only. */
    #[default]
    Fixed,
    /* Hardware description values override the constants field by field. */
    HardwareDescribed(HardwareDescription),
}

/* Everything decided when the build is configured. */
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigProfile {
    pub mapping: UnitMapping,
    pub limits: Limits,
    pub fixed: FixedDefaults,
    pub defaults: DefaultsPolicy,
}

impl ConfigProfile {
    /* State a process starts with before anything is loaded. */
    pub fn boot_state(&self) -> ConfigState {
        self.limits.normalize(ConfigState {
            cpi_index: self.fixed.cpi_index,
            scroll_divisor_index: self.fixed.scroll_divisor_index,
            rotation_index: self.fixed.rotation_index,
            ..ConfigState::default()
        })
    }

    /* Populate `out` with the baseline values of the chosen policy.
     * Scroll trigger layers are left untouched. */
    pub fn set_defaults(&self, out: &mut ConfigState) {
        let boot = self.boot_state();
        out.cpi_index = boot.cpi_index;
        out.scroll_divisor_index = boot.scroll_divisor_index;
        out.rotation_index = boot.rotation_index;
        out.scroll_h_reverse = false;
        out.scroll_v_reverse = false;
        out.scaling_enabled = false;

        let DefaultsPolicy::HardwareDescribed(hw) = self.defaults else {
            return;
        };

        if let Some(threshold) = hw.scroll_threshold {
            out.scroll_divisor_index = self
                .mapping
                .nearest_scroll_divisor_index(u32::from(threshold), self.limits.scroll_div_max);
        }
        if let Some(angle) = hw.rotation_angle {
            out.rotation_index = self.limits.rotation.nearest_index(angle);
        }
        if let Some(invert_x) = hw.invert_x {
            out.scroll_h_reverse = invert_x;
        }
        if let Some(invert_y) = hw.invert_y {
            out.scroll_v_reverse = invert_y;
        }
        if let Some(scaling) = hw.scaling_mode {
            out.scaling_enabled = scaling;
        }
    }

    pub fn defaults(&self) -> ConfigState {
        let mut state = self.boot_state();
        self.set_defaults(&mut state);
        state
    }

    pub fn cpi_value(&self, state: &ConfigState) -> u32 {
        self.mapping.cpi_value(state.cpi_index)
    }

    pub fn scroll_divisor_value(&self, state: &ConfigState) -> u32 {
        self.mapping.scroll_divisor_value(state.scroll_divisor_index)
    }

    pub fn rotation_degrees(&self, state: &ConfigState) -> i16 {
        self.limits.rotation.degrees(state.rotation_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{CpiMapping, ScrollDivisorMapping};

    fn sample() -> ConfigState {
        ConfigState {
            cpi_index: 12,
            scroll_divisor_index: 3,
            rotation_index: 9,
            scroll_h_reverse: true,
            scroll_v_reverse: false,
            scaling_enabled: true,
            scroll_trigger_layer_1: 2,
            scroll_trigger_layer_2: 5,
        }
    }

    #[test]
    fn record_layout_is_field_order() {
        assert_eq!(sample().to_record(), [12, 3, 9, 1, 0, 1, 2, 5]);
        assert_eq!(ConfigState::from_record(&[12, 3, 9, 1, 0, 1, 2, 5]), Ok(sample()));
    }

    #[test]
    fn record_nonzero_flag_byte_reads_true() {
        let state = ConfigState::from_record(&[0, 0, 0, 7, 0, 255, 0, 0]).unwrap();
        assert!(state.scroll_h_reverse);
        assert!(!state.scroll_v_reverse);
        assert!(state.scaling_enabled);
    }

    #[test]
    fn record_wrong_size_rejected() {
        assert_eq!(
            ConfigState::from_record(&[1, 2, 3]),
            Err(ConfigError::InvalidRecordSize {
                expected: RECORD_SIZE,
                actual: 3
            })
        );
        assert!(ConfigState::from_record(&[0u8; RECORD_SIZE + 1]).is_err());
        assert!(ConfigState::from_record(&[]).is_err());
    }

    #[test]
    fn normalize_wraps_indices() {
        let limits = Limits::default();
        let state = ConfigState {
            cpi_index: 33,
            scroll_divisor_index: 16,
            rotation_index: 20,
            ..ConfigState::default()
        };
        let fixed = limits.normalize(state);
        assert_eq!(fixed.cpi_index, 1);
        assert_eq!(fixed.scroll_divisor_index, 0);
        assert_eq!(fixed.rotation_index, 5);
    }

    #[test]
    fn fixed_defaults() {
        let profile = ConfigProfile::default();
        let defaults = profile.defaults();
        assert_eq!(defaults.cpi_index, 5);
        assert_eq!(defaults.scroll_divisor_index, 5);
        assert_eq!(defaults.rotation_index, 5);
        assert!(!defaults.scroll_h_reverse);
        assert!(!defaults.scroll_v_reverse);
        assert!(!defaults.scaling_enabled);
        assert_eq!(profile.cpi_value(&defaults), 600);
        assert_eq!(profile.scroll_divisor_value(&defaults), 60);
        assert_eq!(profile.rotation_degrees(&defaults), -20);
    }

    #[test]
    fn set_defaults_keeps_trigger_layers() {
        let profile = ConfigProfile::default();
        let mut state = sample();
        profile.set_defaults(&mut state);
        assert_eq!(state.cpi_index, 5);
        assert!(!state.scroll_h_reverse);
        assert_eq!(state.scroll_trigger_layer_1, 2);
        assert_eq!(state.scroll_trigger_layer_2, 5);
    }

    #[test]
    fn hardware_described_defaults_override_per_field() {
        let profile = ConfigProfile {
            mapping: UnitMapping {
                cpi: CpiMapping::Offset200,
                scroll_divisor: ScrollDivisorMapping::Linear,
            },
            defaults: DefaultsPolicy::HardwareDescribed(HardwareDescription {
                scroll_threshold: Some(40),
                rotation_angle: Some(12),
                invert_x: Some(true),
                invert_y: None,
                scaling_mode: Some(true),
            }),
            ..ConfigProfile::default()
        };
        let defaults = profile.defaults();
        /* 5 * (7 + 1) = 40 */
        assert_eq!(defaults.scroll_divisor_index, 7);
        assert_eq!(profile.rotation_degrees(&defaults), 10);
        assert!(defaults.scroll_h_reverse);
        assert!(!defaults.scroll_v_reverse);
        assert!(defaults.scaling_enabled);
        assert_eq!(defaults.cpi_index, CPI_DEFAULT);
        assert_eq!(profile.cpi_value(&defaults), 700);
    }

    #[test]
    fn hardware_described_without_values_matches_fixed() {
        let profile = ConfigProfile {
            defaults: DefaultsPolicy::HardwareDescribed(HardwareDescription::default()),
            ..ConfigProfile::default()
        };
        assert_eq!(profile.defaults(), ConfigProfile::default().defaults());
    }

    #[test]
    fn boot_state_respects_small_limits() {
        let profile = ConfigProfile {
            limits: Limits {
                cpi_max: 4,
                scroll_div_max: 2,
                rotation: RotationTable::new(vec![-10, 0, 10]).unwrap(),
            },
            ..ConfigProfile::default()
        };
        let boot = profile.boot_state();
        assert!(boot.cpi_index < 4);
        assert!(boot.scroll_divisor_index < 2);
        assert!(boot.rotation_index < 3);
    }
}
