/* Daemon configuration: an INI file selecting the unit mapping, limits,
 * defaults policy, persistence policy and optional sensor attribute. */

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use configparser::ini::Ini;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::persist::{DEFAULT_SAVE_DEBOUNCE, SavePolicy};
use crate::state::{
    ConfigProfile, DefaultsPolicy, FixedDefaults, HardwareDescription, Limits,
};
use crate::units::{CpiMapping, RotationTable, ScrollDivisorMapping, UnitMapping};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/pointercfg/pointercfgd.conf";
pub const DEFAULT_STORAGE_DIR: &str = "/var/lib/pointercfg";

#[derive(Debug, Clone, PartialEq)]
pub struct DaemonConfig {
    pub profile: ConfigProfile,
    pub storage_dir: PathBuf,
    pub save_policy: SavePolicy,
    pub cpi_attribute: Option<PathBuf>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            profile: ConfigProfile::default(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            save_policy: SavePolicy::default(),
            cpi_attribute: None,
        }
    }
}

impl DaemonConfig {
    /* Load from `path`. A missing file means built-in defaults. */
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config at {}, using built-in defaults", path.display());
            return Ok(Self::default());
        }

        let mut ini = Ini::new();
        ini.load(path)
            .map_err(|e| ConfigError::InvalidSetting(format!("{}: {e}", path.display())))?;
        debug!("Loaded daemon config from {}", path.display());
        Self::from_ini(&ini)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut ini = Ini::new();
        ini.read(text.to_string())
            .map_err(|e| ConfigError::InvalidSetting(format!("config: {e}")))?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mapping = UnitMapping {
            cpi: parse_named(ini, "mapping", "cpi", CpiMapping::from_name)?
                .unwrap_or_default(),
            scroll_divisor: parse_named(
                ini,
                "mapping",
                "scrolldivisor",
                ScrollDivisorMapping::from_name,
            )?
            .unwrap_or_default(),
        };

        let defaults_limits = Limits::default();
        let rotation = match ini.get("limits", "rotationtable") {
            Some(raw) => RotationTable::new(parse_list(&raw, "Limits.RotationTable")?)?,
            None => defaults_limits.rotation,
        };
        let limits = Limits {
            cpi_max: parse_bound(ini, "cpimax")?.unwrap_or(defaults_limits.cpi_max),
            scroll_div_max: parse_bound(ini, "scrolldivmax")?
                .unwrap_or(defaults_limits.scroll_div_max),
            rotation,
        };

        let base = FixedDefaults::default();
        let fixed = FixedDefaults {
            cpi_index: parse_value(ini, "defaults", "cpi")?.unwrap_or(base.cpi_index),
            scroll_divisor_index: parse_value(ini, "defaults", "scrolldivisor")?
                .unwrap_or(base.scroll_divisor_index),
            rotation_index: parse_value(ini, "defaults", "rotation")?
                .unwrap_or(base.rotation_index),
        };

        let policy = ini.get("defaults", "policy").unwrap_or_else(|| "fixed".into());
        let defaults = match policy.to_ascii_lowercase().as_str() {
            "fixed" => DefaultsPolicy::Fixed,
            "hardware" => DefaultsPolicy::HardwareDescribed(HardwareDescription {
                scroll_threshold: parse_value(ini, "hardware", "scrollthreshold")?,
                rotation_angle: parse_value(ini, "hardware", "rotationangle")?,
                invert_x: parse_bool(ini, "hardware", "invertx")?,
                invert_y: parse_bool(ini, "hardware", "inverty")?,
                scaling_mode: parse_bool(ini, "hardware", "scalingmode")?,
            }),
            other => {
                return Err(ConfigError::InvalidSetting(format!(
                    "Defaults.Policy: unknown policy '{other}'"
                )));
            }
        };

        let save_policy = match ini
            .get("persistence", "save")
            .map(|s| s.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("debounced") => {
                let ms = parse_value::<u64>(ini, "persistence", "debouncems")?;
                SavePolicy::Debounced(ms.map_or(DEFAULT_SAVE_DEBOUNCE, Duration::from_millis))
            }
            Some("immediate") => SavePolicy::Immediate,
            Some(other) => {
                return Err(ConfigError::InvalidSetting(format!(
                    "Persistence.Save: unknown policy '{other}'"
                )));
            }
        };

        Ok(Self {
            profile: ConfigProfile {
                mapping,
                limits,
                fixed,
                defaults,
            },
            storage_dir: ini
                .get("persistence", "directory")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR)),
            save_policy,
            cpi_attribute: ini.get("sensor", "cpiattribute").map(PathBuf::from),
        })
    }
}

fn parse_value<T: FromStr>(
    ini: &Ini,
    section: &str,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match ini.get(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidSetting(format!("{section}.{key}: '{raw}'"))),
    }
}

fn parse_bool(ini: &Ini, section: &str, key: &str) -> Result<Option<bool>, ConfigError> {
    match ini.get(section, key).map(|s| s.trim().to_ascii_lowercase()) {
        None => Ok(None),
        Some(raw) => match raw.as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidSetting(format!("{section}.{key}: '{raw}'"))),
        },
    }
}

fn parse_named<T>(
    ini: &Ini,
    section: &str,
    key: &str,
    from_name: fn(&str) -> Option<T>,
) -> Result<Option<T>, ConfigError> {
    match ini.get(section, key) {
        None => Ok(None),
        Some(raw) => from_name(&raw.trim().to_ascii_lowercase())
            .map(Some)
            .ok_or_else(|| ConfigError::InvalidSetting(format!("{section}.{key}: '{raw}'"))),
    }
}

/* Limits must be non-zero: every wraparound divides by them. */
fn parse_bound(ini: &Ini, key: &str) -> Result<Option<u8>, ConfigError> {
    match parse_value::<u8>(ini, "limits", key)? {
        Some(0) => Err(ConfigError::InvalidSetting(format!(
            "limits.{key}: must be greater than zero"
        ))),
        other => Ok(other),
    }
}

/* Parse a comma-separated list like `"-10, 0, 10"`. */
fn parse_list(raw: &str, what: &str) -> Result<Vec<i16>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|_| ConfigError::InvalidSetting(format!("{what}: '{s}'")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_default() {
        assert_eq!(DaemonConfig::parse("").unwrap(), DaemonConfig::default());
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = DaemonConfig::load(&dir.path().join("absent.conf")).unwrap();
        assert_eq!(cfg, DaemonConfig::default());
    }

    #[test]
    fn full_config() {
        let cfg = DaemonConfig::parse(
            "[Mapping]\n\
             Cpi = offset200\n\
             ScrollDivisor = linear\n\
             [Limits]\n\
             CpiMax = 40\n\
             ScrollDivMax = 8\n\
             RotationTable = -10, 0, 10\n\
             [Defaults]\n\
             Policy = hardware\n\
             Cpi = 7\n\
             [Hardware]\n\
             ScrollThreshold = 20\n\
             InvertY = true\n\
             [Persistence]\n\
             Directory = /tmp/pcfg\n\
             Save = immediate\n\
             [Sensor]\n\
             CpiAttribute = /sys/devices/fake/cpi\n",
        )
        .unwrap();

        assert_eq!(cfg.profile.mapping.cpi, CpiMapping::Offset200);
        assert_eq!(cfg.profile.mapping.scroll_divisor, ScrollDivisorMapping::Linear);
        assert_eq!(cfg.profile.limits.cpi_max, 40);
        assert_eq!(cfg.profile.limits.scroll_div_max, 8);
        assert_eq!(cfg.profile.limits.rotation.angles(), &[-10, 0, 10]);
        assert_eq!(cfg.profile.fixed.cpi_index, 7);
        assert_eq!(cfg.profile.fixed.rotation_index, 5);
        assert_eq!(
            cfg.profile.defaults,
            DefaultsPolicy::HardwareDescribed(HardwareDescription {
                scroll_threshold: Some(20),
                invert_y: Some(true),
                ..HardwareDescription::default()
            })
        );
        assert_eq!(cfg.storage_dir, PathBuf::from("/tmp/pcfg"));
        assert_eq!(cfg.save_policy, SavePolicy::Immediate);
        assert_eq!(cfg.cpi_attribute, Some(PathBuf::from("/sys/devices/fake/cpi")));

        let defaults = cfg.profile.defaults();
        assert_eq!(defaults.scroll_divisor_index, 3);
        assert!(defaults.scroll_v_reverse);
        /* Default rotation index 5 wraps on the three-entry table */
        assert_eq!(defaults.rotation_index, 2);
    }

    #[test]
    fn debounce_interval() {
        let cfg = DaemonConfig::parse("[Persistence]\nDebounceMs = 250\n").unwrap();
        assert_eq!(cfg.save_policy, SavePolicy::Debounced(Duration::from_millis(250)));
    }

    #[test]
    fn invalid_values_name_the_key() {
        let cases = [
            ("[Mapping]\nCpi = offset300\n", "mapping.cpi"),
            ("[Limits]\nCpiMax = 0\n", "limits.cpimax"),
            ("[Limits]\nScrollDivMax = 999\n", "limits.scrolldivmax"),
            ("[Limits]\nRotationTable = 10, 0\n", "RotationTable"),
            ("[Defaults]\nPolicy = magic\n", "Defaults.Policy"),
            ("[Hardware]\nInvertX = maybe\n", ""),
            ("[Persistence]\nSave = sometimes\n", "Persistence.Save"),
        ];
        for (text, key) in cases {
            match DaemonConfig::parse(text) {
                Err(ConfigError::InvalidSetting(msg)) => {
                    assert!(msg.contains(key), "{msg} should mention {key}")
                }
                /* Hardware keys are only read under the hardware policy */
                Ok(_) if key.is_empty() => {}
                other => panic!("unexpected result for {text:?}: {other:?}"),
            }
        }
    }

    #[test]
    fn hardware_flag_rejected_under_hardware_policy() {
        let text = "[Defaults]\nPolicy = hardware\n[Hardware]\nInvertX = maybe\n";
        let err = DaemonConfig::parse(text).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidSetting(msg) if msg.contains("hardware.invertx"))
        );
    }
}
