/* Unit mapping: stored indices to physical values (CPI, scroll divisor,
 * rotation degrees) and the nearest-angle reverse lookup.
 *
 * Two formula sets exist in the field, so both the CPI and the scroll
 * divisor mapping are explicit strategies picked at construction time. */

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/* Rotation angles shipped with the default build, in degrees. */
pub const DEFAULT_ROTATION_ANGLES: [i16; 15] = [
    -70, -60, -50, -40, -30, -20, -10, 0, 10, 20, 30, 40, 50, 60, 70,
];

/* Linear CPI mapping `100 * index + offset`. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CpiMapping {
    /* `(index + 1) * 100` */
    #[default]
    Offset100,
    /* `(index + 2) * 100` */
    Offset200,
}

impl CpiMapping {
    pub fn value(self, index: u8) -> u32 {
        let offset = match self {
            Self::Offset100 => 100,
            Self::Offset200 => 200,
        };
        100 * u32::from(index) + offset
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "offset100" => Some(Self::Offset100),
            "offset200" => Some(Self::Offset200),
            _ => None,
        }
    }
}

/* Scroll divisor mapping. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScrollDivisorMapping {
    /* `2 * index^2 + 10` */
    #[default]
    Quadratic,
    /* `5 * (index + 1)` */
    Linear,
}

impl ScrollDivisorMapping {
    pub fn value(self, index: u8) -> u32 {
        let i = u32::from(index);
        match self {
            Self::Quadratic => 2 * i * i + 10,
            Self::Linear => 5 * (i + 1),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "quadratic" => Some(Self::Quadratic),
            "linear" => Some(Self::Linear),
            _ => None,
        }
    }
}

/* The pair of formulas a build uses. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnitMapping {
    pub cpi: CpiMapping,
    pub scroll_divisor: ScrollDivisorMapping,
}

impl UnitMapping {
    pub fn cpi_value(&self, index: u8) -> u32 {
        self.cpi.value(index)
    }

    pub fn scroll_divisor_value(&self, index: u8) -> u32 {
        self.scroll_divisor.value(index)
    }

    /* Index in `0..max` whose divisor is closest to `target`. First minimum wins. */
    pub fn nearest_scroll_divisor_index(&self, target: u32, max: u8) -> u8 {
        let mut best = 0u8;
        let mut best_diff = u32::MAX;
        for index in 0..max {
            let diff = self.scroll_divisor_value(index).abs_diff(target);
            if diff < best_diff {
                best = index;
                best_diff = diff;
            }
        }
        best
    }
}

/* Fixed, strictly ascending table of signed rotation angles. */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationTable {
    angles: Vec<i16>,
}

impl Default for RotationTable {
    fn default() -> Self {
        Self {
            angles: DEFAULT_ROTATION_ANGLES.to_vec(),
        }
    }
}

impl RotationTable {
    pub fn new(angles: Vec<i16>) -> Result<Self, ConfigError> {
        if angles.is_empty() || angles.len() > usize::from(u8::MAX) {
            return Err(ConfigError::InvalidSetting(format!(
                "RotationTable: expected 1..=255 entries, got {}",
                angles.len()
            )));
        }
        if angles.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::InvalidSetting(
                "RotationTable: angles must be strictly ascending".to_string(),
            ));
        }
        Ok(Self { angles })
    }

    /* Number of entries; always at least one. */
    /* Number of table entries; never zero. */
    pub fn entry_count(&self) -> u8 {
        self.angles.len() as u8
    }

    pub fn angles(&self) -> &[i16] {
        &self.angles
    }

    /* Angle at `index`, or 0 when the index is outside the table. */
    pub fn degrees(&self, index: u8) -> i16 {
        self.angles.get(usize::from(index)).copied().unwrap_or(0)
    }

    /* Index of the entry closest to `degrees`; ties go to the lower index. */
    pub fn nearest_index(&self, degrees: i16) -> u8 {
        let mut best = 0usize;
        let mut best_diff = u32::MAX;
        for (index, &angle) in self.angles.iter().enumerate() {
            let diff = (i32::from(angle) - i32::from(degrees)).unsigned_abs();
            if diff < best_diff {
                best = index;
                best_diff = diff;
            }
        }
        best as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpi_offset_profiles() {
        assert_eq!(CpiMapping::Offset100.value(0), 100);
        assert_eq!(CpiMapping::Offset100.value(5), 600);
        assert_eq!(CpiMapping::Offset100.value(31), 3200);
        assert_eq!(CpiMapping::Offset200.value(0), 200);
        assert_eq!(CpiMapping::Offset200.value(31), 3300);
    }

    #[test]
    fn scroll_divisor_profiles() {
        assert_eq!(ScrollDivisorMapping::Quadratic.value(0), 10);
        assert_eq!(ScrollDivisorMapping::Quadratic.value(5), 60);
        assert_eq!(ScrollDivisorMapping::Quadratic.value(15), 460);
        assert_eq!(ScrollDivisorMapping::Linear.value(0), 5);
        assert_eq!(ScrollDivisorMapping::Linear.value(5), 30);
        assert_eq!(ScrollDivisorMapping::Linear.value(15), 80);
    }

    #[test]
    fn scroll_divisor_quadratic_does_not_overflow() {
        assert_eq!(ScrollDivisorMapping::Quadratic.value(u8::MAX), 2 * 255 * 255 + 10);
    }

    #[test]
    fn mapping_names() {
        assert_eq!(CpiMapping::from_name("offset200"), Some(CpiMapping::Offset200));
        assert_eq!(ScrollDivisorMapping::from_name("linear"), Some(ScrollDivisorMapping::Linear));
        assert!(CpiMapping::from_name("offset300").is_none());
        assert!(ScrollDivisorMapping::from_name("cubic").is_none());
    }

    #[test]
    fn rotation_degrees_lookup() {
        let table = RotationTable::default();
        assert_eq!(table.entry_count(), 15);
        assert_eq!(table.degrees(0), -70);
        assert_eq!(table.degrees(5), -20);
        assert_eq!(table.degrees(7), 0);
        assert_eq!(table.degrees(14), 70);
    }

    #[test]
    fn rotation_degrees_out_of_range_is_zero() {
        let table = RotationTable::default();
        assert_eq!(table.degrees(15), 0);
        assert_eq!(table.degrees(u8::MAX), 0);
    }

    #[test]
    fn nearest_rotation_exact_and_closest() {
        let table = RotationTable::default();
        assert_eq!(table.nearest_index(0), 7);
        assert_eq!(table.nearest_index(-70), 0);
        assert_eq!(table.nearest_index(22), 9);
        assert_eq!(table.nearest_index(-500), 0);
        assert_eq!(table.nearest_index(500), 14);
    }

    #[test]
    fn nearest_rotation_tie_picks_lower_index() {
        let table = RotationTable::default();
        /* 15 sits between 10 (index 8) and 20 (index 9) */
        assert_eq!(table.nearest_index(15), 8);
        assert_eq!(table.degrees(table.nearest_index(-5)), -10);
    }

    #[test]
    fn nearest_rotation_round_trips_through_degrees() {
        let table = RotationTable::default();
        for d in -100i16..=100 {
            let got = table.degrees(table.nearest_index(d));
            let best = table
                .angles()
                .iter()
                .map(|&a| (i32::from(a) - i32::from(d)).abs())
                .min()
                .unwrap();
            assert_eq!((i32::from(got) - i32::from(d)).abs(), best, "degrees {d}");
        }
    }

    #[test]
    fn rotation_table_validation() {
        assert!(RotationTable::new(Vec::new()).is_err());
        assert!(RotationTable::new(vec![0, 0]).is_err());
        assert!(RotationTable::new(vec![10, -10]).is_err());
        let table = RotationTable::new(vec![-10, 0, 10]).expect("valid table");
        assert_eq!(table.entry_count(), 3);
    }

    #[test]
    fn rotation_table_entry_count_limits() {
        let widest = RotationTable::new((0..255).collect()).expect("255 entries fit");
        assert_eq!(widest.entry_count(), 255);
        assert_eq!(RotationTable::new(vec![42]).expect("single entry").entry_count(), 1);
        assert!(RotationTable::new((0..256).collect()).is_err());
    }

    #[test]
    fn nearest_scroll_divisor_index_per_profile() {
        let quadratic = UnitMapping::default();
        assert_eq!(quadratic.nearest_scroll_divisor_index(60, 16), 5);
        assert_eq!(quadratic.nearest_scroll_divisor_index(0, 16), 0);
        assert_eq!(quadratic.nearest_scroll_divisor_index(10_000, 16), 15);

        let linear = UnitMapping {
            cpi: CpiMapping::Offset200,
            scroll_divisor: ScrollDivisorMapping::Linear,
        };
        assert_eq!(linear.nearest_scroll_divisor_index(30, 16), 5);
        /* 32 is between 30 (index 5) and 35 (index 6) but closer to 30 */
        assert_eq!(linear.nearest_scroll_divisor_index(32, 16), 5);
        assert_eq!(linear.nearest_scroll_divisor_index(27, 16), 4);
        assert_eq!(linear.nearest_scroll_divisor_index(2, 16), 0);

        /* 15 is 3 away from both 12 (index 1) and 18 (index 2) */
        assert_eq!(quadratic.nearest_scroll_divisor_index(15, 16), 1);
    }
}
