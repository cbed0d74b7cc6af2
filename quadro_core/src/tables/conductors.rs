//! Conductor sections and conduction capacities.
//!
//! Base conduction capacity (Iz at 30 °C, before correction) for copper
//! conductors with PVC insulation, per NBR 5410 Table 36. Columns are indexed
//! by reference installation method and by the number of loaded conductors
//! (2 or 3); rows follow [`CONDUCTOR_SECTIONS_MM2`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Standard commercial cross-sections in mm², ascending.
pub const CONDUCTOR_SECTIONS_MM2: [f64; 16] = [
    1.5, 2.5, 4.0, 6.0, 10.0, 16.0, 25.0, 35.0, 50.0, 70.0, 95.0, 120.0, 150.0, 185.0, 240.0,
    300.0,
];

type CapacityColumn = [f64; 16];

// Two loaded conductors
const A1_2: CapacityColumn = [
    14.5, 19.5, 26.0, 34.0, 46.0, 61.0, 80.0, 99.0, 119.0, 151.0, 182.0, 210.0, 240.0, 273.0, 321.0,
    367.0,
];
const A2_2: CapacityColumn = [
    14.0, 18.5, 25.0, 32.0, 43.0, 57.0, 75.0, 92.0, 110.0, 139.0, 167.0, 192.0, 219.0, 248.0, 291.0,
    334.0,
];
const B1_2: CapacityColumn = [
    17.5, 24.0, 32.0, 41.0, 57.0, 76.0, 101.0, 125.0, 151.0, 192.0, 232.0, 269.0, 309.0, 353.0,
    415.0, 477.0,
];
const B2_2: CapacityColumn = [
    16.5, 23.0, 30.0, 38.0, 52.0, 69.0, 90.0, 111.0, 133.0, 168.0, 201.0, 232.0, 258.0, 294.0,
    344.0, 394.0,
];
const C_2: CapacityColumn = [
    19.5, 27.0, 36.0, 46.0, 63.0, 85.0, 112.0, 138.0, 168.0, 213.0, 258.0, 299.0, 344.0, 392.0,
    461.0, 530.0,
];
const D_2: CapacityColumn = [
    22.0, 29.0, 38.0, 47.0, 63.0, 81.0, 104.0, 125.0, 148.0, 183.0, 216.0, 246.0, 278.0, 312.0,
    361.0, 408.0,
];

// Three loaded conductors
const A1_3: CapacityColumn = [
    13.5, 18.0, 24.0, 31.0, 42.0, 56.0, 73.0, 89.0, 108.0, 136.0, 164.0, 188.0, 216.0, 245.0, 286.0,
    328.0,
];
const A2_3: CapacityColumn = [
    13.0, 17.5, 23.0, 29.0, 39.0, 52.0, 68.0, 83.0, 99.0, 125.0, 150.0, 172.0, 196.0, 223.0, 261.0,
    298.0,
];
const B1_3: CapacityColumn = [
    15.5, 21.0, 28.0, 36.0, 50.0, 68.0, 89.0, 110.0, 134.0, 171.0, 207.0, 239.0, 275.0, 314.0,
    370.0, 426.0,
];
const B2_3: CapacityColumn = [
    15.0, 20.0, 27.0, 34.0, 46.0, 62.0, 80.0, 99.0, 118.0, 149.0, 179.0, 206.0, 225.0, 255.0, 297.0,
    339.0,
];
const C_3: CapacityColumn = [
    17.5, 24.0, 32.0, 41.0, 57.0, 76.0, 96.0, 119.0, 144.0, 184.0, 223.0, 259.0, 299.0, 341.0,
    403.0, 464.0,
];
const D_3: CapacityColumn = [
    18.0, 24.0, 31.0, 39.0, 52.0, 67.0, 86.0, 103.0, 122.0, 151.0, 179.0, 203.0, 230.0, 258.0,
    297.0, 336.0,
];

/// Reference installation method per NBR 5410 Table 33.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InstallationMethod {
    /// Insulated conductors in conduit in a thermally insulating wall
    A1,
    /// Multicore cable in conduit in a thermally insulating wall
    A2,
    /// Insulated conductors in conduit in masonry
    #[default]
    B1,
    /// Multicore cable in conduit in masonry
    B2,
    /// Single or multicore cable fixed directly on a wall
    C,
    /// Multicore cable in conduit buried in the ground
    D,
}

impl InstallationMethod {
    /// All installation methods for UI selection (residential methods first)
    pub const ALL: [InstallationMethod; 6] = [
        InstallationMethod::B1,
        InstallationMethod::B2,
        InstallationMethod::A1,
        InstallationMethod::A2,
        InstallationMethod::C,
        InstallationMethod::D,
    ];

    /// Short code as used in the standard ("B1")
    pub fn code(&self) -> &'static str {
        match self {
            InstallationMethod::A1 => "A1",
            InstallationMethod::A2 => "A2",
            InstallationMethod::B1 => "B1",
            InstallationMethod::B2 => "B2",
            InstallationMethod::C => "C",
            InstallationMethod::D => "D",
        }
    }

    /// Display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            InstallationMethod::A1 => "A1 (conduit in insulated wall)",
            InstallationMethod::A2 => "A2 (multicore cable in insulated wall)",
            InstallationMethod::B1 => "B1 (conduit in masonry)",
            InstallationMethod::B2 => "B2 (multicore cable in conduit)",
            InstallationMethod::C => "C (cable on wall)",
            InstallationMethod::D => "D (buried conduit)",
        }
    }

    fn column(&self, loaded_conductors: u8) -> Option<&'static CapacityColumn> {
        match (self, loaded_conductors) {
            (InstallationMethod::A1, 2) => Some(&A1_2),
            (InstallationMethod::A2, 2) => Some(&A2_2),
            (InstallationMethod::B1, 2) => Some(&B1_2),
            (InstallationMethod::B2, 2) => Some(&B2_2),
            (InstallationMethod::C, 2) => Some(&C_2),
            (InstallationMethod::D, 2) => Some(&D_2),
            (InstallationMethod::A1, 3) => Some(&A1_3),
            (InstallationMethod::A2, 3) => Some(&A2_3),
            (InstallationMethod::B1, 3) => Some(&B1_3),
            (InstallationMethod::B2, 3) => Some(&B2_3),
            (InstallationMethod::C, 3) => Some(&C_3),
            (InstallationMethod::D, 3) => Some(&D_3),
            _ => None,
        }
    }

    /// Iterate `(section_mm2, base_capacity_a)` in ascending section order.
    ///
    /// Empty when `loaded_conductors` is not 2 or 3.
    pub fn capacities(&self, loaded_conductors: u8) -> impl Iterator<Item = (f64, f64)> {
        let column = self.column(loaded_conductors);
        (0..CONDUCTOR_SECTIONS_MM2.len())
            .filter_map(move |i| column.map(|c| (CONDUCTOR_SECTIONS_MM2[i], c[i])))
    }
}

impl fmt::Display for InstallationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for InstallationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A1" => Ok(InstallationMethod::A1),
            "A2" => Ok(InstallationMethod::A2),
            "B1" => Ok(InstallationMethod::B1),
            "B2" => Ok(InstallationMethod::B2),
            "C" => Ok(InstallationMethod::C),
            "D" => Ok(InstallationMethod::D),
            other => Err(format!(
                "Unsupported installation method '{}' (expected one of A1, A2, B1, B2, C, D)",
                other
            )),
        }
    }
}

/// Base capacity in amperes for one section, method and loaded-conductor count.
///
/// ```rust
/// use quadro_core::tables::{base_capacity_a, InstallationMethod};
///
/// assert_eq!(base_capacity_a(2.5, InstallationMethod::B1, 2), Some(24.0));
/// assert_eq!(base_capacity_a(3.0, InstallationMethod::B1, 2), None);
/// ```
pub fn base_capacity_a(section_mm2: f64, method: InstallationMethod, loaded_conductors: u8) -> Option<f64> {
    method
        .capacities(loaded_conductors)
        .find(|&(section, _)| section == section_mm2)
        .map(|(_, capacity)| capacity)
}
