//! # Correction Factors
//!
//! Ambient temperature (FCT) and grouping (FCA) correction factors applied to
//! the base conduction capacity:
//!
//! ```text
//! Iz = Iz_base × FCT × FCA
//! ```
//!
//! Both tables are ordered `(key, factor)` slices resolved by the same
//! function, [`CorrectionTable::nearest`]: an untabulated key resolves to the
//! closest tabulated key, and an exact midpoint resolves to the lower key.
//! Each table accepts keys up to half a step beyond either end; anything
//! further out is never resolved silently.
//!
//! ## Example
//!
//! ```rust
//! use quadro_core::tables::{temperature_factor, grouping_factor, GroupingOverflow};
//!
//! let ft = temperature_factor(32.5).unwrap(); // midpoint, resolves to 30 °C
//! assert_eq!(ft.key, 30.0);
//! assert_eq!(ft.factor, 1.0);
//!
//! let fg = grouping_factor(25, GroupingOverflow::ClampToWorstCase).unwrap();
//! assert_eq!(fg.factor, 0.38);
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{CalcError, CalcResult};

use super::nbr_ref;

/// An ordered mapping from a numeric key to a correction factor.
#[derive(Debug, Clone, Copy)]
pub struct CorrectionTable {
    /// Table name used in errors and reports
    pub name: &'static str,
    /// Clause reference
    pub clause: &'static str,
    /// `(key, factor)` pairs with strictly ascending keys
    pub entries: &'static [(f64, f64)],
    /// How far beyond the first and last key a lookup still resolves
    pub tolerance: f64,
}

/// A factor together with the tabulated key it was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedFactor {
    /// Tabulated key actually used
    pub key: f64,
    /// Correction factor
    pub factor: f64,
}

impl CorrectionTable {
    /// Smallest tabulated key
    pub fn min_key(&self) -> f64 {
        self.entries[0].0
    }

    /// Largest tabulated key
    pub fn max_key(&self) -> f64 {
        self.entries[self.entries.len() - 1].0
    }

    /// Resolve `key` to the nearest tabulated key, ties toward the lower key.
    ///
    /// Returns `None` when `key` is NaN or lies more than `tolerance` outside
    /// `min_key..=max_key`.
    pub fn nearest(&self, key: f64) -> Option<ResolvedFactor> {
        if !(self.min_key() - self.tolerance..=self.max_key() + self.tolerance).contains(&key) {
            return None;
        }
        let mut best: Option<(f64, ResolvedFactor)> = None;
        for &(k, factor) in self.entries {
            let distance = (k - key).abs();
            // Strict comparison keeps the earlier (lower) key on ties
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, ResolvedFactor { key: k, factor }));
            }
        }
        best.map(|(_, resolved)| resolved)
    }

    /// The smallest (most penalizing) factor in the table.
    pub fn worst_case(&self) -> ResolvedFactor {
        let mut worst = ResolvedFactor {
            key: self.entries[0].0,
            factor: self.entries[0].1,
        };
        for &(key, factor) in self.entries {
            if factor < worst.factor {
                worst = ResolvedFactor { key, factor };
            }
        }
        worst
    }

    fn out_of_range(&self, key: f64) -> CalcError {
        CalcError::TableKeyOutOfRange {
            table: self.name.to_string(),
            key,
            min: self.min_key(),
            max: self.max_key(),
        }
    }
}

/// Ambient temperature factors, PVC insulation, ambient air (°C → FCT).
///
/// 10 to 60 °C follow Table 40. 65 and 70 °C extend the column toward the
/// 70 °C conductor limit: 65 °C is `√((70 − 65) / 40)` and 70 °C is held at
/// 0.25 so small loads still dimension.
pub const TEMPERATURE_FACTORS: CorrectionTable = CorrectionTable {
    name: "temperature",
    clause: nbr_ref::TEMPERATURE_FACTOR,
    tolerance: 2.5,
    entries: &[
        (10.0, 1.22),
        (15.0, 1.17),
        (20.0, 1.12),
        (25.0, 1.06),
        (30.0, 1.00),
        (35.0, 0.94),
        (40.0, 0.87),
        (45.0, 0.79),
        (50.0, 0.71),
        (55.0, 0.61),
        (60.0, 0.50),
        (65.0, 0.35),
        (70.0, 0.25),
    ],
};

/// Grouping factors for circuits bundled in one raceway (count → FCA).
///
/// Every integer count up to 20 is tabulated, so integer counts always hit an
/// exact key.
pub const GROUPING_FACTORS: CorrectionTable = CorrectionTable {
    name: "grouping",
    clause: nbr_ref::GROUPING_FACTOR,
    tolerance: 0.0,
    entries: &[
        (1.0, 1.00),
        (2.0, 0.80),
        (3.0, 0.70),
        (4.0, 0.65),
        (5.0, 0.60),
        (6.0, 0.57),
        (7.0, 0.54),
        (8.0, 0.52),
        (9.0, 0.50),
        (10.0, 0.50),
        (11.0, 0.50),
        (12.0, 0.45),
        (13.0, 0.45),
        (14.0, 0.45),
        (15.0, 0.45),
        (16.0, 0.41),
        (17.0, 0.41),
        (18.0, 0.41),
        (19.0, 0.41),
        (20.0, 0.38),
    ],
};

/// What to do when more circuits are grouped than the table covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GroupingOverflow {
    /// Fail the calculation with `TableKeyOutOfRange`
    #[default]
    Fail,
    /// Use the smallest tabulated factor
    ClampToWorstCase,
}

impl GroupingOverflow {
    /// Display name
    pub fn display_name(&self) -> &'static str {
        match self {
            GroupingOverflow::Fail => "Fail beyond table",
            GroupingOverflow::ClampToWorstCase => "Clamp to worst case",
        }
    }
}

impl std::fmt::Display for GroupingOverflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Temperature correction factor for an ambient temperature in °C.
pub fn temperature_factor(ambient_c: f64) -> CalcResult<ResolvedFactor> {
    TEMPERATURE_FACTORS
        .nearest(ambient_c)
        .ok_or_else(|| TEMPERATURE_FACTORS.out_of_range(ambient_c))
}

/// Grouping correction factor for `grouped_circuits` circuits in one raceway.
pub fn grouping_factor(grouped_circuits: u32, overflow: GroupingOverflow) -> CalcResult<ResolvedFactor> {
    let key = f64::from(grouped_circuits);
    if let Some(resolved) = GROUPING_FACTORS.nearest(key) {
        return Ok(resolved);
    }
    match overflow {
        GroupingOverflow::ClampToWorstCase if key > GROUPING_FACTORS.max_key() => {
            let worst = GROUPING_FACTORS.worst_case();
            warn!(
                grouped_circuits,
                factor = worst.factor,
                "grouping count beyond table, clamped to worst-case factor"
            );
            Ok(worst)
        }
        _ => Err(GROUPING_FACTORS.out_of_range(key)),
    }
}
