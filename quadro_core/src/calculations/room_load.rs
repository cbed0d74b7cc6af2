//! # Room Load Calculation
//!
//! Minimum lighting and general-use outlet (TUG) loads for one room per
//! NBR 5410 9.5.2, derived from area, perimeter and room category.
//!
//! ## Rules
//!
//! ```text
//! Lighting:  100 VA up to 6 m², + 60 VA per additional 4 m² or fraction
//! Wet room:  points = max(3, ceil(P / 3.5)); 600 VA for the first 3, 100 VA after
//! General:   points = max(1, ceil(P / 5));   100 VA each
//! Total:     lighting + outlets + dedicated equipment (TUE)
//! ```
//!
//! All loads are apparent power (VA); no power factor is applied here.
//!
//! ## Example
//!
//! ```rust
//! use quadro_core::calculations::room_load::{compute_room_load, RoomCategory};
//!
//! let kitchen = compute_room_load(12.0, 14.0, RoomCategory::Wet, 4400.0).unwrap();
//! assert_eq!(kitchen.lighting_va, 220.0);  // 100 + 2 × 60
//! assert_eq!(kitchen.outlet_points, 4);     // ceil(14 / 3.5)
//! assert_eq!(kitchen.outlet_va, 1900.0);    // 3 × 600 + 100
//! assert_eq!(kitchen.total_va, 6520.0);
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{CalcError, CalcResult, FieldErrors};

/// Lighting allowance covering the first 6 m²
pub const LIGHTING_BASE_VA: f64 = 100.0;
/// Area covered by the base lighting allowance (m²)
pub const LIGHTING_BASE_AREA_M2: f64 = 6.0;
/// Lighting increment per additional step of area
pub const LIGHTING_STEP_VA: f64 = 60.0;
/// Area step for lighting increments (m²)
pub const LIGHTING_STEP_AREA_M2: f64 = 4.0;

/// Perimeter per outlet point in wet rooms (m)
pub const WET_OUTLET_SPACING_M: f64 = 3.5;
/// Mandatory outlet points in wet rooms
pub const WET_MIN_OUTLET_POINTS: u32 = 3;
/// Load of each of the first three wet-room outlets
pub const WET_HEAVY_OUTLET_VA: f64 = 600.0;
/// Perimeter per outlet point in general rooms (m)
pub const GENERAL_OUTLET_SPACING_M: f64 = 5.0;
/// Mandatory outlet points in general rooms
pub const GENERAL_MIN_OUTLET_POINTS: u32 = 1;
/// Load of a standard outlet point
pub const STANDARD_OUTLET_VA: f64 = 100.0;

/// Room category for outlet rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoomCategory {
    /// Living rooms, bedrooms, corridors
    #[default]
    #[serde(alias = "geral")]
    General,
    /// Bathrooms, kitchens, laundry areas
    #[serde(alias = "molhado")]
    Wet,
}

impl RoomCategory {
    /// All room categories for UI selection
    pub const ALL: [RoomCategory; 2] = [RoomCategory::General, RoomCategory::Wet];

    /// Display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            RoomCategory::General => "General",
            RoomCategory::Wet => "Wet (bathroom, kitchen, laundry)",
        }
    }
}

impl std::fmt::Display for RoomCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for RoomCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" | "geral" => Ok(RoomCategory::General),
            "wet" | "molhado" => Ok(RoomCategory::Wet),
            other => Err(format!("Unknown room category '{}' (expected general or wet)", other)),
        }
    }
}

/// Input parameters for one room.
///
/// ## JSON Example
///
/// ```json
/// {
///   "name": "Kitchen",
///   "area_m2": 12.0,
///   "perimeter_m": 14.0,
///   "category": "wet",
///   "appliance_va": 4400.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomInput {
    /// User label for this room
    pub name: String,

    /// Floor area in m²
    pub area_m2: f64,

    /// Perimeter in m
    pub perimeter_m: f64,

    /// Room category (general or wet)
    pub category: RoomCategory,

    /// Dedicated equipment load (TUE) in VA
    #[serde(default)]
    pub appliance_va: f64,
}

impl RoomInput {
    /// Validate input parameters, collecting every offending field.
    pub fn validate(&self) -> CalcResult<()> {
        let mut errors = FieldErrors::new();
        if !self.area_m2.is_finite() || self.area_m2 <= 0.0 {
            errors.insert("area_m2".into(), "Area must be a positive number".into());
        }
        if !self.perimeter_m.is_finite() || self.perimeter_m <= 0.0 {
            errors.insert("perimeter_m".into(), "Perimeter must be a positive number".into());
        }
        if !self.appliance_va.is_finite() || self.appliance_va < 0.0 {
            errors.insert("appliance_va".into(), "Appliance load cannot be negative".into());
        }
        CalcError::from_field_errors(errors)
    }

    /// Validate and compute the room's minimum loads.
    pub fn load(&self) -> CalcResult<RoomLoad> {
        self.validate()?;
        compute_room_load(self.area_m2, self.perimeter_m, self.category, self.appliance_va)
    }
}

/// A room as stored in a caller's collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Stable identifier
    pub id: Uuid,

    /// Room parameters
    #[serde(flatten)]
    pub input: RoomInput,
}

impl Room {
    /// Wrap an input with a fresh identifier.
    pub fn new(input: RoomInput) -> Self {
        Room {
            id: Uuid::new_v4(),
            input,
        }
    }

    /// Room name
    pub fn name(&self) -> &str {
        &self.input.name
    }

    /// Validate and compute the room's minimum loads.
    pub fn load(&self) -> CalcResult<RoomLoad> {
        self.input.load()
    }
}

/// Minimum loads for one room.
///
/// ## JSON Example
///
/// ```json
/// {
///   "lighting_va": 220.0,
///   "lighting_points": 1,
///   "outlet_va": 1900.0,
///   "outlet_points": 4,
///   "appliance_va": 4400.0,
///   "total_va": 6520.0
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomLoad {
    /// Minimum lighting load (VA)
    pub lighting_va: f64,
    /// Lighting points (one central point per room)
    pub lighting_points: u32,
    /// Minimum general-outlet load (VA)
    pub outlet_va: f64,
    /// Minimum general-outlet points
    pub outlet_points: u32,
    /// Dedicated equipment load (VA)
    pub appliance_va: f64,
    /// lighting + outlets + appliance (VA)
    pub total_va: f64,
}

/// Minimum lighting load in VA for a floor area in m².
pub fn lighting_load_va(area_m2: f64) -> f64 {
    if area_m2 <= LIGHTING_BASE_AREA_M2 {
        LIGHTING_BASE_VA
    } else {
        let steps = ((area_m2 - LIGHTING_BASE_AREA_M2) / LIGHTING_STEP_AREA_M2).ceil();
        LIGHTING_BASE_VA + LIGHTING_STEP_VA * steps
    }
}

/// Minimum outlet points for a perimeter in m.
pub fn outlet_points(perimeter_m: f64, category: RoomCategory) -> u32 {
    let (spacing, minimum) = match category {
        RoomCategory::Wet => (WET_OUTLET_SPACING_M, WET_MIN_OUTLET_POINTS),
        RoomCategory::General => (GENERAL_OUTLET_SPACING_M, GENERAL_MIN_OUTLET_POINTS),
    };
    ((perimeter_m / spacing).ceil() as u32).max(minimum)
}

/// Minimum outlet load in VA for a number of outlet points.
pub fn outlet_load_va(points: u32, category: RoomCategory) -> f64 {
    match category {
        RoomCategory::Wet => {
            let heavy = points.min(WET_MIN_OUTLET_POINTS);
            let standard = points.saturating_sub(WET_MIN_OUTLET_POINTS);
            f64::from(heavy) * WET_HEAVY_OUTLET_VA + f64::from(standard) * STANDARD_OUTLET_VA
        }
        RoomCategory::General => f64::from(points) * STANDARD_OUTLET_VA,
    }
}

/// Compute minimum lighting and outlet loads for one room.
///
/// # Arguments
///
/// * `area_m2` - Floor area
/// * `perimeter_m` - Room perimeter
/// * `category` - General or wet room
/// * `appliance_va` - Dedicated equipment load
///
/// # Returns
///
/// * `Ok(RoomLoad)` - Loads and point counts
/// * `Err(CalcError::ValidationFailed)` - A value is negative, NaN or infinite
pub fn compute_room_load(
    area_m2: f64,
    perimeter_m: f64,
    category: RoomCategory,
    appliance_va: f64,
) -> CalcResult<RoomLoad> {
    let mut errors = FieldErrors::new();
    for (field, value) in [
        ("area_m2", area_m2),
        ("perimeter_m", perimeter_m),
        ("appliance_va", appliance_va),
    ] {
        if !value.is_finite() || value < 0.0 {
            errors.insert(field.to_string(), format!("Malformed value {value}"));
        }
    }
    CalcError::from_field_errors(errors)?;

    let lighting_va = lighting_load_va(area_m2);
    let points = outlet_points(perimeter_m, category);
    let outlet_va = outlet_load_va(points, category);

    Ok(RoomLoad {
        lighting_va,
        lighting_points: 1,
        outlet_va,
        outlet_points: points,
        appliance_va,
        total_va: lighting_va + outlet_va + appliance_va,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lighting_base_allowance() {
        for area in [0.5, 3.0, 5.99, 6.0] {
            assert_eq!(lighting_load_va(area), 100.0);
        }
    }

    #[test]
    fn test_lighting_boundaries() {
        assert_eq!(lighting_load_va(6.0001), 160.0);
        assert_eq!(lighting_load_va(6.1), 160.0);
        assert_eq!(lighting_load_va(10.0), 160.0);
        assert_eq!(lighting_load_va(10.0001), 220.0);
        assert_eq!(lighting_load_va(10.01), 220.0);
        assert_eq!(lighting_load_va(14.0), 220.0);
    }

    #[test]
    fn test_lighting_monotonic_in_area() {
        let mut previous = 0.0;
        let mut area = 0.1;
        while area < 80.0 {
            let va = lighting_load_va(area);
            assert!(va >= previous, "lighting dropped at {area}");
            previous = va;
            area += 0.05;
        }
    }

    #[test]
    fn test_wet_room_outlets() {
        let zero = compute_room_load(4.0, 0.0, RoomCategory::Wet, 0.0).unwrap();
        assert_eq!(zero.outlet_points, 3);
        assert_eq!(zero.outlet_va, 1800.0);

        let exact = compute_room_load(4.0, 10.5, RoomCategory::Wet, 0.0).unwrap();
        assert_eq!(exact.outlet_points, 3);
        assert_eq!(exact.outlet_va, 1800.0);

        let over = compute_room_load(4.0, 10.6, RoomCategory::Wet, 0.0).unwrap();
        assert_eq!(over.outlet_points, 4);
        assert_eq!(over.outlet_va, 1900.0);
    }

    #[test]
    fn test_general_room_outlets() {
        let zero = compute_room_load(4.0, 0.0, RoomCategory::General, 0.0).unwrap();
        assert_eq!(zero.outlet_points, 1);
        assert_eq!(zero.outlet_va, 100.0);

        let exact = compute_room_load(4.0, 5.0, RoomCategory::General, 0.0).unwrap();
        assert_eq!(exact.outlet_points, 1);
        assert_eq!(exact.outlet_va, 100.0);

        let over = compute_room_load(4.0, 5.1, RoomCategory::General, 0.0).unwrap();
        assert_eq!(over.outlet_points, 2);
        assert_eq!(over.outlet_va, 200.0);
    }

    #[test]
    fn test_outlets_monotonic_in_perimeter() {
        for category in RoomCategory::ALL {
            let mut previous = (0, 0.0);
            let mut perimeter = 0.0;
            while perimeter < 60.0 {
                let points = outlet_points(perimeter, category);
                let va = outlet_load_va(points, category);
                assert!(points >= previous.0 && va >= previous.1);
                previous = (points, va);
                perimeter += 0.1;
            }
        }
    }

    #[test]
    fn test_total_includes_appliance() {
        let load = compute_room_load(9.0, 12.0, RoomCategory::General, 1500.0).unwrap();
        // 160 + 3 × 100 + 1500
        assert_eq!(load.total_va, 1960.0);
        assert_eq!(load.lighting_points, 1);
    }

    #[test]
    fn test_malformed_values_rejected_together() {
        let err = compute_room_load(f64::NAN, -1.0, RoomCategory::General, 0.0).unwrap_err();
        let fields = err.field_errors().unwrap();
        assert!(fields.contains_key("area_m2"));
        assert!(fields.contains_key("perimeter_m"));
    }

    #[test]
    fn test_room_input_requires_positive_dimensions() {
        let input = RoomInput {
            name: "Hall".into(),
            area_m2: 0.0,
            perimeter_m: 0.0,
            category: RoomCategory::General,
            appliance_va: -10.0,
        };
        let fields = input.load().unwrap_err().field_errors().unwrap();
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn test_category_aliases() {
        let parsed: RoomCategory = serde_json::from_str("\"molhado\"").unwrap();
        assert_eq!(parsed, RoomCategory::Wet);
        assert_eq!("geral".parse::<RoomCategory>(), Ok(RoomCategory::General));
    }

    #[test]
    fn test_room_serialization_is_flat() {
        let room = Room::new(RoomInput {
            name: "Bedroom".into(),
            area_m2: 11.0,
            perimeter_m: 13.4,
            category: RoomCategory::General,
            appliance_va: 0.0,
        });
        let json = serde_json::to_string(&room).unwrap();
        assert!(json.contains("\"area_m2\":11.0"));
        let roundtrip: Room = serde_json::from_str(&json).unwrap();
        assert_eq!(room, roundtrip);
    }
}
