//! # Circuit Dimensioning
//!
//! Selects the protective breaker and the conductor section for one circuit
//! per the overload coordination rule of NBR 5410 5.3.4.1:
//!
//! ```text
//! Ib ≤ Id ≤ In ≤ Iz
//! ```
//!
//! ## Pipeline
//!
//! 1. Operating current: `Ib = P / (V × pf)` for 2 loaded conductors,
//!    `Ib = P / (V × √3 × pf)` for 3
//! 2. Design current: `Id = Ib × margin`
//! 3. Breaker: smallest standard rating `In ≥ Id`
//! 4. Correction factors: FCT (ambient temperature) and FCA (grouping)
//! 5. Conductor: smallest section with `Iz = Iz_base × FCT × FCA ≥ max(Id, In)`
//!
//! A final cross-check re-verifies the chain on the unrounded values. If it
//! fails the reference tables are inconsistent, which is reported as
//! [`CalcError::ConsistencyCheckFailed`] rather than as a user error.
//!
//! ## Example
//!
//! ```rust
//! use quadro_core::calculations::dimensioning::{dimension_circuit, CircuitInput, DesignPolicy};
//! use quadro_core::tables::InstallationMethod;
//!
//! let input = CircuitInput::new(1500.0, 220.0)
//!     .with_installation(InstallationMethod::B1, 2)
//!     .with_environment(30.0, 1);
//!
//! let result = dimension_circuit(&input, &DesignPolicy::default()).unwrap();
//!
//! assert!((result.operating_current_a - 6.82).abs() < 0.01);
//! assert_eq!(result.breaker_rating_a, 10.0);
//! assert_eq!(result.conductor_section_mm2, 1.5);
//! println!("{}", result.format_report());
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CalcError, CalcResult, FieldErrors};
use crate::tables::breakers::largest_rating_a;
use crate::tables::{
    grouping_factor, nbr_ref, select_breaker, temperature_factor, GroupingOverflow, InstallationMethod,
    ResolvedFactor, GROUPING_FACTORS, TEMPERATURE_FACTORS,
};

/// Nominal voltages accepted by the engine (V). 380 V is the three-phase line voltage.
pub const ALLOWED_VOLTAGES_V: [f64; 3] = [127.0, 220.0, 380.0];

/// Supported loaded-conductor counts.
pub const ALLOWED_LOADED_CONDUCTORS: [u8; 2] = [2, 3];

/// Circuit category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CircuitCategory {
    /// Lighting circuit
    #[serde(alias = "iluminacao")]
    Lighting,
    /// General-use outlets (TUG)
    #[default]
    #[serde(alias = "tomadas")]
    GeneralOutlet,
    /// Dedicated equipment (TUE): showers, air conditioning, ovens
    #[serde(alias = "tues", alias = "chuveiro", alias = "ar_condicionado")]
    DedicatedEquipment,
}

impl CircuitCategory {
    /// Minimum conductor section in mm² (NBR 5410 6.2.6.1.1)
    pub fn minimum_section_mm2(&self) -> f64 {
        match self {
            CircuitCategory::Lighting => 1.5,
            CircuitCategory::GeneralOutlet | CircuitCategory::DedicatedEquipment => 2.5,
        }
    }

    /// Display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            CircuitCategory::Lighting => "Lighting",
            CircuitCategory::GeneralOutlet => "General outlets (TUG)",
            CircuitCategory::DedicatedEquipment => "Dedicated equipment (TUE)",
        }
    }
}

impl std::fmt::Display for CircuitCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for CircuitCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "lighting" | "iluminacao" => Ok(CircuitCategory::Lighting),
            "general_outlet" | "tug" | "tomadas" => Ok(CircuitCategory::GeneralOutlet),
            "dedicated_equipment" | "tue" | "tues" | "chuveiro" | "ar_condicionado" => {
                Ok(CircuitCategory::DedicatedEquipment)
            }
            other => Err(format!(
                "Unknown circuit category '{}' (expected lighting, general-outlet or dedicated-equipment)",
                other
            )),
        }
    }
}

/// Policy constants for the dimensioning pipeline.
///
/// Historical calculators disagree on the power factor (1.0 vs 0.92) and on
/// the design margin (Id = Ib vs Id = 1.25 × Ib). Both are explicit here.
///
/// ## JSON Example
///
/// ```json
/// {
///   "power_factor": 1.0,
///   "design_margin": 1.0,
///   "grouping_overflow": "Fail",
///   "enforce_minimum_sections": false
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesignPolicy {
    /// Assumed power factor, in (0, 1]
    pub power_factor: f64,

    /// Multiplier from operating current to design current, ≥ 1
    pub design_margin: f64,

    /// Behaviour when more circuits are grouped than the table covers
    pub grouping_overflow: GroupingOverflow,

    /// Reject sections below the category minimum (1.5 mm² lighting, 2.5 mm² otherwise)
    #[serde(default)]
    pub enforce_minimum_sections: bool,
}

impl Default for DesignPolicy {
    fn default() -> Self {
        Self {
            power_factor: 1.0,
            design_margin: 1.0,
            grouping_overflow: GroupingOverflow::Fail,
            enforce_minimum_sections: false,
        }
    }
}

impl DesignPolicy {
    /// Power factor 0.92, 25% margin, clamped grouping, minimum sections enforced
    pub fn conservative() -> Self {
        Self {
            power_factor: 0.92,
            design_margin: 1.25,
            grouping_overflow: GroupingOverflow::ClampToWorstCase,
            enforce_minimum_sections: true,
        }
    }

    /// Set power factor
    pub fn with_power_factor(mut self, power_factor: f64) -> Self {
        self.power_factor = power_factor;
        self
    }

    /// Set design margin
    pub fn with_design_margin(mut self, design_margin: f64) -> Self {
        self.design_margin = design_margin;
        self
    }

    /// Set grouping overflow behaviour
    pub fn with_grouping_overflow(mut self, overflow: GroupingOverflow) -> Self {
        self.grouping_overflow = overflow;
        self
    }

    /// Enable or disable minimum section enforcement
    pub fn with_minimum_sections(mut self, enforce: bool) -> Self {
        self.enforce_minimum_sections = enforce;
        self
    }

    fn collect_errors(&self, errors: &mut FieldErrors) {
        if !(self.power_factor > 0.0 && self.power_factor <= 1.0) {
            errors.insert(
                "policy.power_factor".into(),
                format!("Power factor must be in (0, 1], got {}", self.power_factor),
            );
        }
        if !(self.design_margin.is_finite() && self.design_margin >= 1.0) {
            errors.insert(
                "policy.design_margin".into(),
                format!("Design margin must be at least 1.0, got {}", self.design_margin),
            );
        }
    }

    /// Validate policy constants.
    pub fn validate(&self) -> CalcResult<()> {
        let mut errors = FieldErrors::new();
        self.collect_errors(&mut errors);
        CalcError::from_field_errors(errors)
    }
}

/// Input parameters for one circuit.
///
/// ## JSON Example
///
/// ```json
/// {
///   "name": "Shower",
///   "category": "dedicated_equipment",
///   "power_w": 5400.0,
///   "voltage_v": 220.0,
///   "installation_method": "b1",
///   "loaded_conductors": 2,
///   "ambient_temperature_c": 30.0,
///   "grouped_circuits": 1
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitInput {
    /// Optional user label (e.g., "Kitchen outlets")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Circuit category
    #[serde(default)]
    pub category: CircuitCategory,

    /// Declared active power in W
    pub power_w: f64,

    /// Nominal voltage in V (see [`ALLOWED_VOLTAGES_V`])
    pub voltage_v: f64,

    /// Reference installation method
    pub installation_method: InstallationMethod,

    /// Loaded conductors: 2 (phase-neutral or phase-phase) or 3 (three-phase)
    pub loaded_conductors: u8,

    /// Ambient temperature in °C
    pub ambient_temperature_c: f64,

    /// Circuits bundled in the same raceway, including this one
    pub grouped_circuits: u32,

    /// Number of points served (informational)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
}

impl CircuitInput {
    /// Circuit in B1 with 2 loaded conductors at 30 °C, not grouped.
    pub fn new(power_w: f64, voltage_v: f64) -> Self {
        Self {
            name: None,
            category: CircuitCategory::default(),
            power_w,
            voltage_v,
            installation_method: InstallationMethod::B1,
            loaded_conductors: 2,
            ambient_temperature_c: 30.0,
            grouped_circuits: 1,
            points: None,
        }
    }

    /// Set name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set category
    pub fn with_category(mut self, category: CircuitCategory) -> Self {
        self.category = category;
        self
    }

    /// Set installation method and loaded-conductor count
    pub fn with_installation(mut self, method: InstallationMethod, loaded_conductors: u8) -> Self {
        self.installation_method = method;
        self.loaded_conductors = loaded_conductors;
        self
    }

    /// Set ambient temperature and grouping count
    pub fn with_environment(mut self, ambient_temperature_c: f64, grouped_circuits: u32) -> Self {
        self.ambient_temperature_c = ambient_temperature_c;
        self.grouped_circuits = grouped_circuits;
        self
    }

    fn collect_errors(&self, errors: &mut FieldErrors) {
        let checks = [
            ("power_w", power_error(self.power_w)),
            ("voltage_v", voltage_error(self.voltage_v)),
            ("loaded_conductors", loaded_conductors_error(self.loaded_conductors)),
            ("ambient_temperature_c", ambient_temperature_error(self.ambient_temperature_c)),
            ("grouped_circuits", grouped_circuits_error(self.grouped_circuits)),
        ];
        for (field, message) in checks {
            if let Some(message) = message {
                errors.insert(field.into(), message);
            }
        }
    }

    /// Validate input parameters, collecting every offending field.
    pub fn validate(&self) -> CalcResult<()> {
        let mut errors = FieldErrors::new();
        self.collect_errors(&mut errors);
        CalcError::from_field_errors(errors)
    }
}

pub(crate) fn power_error(power_w: f64) -> Option<String> {
    (!power_w.is_finite() || power_w <= 0.0).then(|| "Power must be a positive number".to_string())
}

pub(crate) fn voltage_error(voltage_v: f64) -> Option<String> {
    (!ALLOWED_VOLTAGES_V.contains(&voltage_v))
        .then(|| format!("Unsupported voltage {voltage_v} V (expected 127, 220 or 380)"))
}

pub(crate) fn loaded_conductors_error(loaded_conductors: u8) -> Option<String> {
    (!ALLOWED_LOADED_CONDUCTORS.contains(&loaded_conductors))
        .then(|| format!("Unsupported loaded-conductor count {loaded_conductors} (expected 2 or 3)"))
}

pub(crate) fn ambient_temperature_error(ambient_temperature_c: f64) -> Option<String> {
    (!ambient_temperature_c.is_finite()).then(|| "Ambient temperature must be a number".to_string())
}

pub(crate) fn grouped_circuits_error(grouped_circuits: u32) -> Option<String> {
    (grouped_circuits < 1).then(|| "At least one circuit must be counted in the raceway".to_string())
}

/// Results from circuit dimensioning.
///
/// Values are unrounded; use [`DimensioningResult::rounded`] for display.
///
/// ## JSON Example
///
/// ```json
/// {
///   "operating_current_a": 6.818181818181818,
///   "design_current_a": 6.818181818181818,
///   "breaker_rating_a": 10.0,
///   "conductor_section_mm2": 1.5,
///   "corrected_capacity_a": 17.5,
///   "base_capacity_a": 17.5,
///   "temperature": { "key": 30.0, "factor": 1.0 },
///   "grouping": { "key": 1.0, "factor": 1.0 }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensioningResult {
    /// Operating current Ib (A)
    pub operating_current_a: f64,
    /// Design current Id (A)
    pub design_current_a: f64,
    /// Selected breaker rating In (A)
    pub breaker_rating_a: f64,
    /// Selected conductor section (mm²)
    pub conductor_section_mm2: f64,
    /// Corrected conduction capacity Iz (A)
    pub corrected_capacity_a: f64,
    /// Tabulated capacity of the selected section before correction (A)
    pub base_capacity_a: f64,
    /// Temperature factor and the tabulated key it came from
    pub temperature: ResolvedFactor,
    /// Grouping factor and the tabulated key it came from
    pub grouping: ResolvedFactor,
}

/// Round to 2 decimal places
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl DimensioningResult {
    /// Copy with every current rounded to 2 decimal places, for display.
    pub fn rounded(&self) -> Self {
        Self {
            operating_current_a: round2(self.operating_current_a),
            design_current_a: round2(self.design_current_a),
            corrected_capacity_a: round2(self.corrected_capacity_a),
            ..*self
        }
    }

    /// Check `Ib ≤ Id ≤ Iz`, `Id ≤ In` and `In ≤ Iz` on unrounded values.
    pub fn check_consistency(&self) -> CalcResult<()> {
        let checks = [
            ("Ib <= Id", self.operating_current_a <= self.design_current_a),
            ("Id <= Iz", self.design_current_a <= self.corrected_capacity_a),
            ("Id <= In", self.design_current_a <= self.breaker_rating_a),
            ("In <= Iz", self.breaker_rating_a <= self.corrected_capacity_a),
        ];
        match checks.iter().find(|(_, ok)| !ok) {
            Some((check, _)) => Err(CalcError::consistency(
                *check,
                format!(
                    "Ib={:.4} A, Id={:.4} A, In={} A, Iz={:.4} A",
                    self.operating_current_a,
                    self.design_current_a,
                    self.breaker_rating_a,
                    self.corrected_capacity_a
                ),
            )),
            None => Ok(()),
        }
    }

    /// Format as a multi-line string for reports
    pub fn format_report(&self) -> String {
        let r = self.rounded();
        format!(
            "Circuit Dimensioning\n\
             ================================================\n\
             Ib  (operating current)  = {:>8.2} A\n\
             Id  (design current)     = {:>8.2} A\n\
             In  (breaker)            = {:>8.0} A\n\
             S   (section)            = {:>8} mm²\n\
             FCT ({:>4} °C)            = {:>8.2}    {}\n\
             FCA ({:>2} circuits)        = {:>8.2}    {}\n\
             Iz  (base)               = {:>8.2} A  {}\n\
             Iz  (corrected)          = {:>8.2} A\n\
             ------------------------------------------------\n\
             Ib ≤ In ≤ Iz                            {}",
            r.operating_current_a,
            r.design_current_a,
            r.breaker_rating_a,
            r.conductor_section_mm2,
            r.temperature.key,
            r.temperature.factor,
            TEMPERATURE_FACTORS.clause,
            r.grouping.key,
            r.grouping.factor,
            GROUPING_FACTORS.clause,
            r.base_capacity_a,
            nbr_ref::CONDUCTION_CAPACITY,
            r.corrected_capacity_a,
            nbr_ref::OVERLOAD_PROTECTION,
        )
    }
}

/// Operating current Ib in amperes.
///
/// Single-phase (2 loaded conductors): `P / (V × pf)`.
/// Three-phase (3 loaded conductors): `P / (V × √3 × pf)`.
pub fn operating_current_a(power_w: f64, voltage_v: f64, loaded_conductors: u8, power_factor: f64) -> f64 {
    if loaded_conductors == 3 {
        power_w / (voltage_v * 3f64.sqrt() * power_factor)
    } else {
        power_w / (voltage_v * power_factor)
    }
}

/// Dimension one circuit.
///
/// # Arguments
///
/// * `input` - Circuit parameters
/// * `policy` - Power factor, design margin and table overflow behaviour
///
/// # Returns
///
/// * `Ok(DimensioningResult)` - Breaker and conductor selections
/// * `Err(CalcError::ValidationFailed)` - Every invalid input field, reported together
/// * `Err(CalcError::NoSuitableBreaker | NoSuitableConductor | TableKeyOutOfRange)` - No table entry fits
/// * `Err(CalcError::ConsistencyCheckFailed)` - Reference tables are inconsistent
pub fn dimension_circuit(input: &CircuitInput, policy: &DesignPolicy) -> CalcResult<DimensioningResult> {
    let mut errors = FieldErrors::new();
    input.collect_errors(&mut errors);
    policy.collect_errors(&mut errors);
    CalcError::from_field_errors(errors)?;

    // Step 1
    let ib = operating_current_a(
        input.power_w,
        input.voltage_v,
        input.loaded_conductors,
        policy.power_factor,
    );

    // Step 2
    let id = ib * policy.design_margin;
    if !(id.is_finite() && id > 0.0) {
        return Err(CalcError::calculation_failed(
            "design current",
            format!("Design current must be positive, got {id}"),
        ));
    }
    debug!(ib, id, "operating and design current");

    // Step 3
    let breaker = select_breaker(id).ok_or(CalcError::NoSuitableBreaker {
        design_current_a: id,
        largest_rating_a: largest_rating_a(),
    })?;
    debug!(breaker, "breaker selected");

    // Step 4
    let temperature = temperature_factor(input.ambient_temperature_c)?;
    let grouping = grouping_factor(input.grouped_circuits, policy.grouping_overflow)?;
    let correction = temperature.factor * grouping.factor;
    debug!(
        fct = temperature.factor,
        fca = grouping.factor,
        "correction factors resolved"
    );

    // Step 5
    let minimum_section = if policy.enforce_minimum_sections {
        input.category.minimum_section_mm2()
    } else {
        0.0
    };
    let mut largest_capacity = 0.0;
    let mut selected = None;
    for (section, base) in input.installation_method.capacities(input.loaded_conductors) {
        let corrected = base * correction;
        largest_capacity = corrected;
        if section >= minimum_section && corrected >= id && corrected >= breaker {
            selected = Some((section, base, corrected));
            break;
        }
    }
    let (section, base, corrected) = selected.ok_or_else(|| CalcError::NoSuitableConductor {
        required_a: id.max(breaker),
        method: input.installation_method.code().to_string(),
        loaded_conductors: input.loaded_conductors,
        largest_capacity_a: largest_capacity,
    })?;
    debug!(section, corrected, "conductor selected");

    let result = DimensioningResult {
        operating_current_a: ib,
        design_current_a: id,
        breaker_rating_a: breaker,
        conductor_section_mm2: section,
        corrected_capacity_a: corrected,
        base_capacity_a: base,
        temperature,
        grouping,
    };
    result.check_consistency()?;
    Ok(result)
}

/// Dimension several circuits independently.
///
/// Outcomes are returned in input order; one circuit's failure never
/// affects another.
pub fn dimension_batch(inputs: &[CircuitInput], policy: &DesignPolicy) -> Vec<CalcResult<DimensioningResult>> {
    inputs.iter().map(|input| dimension_circuit(input, policy)).collect()
}
