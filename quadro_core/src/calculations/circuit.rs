//! # Circuit Records
//!
//! A [`Circuit`] pairs a stable identifier with its input and the outcome of
//! the last dimensioning pass. The outcome is all-or-nothing: it is pending,
//! fully dimensioned, or failed, and any edit to the input resets it to
//! pending.
//!
//! [`CircuitDraft`] is the raw, string-typed form a user interface collects.
//! Parsing it reports every missing, non-numeric or unsupported field at once.
//!
//! ## Example
//!
//! ```rust
//! use quadro_core::calculations::circuit::{Circuit, CircuitDraft};
//! use quadro_core::calculations::dimensioning::DesignPolicy;
//!
//! let draft = CircuitDraft {
//!     category: "lighting".into(),
//!     power: "1500".into(),
//!     voltage: "220".into(),
//!     installation_method: "b1".into(),
//!     loaded_conductors: "2".into(),
//!     ambient_temperature: "30".into(),
//!     grouped_circuits: "1".into(),
//!     ..Default::default()
//! };
//!
//! let mut circuit = Circuit::new(draft.parse().unwrap());
//! circuit.dimension(&DesignPolicy::default());
//! assert_eq!(circuit.result().unwrap().breaker_rating_a, 10.0);
//!
//! circuit.edit(|input| input.power_w = 3000.0);
//! assert!(circuit.result().is_none());
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{CalcError, CalcResult, FieldErrors};
use crate::tables::InstallationMethod;

use super::dimensioning::{
    ambient_temperature_error, dimension_circuit, grouped_circuits_error, loaded_conductors_error, power_error,
    voltage_error, CircuitCategory, CircuitInput, DesignPolicy, DimensioningResult,
};

/// Outcome of the last dimensioning pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "state", content = "value")]
pub enum CircuitStatus {
    /// Not dimensioned since the last edit
    #[default]
    Pending,
    /// Every derived value is populated
    Dimensioned(DimensioningResult),
    /// Validation or calculation failed; no derived values
    Failed(CalcError),
}

/// A circuit as stored in a caller's collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Stable identifier
    pub id: Uuid,

    input: CircuitInput,

    #[serde(default)]
    status: CircuitStatus,
}

impl Circuit {
    /// Create a pending circuit with a fresh identifier.
    pub fn new(input: CircuitInput) -> Self {
        Circuit {
            id: Uuid::new_v4(),
            input,
            status: CircuitStatus::Pending,
        }
    }

    /// Circuit parameters
    pub fn input(&self) -> &CircuitInput {
        &self.input
    }

    /// Outcome of the last dimensioning pass
    pub fn status(&self) -> &CircuitStatus {
        &self.status
    }

    /// Display label: the name if set, otherwise the category
    pub fn label(&self) -> String {
        match &self.input.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => self.input.category.display_name().to_string(),
        }
    }

    /// Replace the input. Clears any previous outcome.
    pub fn set_input(&mut self, input: CircuitInput) {
        self.input = input;
        self.status = CircuitStatus::Pending;
    }

    /// Modify the input in place. Clears any previous outcome.
    pub fn edit(&mut self, f: impl FnOnce(&mut CircuitInput)) {
        f(&mut self.input);
        self.status = CircuitStatus::Pending;
    }

    /// Run the dimensioning pipeline and store its outcome.
    pub fn dimension(&mut self, policy: &DesignPolicy) -> &CircuitStatus {
        self.status = match dimension_circuit(&self.input, policy) {
            Ok(result) => CircuitStatus::Dimensioned(result),
            Err(err) => CircuitStatus::Failed(err),
        };
        &self.status
    }

    /// Derived values, if the last pass succeeded
    pub fn result(&self) -> Option<&DimensioningResult> {
        match &self.status {
            CircuitStatus::Dimensioned(result) => Some(result),
            _ => None,
        }
    }

    /// Error of the last pass, if it failed
    pub fn error(&self) -> Option<&CalcError> {
        match &self.status {
            CircuitStatus::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Per-field messages to attach to form inputs
    pub fn field_errors(&self) -> FieldErrors {
        self.error().and_then(CalcError::field_errors).unwrap_or_default()
    }
}

/// Raw circuit form fields, as typed by a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitDraft {
    /// Optional label; blank means unnamed
    pub name: String,
    /// Category code or alias ("lighting", "tug", "chuveiro", ...)
    pub category: String,
    /// Declared power in W
    pub power: String,
    /// Nominal voltage in V
    pub voltage: String,
    /// Installation method code (A1, A2, B1, B2, C, D)
    pub installation_method: String,
    /// 2 or 3
    pub loaded_conductors: String,
    /// Ambient temperature in °C
    pub ambient_temperature: String,
    /// Circuits sharing the raceway
    pub grouped_circuits: String,
    /// Optional number of points served
    pub points: String,
}

fn required<'a>(field: &str, raw: &'a str, errors: &mut FieldErrors) -> Option<&'a str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        errors.insert(field.to_string(), "Required".to_string());
        None
    } else {
        Some(trimmed)
    }
}

/// Keep `value` only if `check` accepts it, recording the message otherwise.
fn checked<T: Copy>(
    field: &str,
    value: Option<T>,
    check: impl Fn(T) -> Option<String>,
    errors: &mut FieldErrors,
) -> Option<T> {
    let value = value?;
    match check(value) {
        Some(message) => {
            errors.insert(field.to_string(), message);
            None
        }
        None => Some(value),
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, raw: &str, kind: &str, errors: &mut FieldErrors) -> Option<T> {
    let value = required(field, raw, errors)?;
    // Accept a decimal comma ("2,5")
    match value.replace(',', ".").parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.insert(field.to_string(), format!("'{value}' is not {kind}"));
            None
        }
    }
}

impl CircuitDraft {
    /// Coerce and check every field.
    ///
    /// Each field is range-checked as soon as it coerces, so missing,
    /// malformed and out-of-domain fields are all reported in one
    /// `ValidationFailed`, keyed by the [`CircuitInput`] field name.
    pub fn parse(&self) -> CalcResult<CircuitInput> {
        let mut errors = FieldErrors::new();

        let category = required("category", &self.category, &mut errors).and_then(|raw| {
            raw.parse::<CircuitCategory>()
                .map_err(|msg| errors.insert("category".into(), msg))
                .ok()
        });
        let installation_method =
            required("installation_method", &self.installation_method, &mut errors).and_then(|raw| {
                raw.parse::<InstallationMethod>()
                    .map_err(|msg| errors.insert("installation_method".into(), msg))
                    .ok()
            });
        let power_w = checked(
            "power_w",
            parse_field::<f64>("power_w", &self.power, "a number", &mut errors),
            power_error,
            &mut errors,
        );
        let voltage_v = checked(
            "voltage_v",
            parse_field::<f64>("voltage_v", &self.voltage, "a number", &mut errors),
            voltage_error,
            &mut errors,
        );
        let loaded_conductors = checked(
            "loaded_conductors",
            parse_field::<u8>("loaded_conductors", &self.loaded_conductors, "a whole number", &mut errors),
            loaded_conductors_error,
            &mut errors,
        );
        let ambient_temperature_c = checked(
            "ambient_temperature_c",
            parse_field::<f64>("ambient_temperature_c", &self.ambient_temperature, "a number", &mut errors),
            ambient_temperature_error,
            &mut errors,
        );
        let grouped_circuits = checked(
            "grouped_circuits",
            parse_field::<u32>("grouped_circuits", &self.grouped_circuits, "a whole number", &mut errors),
            grouped_circuits_error,
            &mut errors,
        );
        let points = if self.points.trim().is_empty() {
            None
        } else {
            parse_field::<u32>("points", &self.points, "a whole number", &mut errors)
        };
        let name = Some(self.name.trim().to_string()).filter(|n| !n.is_empty());

        match (
            category,
            installation_method,
            power_w,
            voltage_v,
            loaded_conductors,
            ambient_temperature_c,
            grouped_circuits,
        ) {
            (
                Some(category),
                Some(installation_method),
                Some(power_w),
                Some(voltage_v),
                Some(loaded_conductors),
                Some(ambient_temperature_c),
                Some(grouped_circuits),
            ) => {
                let input = CircuitInput {
                    name,
                    category,
                    power_w,
                    voltage_v,
                    installation_method,
                    loaded_conductors,
                    ambient_temperature_c,
                    grouped_circuits,
                    points,
                };
                CalcError::from_field_errors(errors)?;
                Ok(input)
            }
            _ => Err(CalcError::ValidationFailed { errors }),
        }
    }
}
