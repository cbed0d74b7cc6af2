//! # quadro_core - NBR 5410 Circuit Dimensioning Engine
//!
//! `quadro_core` computes minimum room loads for a dwelling, aggregates them
//! into suggested circuits, and dimensions individual low-voltage circuits
//! (breaker rating and conductor section) per the Brazilian installation
//! standard NBR 5410. Every input, result and error is JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions that take input and return results
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types with per-field messages
//! - **Justified Results**: Every result records the table keys and factors used
//!
//! ## Quick Start
//!
//! ```rust
//! use quadro_core::calculations::dimensioning::{dimension_circuit, CircuitInput, DesignPolicy};
//!
//! let input = CircuitInput::new(1500.0, 220.0);
//! let result = dimension_circuit(&input, &DesignPolicy::default()).unwrap();
//!
//! assert_eq!(result.breaker_rating_a, 10.0);
//! assert_eq!(result.conductor_section_mm2, 1.5);
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - Room loads, circuit dimensioning, aggregation
//! - [`tables`] - Breaker ratings, conduction capacities, correction factors
//! - [`project`] - Project container, metadata, and settings
//! - [`errors`] - Structured error types
//! - [`file_io`] - File operations with atomic saves and locking

pub mod calculations;
pub mod errors;
#[cfg(not(target_arch = "wasm32"))]
pub mod file_io;
pub mod project;
pub mod tables;

pub use errors::{CalcError, CalcResult, ErrorKind};
#[cfg(not(target_arch = "wasm32"))]
pub use file_io::{load_project, save_project, FileLock};
pub use project::{Project, ProjectMetadata, ProjectSettings};
