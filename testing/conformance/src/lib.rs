//! Conformance harness for the query layer: a randomized schema fixture,
//! seeded per-variant node generators, and the behavioral properties every
//! registered variant must satisfy.
#![warn(unreachable_pub)]

pub mod config;
pub mod fixture;
pub mod generate;
pub mod properties;
pub mod rng;

pub use config::HarnessConfig;
pub use fixture::SchemaFixture;
pub use generate::{AlternateForm, NodeGenerator, generator_for};
pub use properties::{Property, PropertyViolation, VariantReport, run_all, run_variant};
pub use rng::Randomness;

use glacier_core::schema::SchemaError;
use thiserror::Error as ThisError;

///
/// HarnessError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum HarnessError {
    #[error("invalid harness configuration: {message}")]
    Config { message: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("no generator is registered for '{type_id}'")]
    UnknownVariant { type_id: String },

    #[error(transparent)]
    Violation(#[from] PropertyViolation),

    #[error("variant '{type_id}' panicked during its run")]
    Panicked { type_id: String },
}
