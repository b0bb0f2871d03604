//! Numeric input errors shared by the train crates.

use thiserror::Error;

pub type WtResult<T> = Result<T, WtError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WtError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Fraction out of range for {what}: {value} (expected 0..=1)")]
    FractionOutOfRange { what: &'static str, value: f64 },
}
