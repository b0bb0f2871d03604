//! wt-core: stable foundation for the water-treatment train crates.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (Real + tolerances + fraction helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{WtError, WtResult};
pub use numeric::*;
pub use units::*;
