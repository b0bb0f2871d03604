//! wt-train: attribute resolution and split rules for treatment trains.
//!
//! A build runs in four steps per unit process:
//! 1. Canonicalise the unit key (`reverse_osmosis` reads the `ro_deep` rows)
//! 2. Resolve recovery from the case study row, else the `"default"` row
//! 3. Derive recovery/waste/recycle factors and stamp inlet ceilings
//! 4. Resolve per-constituent removal and the negligible pressure drops
//!
//! Values marked `"calculated"` in the tables are left unset for the solver.

pub mod constituents;
pub mod error;
pub mod mass_balance;
pub mod pipeline;
pub mod resolve;
pub mod split;
pub mod tables;

pub use constituents::ConstituentSet;
pub use error::{TrainError, TrainResult};
pub use mass_balance::{BalanceError, ProcessOutlets, process_outlets, propagate};
pub use pipeline::{BuiltTrain, TrainBuilder};
pub use resolve::{AttributeResolver, RemovalResolution, Resolution, UnitKey};
pub use split::{InletConstraintCatalog, SplitError, SplitFactors, SplitRuleEngine, verify_splits};
pub use tables::{
    RecoveryRow, RecoveryTable, ReferenceTables, RemovalRow, RemovalTable, TableError, TableValue,
};
