//! Recovery and removal resolution against the reference tables.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};
use wt_core::{Real, bar};
use wt_graph::ProcessAttrs;
use wt_project::BuildConfig;

use crate::constituents::ConstituentSet;
use crate::tables::{Hit, RowSource, TableValue};
use crate::tables::{RecoveryTable, RemovalTable};

/// Display key of the reverse-osmosis unit.
pub const REVERSE_OSMOSIS: &str = "reverse_osmosis";
/// Key the reference tables use for reverse osmosis.
pub const RO_TABLE_KEY: &str = "ro_deep";

/// A unit-process key already mapped to the name the tables use.
///
/// Only [`UnitKey::canonical`] constructs one, so a key is renamed exactly
/// once no matter how many lookups use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitKey<'a>(&'a str);

impl<'a> UnitKey<'a> {
    pub fn canonical(raw: &'a str) -> Self {
        if raw == REVERSE_OSMOSIS {
            UnitKey(RO_TABLE_KEY)
        } else {
            UnitKey(raw)
        }
    }

    pub fn as_str(&self) -> &'a str {
        self.0
    }

    pub fn is_reverse_osmosis(&self) -> bool {
        self.0 == RO_TABLE_KEY
    }
}

/// Outcome of one table resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// Assign this fraction.
    Fixed(Real),
    /// Leave unassigned for the external solver.
    Calculated,
    /// No row, not even under the default case study.
    Missing,
}

impl From<Option<Hit>> for Resolution {
    fn from(hit: Option<Hit>) -> Self {
        match hit.map(|h| h.value) {
            Some(TableValue::Fixed(v)) => Resolution::Fixed(v),
            Some(TableValue::Calculated) => Resolution::Calculated,
            None => Resolution::Missing,
        }
    }
}

/// Removal fractions resolved for every active constituent of one process.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemovalResolution {
    pub fixed: BTreeMap<String, Real>,
    pub calculated: BTreeSet<String>,
    /// Constituents with no row at all; they carry the default fraction in `fixed`.
    pub defaulted: Vec<String>,
}

/// Resolves per-process configuration for a given case study.
///
/// The case study is always passed in; the resolver holds no selection state.
#[derive(Debug, Clone, Copy)]
pub struct AttributeResolver<'a> {
    recovery: &'a RecoveryTable,
    removal: &'a RemovalTable,
    config: &'a BuildConfig,
}

impl<'a> AttributeResolver<'a> {
    pub fn new(recovery: &'a RecoveryTable, removal: &'a RemovalTable, config: &'a BuildConfig) -> Self {
        Self {
            recovery,
            removal,
            config,
        }
    }

    /// Water recovery for a unit in a case study.
    pub fn recovery(&self, key: UnitKey<'_>, case_study: &str) -> Resolution {
        let hit = self.recovery.lookup(key.as_str(), case_study);
        if let Some(Hit {
            source: RowSource::Default,
            ..
        }) = hit
        {
            debug!(unit = key.as_str(), case_study, "recovery from default row");
        }
        hit.into()
    }

    /// Removal fraction of one constituent; a miss yields the configured default.
    pub fn removal(&self, key: UnitKey<'_>, case_study: &str, constituent: &str) -> Resolution {
        match self.removal_row(key, case_study, constituent) {
            Resolution::Missing => Resolution::Fixed(self.config.default_removal),
            other => other,
        }
    }

    /// Table lookup only; `Missing` is passed through.
    fn removal_row(&self, key: UnitKey<'_>, case_study: &str, constituent: &str) -> Resolution {
        let hit = self.removal.lookup(key.as_str(), case_study, constituent);
        if let Some(Hit {
            source: RowSource::Default,
            ..
        }) = hit
        {
            debug!(unit = key.as_str(), case_study, constituent, "removal from default row");
        }
        hit.into()
    }

    /// Removal fractions for every active constituent.
    pub fn removals(
        &self,
        key: UnitKey<'_>,
        case_study: &str,
        constituents: &ConstituentSet,
    ) -> RemovalResolution {
        let mut out = RemovalResolution::default();
        for constituent in constituents.iter() {
            match self.removal_row(key, case_study, constituent) {
                Resolution::Fixed(v) => {
                    out.fixed.insert(constituent.to_string(), v);
                }
                Resolution::Calculated => {
                    out.calculated.insert(constituent.to_string());
                }
                Resolution::Missing => {
                    out.fixed
                        .insert(constituent.to_string(), self.config.default_removal);
                    out.defaulted.push(constituent.to_string());
                }
            }
        }
        if !out.defaulted.is_empty() {
            warn!(
                unit = key.as_str(),
                constituents = ?out.defaulted,
                "no removal data; using default removal fraction"
            );
        }
        out
    }

    /// Fix `recovery_factor` when the table gives a number.
    ///
    /// Returns the resolution so the split engine can tell "calculated" from
    /// "missing".
    pub fn apply_recovery(&self, key: UnitKey<'_>, case_study: &str, attrs: &mut ProcessAttrs) -> Resolution {
        let resolution = self.recovery(key, case_study);
        if let Resolution::Fixed(v) = resolution {
            attrs.recovery_factor = Some(v);
        }
        resolution
    }

    /// Stamp removal fractions; "calculated" constituents are recorded but not fixed.
    pub fn apply_removal(
        &self,
        key: UnitKey<'_>,
        case_study: &str,
        constituents: &ConstituentSet,
        attrs: &mut ProcessAttrs,
    ) {
        let resolved = self.removals(key, case_study, constituents);
        // A constituent is either fixed or solver-owned, never both.
        for name in &resolved.calculated {
            attrs.removal_fractions.remove(name);
        }
        for name in resolved.fixed.keys() {
            attrs.calculated_removal.remove(name);
        }
        attrs.removal_fractions.extend(resolved.fixed);
        attrs.calculated_removal.extend(resolved.calculated);
    }

    /// Non-RO units get negligible outlet and waste pressure drops.
    pub fn apply_pressure_drops(&self, key: UnitKey<'_>, attrs: &mut ProcessAttrs) {
        if key.is_reverse_osmosis() {
            return;
        }
        let negligible = bar(self.config.negligible_pressure_drop_bar);
        attrs.pressure_drop.outlet = Some(negligible);
        attrs.pressure_drop.waste = Some(negligible);
    }
}
