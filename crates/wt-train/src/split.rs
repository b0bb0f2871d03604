//! Recovery/waste/recycle split rules for treatment-process edges.

use std::collections::HashMap;

use thiserror::Error;
use wt_core::{Real, ensure_fraction, mg_per_l, sums_to_one};
use wt_graph::{InletConstraints, ProcessAttrs, TrainGraph};

use crate::resolve::{Resolution, UnitKey};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SplitError {
    #[error("Edge {edge}: {what} = {value} is not a fraction in 0..=1")]
    OutOfRange {
        edge: String,
        what: &'static str,
        value: Real,
    },

    #[error("Edge {edge}: recovery + waste + recycle = {sum} (tolerance {tolerance})")]
    SumViolation {
        edge: String,
        sum: Real,
        tolerance: Real,
    },
}

/// The three volume fractions leaving a process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitFactors {
    pub recovery: Real,
    pub waste: Real,
    pub recycle: Real,
}

impl SplitFactors {
    /// Split for a given recovery and optional fraction of waste to recycle.
    pub fn from_recovery(recovery: Real, recycle_request: Option<Real>) -> Self {
        let rejected = 1.0 - recovery;
        match recycle_request {
            None => Self {
                recovery,
                waste: rejected,
                recycle: 0.0,
            },
            Some(r) => {
                let recycle = rejected * r;
                Self {
                    recovery,
                    waste: rejected - recycle,
                    recycle,
                }
            }
        }
    }

    pub fn sum(&self) -> Real {
        self.recovery + self.waste + self.recycle
    }

    /// Fail unless every factor is a fraction and they sum to one.
    pub fn check(&self, edge: &str, tolerance: Real) -> Result<(), SplitError> {
        for (what, value) in [
            ("recovery_factor", self.recovery),
            ("waste_factor", self.waste),
            ("recycle_factor", self.recycle),
        ] {
            // Rounding can leave e.g. -1e-17 on a fully recovered stream.
            if !value.is_finite() || value < -tolerance || value > 1.0 + tolerance {
                return Err(SplitError::OutOfRange {
                    edge: edge.to_string(),
                    what,
                    value,
                });
            }
        }
        if !sums_to_one(&[self.recovery, self.waste, self.recycle], tolerance) {
            return Err(SplitError::SumViolation {
                edge: edge.to_string(),
                sum: self.sum(),
                tolerance,
            });
        }
        Ok(())
    }
}

/// Static inlet-quality ceilings per unit-process type.
#[derive(Debug, Clone)]
pub struct InletConstraintCatalog {
    entries: HashMap<String, InletConstraints>,
}

impl Default for InletConstraintCatalog {
    fn default() -> Self {
        let mut catalog = Self::empty();
        catalog.insert(
            "anaerobic_mbr_mec",
            InletConstraints {
                bod_max: Some(mg_per_l(2000.0)),
                toc_max: None,
            },
        );
        catalog.insert(
            "ro_deep",
            InletConstraints {
                bod_max: None,
                toc_max: Some(mg_per_l(3.0)),
            },
        );
        catalog.insert(
            "uv_aop",
            InletConstraints {
                bod_max: None,
                toc_max: Some(mg_per_l(10.0)),
            },
        );
        catalog
    }
}

impl InletConstraintCatalog {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register (or replace) the ceilings for a table key.
    pub fn insert(&mut self, unit: impl Into<String>, constraints: InletConstraints) {
        self.entries.insert(unit.into(), constraints);
    }

    pub fn get(&self, key: UnitKey<'_>) -> Option<&InletConstraints> {
        self.entries.get(key.as_str())
    }
}

/// Assigns split factors and inlet ceilings to treatment edges.
#[derive(Debug, Clone, Copy)]
pub struct SplitRuleEngine<'a> {
    catalog: &'a InletConstraintCatalog,
    tolerance: Real,
    default_recovery: Real,
}

impl<'a> SplitRuleEngine<'a> {
    pub fn new(catalog: &'a InletConstraintCatalog, tolerance: Real, default_recovery: Real) -> Self {
        Self {
            catalog,
            tolerance,
            default_recovery,
        }
    }

    /// Stamp split factors on one process given its recovery resolution.
    ///
    /// A `Calculated` recovery leaves all three factors to the solver and
    /// returns `Ok(None)`. A `Missing` recovery falls back to the process's
    /// nominal recovery, then to the configured default.
    pub fn apply(
        &self,
        edge: &str,
        key: UnitKey<'_>,
        attrs: &mut ProcessAttrs,
        recovery: Resolution,
    ) -> Result<Option<SplitFactors>, SplitError> {
        if let Some(constraints) = self.catalog.get(key) {
            attrs.constraints = *constraints;
        }

        let recovery = match recovery {
            Resolution::Fixed(r) => r,
            Resolution::Calculated => {
                attrs.recovery_factor = None;
                attrs.waste_factor = None;
                attrs.recycle_factor = None;
                return Ok(None);
            }
            Resolution::Missing => attrs.nominal_recovery.unwrap_or(self.default_recovery),
        };
        let out_of_range = |what: &'static str, value: Real| SplitError::OutOfRange {
            edge: edge.to_string(),
            what,
            value,
        };
        ensure_fraction(recovery, "recovery_factor").map_err(|_| out_of_range("recovery_factor", recovery))?;
        if let Some(r) = attrs.recycle_request {
            ensure_fraction(r, "recycle_request").map_err(|_| out_of_range("recycle_request", r))?;
        }

        let factors = SplitFactors::from_recovery(recovery, attrs.recycle_request);
        factors.check(edge, self.tolerance)?;

        attrs.recovery_factor = Some(factors.recovery);
        attrs.waste_factor = Some(factors.waste);
        attrs.recycle_factor = Some(factors.recycle);
        Ok(Some(factors))
    }
}

/// Re-check the sum invariant on every process whose factors are all fixed.
///
/// Catches factors written by collaborators after the build.
pub fn verify_splits(graph: &TrainGraph, tolerance: Real) -> Result<(), SplitError> {
    for view in graph.edges() {
        let Some(attrs) = view.edge.as_process() else {
            continue;
        };
        if let (Some(recovery), Some(waste), Some(recycle)) =
            (attrs.recovery_factor, attrs.waste_factor, attrs.recycle_factor)
        {
            SplitFactors {
                recovery,
                waste,
                recycle,
            }
            .check(&view.edge.name, tolerance)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wt_core::DEFAULT_SPLIT_TOLERANCE;

    fn engine(catalog: &InletConstraintCatalog) -> SplitRuleEngine<'_> {
        SplitRuleEngine::new(catalog, DEFAULT_SPLIT_TOLERANCE, 1.0)
    }

    #[test]
    fn no_recycle_sends_rejects_to_waste() {
        let f = SplitFactors::from_recovery(0.8, None);
        assert!((f.waste - 0.2).abs() < 1e-12);
        assert_eq!(f.recycle, 0.0);
    }

    #[test]
    fn recycle_takes_share_of_waste() {
        let f = SplitFactors::from_recovery(0.8, Some(0.5));
        assert!((f.recycle - 0.1).abs() < 1e-12);
        assert!((f.waste - 0.1).abs() < 1e-12);
    }

    #[test]
    fn bad_sum_is_reported_with_edge() {
        let f = SplitFactors {
            recovery: 0.8,
            waste: 0.3,
            recycle: 0.0,
        };
        let err = f.check("mf1", DEFAULT_SPLIT_TOLERANCE).unwrap_err();
        assert!(matches!(err, SplitError::SumViolation { ref edge, .. } if edge == "mf1"));
        assert!(err.to_string().contains("mf1"));
    }

    #[test]
    fn missing_recovery_uses_nominal_then_default() {
        let catalog = InletConstraintCatalog::empty();
        let e = engine(&catalog);

        let mut with_nominal = ProcessAttrs::new("x").with_nominal_recovery(0.6);
        e.apply("a", UnitKey::canonical("x"), &mut with_nominal, Resolution::Missing)
            .unwrap();
        assert_eq!(with_nominal.recovery_factor, Some(0.6));

        let mut bare = ProcessAttrs::new("x");
        e.apply("b", UnitKey::canonical("x"), &mut bare, Resolution::Missing)
            .unwrap();
        assert_eq!(bare.recovery_factor, Some(1.0));
        assert_eq!(bare.waste_factor, Some(0.0));
    }

    #[test]
    fn calculated_recovery_leaves_factors_unset() {
        let catalog = InletConstraintCatalog::empty();
        let mut attrs = ProcessAttrs::new("x")
            .with_nominal_recovery(0.6)
            .with_recycle_request(0.2);
        let out = engine(&catalog)
            .apply("a", UnitKey::canonical("x"), &mut attrs, Resolution::Calculated)
            .unwrap();
        assert_eq!(out, None);
        assert!(!attrs.split_fixed());
        assert_eq!(attrs.recycle_request, Some(0.2));
    }

    #[test]
    fn out_of_range_recycle_rejected() {
        let catalog = InletConstraintCatalog::empty();
        let mut attrs = ProcessAttrs::new("x").with_recycle_request(1.5);
        let err = engine(&catalog)
            .apply("a", UnitKey::canonical("x"), &mut attrs, Resolution::Fixed(0.5))
            .unwrap_err();
        assert!(matches!(err, SplitError::OutOfRange { what: "recycle_request", .. }));
    }

    #[test]
    fn tolerance_is_configurable() {
        let loose = 1e-4;
        let catalog = InletConstraintCatalog::empty();
        let lenient = SplitRuleEngine::new(&catalog, loose, 1.0);

        let mut attrs = ProcessAttrs::new("x");
        lenient
            .apply("mf1", UnitKey::canonical("x"), &mut attrs, Resolution::Fixed(0.8))
            .unwrap();
        // A collaborator nudges the waste fraction after the build.
        attrs.waste_factor = attrs.waste_factor.map(|w| w + 1e-6);

        let mut graph = TrainGraph::new();
        graph.add_unit_process("mf1", attrs).unwrap();
        assert!(verify_splits(&graph, loose).is_ok());
        assert!(matches!(
            verify_splits(&graph, DEFAULT_SPLIT_TOLERANCE),
            Err(SplitError::SumViolation { ref edge, .. }) if edge == "mf1"
        ));

        let nudged = SplitFactors {
            recovery: 0.8,
            waste: 0.2 + 1e-6,
            recycle: 0.0,
        };
        assert!(nudged.check("mf1", loose).is_ok());
        assert!(nudged.check("mf1", DEFAULT_SPLIT_TOLERANCE).is_err());
    }

    #[test]
    fn inlet_ceilings_stamped_from_catalog() {
        let catalog = InletConstraintCatalog::default();
        let mut attrs = ProcessAttrs::new("reverse_osmosis");
        engine(&catalog)
            .apply(
                "ro1",
                UnitKey::canonical("reverse_osmosis"),
                &mut attrs,
                Resolution::Fixed(0.5),
            )
            .unwrap();
        assert_eq!(attrs.constraints.toc_max, Some(mg_per_l(3.0)));
        assert_eq!(attrs.constraints.bod_max, None);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use wt_core::DEFAULT_SPLIT_TOLERANCE;

    proptest! {
        #[test]
        fn factors_always_sum_to_one(
            recovery in 0.0_f64..=1.0,
            recycle in prop::option::of(0.0_f64..=1.0),
        ) {
            let f = SplitFactors::from_recovery(recovery, recycle);
            prop_assert!(f.check("p", DEFAULT_SPLIT_TOLERANCE).is_ok());
            prop_assert!(f.waste >= -DEFAULT_SPLIT_TOLERANCE);
            prop_assert!(f.recycle >= 0.0);
        }
    }
}
