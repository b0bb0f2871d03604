//! SI quantity aliases and constructors for flows, pressures and concentrations.

use uom::si::f64::{
    MassDensity as UomMassDensity, Pressure as UomPressure, VolumeRate as UomVolumeRate,
};

// Public canonical unit types (SI, f64)
pub type MassConcentration = UomMassDensity;
pub type Pressure = UomPressure;
pub type VolumeRate = UomVolumeRate;

#[inline]
pub fn bar(v: f64) -> Pressure {
    use uom::si::pressure::bar;
    Pressure::new::<bar>(v)
}

#[inline]
pub fn m3ps(v: f64) -> VolumeRate {
    use uom::si::volume_rate::cubic_meter_per_second;
    VolumeRate::new::<cubic_meter_per_second>(v)
}

#[inline]
pub fn kg_per_m3(v: f64) -> MassConcentration {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    MassConcentration::new::<kilogram_per_cubic_meter>(v)
}

/// Milligrams per litre (numerically equal to grams per cubic metre).
#[inline]
pub fn mg_per_l(v: f64) -> MassConcentration {
    kg_per_m3(v * 1e-3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uom::si::mass_density::kilogram_per_cubic_meter;
    use uom::si::pressure::pascal;

    #[test]
    fn flow_is_si() {
        use uom::si::volume_rate::liter_per_second;
        assert!((m3ps(0.5).get::<liter_per_second>() - 500.0).abs() < 1e-9);
    }

    #[test]
    fn bar_and_mg_per_l_convert() {
        assert!((bar(1.0).get::<pascal>() - 1.0e5).abs() < 1e-9);
        assert!((mg_per_l(1000.0).get::<kilogram_per_cubic_meter>() - 1.0).abs() < 1e-12);
    }
}
