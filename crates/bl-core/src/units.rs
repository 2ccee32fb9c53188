// bl-core/src/units.rs

use uom::si::f64::{
    Acceleration as UomAcceleration, ElectricCurrent as UomElectricCurrent,
    ElectricPotential as UomElectricPotential, ElectricalResistance as UomElectricalResistance,
    Force as UomForce, Mass as UomMass,
};

// Public canonical unit types (SI, f64)
pub type Accel = UomAcceleration;
pub type Current = UomElectricCurrent;
pub type Voltage = UomElectricPotential;
pub type Resistance = UomElectricalResistance;
pub type Force = UomForce;
pub type Mass = UomMass;

#[inline]
pub fn kg(v: f64) -> Mass {
    use uom::si::mass::kilogram;
    Mass::new::<kilogram>(v)
}

#[inline]
pub fn volts(v: f64) -> Voltage {
    use uom::si::electric_potential::volt;
    Voltage::new::<volt>(v)
}

#[inline]
pub fn ohms(v: f64) -> Resistance {
    use uom::si::electrical_resistance::ohm;
    Resistance::new::<ohm>(v)
}

#[inline]
pub fn as_amps(i: Current) -> f64 {
    use uom::si::electric_current::ampere;
    i.get::<ampere>()
}

#[inline]
pub fn as_newtons(f: Force) -> f64 {
    use uom::si::force::newton;
    f.get::<newton>()
}

pub mod constants {
    use super::*;

    /// Gravitational acceleration used by every scenario (m/s²).
    pub const G0_MPS2: f64 = 9.81;

    #[inline]
    pub fn g0() -> Accel {
        use uom::si::acceleration::meter_per_second_squared;
        Accel::new::<meter_per_second_squared>(G0_MPS2)
    }

    /// Weight of a mass under standard gravity.
    #[inline]
    pub fn weight(mass: Mass) -> Force {
        mass * g0()
    }
}
