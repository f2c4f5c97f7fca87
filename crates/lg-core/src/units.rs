//! SI quantities (`uom`, f64) and their constructors.

use uom::si::f64::{Acceleration as UomAcceleration, Length as UomLength, Mass as UomMass};

pub type Accel = UomAcceleration;
pub type Length = UomLength;
pub type Mass = UomMass;

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn kg(v: f64) -> Mass {
    use uom::si::mass::kilogram;
    Mass::new::<kilogram>(v)
}

#[inline]
pub fn mps2(v: f64) -> Accel {
    use uom::si::acceleration::meter_per_second_squared;
    Accel::new::<meter_per_second_squared>(v)
}

pub mod constants {
    use super::*;

    /// Standard gravity.
    pub const G0_MPS2: f64 = 9.806_65;

    #[inline]
    pub fn g0() -> Accel {
        mps2(G0_MPS2)
    }
}
