// sb-core/src/units.rs

use uom::si::f64::{Time as UomTime, Volume as UomVolume};

// Public canonical unit types (SI, f64)
pub type Time = UomTime;
pub type Volume = UomVolume;

#[inline]
pub fn liters(v: f64) -> Volume {
    use uom::si::volume::liter;
    Volume::new::<liter>(v)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn as_liters(v: Volume) -> f64 {
    use uom::si::volume::liter;
    v.get::<liter>()
}

#[inline]
pub fn as_seconds(v: Time) -> f64 {
    use uom::si::time::second;
    v.get::<second>()
}
