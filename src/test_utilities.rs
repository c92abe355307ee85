use gnss_rs::constellation::Constellation;
use gnss_rs::sv::SV;
use std::collections::HashMap;

use crate::ephemeris::Ephemeris;

/// Ephemerides with a nominal GPS-sized orbit and mild eccentricity,
/// enough to drive the propagator without a RINEX file.
pub fn synthetic_ephemerides(
    constellation: Constellation,
    prns: std::ops::RangeInclusive<u8>,
) -> HashMap<u8, Ephemeris> {
    prns.map(|prn| {
        let mut eph = Ephemeris::new(SV::new(constellation, prn));
        eph.sqrt_a = 5153.6;
        eph.ecc = 0.005;
        eph.is_valid = true;
        (prn, eph)
    })
    .collect()
}
