use gnss_rs::constellation::Constellation;
use std::path::Path;

use crate::beidou::BeidouB1Provider;
use crate::config::GlobalConfig;
use crate::constants::{BEIDOU_B1I_HZ, GALILEO_E1_HZ, GLONASS_L1_HZ, GPS_L1_HZ};
use crate::error::Error;
use crate::galileo::GalileoE1Provider;
use crate::glonass::GlonassL1Provider;
use crate::gps::GpsL1Provider;
use crate::types::{IQSample, SatelliteInfo};

const PI: f64 = std::f64::consts::PI;

/// Capability set of a constellation signal provider.
///
/// Lifecycle: `configure`, then `load_ephemeris`, then any number of
/// `generate_chunk` calls. `set_frequency_offset` may be called in any state.
pub trait ConstellationProvider {
    fn generate_chunk(&mut self, buffer: &mut [IQSample], time_now: f64) -> Result<(), Error>;
    fn load_ephemeris(&mut self, path: &Path) -> Result<(), Error>;
    fn set_frequency_offset(&mut self, offset_hz: f64);
    fn configure(&mut self, config: &GlobalConfig);
    fn carrier_frequency(&self) -> f64;
    fn constellation(&self) -> Constellation;
    fn active_satellites(&self) -> Vec<SatelliteInfo>;
    fn is_ready(&self) -> bool;
}

/// Single factory over all four supported constellations.
pub fn create_provider(
    constellation: Constellation,
) -> Result<Box<dyn ConstellationProvider>, Error> {
    match constellation {
        Constellation::GPS => Ok(Box::new(GpsL1Provider::new())),
        Constellation::Galileo => Ok(Box::new(GalileoE1Provider::new())),
        Constellation::BeiDou => Ok(Box::new(BeidouB1Provider::new())),
        Constellation::Glonass => Ok(Box::new(GlonassL1Provider::new())),
        other => Err(Error::UnsupportedConstellation(other)),
    }
}

pub fn carrier_frequency_hz(constellation: Constellation) -> Result<f64, Error> {
    match constellation {
        Constellation::GPS => Ok(GPS_L1_HZ),
        Constellation::Galileo => Ok(GALILEO_E1_HZ),
        Constellation::BeiDou => Ok(BEIDOU_B1I_HZ),
        Constellation::Glonass => Ok(GLONASS_L1_HZ),
        other => Err(Error::UnsupportedConstellation(other)),
    }
}

/// Saturating int16 accumulation through a 32-bit intermediate.
pub(crate) fn accumulate(dst: &mut IQSample, add: IQSample) {
    let i = dst.re as i32 + add.re as i32;
    let q = dst.im as i32 + add.im as i32;
    dst.re = i.clamp(-32768, 32767) as i16;
    dst.im = q.clamp(-32768, 32767) as i16;
}

/// Deterministic per-PRN starting phase. Spreading the initial phases keeps
/// the summed chunk from collapsing to zero whenever chip signs cancel;
/// coherent mode starts every carrier at zero phase instead.
pub(crate) fn initial_carrier_phase(prn: u8, coherent: bool) -> f64 {
    if coherent {
        return 0.0;
    }
    (prn as f64 * 0.618_033_988_749_895).fract() * 2.0 * PI
}

/// Absolute sample index of `time_now` relative to the provider's first
/// generated sample. Deriving per-sample time from this integer keeps any
/// chunk partition of the stream bit-identical.
pub(crate) fn sample_base(time_base: f64, time_now: f64, sample_rate_hz: f64) -> u64 {
    ((time_now - time_base) * sample_rate_hz).round().max(0.0) as u64
}
