use gnss_rs::sv::SV;
use rustfft::num_complex::Complex;

/// One interleaved 16-bit I/Q output sample.
pub type IQSample = Complex<i16>;

#[derive(Debug, Clone, Copy)]
pub struct SatelliteInfo {
    pub sv: SV,
    pub frequency_hz: f64,
    pub power_dbm: f64,
    pub doppler_hz: f64,
    pub is_active: bool,
}
