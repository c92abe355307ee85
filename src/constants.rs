pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

// WGS-84 gravitational parameter and Earth rotation rate
pub const EARTH_MU: f64 = 3.986005e14;
pub const EARTH_ROTATION_RATE: f64 = 7.2921151467e-5;

// Nominal carrier frequencies
pub const GPS_L1_HZ: f64 = 1_575_420_000.0;
pub const GALILEO_E1_HZ: f64 = 1_575_420_000.0;
pub const BEIDOU_B1I_HZ: f64 = 1_561_098_000.0;
pub const GLONASS_L1_HZ: f64 = 1_602_000_000.0;
pub const GLONASS_FREQ_STEP_HZ: f64 = 562_500.0;

// Chipping rates
pub const GPS_CHIP_RATE_HZ: f64 = 1.023e6;
pub const GALILEO_CHIP_RATE_HZ: f64 = 1.023e6;
pub const BEIDOU_CHIP_RATE_HZ: f64 = 2.046e6;
pub const GLONASS_CHIP_RATE_HZ: f64 = 0.511e6;
pub const BOC_SUBCARRIER_HZ: f64 = 1.023e6;

// Spreading code lengths in chips
pub const GPS_CODE_LEN: usize = 1023;
pub const GALILEO_PRIMARY_LEN: usize = 4092;
pub const GALILEO_SECONDARY_LEN: usize = 25;
pub const BEIDOU_CODE_LEN: usize = 2046;
pub const GLONASS_CODE_LEN: usize = 511;

// Per-constellation baseband amplitudes for the int16 range
pub const GPS_AMPLITUDE: f64 = 1000.0;
pub const GALILEO_AMPLITUDE: f64 = 800.0;
pub const BEIDOU_AMPLITUDE: f64 = 900.0;
pub const GLONASS_AMPLITUDE: f64 = 1000.0;
pub const GLONASS_ROTATION_SCALE: f64 = 0.7;

// Frequency offsets below this are not worth a mixing pass
pub const MIX_THRESHOLD_HZ: f64 = 1.0;

// Doppler is re-propagated on absolute 10 msec epoch boundaries
pub const DOPPLER_EPOCH_RATE_HZ: f64 = 100.0;

pub const CHUNK_DURATION_SEC: f64 = 0.01;
