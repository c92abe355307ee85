use gnss_rs::constellation::Constellation;
use std::path::PathBuf;

use crate::error::Error;

pub const DEFAULT_SAMPLING_RATE_HZ: f64 = 60e6;
pub const DEFAULT_CENTER_FREQUENCY_HZ: f64 = 1582e6;
pub const STREAMING_CENTER_FREQUENCY_HZ: f64 = 1581.5e6;

// Static receiver location used when no motion input is given
const DEFAULT_USER_LAT_DEG: f64 = 30.286502;
const DEFAULT_USER_LON_DEG: f64 = 120.032669;
const DEFAULT_USER_HEIGHT_M: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub bits_per_sample: u8,
    pub tx_gain_db: f64,
    pub enable_iq_file: bool,
    pub filename: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            bits_per_sample: 16,
            tx_gain_db: 0.0,
            enable_iq_file: false,
            filename: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub start_time_gps: f64,
    pub duration_seconds: f64,
    pub enable_ionospheric: bool,
    pub enable_tropospheric: bool,
    pub coherent_mode: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start_time_gps: 0.0,
            duration_seconds: 60.0,
            enable_ionospheric: true,
            enable_tropospheric: true,
            coherent_mode: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GlobalConfig {
    pub sampling_rate_hz: f64,
    pub center_frequency_hz: f64,
    pub active_constellations: Vec<Constellation>,
    pub user_llh: [f64; 3],
    pub output: OutputConfig,
    pub simulation: SimulationConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            sampling_rate_hz: DEFAULT_SAMPLING_RATE_HZ,
            center_frequency_hz: DEFAULT_CENTER_FREQUENCY_HZ,
            active_constellations: vec![
                Constellation::GPS,
                Constellation::Glonass,
                Constellation::Galileo,
                Constellation::BeiDou,
            ],
            user_llh: [DEFAULT_USER_LAT_DEG, DEFAULT_USER_LON_DEG, DEFAULT_USER_HEIGHT_M],
            output: OutputConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl GlobalConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.sampling_rate_hz <= 0.0 {
            return Err(Error::ConfigInvalid(format!(
                "sampling rate must be positive, got {}",
                self.sampling_rate_hz
            )));
        }
        if self.center_frequency_hz <= 0.0 {
            return Err(Error::ConfigInvalid(format!(
                "center frequency must be positive, got {}",
                self.center_frequency_hz
            )));
        }
        if self.active_constellations.is_empty() {
            return Err(Error::ConfigInvalid(
                "no active constellations selected".to_string(),
            ));
        }
        if ![1, 8, 16].contains(&self.output.bits_per_sample) {
            return Err(Error::ConfigInvalid(format!(
                "unsupported bits per sample: {}",
                self.output.bits_per_sample
            )));
        }
        Ok(())
    }

    /// Samples in one 10 msec generation chunk.
    pub fn chunk_len(&self) -> usize {
        (self.sampling_rate_hz * crate::constants::CHUNK_DURATION_SEC) as usize
    }
}

/// Parse a comma separated constellation list, e.g. "gps,glonass" or "all".
pub fn parse_constellation_list(list: &str) -> Result<Vec<Constellation>, Error> {
    let mut out = vec![];
    for token in list.split(',') {
        match token.trim().to_ascii_lowercase().as_str() {
            "gps" => out.push(Constellation::GPS),
            "glonass" => out.push(Constellation::Glonass),
            "galileo" => out.push(Constellation::Galileo),
            "beidou" => out.push(Constellation::BeiDou),
            "all" => {
                return Ok(vec![
                    Constellation::GPS,
                    Constellation::Glonass,
                    Constellation::Galileo,
                    Constellation::BeiDou,
                ])
            }
            other => {
                return Err(Error::ConfigInvalid(format!(
                    "unknown constellation: {}",
                    other
                )))
            }
        }
    }
    if out.is_empty() {
        return Err(Error::ConfigInvalid("empty constellation list".to_string()));
    }
    Ok(out)
}
