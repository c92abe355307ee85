use colored::Colorize;
use gnss_rs::constellation::Constellation;
use gnss_rs::sv::SV;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;

use crate::config::GlobalConfig;
use crate::constants::{
    BOC_SUBCARRIER_HZ, DOPPLER_EPOCH_RATE_HZ, GALILEO_AMPLITUDE, GALILEO_CHIP_RATE_HZ,
    GALILEO_E1_HZ, MIX_THRESHOLD_HZ, SPEED_OF_LIGHT,
};
use crate::ephemeris::Ephemeris;
use crate::error::Error;
use crate::galileo_code::TieredCode;
use crate::nco::Nco;
use crate::orbit;
use crate::provider::{accumulate, initial_carrier_phase, sample_base, ConstellationProvider};
use crate::rinex;
use crate::types::{IQSample, SatelliteInfo};
use crate::util;

const PI: f64 = std::f64::consts::PI;

const NUM_SATELLITES: u8 = 36;
const NUM_DEFAULT_ACTIVE: u8 = 6;
const DEFAULT_POWER_DBM: f64 = -127.0;

struct GalileoSatellite {
    sv: SV,
    power_dbm: f64,
    is_active: bool,
    eph: Option<Ephemeris>,
    code: TieredCode,
    chip: i8,
    chip_index: u64,
    carrier_phase: f64,
    doppler_hz: f64,
    doppler_epoch: i64,
    range_m: f64,
}

impl GalileoSatellite {
    fn new(prn: u8, coherent: bool) -> Self {
        Self {
            sv: SV::new(Constellation::Galileo, prn),
            power_dbm: DEFAULT_POWER_DBM,
            is_active: prn <= NUM_DEFAULT_ACTIVE,
            eph: None,
            code: TieredCode::new(prn),
            chip: 0,
            chip_index: u64::MAX,
            carrier_phase: initial_carrier_phase(prn, coherent),
            doppler_hz: 0.0,
            doppler_epoch: i64::MIN,
            range_m: 0.0,
        }
    }

    fn update_orbit(&mut self, t: f64, user_ecef: &[f64; 3], config: &GlobalConfig) {
        let eph = match &self.eph {
            Some(eph) => eph,
            None => return,
        };
        let state = orbit::propagate(eph, t, user_ecef, GALILEO_E1_HZ);
        self.doppler_hz = state.doppler_hz;

        let sat_ecef = [state.x, state.y, state.z];
        let mut range_m = state.range_m;
        if config.simulation.enable_ionospheric {
            range_m +=
                util::ionospheric_delay_s(user_ecef, &sat_ecef, GALILEO_E1_HZ) * SPEED_OF_LIGHT;
        }
        if config.simulation.enable_tropospheric {
            range_m += util::tropospheric_delay_s(user_ecef, &sat_ecef) * SPEED_OF_LIGHT;
        }
        self.range_m = range_m;
        log::trace!(
            "{}: doppler={:.1} Hz range={:.0} m t={:.3}",
            self.sv,
            self.doppler_hz,
            self.range_m,
            t
        );
    }

    fn fill_baseband(
        &mut self,
        out: &mut [IQSample],
        time_base: f64,
        first_sample: u64,
        config: &GlobalConfig,
        user_ecef: &[f64; 3],
    ) {
        let fs = config.sampling_rate_hz;
        let phase_step = 2.0 * PI / fs;
        for (i, s) in out.iter_mut().enumerate() {
            let t = time_base + (first_sample + i as u64) as f64 / fs;

            let epoch = (t * DOPPLER_EPOCH_RATE_HZ).floor() as i64;
            if epoch != self.doppler_epoch {
                self.doppler_epoch = epoch;
                self.update_orbit(t, user_ecef, config);
            }

            let chip_index = (t * GALILEO_CHIP_RATE_HZ) as u64;
            if chip_index != self.chip_index {
                self.chip_index = chip_index;
                self.chip = self.code.advance_one_chip();
            }

            // BOC(1,1): square-wave subcarrier sign on top of the tiered chip
            let subcarrier = (2.0 * PI * BOC_SUBCARRIER_HZ * t).cos();
            let boc_sign = if subcarrier > 0.0 { 1.0 } else { -1.0 };

            let value =
                self.chip as f64 * boc_sign * self.carrier_phase.cos() * GALILEO_AMPLITUDE;
            *s = IQSample::new(value as i16, 0);
            self.carrier_phase =
                (self.carrier_phase + self.doppler_hz * phase_step).rem_euclid(2.0 * PI);
        }
    }
}

pub struct GalileoE1Provider {
    config: GlobalConfig,
    configured: bool,
    ephemeris_loaded: bool,
    frequency_offset_hz: f64,
    nco: Nco,
    user_ecef: [f64; 3],
    time_base: Option<f64>,
    satellites: Vec<GalileoSatellite>,
    scratch: Vec<Vec<IQSample>>,
    ephemerides: HashMap<u8, Ephemeris>,
}

impl GalileoE1Provider {
    pub fn new() -> Self {
        let config = GlobalConfig::default();
        let nco = Nco::new(config.sampling_rate_hz);
        Self {
            config,
            configured: false,
            ephemeris_loaded: false,
            frequency_offset_hz: 0.0,
            nco,
            user_ecef: [0.0; 3],
            time_base: None,
            satellites: vec![],
            scratch: vec![],
            ephemerides: HashMap::new(),
        }
    }

    pub fn set_ephemerides(&mut self, ephemerides: HashMap<u8, Ephemeris>) {
        self.ephemerides = ephemerides;
        self.apply_ephemerides();
        self.ephemeris_loaded = true;
    }

    fn apply_ephemerides(&mut self) {
        let mut matched = 0;
        for sat in &mut self.satellites {
            sat.eph = self
                .ephemerides
                .get(&sat.sv.prn)
                .copied()
                .filter(|eph| eph.is_valid);
            if sat.eph.is_some() {
                matched += 1;
            }
        }
        log::info!(
            "{}: {} ephemeris records, {} matched to satellites",
            "Galileo E1".green(),
            self.ephemerides.len(),
            matched
        );
    }
}

impl Default for GalileoE1Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstellationProvider for GalileoE1Provider {
    fn generate_chunk(&mut self, buffer: &mut [IQSample], time_now: f64) -> Result<(), Error> {
        if !self.is_ready() {
            return Err(Error::NotReady("Galileo E1 provider".to_string()));
        }
        buffer.fill(IQSample::new(0, 0));
        let n = buffer.len();
        if n == 0 {
            return Ok(());
        }

        let time_base = *self.time_base.get_or_insert(time_now);
        let first_sample = sample_base(time_base, time_now, self.config.sampling_rate_hz);

        if self.scratch.len() != self.satellites.len() {
            self.scratch = vec![Vec::new(); self.satellites.len()];
        }

        let Self {
            satellites,
            scratch,
            config,
            user_ecef,
            ..
        } = self;
        let config = &*config;
        let user_ecef = *user_ecef;

        satellites
            .par_iter_mut()
            .zip(scratch.par_iter_mut())
            .for_each(|(sat, buf)| {
                if !sat.is_active || sat.eph.is_none() {
                    buf.clear();
                    return;
                }
                buf.resize(n, IQSample::new(0, 0));
                sat.fill_baseband(buf, time_base, first_sample, config, &user_ecef);
            });

        for buf in self.scratch.iter() {
            if buf.is_empty() {
                continue;
            }
            for (dst, add) in buffer.iter_mut().zip(buf.iter()) {
                accumulate(dst, *add);
            }
        }

        if self.frequency_offset_hz.abs() > MIX_THRESHOLD_HZ {
            self.nco.mix(buffer);
        }
        Ok(())
    }

    fn load_ephemeris(&mut self, path: &Path) -> Result<(), Error> {
        log::info!(
            "{}: loading ephemeris from {}",
            "Galileo E1".green(),
            path.display()
        );
        let ephemerides = rinex::load_ephemerides(path, Constellation::Galileo)?;
        self.set_ephemerides(ephemerides);
        Ok(())
    }

    fn set_frequency_offset(&mut self, offset_hz: f64) {
        self.frequency_offset_hz = offset_hz;
        self.nco.set_frequency(offset_hz);
    }

    fn configure(&mut self, config: &GlobalConfig) {
        self.config = config.clone();
        self.user_ecef = util::llh_to_ecef(&config.user_llh);
        self.nco = Nco::new(config.sampling_rate_hz);
        self.nco.set_frequency(self.frequency_offset_hz);
        self.time_base = None;
        let coherent = config.simulation.coherent_mode;
        self.satellites = (1..=NUM_SATELLITES)
            .map(|prn| GalileoSatellite::new(prn, coherent))
            .collect();
        self.scratch.clear();
        self.configured = true;
        if self.ephemeris_loaded {
            self.apply_ephemerides();
        }
    }

    fn carrier_frequency(&self) -> f64 {
        GALILEO_E1_HZ
    }

    fn constellation(&self) -> Constellation {
        Constellation::Galileo
    }

    fn active_satellites(&self) -> Vec<SatelliteInfo> {
        self.satellites
            .iter()
            .filter(|sat| sat.is_active && sat.eph.is_some())
            .map(|sat| SatelliteInfo {
                sv: sat.sv,
                frequency_hz: GALILEO_E1_HZ + self.frequency_offset_hz,
                power_dbm: sat.power_dbm,
                doppler_hz: sat.doppler_hz,
                is_active: true,
            })
            .collect()
    }

    fn is_ready(&self) -> bool {
        self.configured
            && self.ephemeris_loaded
            && self
                .satellites
                .iter()
                .any(|sat| sat.is_active && sat.eph.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utilities::synthetic_ephemerides;

    fn ready_provider(config: &GlobalConfig) -> GalileoE1Provider {
        let mut provider = GalileoE1Provider::new();
        provider.configure(config);
        provider.set_ephemerides(synthetic_ephemerides(Constellation::Galileo, 1..=6));
        provider
    }

    #[test]
    fn test_not_ready_without_ephemeris() {
        let mut provider = GalileoE1Provider::new();
        provider.configure(&GlobalConfig::default());
        let mut buffer = vec![IQSample::new(0, 0); 64];
        assert!(matches!(
            provider.generate_chunk(&mut buffer, 0.0),
            Err(Error::NotReady(_))
        ));
    }

    #[test]
    fn test_six_default_active_satellites() {
        let provider = ready_provider(&GlobalConfig::default());
        assert_eq!(provider.active_satellites().len(), 6);
    }

    #[test]
    fn test_boc_adds_sign_transitions() {
        // The BOC(1,1) subcarrier flips twice per chip, so the Galileo
        // baseband must change sign noticeably more often than chips do.
        let mut provider = ready_provider(&GlobalConfig::default());
        let mut buffer = vec![IQSample::new(0, 0); 60_000];
        provider.generate_chunk(&mut buffer, 0.0).unwrap();

        let transitions = buffer
            .windows(2)
            .filter(|w| (w[0].re > 0) != (w[1].re > 0))
            .count();
        // 60000 samples at 60 MHz cover ~1023 chips; BPSK alone would give
        // roughly one transition per two chips
        assert!(transitions > 1200, "transitions={}", transitions);
    }

    #[test]
    fn test_chunk_boundary_invariance() {
        let config = GlobalConfig::default();
        let fs = config.sampling_rate_hz;
        let n = 4096;

        let mut split = ready_provider(&config);
        let mut a = vec![IQSample::new(0, 0); n];
        let mut b = vec![IQSample::new(0, 0); n];
        split.generate_chunk(&mut a, 0.0).unwrap();
        split.generate_chunk(&mut b, n as f64 / fs).unwrap();

        let mut whole = ready_provider(&config);
        let mut c = vec![IQSample::new(0, 0); 2 * n];
        whole.generate_chunk(&mut c, 0.0).unwrap();

        assert_eq!(&c[..n], &a[..]);
        assert_eq!(&c[n..], &b[..]);
    }

    #[test]
    fn test_amplitude_stays_below_gps() {
        let mut provider = ready_provider(&GlobalConfig::default());
        let mut buffer = vec![IQSample::new(0, 0); 10_000];
        provider.generate_chunk(&mut buffer, 0.0).unwrap();
        let max_i = buffer.iter().map(|s| s.re.unsigned_abs()).max().unwrap();
        assert!(max_i <= 6 * 800, "max_i={}", max_i);
        assert!(max_i > 0);
    }
}
