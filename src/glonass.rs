use colored::Colorize;
use gnss_rs::constellation::Constellation;
use gnss_rs::sv::SV;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;

use crate::config::GlobalConfig;
use crate::constants::{
    DOPPLER_EPOCH_RATE_HZ, GLONASS_AMPLITUDE, GLONASS_CHIP_RATE_HZ, GLONASS_FREQ_STEP_HZ,
    GLONASS_L1_HZ, GLONASS_ROTATION_SCALE, MIX_THRESHOLD_HZ, SPEED_OF_LIGHT,
};
use crate::ephemeris::Ephemeris;
use crate::error::Error;
use crate::glonass_code::GlonassCode;
use crate::nco::Nco;
use crate::orbit;
use crate::provider::{accumulate, initial_carrier_phase, sample_base, ConstellationProvider};
use crate::rinex;
use crate::types::{IQSample, SatelliteInfo};
use crate::util;

const PI: f64 = std::f64::consts::PI;

const NUM_SATELLITES: u8 = 24;
const NUM_DEFAULT_ACTIVE: u8 = 8;
const DEFAULT_POWER_DBM: f64 = -128.0;

// PRN to frequency-channel assignment; channel numbers repeat across PRNs
const GLONASS_CHANNELS: [i8; 24] = [
    1, -4, 5, 6, 1, -4, 5, 6, 1, -4, 5, 6, //
    1, -4, 5, 6, 1, -4, 5, 6, 1, -4, 5, 6,
];

struct GlonassSatellite {
    sv: SV,
    channel: i8,
    power_dbm: f64,
    is_active: bool,
    eph: Option<Ephemeris>,
    code: GlonassCode,
    chip: i8,
    chip_index: u64,
    rotation_phase: f64,
    doppler_hz: f64,
    doppler_epoch: i64,
    range_m: f64,
}

impl GlonassSatellite {
    fn new(prn: u8, coherent: bool) -> Self {
        Self {
            sv: SV::new(Constellation::Glonass, prn),
            channel: GLONASS_CHANNELS[(prn - 1) as usize],
            power_dbm: DEFAULT_POWER_DBM,
            is_active: prn <= NUM_DEFAULT_ACTIVE,
            eph: None,
            code: GlonassCode::new(),
            chip: 0,
            chip_index: u64::MAX,
            rotation_phase: initial_carrier_phase(prn, coherent),
            doppler_hz: 0.0,
            doppler_epoch: i64::MIN,
            range_m: 0.0,
        }
    }

    /// Channel transmit frequency: 1602 MHz + k * 562.5 kHz.
    fn frequency_hz(&self) -> f64 {
        GLONASS_L1_HZ + self.channel as f64 * GLONASS_FREQ_STEP_HZ
    }

    fn update_orbit(&mut self, t: f64, user_ecef: &[f64; 3], config: &GlobalConfig) {
        let eph = match &self.eph {
            Some(eph) => eph,
            None => return,
        };
        let state = orbit::propagate(eph, t, user_ecef, self.frequency_hz());
        self.doppler_hz = state.doppler_hz;

        let sat_ecef = [state.x, state.y, state.z];
        let mut range_m = state.range_m;
        if config.simulation.enable_ionospheric {
            range_m += util::ionospheric_delay_s(user_ecef, &sat_ecef, self.frequency_hz())
                * SPEED_OF_LIGHT;
        }
        if config.simulation.enable_tropospheric {
            range_m += util::tropospheric_delay_s(user_ecef, &sat_ecef) * SPEED_OF_LIGHT;
        }
        self.range_m = range_m;
        log::trace!(
            "{}: k={} doppler={:.1} Hz range={:.0} m t={:.3}",
            self.sv,
            self.channel,
            self.doppler_hz,
            self.range_m,
            t
        );
    }

    /// FDMA baseband: the shared 511-chip BPSK stream rotated to this
    /// channel's offset from the 1602 MHz carrier.
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
        let delta_f = self.channel as f64 * GLONASS_FREQ_STEP_HZ;
        for (i, s) in out.iter_mut().enumerate() {
            let t = time_base + (first_sample + i as u64) as f64 / fs;

            let epoch = (t * DOPPLER_EPOCH_RATE_HZ).floor() as i64;
            if epoch != self.doppler_epoch {
                self.doppler_epoch = epoch;
                self.update_orbit(t, user_ecef, config);
            }

            let chip_index = (t * GLONASS_CHIP_RATE_HZ) as u64;
            if chip_index != self.chip_index {
                self.chip_index = chip_index;
                self.chip = self.code.advance_one_chip();
            }

            let value = self.chip as f64 * GLONASS_AMPLITUDE * GLONASS_ROTATION_SCALE;
            let i_arm = value * self.rotation_phase.cos();
            let q_arm = value * self.rotation_phase.sin();
            *s = IQSample::new(i_arm as i16, q_arm as i16);
            self.rotation_phase = (self.rotation_phase
                + (delta_f + self.doppler_hz) * phase_step)
                .rem_euclid(2.0 * PI);
        }
    }
}

pub struct GlonassL1Provider {
    config: GlobalConfig,
    configured: bool,
    ephemeris_loaded: bool,
    frequency_offset_hz: f64,
    nco: Nco,
    user_ecef: [f64; 3],
    time_base: Option<f64>,
    satellites: Vec<GlonassSatellite>,
    scratch: Vec<Vec<IQSample>>,
    ephemerides: HashMap<u8, Ephemeris>,
}

impl GlonassL1Provider {
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
            "{}: {} ephemeris records, {} matched to channels",
            "GLONASS L1".green(),
            self.ephemerides.len(),
            matched
        );
    }
}

impl Default for GlonassL1Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstellationProvider for GlonassL1Provider {
    fn generate_chunk(&mut self, buffer: &mut [IQSample], time_now: f64) -> Result<(), Error> {
        if !self.is_ready() {
            return Err(Error::NotReady("GLONASS L1 provider".to_string()));
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
            "GLONASS L1".green(),
            path.display()
        );
        let ephemerides = rinex::load_ephemerides(path, Constellation::Glonass)?;
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
            .map(|prn| GlonassSatellite::new(prn, coherent))
            .collect();
        self.scratch.clear();
        self.configured = true;
        if self.ephemeris_loaded {
            self.apply_ephemerides();
        }
    }

    fn carrier_frequency(&self) -> f64 {
        GLONASS_L1_HZ
    }

    fn constellation(&self) -> Constellation {
        Constellation::Glonass
    }

    fn active_satellites(&self) -> Vec<SatelliteInfo> {
        self.satellites
            .iter()
            .filter(|sat| sat.is_active && sat.eph.is_some())
            .map(|sat| SatelliteInfo {
                sv: sat.sv,
                frequency_hz: sat.frequency_hz(),
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

    fn ready_provider(config: &GlobalConfig) -> GlonassL1Provider {
        let mut provider = GlonassL1Provider::new();
        provider.configure(config);
        provider.set_ephemerides(synthetic_ephemerides(Constellation::Glonass, 1..=8));
        provider
    }

    #[test]
    fn test_channel_table_mapping() {
        let provider = ready_provider(&GlobalConfig::default());
        let info = provider.active_satellites();
        assert_eq!(info.len(), 8);
        // PRN 1 -> k=1, PRN 2 -> k=-4, PRN 3 -> k=5, PRN 4 -> k=6, repeating
        let expected = [1i8, -4, 5, 6, 1, -4, 5, 6];
        for (sat, &k) in info.iter().zip(expected.iter()) {
            let freq = GLONASS_L1_HZ + k as f64 * GLONASS_FREQ_STEP_HZ;
            assert_eq!(sat.frequency_hz, freq, "PRN {}", sat.sv.prn);
        }
    }

    #[test]
    fn test_fdma_signal_occupies_both_arms() {
        let mut provider = ready_provider(&GlobalConfig::default());
        let mut buffer = vec![IQSample::new(0, 0); 10_000];
        provider.generate_chunk(&mut buffer, 0.0).unwrap();
        let max_i = buffer.iter().map(|s| s.re.unsigned_abs()).max().unwrap();
        let max_q = buffer.iter().map(|s| s.im.unsigned_abs()).max().unwrap();
        assert!(max_i > 100, "max_i={}", max_i);
        assert!(max_q > 100, "max_q={}", max_q);
    }

    #[test]
    fn test_not_ready_without_ephemeris() {
        let mut provider = GlonassL1Provider::new();
        provider.configure(&GlobalConfig::default());
        let mut buffer = vec![IQSample::new(0, 0); 64];
        assert!(matches!(
            provider.generate_chunk(&mut buffer, 0.0),
            Err(Error::NotReady(_))
        ));
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
    fn test_channels_are_frequency_separated() {
        // Two satellites on different channels must rotate at different
        // rates, so their baseband streams decorrelate quickly.
        let config = GlobalConfig::default();
        let mut one = GlonassL1Provider::new();
        one.configure(&config);
        one.set_ephemerides(synthetic_ephemerides(Constellation::Glonass, 1..=1));
        let mut two = GlonassL1Provider::new();
        two.configure(&config);
        two.set_ephemerides(synthetic_ephemerides(Constellation::Glonass, 2..=2));

        let mut a = vec![IQSample::new(0, 0); 8192];
        let mut b = vec![IQSample::new(0, 0); 8192];
        one.generate_chunk(&mut a, 0.0).unwrap();
        two.generate_chunk(&mut b, 0.0).unwrap();
        assert_ne!(a, b);
    }
}
