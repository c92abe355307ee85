use colored::Colorize;
use gnss_rs::constellation::Constellation;
use gnss_rs::sv::SV;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;

use crate::beidou_code::CssCode;
use crate::config::GlobalConfig;
use crate::constants::{
    BEIDOU_AMPLITUDE, BEIDOU_B1I_HZ, BEIDOU_CHIP_RATE_HZ, DOPPLER_EPOCH_RATE_HZ,
    MIX_THRESHOLD_HZ, SPEED_OF_LIGHT,
};
use crate::ephemeris::Ephemeris;
use crate::error::Error;
use crate::nco::Nco;
use crate::orbit;
use crate::provider::{accumulate, initial_carrier_phase, sample_base, ConstellationProvider};
use crate::rinex;
use crate::types::{IQSample, SatelliteInfo};
use crate::util;

const PI: f64 = std::f64::consts::PI;

const NUM_SATELLITES: u8 = 37;
const NUM_DEFAULT_ACTIVE: u8 = 5;
const DEFAULT_POWER_DBM: f64 = -133.0;

struct BeidouSatellite {
    sv: SV,
    power_dbm: f64,
    is_active: bool,
    eph: Option<Ephemeris>,
    code: CssCode,
    chip: i8,
    chip_index: u64,
    carrier_phase: f64,
    doppler_hz: f64,
    doppler_epoch: i64,
    range_m: f64,
}

impl BeidouSatellite {
    fn new(prn: u8, coherent: bool) -> Self {
        Self {
            sv: SV::new(Constellation::BeiDou, prn),
            power_dbm: DEFAULT_POWER_DBM,
            is_active: prn <= NUM_DEFAULT_ACTIVE,
            eph: None,
            code: CssCode::new(prn),
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
        let state = orbit::propagate(eph, t, user_ecef, BEIDOU_B1I_HZ);
        self.doppler_hz = state.doppler_hz;

        let sat_ecef = [state.x, state.y, state.z];
        let mut range_m = state.range_m;
        if config.simulation.enable_ionospheric {
            range_m +=
                util::ionospheric_delay_s(user_ecef, &sat_ecef, BEIDOU_B1I_HZ) * SPEED_OF_LIGHT;
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

            let chip_index = (t * BEIDOU_CHIP_RATE_HZ) as u64;
            if chip_index != self.chip_index {
                self.chip_index = chip_index;
                self.chip = self.code.advance_one_chip();
            }

            let value = self.chip as f64 * self.carrier_phase.cos() * BEIDOU_AMPLITUDE;
            *s = IQSample::new(value as i16, 0);
            self.carrier_phase =
                (self.carrier_phase + self.doppler_hz * phase_step).rem_euclid(2.0 * PI);
        }
    }
}

pub struct BeidouB1Provider {
    config: GlobalConfig,
    configured: bool,
    ephemeris_loaded: bool,
    frequency_offset_hz: f64,
    nco: Nco,
    user_ecef: [f64; 3],
    time_base: Option<f64>,
    satellites: Vec<BeidouSatellite>,
    scratch: Vec<Vec<IQSample>>,
    ephemerides: HashMap<u8, Ephemeris>,
}

impl BeidouB1Provider {
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
            "BeiDou B1I".green(),
            self.ephemerides.len(),
            matched
        );
    }
}

impl Default for BeidouB1Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstellationProvider for BeidouB1Provider {
    fn generate_chunk(&mut self, buffer: &mut [IQSample], time_now: f64) -> Result<(), Error> {
        if !self.is_ready() {
            return Err(Error::NotReady("BeiDou B1I provider".to_string()));
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
            "BeiDou B1I".green(),
            path.display()
        );
        let ephemerides = rinex::load_ephemerides(path, Constellation::BeiDou)?;
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
            .map(|prn| BeidouSatellite::new(prn, coherent))
            .collect();
        self.scratch.clear();
        self.configured = true;
        if self.ephemeris_loaded {
            self.apply_ephemerides();
        }
    }

    fn carrier_frequency(&self) -> f64 {
        BEIDOU_B1I_HZ
    }

    fn constellation(&self) -> Constellation {
        Constellation::BeiDou
    }

    fn active_satellites(&self) -> Vec<SatelliteInfo> {
        self.satellites
            .iter()
            .filter(|sat| sat.is_active && sat.eph.is_some())
            .map(|sat| SatelliteInfo {
                sv: sat.sv,
                frequency_hz: BEIDOU_B1I_HZ + self.frequency_offset_hz,
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
