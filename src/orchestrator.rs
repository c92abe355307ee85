use colored::Colorize;
use gnss_rs::constellation::Constellation;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::GlobalConfig;
use crate::error::Error;
use crate::provider::ConstellationProvider;
use crate::types::{IQSample, SatelliteInfo};

/// Owns the per-constellation providers, allocates their frequency offsets
/// against the shared LO and sums their chunks into one saturated stream.
pub struct SignalOrchestrator {
    config: GlobalConfig,
    providers: Vec<Box<dyn ConstellationProvider>>,
    initialized: bool,
    scratch: Vec<IQSample>,
    accumulator: Vec<(i32, i32)>,
}

impl SignalOrchestrator {
    pub fn new(config: GlobalConfig) -> Self {
        Self {
            config,
            providers: vec![],
            initialized: false,
            scratch: vec![],
            accumulator: vec![],
        }
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    pub fn add_provider(
        &mut self,
        provider: Option<Box<dyn ConstellationProvider>>,
    ) -> Result<(), Error> {
        match provider {
            Some(provider) => {
                self.providers.push(provider);
                Ok(())
            }
            None => Err(Error::NullInput("absent provider handle".to_string())),
        }
    }

    /// Configure every provider, load ephemerides where a path is given and
    /// place each carrier at its offset from the LO centre.
    pub fn initialize(
        &mut self,
        ephemeris_paths: &HashMap<Constellation, PathBuf>,
    ) -> Result<(), Error> {
        self.config.validate()?;

        let center_hz = self.config.center_frequency_hz;
        log::info!(
            "{}: LO centre {:.3} MHz, {:.1} MSps, {} providers",
            "orchestrator".cyan(),
            center_hz / 1e6,
            self.config.sampling_rate_hz / 1e6,
            self.providers.len()
        );

        for provider in &mut self.providers {
            provider.configure(&self.config);
            if let Some(path) = ephemeris_paths.get(&provider.constellation()) {
                provider.load_ephemeris(path)?;
            }
            let offset_hz = provider.carrier_frequency() - center_hz;
            provider.set_frequency_offset(offset_hz);
            log::info!(
                "  {:8}: {:9.3} MHz -> offset {:+8.3} MHz",
                provider.constellation().to_string().green(),
                provider.carrier_frequency() / 1e6,
                offset_hz / 1e6
            );
        }

        self.initialized = true;
        Ok(())
    }

    /// Sum one chunk from every ready provider, in registration order, with
    /// a 32-bit accumulator saturated back to int16.
    pub fn mix_all(&mut self, buffer: &mut [IQSample], time_now: f64) -> Result<(), Error> {
        if !self.initialized {
            return Err(Error::NotReady("orchestrator not initialized".to_string()));
        }
        if buffer.is_empty() {
            return Err(Error::NullInput("empty output buffer".to_string()));
        }

        let n = buffer.len();
        self.scratch.resize(n, IQSample::new(0, 0));
        self.accumulator.clear();
        self.accumulator.resize(n, (0, 0));

        for provider in &mut self.providers {
            if !provider.is_ready() {
                continue;
            }
            provider.generate_chunk(&mut self.scratch, time_now)?;
            for (acc, s) in self.accumulator.iter_mut().zip(self.scratch.iter()) {
                acc.0 += s.re as i32;
                acc.1 += s.im as i32;
            }
        }

        for (out, acc) in buffer.iter_mut().zip(self.accumulator.iter()) {
            *out = IQSample::new(
                acc.0.clamp(-32768, 32767) as i16,
                acc.1.clamp(-32768, 32767) as i16,
            );
        }
        Ok(())
    }

    /// Flat union of every ready provider's active satellites.
    pub fn all_satellites(&self) -> Vec<SatelliteInfo> {
        self.providers
            .iter()
            .filter(|p| p.is_ready())
            .flat_map(|p| p.active_satellites())
            .collect()
    }

    pub fn is_ready(&self) -> bool {
        self.initialized && self.providers.iter().all(|p| p.is_ready())
    }
}
