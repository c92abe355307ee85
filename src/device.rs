use colored::Colorize;
use std::str::FromStr;

use crate::error::Error;
use crate::types::IQSample;

/// Supported SDR transmit sinks. All of them are stubs for now: they accept
/// a chunk, log it and report success without touching hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdrDevice {
    HackRf,
    Pluto,
    BladeRf,
    Usrp,
    LimeSdr,
    IqFile,
}

impl SdrDevice {
    pub fn name(&self) -> &'static str {
        match self {
            SdrDevice::HackRf => "hackrf",
            SdrDevice::Pluto => "pluto",
            SdrDevice::BladeRf => "bladerf",
            SdrDevice::Usrp => "usrp",
            SdrDevice::LimeSdr => "limesdr",
            SdrDevice::IqFile => "iqfile",
        }
    }

    pub fn transmit(
        &self,
        samples: &[IQSample],
        frequency_hz: f64,
        gain_db: f64,
    ) -> Result<(), Error> {
        log::debug!(
            "{}: {} samples at {:.3} MHz, gain {:.1} dB",
            self.name().yellow(),
            samples.len(),
            frequency_hz / 1e6,
            gain_db
        );
        Ok(())
    }
}

impl FromStr for SdrDevice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hackrf" => Ok(SdrDevice::HackRf),
            "pluto" => Ok(SdrDevice::Pluto),
            "bladerf" => Ok(SdrDevice::BladeRf),
            "usrp" => Ok(SdrDevice::Usrp),
            "limesdr" => Ok(SdrDevice::LimeSdr),
            "iqfile" => Ok(SdrDevice::IqFile),
            other => Err(format!("unknown SDR device: {}", other)),
        }
    }
}
