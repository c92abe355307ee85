use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;
use structopt::StructOpt;

use gnss_sim::config::{
    self, GlobalConfig, DEFAULT_CENTER_FREQUENCY_HZ, STREAMING_CENTER_FREQUENCY_HZ,
};
use gnss_sim::constants::CHUNK_DURATION_SEC;
use gnss_sim::device::SdrDevice;
use gnss_sim::error::Error;
use gnss_sim::orchestrator::SignalOrchestrator;
use gnss_sim::provider;
use gnss_sim::recording::IQRecording;
use gnss_sim::types::IQSample;

#[derive(StructOpt, Debug)]
#[structopt(
    name = "gnss-sim",
    about = "multi-constellation GNSS IQ signal generator"
)]
struct Options {
    /// RINEX navigation file shared by the active constellations
    #[structopt(short = "e", long)]
    nav_file: Option<PathBuf>,

    /// Constellation list: gps,glonass,galileo,beidou or all
    #[structopt(short = "c", long, default_value = "all")]
    constellations: String,

    /// Sample rate in Hz
    #[structopt(short = "s", long, default_value = "60e6")]
    sample_rate: f64,

    /// LO centre frequency in Hz (1582 MHz default, 1581.5 MHz when streaming)
    #[structopt(short = "f", long)]
    center_frequency: Option<f64>,

    /// Simulation duration in seconds
    #[structopt(short = "d", long, default_value = "60")]
    duration: f64,

    /// Static receiver location as lat,lon,height (deg, deg, m)
    #[structopt(short = "l", long)]
    location: Option<String>,

    /// Output IQ file
    #[structopt(short = "o", long, default_value = "gnss-sim-iq.bin")]
    output: PathBuf,

    /// IQ resolution in bits per component (1, 8 or 16)
    #[structopt(short = "b", long, default_value = "16")]
    bits: u8,

    /// TX gain in dB, forwarded to the SDR sink
    #[structopt(long, default_value = "0")]
    gain: f64,

    /// Simulation start time in GPS seconds
    #[structopt(long, default_value = "0")]
    start_time: f64,

    /// Stream IQ to stdout in 10 ms chunks instead of writing a file
    #[structopt(long)]
    stdout: bool,

    /// SDR sink: hackrf, pluto, bladerf, usrp, limesdr, iqfile
    #[structopt(short = "r", long)]
    device: Option<SdrDevice>,

    /// Disable the ionospheric delay term
    #[structopt(long)]
    disable_iono: bool,

    /// Disable the tropospheric delay term
    #[structopt(long)]
    disable_tropo: bool,

    /// Start every carrier at zero phase
    #[structopt(long)]
    coherent: bool,
}

fn parse_location(text: &str) -> Result<[f64; 3], Error> {
    let parts: Vec<f64> = text
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| Error::ConfigInvalid(format!("bad location: {}", text)))?;
    if parts.len() != 3 || parts[0].abs() > 90.0 || parts[1].abs() > 180.0 {
        return Err(Error::ConfigInvalid(format!("bad location: {}", text)));
    }
    Ok([parts[0], parts[1], parts[2]])
}

fn build_config(opt: &Options) -> Result<GlobalConfig, Error> {
    let mut config = GlobalConfig::default();
    config.sampling_rate_hz = opt.sample_rate;
    config.center_frequency_hz = opt.center_frequency.unwrap_or(if opt.stdout {
        STREAMING_CENTER_FREQUENCY_HZ
    } else {
        DEFAULT_CENTER_FREQUENCY_HZ
    });
    config.active_constellations = config::parse_constellation_list(&opt.constellations)?;
    if let Some(location) = &opt.location {
        config.user_llh = parse_location(location)?;
    }
    config.output.bits_per_sample = opt.bits;
    config.output.tx_gain_db = opt.gain;
    config.output.enable_iq_file = !opt.stdout;
    config.output.filename = Some(opt.output.clone());
    config.simulation.start_time_gps = opt.start_time;
    config.simulation.duration_seconds = opt.duration;
    config.simulation.enable_ionospheric = !opt.disable_iono;
    config.simulation.enable_tropospheric = !opt.disable_tropo;
    config.simulation.coherent_mode = opt.coherent;
    config.validate()?;
    Ok(config)
}

fn run(opt: Options) -> Result<(), Error> {
    let config = build_config(&opt)?;

    let mut orchestrator = SignalOrchestrator::new(config.clone());
    for &constellation in &config.active_constellations {
        orchestrator.add_provider(Some(provider::create_provider(constellation)?))?;
    }

    let mut ephemeris_paths = HashMap::new();
    if let Some(nav_file) = &opt.nav_file {
        for &constellation in &config.active_constellations {
            ephemeris_paths.insert(constellation, nav_file.clone());
        }
    }
    orchestrator.initialize(&ephemeris_paths)?;

    let satellites = orchestrator.all_satellites();
    if satellites.is_empty() {
        return Err(Error::NotReady(
            "no provider has usable ephemerides; pass a navigation file with -e".to_string(),
        ));
    }

    let mut recording = if opt.stdout {
        IQRecording::new_stdout(opt.bits)
    } else {
        IQRecording::new_file(&opt.output, opt.bits)?
    };

    let chunk_len = config.chunk_len();
    let num_chunks = (config.simulation.duration_seconds / CHUNK_DURATION_SEC).ceil() as u64;
    log::info!(
        "generating {} chunks of {} samples, {} active satellites",
        num_chunks,
        chunk_len,
        satellites.len()
    );

    let started = Instant::now();
    let mut chunk = vec![IQSample::new(0, 0); chunk_len];
    for k in 0..num_chunks {
        let time_now = config.simulation.start_time_gps + k as f64 * CHUNK_DURATION_SEC;
        orchestrator.mix_all(&mut chunk, time_now)?;
        recording.write_chunk(&chunk)?;
        if let Some(device) = opt.device {
            device.transmit(&chunk, config.center_frequency_hz, config.output.tx_gain_db)?;
        }
        if k % 100 == 99 {
            log::info!(
                "t={:7.2} s  samples={}",
                (k + 1) as f64 * CHUNK_DURATION_SEC,
                recording.num_samples()
            );
        }
    }
    recording.finish()?;

    log::info!(
        "done: {:.1} s of signal in {:.1} s wall time",
        config.simulation.duration_seconds,
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

fn main() {
    env_logger::init();
    let opt = Options::from_args();
    if let Err(e) = run(opt) {
        eprintln!("gnss-sim: {}", e);
        std::process::exit(1);
    }
}
