use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Stdout, Write};
use std::path::Path;

use crate::error::Error;
use crate::types::IQSample;

const BUFFER_SIZE: usize = 128 * 1024;

enum IqSink {
    Stdout(Stdout),
    File(BufWriter<File>),
}

/// Writes interleaved little-endian I/Q samples at 16, 8 or 1 bit per
/// component to a file or to stdout for streaming.
pub struct IQRecording {
    sink: IqSink,
    bits_per_sample: u8,
    num_samples: u64,
}

impl IQRecording {
    pub fn new_file(path: &Path, bits_per_sample: u8) -> Result<Self, Error> {
        let file = File::create(path)
            .map_err(|e| Error::OutputSinkFailure(format!("{}: {}", path.display(), e)))?;
        log::info!(
            "{}: writing {}-bit IQ to {}",
            "recording".blue(),
            bits_per_sample,
            path.display()
        );
        Ok(Self {
            sink: IqSink::File(BufWriter::with_capacity(BUFFER_SIZE, file)),
            bits_per_sample,
            num_samples: 0,
        })
    }

    pub fn new_stdout(bits_per_sample: u8) -> Self {
        log::info!(
            "{}: streaming {}-bit IQ to stdout",
            "recording".blue(),
            bits_per_sample
        );
        Self {
            sink: IqSink::Stdout(std::io::stdout()),
            bits_per_sample,
            num_samples: 0,
        }
    }

    pub fn num_samples(&self) -> u64 {
        self.num_samples
    }

    pub fn write_chunk(&mut self, samples: &[IQSample]) -> Result<(), Error> {
        let bytes = match self.bits_per_sample {
            16 => encode_16bit(samples),
            8 => encode_8bit(samples),
            1 => encode_1bit(samples),
            other => {
                return Err(Error::OutputSinkFailure(format!(
                    "unsupported bits per sample: {}",
                    other
                )))
            }
        };
        match &mut self.sink {
            IqSink::Stdout(out) => {
                let mut lock = out.lock();
                lock.write_all(&bytes)
                    .and_then(|_| lock.flush())
                    .map_err(|e| Error::OutputSinkFailure(e.to_string()))?;
            }
            IqSink::File(writer) => {
                writer
                    .write_all(&bytes)
                    .map_err(|e| Error::OutputSinkFailure(e.to_string()))?;
            }
        }
        self.num_samples += samples.len() as u64;
        Ok(())
    }

    pub fn finish(&mut self) -> Result<(), Error> {
        if let IqSink::File(writer) = &mut self.sink {
            writer
                .flush()
                .map_err(|e| Error::OutputSinkFailure(e.to_string()))?;
        }
        log::info!(
            "{}: {} samples written ({})",
            "recording".blue(),
            self.num_samples,
            crate::util::pretty_print(self.num_samples * self.bytes_per_sample())
        );
        Ok(())
    }

    fn bytes_per_sample(&self) -> u64 {
        match self.bits_per_sample {
            16 => 4,
            8 => 2,
            _ => 1,
        }
    }
}

fn encode_16bit(samples: &[IQSample]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 4);
    for s in samples {
        bytes.extend_from_slice(&s.re.to_le_bytes());
        bytes.extend_from_slice(&s.im.to_le_bytes());
    }
    bytes
}

fn encode_8bit(samples: &[IQSample]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for s in samples {
        bytes.push((s.re >> 8) as u8);
        bytes.push((s.im >> 8) as u8);
    }
    bytes
}

fn encode_1bit(samples: &[IQSample]) -> Vec<u8> {
    // Sign bits packed MSB first, I before Q
    let mut bytes = vec![0u8; (samples.len() * 2 + 7) / 8];
    for (i, s) in samples.iter().enumerate() {
        if s.re > 0 {
            bytes[(2 * i) / 8] |= 1 << (7 - (2 * i) % 8);
        }
        if s.im > 0 {
            bytes[(2 * i + 1) / 8] |= 1 << (7 - (2 * i + 1) % 8);
        }
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_16bit_little_endian_interleaved() {
        let samples = vec![IQSample::new(0x1234, -2), IQSample::new(-1, 256)];
        let bytes = encode_16bit(&samples);
        assert_eq!(bytes, vec![0x34, 0x12, 0xFE, 0xFF, 0xFF, 0xFF, 0x00, 0x01]);
    }

    #[test]
    fn test_8bit_keeps_high_byte() {
        let samples = vec![IQSample::new(0x1234, -256)];
        let bytes = encode_8bit(&samples);
        assert_eq!(bytes, vec![0x12, 0xFF]);
    }

    #[test]
    fn test_1bit_packs_signs() {
        let samples = vec![
            IQSample::new(100, -5),
            IQSample::new(-7, 3),
            IQSample::new(1, 1),
            IQSample::new(-1, -1),
        ];
        let bytes = encode_1bit(&samples);
        // Signs: + - - + + + - -  ->  0b10011100
        assert_eq!(bytes, vec![0b1001_1100]);
    }

    #[test]
    fn test_file_round_trip() {
        let path =
            std::env::temp_dir().join(format!("gnss-sim-rec-{}.bin", std::process::id()));
        {
            let mut recording = IQRecording::new_file(&path, 16).unwrap();
            recording
                .write_chunk(&[IQSample::new(1, 2), IQSample::new(3, 4)])
                .unwrap();
            recording.finish().unwrap();
            assert_eq!(recording.num_samples(), 2);
        }
        let bytes = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(bytes, vec![1, 0, 2, 0, 3, 0, 4, 0]);
    }

    #[test]
    fn test_create_failure() {
        let res = IQRecording::new_file(Path::new("/nonexistent/dir/iq.bin"), 16);
        assert!(matches!(res, Err(Error::OutputSinkFailure(_))));
    }
}
