use once_cell::sync::Lazy;
use rustfft::num_complex::Complex32;

use crate::types::IQSample;

const PI: f64 = std::f64::consts::PI;

pub const LUT_SIZE: usize = 16384;

// Post-mix attenuation so a full-scale input cannot double after mixing
const MIX_SCALE: f32 = 0.5;

// One unit circle shared by every oscillator
static CARRIER_LUT: Lazy<Vec<Complex32>> = Lazy::new(|| {
    (0..LUT_SIZE)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / LUT_SIZE as f64;
            Complex32::new(angle.cos() as f32, angle.sin() as f32)
        })
        .collect()
});

/// Numerically controlled oscillator with table-lookup carrier synthesis.
///
/// Phase is tracked in f64 and wrapped to [0, 2*pi) so long runs do not
/// drift; the table index quantises only the emitted sample.
#[derive(Debug, Clone)]
pub struct Nco {
    sample_rate_hz: f64,
    frequency_hz: f64,
    phase: f64,
    phase_increment: f64,
}

impl Nco {
    pub fn new(sample_rate_hz: f64) -> Self {
        Self {
            sample_rate_hz,
            frequency_hz: 0.0,
            phase: 0.0,
            phase_increment: 0.0,
        }
    }

    pub fn set_frequency(&mut self, frequency_hz: f64) {
        self.frequency_hz = frequency_hz;
        self.phase_increment = 2.0 * PI * frequency_hz / self.sample_rate_hz;
    }

    pub fn frequency(&self) -> f64 {
        self.frequency_hz
    }

    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
    }

    fn step(&mut self) -> Complex32 {
        let index = (self.phase * LUT_SIZE as f64 / (2.0 * PI)) as usize % LUT_SIZE;
        let sample = CARRIER_LUT[index];
        self.phase = (self.phase + self.phase_increment).rem_euclid(2.0 * PI);
        sample
    }

    /// Fill `buffer` with unit-amplitude carrier samples.
    pub fn generate(&mut self, buffer: &mut [Complex32]) {
        for s in buffer.iter_mut() {
            *s = self.step();
        }
    }

    /// Translate an int16 IQ buffer in place by the programmed frequency.
    pub fn mix(&mut self, buffer: &mut [IQSample]) {
        for s in buffer.iter_mut() {
            let carrier = self.step();
            let re = s.re as f32;
            let im = s.im as f32;
            let mixed_re = re * carrier.re - im * carrier.im;
            let mixed_im = re * carrier.im + im * carrier.re;
            *s = IQSample::new(
                (mixed_re * MIX_SCALE) as i16,
                (mixed_im * MIX_SCALE) as i16,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustfft::num_complex::Complex64;
    use rustfft::FftPlanner;

    #[test]
    fn test_generate_unit_amplitude() {
        let mut nco = Nco::new(60e6);
        nco.set_frequency(1e6);
        let mut buffer = vec![Complex32::new(0.0, 0.0); 1024];
        nco.generate(&mut buffer);
        for s in &buffer {
            assert!((s.norm() - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_phase_continuity_across_calls() {
        let fs = 60e6;
        let mut split = Nco::new(fs);
        split.set_frequency(-6.58e6);
        let mut a = vec![Complex32::new(0.0, 0.0); 500];
        let mut b = vec![Complex32::new(0.0, 0.0); 500];
        split.generate(&mut a);
        split.generate(&mut b);

        let mut whole = Nco::new(fs);
        whole.set_frequency(-6.58e6);
        let mut c = vec![Complex32::new(0.0, 0.0); 1000];
        whole.generate(&mut c);

        for i in 0..500 {
            assert_eq!(a[i], c[i]);
            assert_eq!(b[i], c[500 + i]);
        }
    }

    #[test]
    fn test_mix_scale_at_dc() {
        // Zero-frequency carrier leaves only the 0.5 scale
        let mut nco = Nco::new(60e6);
        nco.set_frequency(0.0);
        let mut buffer = vec![IQSample::new(1000, 0); 16];
        nco.mix(&mut buffer);
        for s in &buffer {
            assert_eq!(s.re, 500);
            assert_eq!(s.im, 0);
        }
    }

    #[test]
    fn test_tone_lands_in_expected_fft_bin() {
        let fs = 8192.0;
        let n = 8192;
        let tone = 1024.0; // exactly bin 1024
        let mut nco = Nco::new(fs);
        nco.set_frequency(tone);
        let mut carrier = vec![Complex32::new(0.0, 0.0); n];
        nco.generate(&mut carrier);

        let mut spectrum: Vec<Complex64> = carrier
            .iter()
            .map(|s| Complex64::new(s.re as f64, s.im as f64))
            .collect();
        FftPlanner::new().plan_fft_forward(n).process(&mut spectrum);

        let peak = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm_sqr().partial_cmp(&b.1.norm_sqr()).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 1024);
    }

    #[test]
    fn test_negative_frequency_phase_stays_wrapped() {
        let mut nco = Nco::new(1e6);
        nco.set_frequency(-123_456.0);
        let mut buffer = vec![Complex32::new(0.0, 0.0); 4096];
        nco.generate(&mut buffer);
        for s in &buffer {
            assert!((s.norm() - 1.0).abs() < 1e-3);
        }
    }
}
