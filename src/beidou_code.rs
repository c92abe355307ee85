use crate::constants::BEIDOU_CODE_LEN;
use crate::lfsr::Lfsr;

// x^11 + x^9 + x^8 + x^5 + x^2 + 1 and x^11 + x^10 + x^8 + x^7 + x^4 + x^3 + 1
const POLY1_TAPS: u32 = 0x592;
const POLY2_TAPS: u32 = 0x6CC;

/// BeiDou B1I composite code for one PRN.
///
/// Two 11-bit LFSRs with PRN-derived seeds feed one of four logical chip
/// combinations selected by PRN mod 4, yielding 37 distinct families. The
/// 2046-chip table is cut from the combined stream so the period is exact.
#[derive(Debug, Clone)]
pub struct CssCode {
    code: Vec<i8>,
    prn: u8,
    position: usize,
}

impl CssCode {
    pub fn new(prn: u8) -> Self {
        assert!((1..=37).contains(&prn), "BeiDou PRN must be 1-37, got {}", prn);

        let seed1 = 0x400 + (prn as u32 & 0x3FF);
        let seed2 = 0x600 + ((prn as u32 * 7) & 0x3FF);
        let mut lfsr1 = Lfsr::new(11, POLY1_TAPS, seed1);
        let mut lfsr2 = Lfsr::new(11, POLY2_TAPS, seed2);

        let code = (0..BEIDOU_CODE_LEN)
            .map(|_| {
                let c1 = lfsr1.clock();
                let c2 = lfsr2.clock();
                let bit = match prn % 4 {
                    0 => c1 ^ c2,
                    1 => c1 & (c2 ^ 1),
                    2 => (c1 ^ 1) ^ c2,
                    _ => c1,
                };
                if bit == 0 {
                    1
                } else {
                    -1
                }
            })
            .collect();

        Self {
            code,
            prn,
            position: 0,
        }
    }

    pub fn prn(&self) -> u8 {
        self.prn
    }

    pub fn advance_one_chip(&mut self) -> i8 {
        let chip = self.code[self.position];
        self.position = (self.position + 1) % BEIDOU_CODE_LEN;
        chip
    }

    pub fn generate_period(&mut self) -> Vec<i8> {
        (0..BEIDOU_CODE_LEN)
            .map(|_| self.advance_one_chip())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_is_2046() {
        let mut code = CssCode::new(1);
        let first = code.generate_period();
        let second = code.generate_period();
        assert_eq!(first.len(), 2046);
        assert_eq!(first, second);
    }

    #[test]
    fn test_four_combination_classes_differ() {
        // PRNs 1-4 exercise each of the four chip combinations
        let codes: Vec<Vec<i8>> = (1..=4)
            .map(|prn| CssCode::new(prn).generate_period())
            .collect();
        for i in 0..4 {
            for j in (i + 1)..4 {
                assert_ne!(codes[i], codes[j], "PRN {} vs {}", i + 1, j + 1);
            }
        }
    }

    #[test]
    fn test_same_class_distinct_seeds_differ() {
        let mut a = CssCode::new(1);
        let mut b = CssCode::new(5);
        assert_ne!(a.generate_period(), b.generate_period());
    }

    #[test]
    fn test_chips_are_bipolar() {
        let mut code = CssCode::new(9);
        assert!(code.generate_period().iter().all(|&c| c == 1 || c == -1));
    }

    #[test]
    fn test_deterministic() {
        let mut a = CssCode::new(23);
        let mut b = CssCode::new(23);
        assert_eq!(a.generate_period(), b.generate_period());
    }
}
