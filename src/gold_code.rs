use crate::constants::GPS_CODE_LEN;
use crate::lfsr::Lfsr;

// G1: x^10 + x^3 + 1, G2: x^10 + x^9 + x^8 + x^6 + x^3 + x^2 + 1
const G1_TAPS: u32 = 0x204;
const G2_TAPS: u32 = 0x3A6;
const ALL_ONES: u32 = 0x3FF;

// G2 chip delay per PRN 1-37 (ICD-GPS-200 table)
const G2_DELAY: [usize; 37] = [
    5, 6, 7, 8, 17, 18, 139, 140, 141, 251, /*  1-10 */
    252, 254, 255, 256, 257, 258, 469, 470, 471, 472, /* 11-20 */
    473, 474, 509, 512, 513, 514, 515, 516, 859, 860, /* 21-30 */
    861, 862, 863, 950, 947, 948, 950, /* 31-37 */
];

/// GPS L1 C/A Gold code generator for one PRN.
///
/// Both registers start all-ones; G2 is pre-advanced so that the emitted
/// chip stream is G1(t) xor G2(t - delay) for the PRN's ICD delay.
#[derive(Debug, Clone)]
pub struct GoldCode {
    g1: Lfsr,
    g2: Lfsr,
    prn: u8,
}

impl GoldCode {
    pub fn new(prn: u8) -> Self {
        assert!((1..=37).contains(&prn), "GPS PRN must be 1-37, got {}", prn);
        let g1 = Lfsr::new(10, G1_TAPS, ALL_ONES);
        let mut g2 = Lfsr::new(10, G2_TAPS, ALL_ONES);
        g2.advance(GPS_CODE_LEN - G2_DELAY[(prn - 1) as usize]);
        Self { g1, g2, prn }
    }

    pub fn prn(&self) -> u8 {
        self.prn
    }

    /// Next chip as a bipolar value: code bit 0 -> +1, 1 -> -1.
    pub fn advance_one_chip(&mut self) -> i8 {
        let bit = self.g1.clock() ^ self.g2.clock();
        if bit == 0 {
            1
        } else {
            -1
        }
    }

    /// One full 1023-chip period from the current state.
    pub fn generate_period(&mut self) -> Vec<i8> {
        (0..GPS_CODE_LEN).map(|_| self.advance_one_chip()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_is_1023() {
        let mut code = GoldCode::new(1);
        let first = code.generate_period();
        let second = code.generate_period();
        assert_eq!(first.len(), 1023);
        assert_eq!(first, second);
    }

    #[test]
    fn test_chips_are_bipolar() {
        let mut code = GoldCode::new(7);
        assert!(code.generate_period().iter().all(|&c| c == 1 || c == -1));
    }

    #[test]
    fn test_balance() {
        // Balanced Gold codes are off by exactly one chip
        for prn in 1..=37u8 {
            let mut code = GoldCode::new(prn);
            let sum: i32 = code.generate_period().iter().map(|&c| c as i32).sum();
            assert_eq!(sum.abs(), 1, "PRN {} balance {}", prn, sum);
        }
    }

    #[test]
    fn test_distinct_prns_differ() {
        let mut a = GoldCode::new(1);
        let mut b = GoldCode::new(2);
        assert_ne!(a.generate_period(), b.generate_period());
    }

    #[test]
    fn test_deterministic() {
        let mut a = GoldCode::new(19);
        let mut b = GoldCode::new(19);
        assert_eq!(a.generate_period(), b.generate_period());
    }

    #[test]
    fn test_cross_correlation_three_valued() {
        // Gold pairs take cross-correlation values in {-65, -1, 63} for n=10
        let pairs = [(1u8, 2u8), (5, 9), (17, 30), (3, 24)];
        for &(p1, p2) in &pairs {
            let a = GoldCode::new(p1).generate_period();
            let b = GoldCode::new(p2).generate_period();
            for lag in 0..50 {
                let r: i32 = (0..1023)
                    .map(|i| a[i] as i32 * b[(i + lag) % 1023] as i32)
                    .sum();
                assert!(
                    r == -65 || r == -1 || r == 63,
                    "PRN {}/{} lag {} correlation {}",
                    p1,
                    p2,
                    lag,
                    r
                );
            }
        }
    }
}
