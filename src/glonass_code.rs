use crate::constants::GLONASS_CODE_LEN;
use crate::lfsr::Lfsr;

// x^9 + x^5 + 1, all-ones start
const TAPS: u32 = 0x110;
const ALL_ONES: u32 = 0x1FF;

/// GLONASS L1 C/A 511-chip m-sequence.
///
/// Every satellite transmits the same code; separation is by frequency.
#[derive(Debug, Clone)]
pub struct GlonassCode {
    lfsr: Lfsr,
}

impl GlonassCode {
    pub fn new() -> Self {
        Self {
            lfsr: Lfsr::new(9, TAPS, ALL_ONES),
        }
    }

    pub fn advance_one_chip(&mut self) -> i8 {
        if self.lfsr.clock() == 0 {
            1
        } else {
            -1
        }
    }

    pub fn generate_period(&mut self) -> Vec<i8> {
        (0..GLONASS_CODE_LEN)
            .map(|_| self.advance_one_chip())
            .collect()
    }
}

impl Default for GlonassCode {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_is_511() {
        let mut code = GlonassCode::new();
        let first = code.generate_period();
        let second = code.generate_period();
        assert_eq!(first.len(), 511);
        assert_eq!(first, second);
    }

    #[test]
    fn test_balance() {
        let mut code = GlonassCode::new();
        let sum: i32 = code.generate_period().iter().map(|&c| c as i32).sum();
        assert_eq!(sum.abs(), 1);
    }

    #[test]
    fn test_same_code_for_all_satellites() {
        let mut a = GlonassCode::new();
        let mut b = GlonassCode::new();
        assert_eq!(a.generate_period(), b.generate_period());
    }
}
