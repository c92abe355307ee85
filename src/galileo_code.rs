use crate::constants::{GALILEO_PRIMARY_LEN, GALILEO_SECONDARY_LEN};
use crate::lfsr::Lfsr;

// Primary: x^12 + x^6 + x^4 + x + 1, secondary: x^5 + x^3 + 1
const PRIMARY_TAPS: u32 = 0x829;
const SECONDARY_TAPS: u32 = 0x14;

/// Galileo E1 OS tiered code for one PRN.
///
/// The 4092-chip primary and 25-chip secondary sequences are cut from
/// PRN-seeded LFSR streams and stored, so both periods are exact. One
/// secondary chip covers one whole primary epoch; the tiered chip is the
/// product of the two.
#[derive(Debug, Clone)]
pub struct TieredCode {
    primary: Vec<i8>,
    secondary: Vec<i8>,
    prn: u8,
    position: usize,
    epoch: usize,
}

impl TieredCode {
    pub fn new(prn: u8) -> Self {
        assert!((1..=36).contains(&prn), "Galileo PRN must be 1-36, got {}", prn);

        let primary_seed = 0x800 + ((prn as u32 * 13) & 0xFFF);
        let secondary_seed = 0x10 + ((prn as u32 * 3) & 0x1F);

        let mut primary_lfsr = Lfsr::new(12, PRIMARY_TAPS, primary_seed);
        let primary = (0..GALILEO_PRIMARY_LEN)
            .map(|_| bipolar(primary_lfsr.clock()))
            .collect();

        let mut secondary_lfsr = Lfsr::new(5, SECONDARY_TAPS, secondary_seed);
        let secondary = (0..GALILEO_SECONDARY_LEN)
            .map(|_| bipolar(secondary_lfsr.clock()))
            .collect();

        Self {
            primary,
            secondary,
            prn,
            position: 0,
            epoch: 0,
        }
    }

    pub fn prn(&self) -> u8 {
        self.prn
    }

    pub fn advance_one_chip(&mut self) -> i8 {
        let chip = self.primary[self.position] * self.secondary[self.epoch];
        self.position += 1;
        if self.position == GALILEO_PRIMARY_LEN {
            self.position = 0;
            self.epoch = (self.epoch + 1) % GALILEO_SECONDARY_LEN;
        }
        chip
    }

    /// One full primary epoch of tiered chips from the current state.
    pub fn generate_epoch(&mut self) -> Vec<i8> {
        (0..GALILEO_PRIMARY_LEN)
            .map(|_| self.advance_one_chip())
            .collect()
    }
}

fn bipolar(bit: u8) -> i8 {
    if bit == 0 {
        1
    } else {
        -1
    }
}
