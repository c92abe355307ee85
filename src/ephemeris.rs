use gnss_rs::sv::SV;

/// Broadcast ephemeris record as read from a RINEX navigation file.
#[derive(Default, Clone, Copy, Debug)]
pub struct Ephemeris {
    pub sv: SV,

    pub sqrt_a: f64,   // square root of semi-major axis (sqrt(m))
    pub ecc: f64,      // eccentricity
    pub i0: f64,       // inclination at reference time (rad)
    pub omg0: f64,     // longitude of ascending node (rad)
    pub omg: f64,      // argument of perigee (rad)
    pub m0: f64,       // mean anomaly at reference time (rad)
    pub deln: f64,     // mean motion correction (rad/s)
    pub omg_dot: f64,  // rate of right ascension (rad/s)
    pub i_dot: f64,    // rate of inclination (rad/s)
    pub cuc: f64,
    pub cus: f64,
    pub crc: f64,
    pub crs: f64,
    pub cic: f64,
    pub cis: f64,

    pub f0: f64, // clock bias (s)
    pub f1: f64, // clock drift (s/s)
    pub f2: f64, // clock drift rate (s/s^2)

    pub toe: f64, // time of ephemeris (s of week)
    pub toc: f64, // time of clock (s of week)
    pub iode: f64,
    pub week: f64,

    pub is_valid: bool,
}

impl Ephemeris {
    pub fn new(sv: SV) -> Self {
        Self {
            sv,
            ..Default::default()
        }
    }

    /// Semi-major axis in meters.
    pub fn semi_major_axis(&self) -> f64 {
        self.sqrt_a * self.sqrt_a
    }

    /// Clock correction at `t` seconds of week.
    pub fn clock_bias_s(&self, t: f64) -> f64 {
        let dt = t - self.toc;
        self.f0 + self.f1 * dt + self.f2 * dt * dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gnss_rs::constellation::Constellation;

    #[test]
    fn test_semi_major_axis() {
        let mut eph = Ephemeris::new(SV::new(Constellation::GPS, 1));
        eph.sqrt_a = 5153.6;
        assert!((eph.semi_major_axis() - 26_559_593.0).abs() < 1.0);
    }

    #[test]
    fn test_clock_polynomial() {
        let mut eph = Ephemeris::new(SV::new(Constellation::GPS, 2));
        eph.toc = 100.0;
        eph.f0 = 1e-5;
        eph.f1 = 1e-9;
        let bias = eph.clock_bias_s(200.0);
        assert!((bias - (1e-5 + 1e-7)).abs() < 1e-15);
    }
}
