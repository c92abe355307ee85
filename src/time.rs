use gnss_rs::constellation::Constellation;

pub const LEAP_SECONDS: f64 = 18.0;

// BeiDou time starts 14 s behind GPS; GLONASS runs on UTC plus three hours
const BDT_GPS_OFFSET_S: f64 = -14.0;
const GLONASS_UTC_OFFSET_S: f64 = 3.0 * 3600.0;

/// Offset added to a GPS-time instant to express it in the constellation's
/// own time system. Galileo system time is aligned with GPS time.
pub fn system_time_offset_s(constellation: Constellation) -> f64 {
    match constellation {
        Constellation::BeiDou => BDT_GPS_OFFSET_S,
        Constellation::Glonass => GLONASS_UTC_OFFSET_S - LEAP_SECONDS,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gps_and_galileo_share_time_base() {
        assert_eq!(system_time_offset_s(Constellation::GPS), 0.0);
        assert_eq!(system_time_offset_s(Constellation::Galileo), 0.0);
    }

    #[test]
    fn test_beidou_offset() {
        assert_eq!(system_time_offset_s(Constellation::BeiDou), -14.0);
    }

    #[test]
    fn test_glonass_offset() {
        assert_eq!(system_time_offset_s(Constellation::Glonass), 10782.0);
    }
}
