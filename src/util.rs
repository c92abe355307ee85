const PI: f64 = std::f64::consts::PI;

// WGS-84 ellipsoid
const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// Geodetic latitude/longitude/height (deg, deg, m) to ECEF meters.
pub fn llh_to_ecef(llh: &[f64; 3]) -> [f64; 3] {
    let lat = llh[0] * PI / 180.0;
    let lon = llh[1] * PI / 180.0;
    let height = llh[2];

    let e2 = WGS84_F * (2.0 - WGS84_F);
    let sin_lat = lat.sin();
    let n = WGS84_A / (1.0 - e2 * sin_lat * sin_lat).sqrt();

    [
        (n + height) * lat.cos() * lon.cos(),
        (n + height) * lat.cos() * lon.sin(),
        (n * (1.0 - e2) + height) * sin_lat,
    ]
}

/// First-order ionospheric group delay placeholder. Still a stub.
pub fn ionospheric_delay_s(
    _user_ecef: &[f64; 3],
    _sat_ecef: &[f64; 3],
    _frequency_hz: f64,
) -> f64 {
    0.0
}

/// First-order tropospheric delay placeholder. Still a stub.
pub fn tropospheric_delay_s(_user_ecef: &[f64; 3], _sat_ecef: &[f64; 3]) -> f64 {
    0.0
}

pub fn pretty_print(num_bytes: u64) -> String {
    if num_bytes >= 1024 * 1024 * 1024 {
        format!("{:.1} GB", num_bytes as f64 / 1024.0 / 1024.0 / 1024.0)
    } else if num_bytes >= 1024 * 1024 {
        format!("{:.1} MB", num_bytes as f64 / 1024.0 / 1024.0)
    } else if num_bytes >= 1024 {
        format!("{:.1} KB", num_bytes as f64 / 1024.0)
    } else {
        format!("{} B", num_bytes)
    }
}
