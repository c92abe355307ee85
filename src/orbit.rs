use gnss_rs::constellation::Constellation;

use crate::constants::{EARTH_MU, EARTH_ROTATION_RATE, SPEED_OF_LIGHT};
use crate::ephemeris::Ephemeris;
use crate::time;

const PI: f64 = std::f64::consts::PI;

const HALF_WEEK_S: f64 = 302_400.0;
const WEEK_S: f64 = 604_800.0;

// GLONASS circular-orbit shortcut: half-sidereal-day period, fixed plane tilt
const GLONASS_ORBIT_PERIOD_S: f64 = 43_200.0;
const GLONASS_INCLINATION_RAD: f64 = 64.8 * PI / 180.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct SatelliteEcef {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub range_m: f64,
    pub doppler_hz: f64,
}

/// Newton iteration on E - e*sin(E) = M. Clamps to the last iterate if the
/// tolerance is not reached within the iteration budget.
pub fn solve_kepler(mean_anomaly: f64, ecc: f64) -> f64 {
    let mut e = mean_anomaly;
    for _ in 0..10 {
        let delta = (e - ecc * e.sin() - mean_anomaly) / (1.0 - ecc * e.cos());
        e -= delta;
        if delta.abs() < 1e-10 {
            break;
        }
    }
    e
}

/// Satellite ECEF state at GPS time `t_gps` for a user at `user_ecef`.
///
/// The constellation tag on the ephemeris selects the time-system offset;
/// GLONASS records take the circular-orbit shortcut instead of the full
/// Keplerian form.
pub fn propagate(
    eph: &Ephemeris,
    t_gps: f64,
    user_ecef: &[f64; 3],
    carrier_hz: f64,
) -> SatelliteEcef {
    if !eph.is_valid {
        return SatelliteEcef::default();
    }
    if eph.sv.constellation == Constellation::Glonass {
        return propagate_circular(eph, t_gps, user_ecef, carrier_hz);
    }

    let a = eph.semi_major_axis();
    let t_sys = t_gps + time::system_time_offset_s(eph.sv.constellation);
    let mut dt = t_sys - eph.toe;
    if dt > HALF_WEEK_S {
        dt -= WEEK_S;
    }
    if dt < -HALF_WEEK_S {
        dt += WEEK_S;
    }

    let n0 = (EARTH_MU / (a * a * a)).sqrt();
    let n = n0 + eph.deln;
    let mean_anomaly = eph.m0 + n * dt;
    let ecc_anomaly = solve_kepler(mean_anomaly, eph.ecc);

    let nu = ((1.0 - eph.ecc * eph.ecc).sqrt() * ecc_anomaly.sin())
        .atan2(ecc_anomaly.cos() - eph.ecc);

    let phi = nu + eph.omg;
    let du = eph.cus * (2.0 * phi).sin() + eph.cuc * (2.0 * phi).cos();
    let dr = eph.crs * (2.0 * phi).sin() + eph.crc * (2.0 * phi).cos();
    let di = eph.cis * (2.0 * phi).sin() + eph.cic * (2.0 * phi).cos();

    let u = phi + du;
    let r = a * (1.0 - eph.ecc * ecc_anomaly.cos()) + dr;
    let inc = eph.i0 + eph.i_dot * dt + di;
    let omega = eph.omg0 + (eph.omg_dot - EARTH_ROTATION_RATE) * dt;

    let x = r * (u.cos() * omega.cos() - u.sin() * inc.cos() * omega.sin());
    let y = r * (u.cos() * omega.sin() + u.sin() * inc.cos() * omega.cos());
    let z = r * u.sin() * inc.sin();

    let range_m = range_to(user_ecef, x, y, z);
    let v_radial = n0 * eph.sqrt_a * eph.ecc * nu.sin();
    let doppler_hz = -v_radial * carrier_hz / SPEED_OF_LIGHT;

    SatelliteEcef {
        x,
        y,
        z,
        range_m,
        doppler_hz,
    }
}

fn propagate_circular(
    eph: &Ephemeris,
    t_gps: f64,
    user_ecef: &[f64; 3],
    carrier_hz: f64,
) -> SatelliteEcef {
    let t_sys = t_gps + time::system_time_offset_s(eph.sv.constellation);
    let dt = t_sys - eph.toe;
    let mean_anomaly = 2.0 * PI * dt / GLONASS_ORBIT_PERIOD_S;
    let radius = eph.semi_major_axis();

    let x_orb = radius * mean_anomaly.cos();
    let y_orb = radius * mean_anomaly.sin();

    let y_rot = y_orb * GLONASS_INCLINATION_RAD.cos();
    let z = y_orb * GLONASS_INCLINATION_RAD.sin();

    let x = x_orb * eph.omg0.cos() - y_rot * eph.omg0.sin();
    let y = x_orb * eph.omg0.sin() + y_rot * eph.omg0.cos();

    let range_m = range_to(user_ecef, x, y, z);
    let n0 = if radius > 0.0 {
        (EARTH_MU / (radius * radius * radius)).sqrt()
    } else {
        0.0
    };
    let v_radial = n0 * eph.sqrt_a * eph.ecc * mean_anomaly.sin();
    let doppler_hz = -v_radial * carrier_hz / SPEED_OF_LIGHT;

    SatelliteEcef {
        x,
        y,
        z,
        range_m,
        doppler_hz,
    }
}

fn range_to(user_ecef: &[f64; 3], x: f64, y: f64, z: f64) -> f64 {
    let dx = x - user_ecef[0];
    let dy = y - user_ecef[1];
    let dz = z - user_ecef[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}
