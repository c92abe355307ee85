use colored::Colorize;
use gnss_rs::constellation::Constellation;
use gnss_rs::sv::SV;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::ephemeris::Ephemeris;
use crate::error::Error;

/// Read one 19-column numeric slot, normalising Fortran D exponents.
/// Malformed or absent slots default to 0.0 so a single bad field does not
/// abort the whole parse.
fn parse_slot(line: &str, pos: usize) -> f64 {
    if pos >= line.len() {
        return 0.0;
    }
    let end = usize::min(pos + 19, line.len());
    let field: String = line[pos..end]
        .chars()
        .map(|c| if c == 'D' || c == 'd' { 'E' } else { c })
        .collect();
    field.trim().parse::<f64>().unwrap_or(0.0)
}

fn parse_prn(line: &str, pos: usize) -> Option<u8> {
    line.get(pos..pos + 2)?.trim().parse::<u8>().ok()
}

/// Does this record line open an ephemeris block for `constellation`?
/// RINEX 2.11 carries a bare PRN in the first columns (GPS only); RINEX 3.0
/// prefixes the PRN with a constellation letter.
fn record_prn(line: &str, constellation: Constellation) -> Option<u8> {
    let first = line.chars().next()?;
    let tag = match constellation {
        Constellation::GPS => 'G',
        Constellation::Galileo => 'E',
        Constellation::BeiDou => 'C',
        Constellation::Glonass => 'R',
        _ => return None,
    };
    if first == tag {
        return parse_prn(line, 1);
    }
    if constellation == Constellation::GPS && (first == ' ' || first.is_ascii_digit()) {
        return parse_prn(line, 0);
    }
    None
}

/// Parse a RINEX navigation file and return the ephemerides of one
/// constellation keyed by PRN.
pub fn load_ephemerides(
    path: &Path,
    constellation: Constellation,
) -> Result<HashMap<u8, Ephemeris>, Error> {
    let file = File::open(path)
        .map_err(|e| Error::EphemerisLoad(format!("{}: {}", path.display(), e)))?;
    let reader = BufReader::new(file);

    let mut lines = reader.lines();
    let mut header_done = false;
    for line in lines.by_ref() {
        let line = line.map_err(|e| Error::EphemerisLoad(e.to_string()))?;
        if line.contains("END OF HEADER") {
            header_done = true;
            break;
        }
    }
    if !header_done {
        return Err(Error::EphemerisLoad(format!(
            "{}: no END OF HEADER terminator",
            path.display()
        )));
    }

    let mut ephemerides = HashMap::new();
    while let Some(line) = lines.next() {
        let line = line.map_err(|e| Error::EphemerisLoad(e.to_string()))?;
        let prn = match record_prn(&line, constellation) {
            Some(prn) if prn >= 1 => prn,
            _ => continue,
        };

        let mut eph = Ephemeris::new(SV::new(constellation, prn));
        eph.toc = parse_slot(&line, 22);
        eph.f2 = parse_slot(&line, 60);

        // Orbit lines 2-6, four 19-column slots each
        let mut orbit = [[0.0f64; 4]; 5];
        let mut truncated = false;
        for row in orbit.iter_mut() {
            match lines.next() {
                Some(Ok(cont)) => {
                    for (col, value) in row.iter_mut().enumerate() {
                        *value = parse_slot(&cont, col * 19);
                    }
                }
                Some(Err(e)) => return Err(Error::EphemerisLoad(e.to_string())),
                None => {
                    truncated = true;
                    break;
                }
            }
        }
        if truncated {
            return Err(Error::EphemerisLoad(format!(
                "{}: truncated record for PRN {}",
                path.display(),
                prn
            )));
        }

        eph.f1 = orbit[0][0];
        eph.f0 = orbit[0][1];
        eph.iode = orbit[0][2];
        eph.crs = orbit[0][3];
        eph.deln = orbit[1][0];
        eph.m0 = orbit[1][1];
        eph.cuc = orbit[1][2];
        eph.ecc = orbit[1][3];
        eph.cus = orbit[2][0];
        eph.sqrt_a = orbit[2][1];
        eph.toe = orbit[2][2];
        eph.cic = orbit[2][3];
        eph.omg0 = orbit[3][0];
        eph.cis = orbit[3][1];
        eph.i0 = orbit[3][2];
        eph.crc = orbit[3][3];
        eph.omg = orbit[4][0];
        eph.omg_dot = orbit[4][1];
        eph.i_dot = orbit[4][2];

        eph.is_valid = true;
        ephemerides.insert(prn, eph);
    }

    log::info!(
        "{}: {} {} ephemeris records from {}",
        "rinex".blue(),
        ephemerides.len(),
        constellation,
        path.display()
    );
    Ok(ephemerides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn slot(v: f64) -> String {
        // Fortran style D-exponent field, 19 columns
        format!("{:>19}", format!("{:.12E}", v).replace('E', "D"))
    }

    fn gps_record_v2(prn: u8, sqrt_a: f64, ecc: f64) -> String {
        let mut s = String::new();
        s.push_str(&format!(
            "{:2} 23 11 29  0  0  0.0{}{}{}\n",
            prn,
            slot(0.0),
            slot(1e-5),
            slot(0.0)
        ));
        s.push_str(&format!("{}{}{}{}\n", slot(0.0), slot(1e-4), slot(55.0), slot(12.5)));
        s.push_str(&format!("{}{}{}{}\n", slot(4.5e-9), slot(0.5), slot(2.1e-6), slot(ecc)));
        s.push_str(&format!("{}{}{}{}\n", slot(7.8e-6), slot(sqrt_a), slot(252000.0), slot(1.0e-7)));
        s.push_str(&format!("{}{}{}{}\n", slot(1.2), slot(-2.0e-7), slot(0.95), slot(200.0)));
        s.push_str(&format!("{}{}{}{}\n", slot(0.6), slot(-8.1e-9), slot(4.0e-10), slot(1.0)));
        s
    }

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("gnss-sim-{}-{}", std::process::id(), name));
        let mut f = File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_rinex2_three_gps_records() {
        let mut content = String::from(
            "     2.11           NAVIGATION DATA                         RINEX VERSION / TYPE\n\
             gnss-sim            test                                    PGM / RUN BY / DATE\n\
             \x20                                                           END OF HEADER\n",
        );
        content.push_str(&gps_record_v2(1, 5153.6, 0.005));
        content.push_str(&gps_record_v2(7, 5153.7, 0.011));
        content.push_str(&gps_record_v2(23, 5153.8, 0.002));

        let path = write_temp("v2.nav", &content);
        let map = load_ephemerides(&path, Constellation::GPS).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(map.len(), 3);
        for prn in [1u8, 7, 23] {
            let eph = &map[&prn];
            assert!(eph.is_valid);
            assert!(eph.sqrt_a > 5000.0);
            assert_eq!(eph.sv.prn, prn);
        }
        assert!((map[&1].ecc - 0.005).abs() < 1e-12);
        assert!((map[&1].toe - 252000.0).abs() < 1e-6);
        assert!((map[&1].crs - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_rinex3_constellation_filter() {
        let mut content = String::from(
            "     3.00           NAVIGATION DATA     M                   RINEX VERSION / TYPE\n\
             \x20                                                           END OF HEADER\n",
        );
        let body = gps_record_v2(4, 5440.6, 0.001);
        // Same record shape, tagged for Galileo and BeiDou
        content.push_str(&format!("E{}", &body[1..]));
        content.push_str(&format!("C{}", &body[1..]));

        let path = write_temp("v3.nav", &content);
        let galileo = load_ephemerides(&path, Constellation::Galileo).unwrap();
        let beidou = load_ephemerides(&path, Constellation::BeiDou).unwrap();
        let gps = load_ephemerides(&path, Constellation::GPS).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(galileo.len(), 1);
        assert!(galileo[&4].is_valid);
        assert_eq!(beidou.len(), 1);
        assert!(gps.is_empty());
    }

    #[test]
    fn test_missing_header_terminator() {
        let path = write_temp("broken.nav", "just some text\nwith no terminator\n");
        let res = load_ephemerides(&path, Constellation::GPS);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(res, Err(Error::EphemerisLoad(_))));
    }

    #[test]
    fn test_truncated_record() {
        let mut content = String::from(
            "     2.11           NAVIGATION DATA                         RINEX VERSION / TYPE\n\
             \x20                                                           END OF HEADER\n",
        );
        let full = gps_record_v2(9, 5153.6, 0.003);
        let cut: Vec<&str> = full.lines().take(3).collect();
        content.push_str(&cut.join("\n"));

        let path = write_temp("truncated.nav", &content);
        let res = load_ephemerides(&path, Constellation::GPS);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(res, Err(Error::EphemerisLoad(_))));
    }

    #[test]
    fn test_malformed_slot_defaults_to_zero() {
        let mut content = String::from(
            "     2.11           NAVIGATION DATA                         RINEX VERSION / TYPE\n\
             \x20                                                           END OF HEADER\n",
        );
        let record = gps_record_v2(2, 5153.6, 0.004).replace("4.500000000000D-9", "  not-a-number   ");
        content.push_str(&record);

        let path = write_temp("malformed.nav", &content);
        let map = load_ephemerides(&path, Constellation::GPS).unwrap();
        std::fs::remove_file(&path).unwrap();

        let eph = &map[&2];
        assert!(eph.is_valid);
        assert_eq!(eph.deln, 0.0);
        assert!((eph.sqrt_a - 5153.6).abs() < 1e-9);
    }

    #[test]
    fn test_open_failure() {
        let res = load_ephemerides(Path::new("/nonexistent/file.nav"), Constellation::GPS);
        assert!(matches!(res, Err(Error::EphemerisLoad(_))));
    }
}
