use gnss_rs::constellation::Constellation;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    ConfigInvalid(String),
    EphemerisLoad(String),
    NotReady(String),
    UnsupportedConstellation(Constellation),
    NullInput(String),
    OutputSinkFailure(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConfigInvalid(msg) => write!(f, "invalid configuration: {}", msg),
            Error::EphemerisLoad(msg) => write!(f, "ephemeris load failed: {}", msg),
            Error::NotReady(msg) => write!(f, "not ready: {}", msg),
            Error::UnsupportedConstellation(c) => write!(f, "unsupported constellation: {}", c),
            Error::NullInput(msg) => write!(f, "null input: {}", msg),
            Error::OutputSinkFailure(msg) => write!(f, "output sink failure: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
