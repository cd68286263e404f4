//! Error types for benchmark runs.
//!
//! There are exactly two fatal error classes, plus I/O failures from the
//! result sink. A configuration error means the *input* was bad and is
//! reported before any timing happens. A measurement error means a trial
//! ran but its *result* is suspect (a non-finite accumulator, an
//! unformattable timestamp) — the run aborts rather than emit records that
//! look valid and are not. There is no in-run recovery in either case.

use std::fmt;
use std::io;

/// Fatal benchmark error.
#[derive(Debug)]
pub enum Error {
    /// Bad run configuration: unparsable argument, unknown operand mode,
    /// unusable output path. Raised before the first timed region.
    Config(String),
    /// Measurement-integrity failure: the run produced data that cannot be
    /// trusted. The offending trial's record has already been emitted.
    Measurement(String),
    /// Result sink I/O failure.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Measurement(msg) => write!(f, "measurement integrity failure: {msg}"),
            Self::Io(err) => write!(f, "output error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_distinguishes_classes() {
        let config = Error::Config("unknown mode 'fast'".into());
        let measure = Error::Measurement("accumulator went non-finite".into());
        assert!(config.to_string().starts_with("configuration error"));
        assert!(measure.to_string().starts_with("measurement integrity"));
    }
}
