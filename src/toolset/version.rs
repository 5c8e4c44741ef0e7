//! MSVC version tokens.
//!
//! A version token is a dotted `major.minor` pair plus an optional edition
//! suffix, e.g. `14.1` or `14.1Exp`. All ordering and era dispatch uses the
//! numeric pair only; the suffix participates in identity and display.

use std::fmt;

use crate::error::{Result, VcEnvError};

/// Parsed MSVC version: numeric pair plus edition suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MsvcVersion {
    major: u32,
    minor: u32,
    suffix: String,
}

impl MsvcVersion {
    /// Parse a version token like `14.1` or `14.1Exp`.
    ///
    /// The numeric part must be exactly `major.minor`; everything that is
    /// not a digit or a dot becomes the suffix.
    pub fn parse(token: &str) -> Result<Self> {
        let unsupported = || VcEnvError::UnsupportedVersion {
            version: token.to_string(),
        };

        let numeric: String = token
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        let suffix: String = token
            .chars()
            .filter(|c| !c.is_ascii_digit() && *c != '.')
            .collect();

        let mut parts = numeric.split('.');
        let (major, minor) = match (parts.next(), parts.next(), parts.next()) {
            (Some(maj), Some(min), None) => (
                maj.parse().map_err(|_| unsupported())?,
                min.parse().map_err(|_| unsupported())?,
            ),
            _ => return Err(unsupported()),
        };

        Ok(Self {
            major,
            minor,
            suffix,
        })
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    /// Numeric pair used for every ordering comparison.
    pub fn numeric(&self) -> (u32, u32) {
        (self.major, self.minor)
    }

    /// The version with the suffix stripped, e.g. `14.1` for `14.1Exp`.
    pub fn numeric_token(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Express editions carry the `Exp` suffix and ship reduced layouts.
    pub fn is_express(&self) -> bool {
        self.suffix == "Exp"
    }
}

impl fmt::Display for MsvcVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.major, self.minor, self.suffix)
    }
}
