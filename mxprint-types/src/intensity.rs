//! Print head intensity

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Print head intensity (darkness), 0x00 to 0xFF
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Intensity(u8);

impl Intensity {
    /// Light print
    pub const LOW: Self = Self(0x30);

    /// Medium print
    pub const MEDIUM: Self = Self(0x5D);

    /// Dark print
    pub const HIGH: Self = Self(0x90);

    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Default for Intensity {
    fn default() -> Self {
        Self::MEDIUM
    }
}

impl From<u8> for Intensity {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<Intensity> for u8 {
    fn from(intensity: Intensity) -> u8 {
        intensity.0
    }
}

/// Accepts `low`, `medium`, `high`, a decimal value or a `0x` hex value
impl FromStr for Intensity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "low" => return Ok(Self::LOW),
            "medium" | "default" => return Ok(Self::MEDIUM),
            "high" => return Ok(Self::HIGH),
            _ => {}
        }

        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u8::from_str_radix(hex, 16),
            None => s.parse::<u8>(),
        };

        parsed
            .map(Self)
            .map_err(|e| Error::Parse(format!("invalid intensity {:?}: {}", s, e)))
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}
