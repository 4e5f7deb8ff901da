//! Code map file formats

use serde::Serialize;
use std::{fmt, str};

/// Enumeration of every kind of code map that can be imported.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeMapFormat {
    /// 8192-byte bitmap, one bit per address, least significant bit first.
    Bitmap,

    /// 65536-byte table, one byte per address; bit 0 marks execution.
    Occupancy,

    /// Fuse profiler output: `0x8000,123` per line.
    Fuse,

    /// SpudACE log: `PC = 8000 ...` per line, hexadecimal.
    Spud,

    /// Zero log: `PC:32768 ...` per line, decimal.
    Zero,

    /// Address trace: `$8000 ...` per line, hexadecimal.
    Address,
}

impl CodeMapFormat {
    /// Determine which text log format a line belongs to.
    pub fn detect(line: &str) -> Option<Self> {
        let line = line.trim();

        if line.starts_with("0x") {
            Some(CodeMapFormat::Fuse)
        } else if line.starts_with("PC = ") {
            Some(CodeMapFormat::Spud)
        } else if line.starts_with("PC:") {
            Some(CodeMapFormat::Zero)
        } else if line.starts_with('$') {
            Some(CodeMapFormat::Address)
        } else {
            None
        }
    }

    pub fn is_binary(self) -> bool {
        matches!(self, CodeMapFormat::Bitmap | CodeMapFormat::Occupancy)
    }

    fn radix(self) -> u32 {
        match self {
            CodeMapFormat::Zero => 10,
            _ => 16,
        }
    }

    /// Find the text of the address on a line of a text log.
    pub fn address_token(self, line: &str) -> Option<&str> {
        let line = line.trim();

        match self {
            CodeMapFormat::Fuse => line
                .strip_prefix("0x")
                .and_then(|rest| rest.split(',').next()),
            CodeMapFormat::Spud => line
                .strip_prefix("PC = ")
                .and_then(|rest| rest.split_whitespace().next()),
            CodeMapFormat::Zero => line
                .strip_prefix("PC:")
                .and_then(|rest| rest.split_whitespace().next()),
            CodeMapFormat::Address => line
                .strip_prefix('$')
                .and_then(|rest| rest.split(|c: char| c.is_whitespace() || c == ':').next()),
            CodeMapFormat::Bitmap | CodeMapFormat::Occupancy => None,
        }
    }

    /// Parse the address on a line of a text log.
    ///
    /// Addresses above `$FFFF` are rejected.
    pub fn parse_line(self, line: &str) -> Option<u32> {
        let token = self.address_token(line)?;
        let addr = u32::from_str_radix(token.trim(), self.radix()).ok()?;

        if addr > 0xFFFF {
            return None;
        }

        Some(addr)
    }
}

impl fmt::Display for CodeMapFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CodeMapFormat::Bitmap => "bitmap",
            CodeMapFormat::Occupancy => "occupancy",
            CodeMapFormat::Fuse => "fuse",
            CodeMapFormat::Spud => "spud",
            CodeMapFormat::Zero => "zero",
            CodeMapFormat::Address => "address",
        };

        write!(f, "{}", name)
    }
}

impl str::FromStr for CodeMapFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_ref() {
            "bitmap" => Ok(CodeMapFormat::Bitmap),
            "map" => Ok(CodeMapFormat::Bitmap),
            "occupancy" => Ok(CodeMapFormat::Occupancy),
            "specemu" => Ok(CodeMapFormat::Occupancy),
            "fuse" => Ok(CodeMapFormat::Fuse),
            "profile" => Ok(CodeMapFormat::Fuse),
            "spud" => Ok(CodeMapFormat::Spud),
            "spudace" => Ok(CodeMapFormat::Spud),
            "zero" => Ok(CodeMapFormat::Zero),
            "address" => Ok(CodeMapFormat::Address),
            "trace" => Ok(CodeMapFormat::Address),
            _ => Err(()),
        }
    }
}

derive_deserialize_from_str!(CodeMapFormat, "valid code map format");
