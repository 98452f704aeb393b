// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! ROM records, identified by content rather than by owner.

use std::fmt;

/// Provenance category of a ROM, assigned during normalization.
///
/// Stored as a single-character column: `'b'` for BIOS ROMs, `'d'` for
/// device ROMs, `NULL` for regular game ROMs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RomType {
    #[default]
    Regular,
    Bios,
    Device,
}

impl RomType {
    /// The single-character database code, `None` for regular ROMs.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            RomType::Regular => None,
            RomType::Bios => Some("b"),
            RomType::Device => Some("d"),
        }
    }

    /// Decode the database column value. Unknown codes read as regular.
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("b") => RomType::Bios,
            Some("d") => RomType::Device,
            _ => RomType::Regular,
        }
    }
}

impl fmt::Display for RomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RomType::Regular => "regular",
            RomType::Bios => "bios",
            RomType::Device => "device",
        };
        write!(f, "{name}")
    }
}

/// Canonical form of a CRC attribute: uppercase hex.
///
/// The store keeps CRCs uppercase so lookups can compare byte-for-byte;
/// query input is canonicalized the same way.
pub fn canonical_crc(crc: &str) -> String {
    crc.to_ascii_uppercase()
}

/// One binary artifact. Identity is the triple `(name, size, crc)`,
/// unique within a store no matter how many machines claim it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rom {
    /// Surrogate key assigned at insert.
    pub rom_id: i64,
    pub name: String,
    pub size: u64,
    /// Uppercase hex, see [`canonical_crc`].
    pub crc: String,
    pub rom_type: RomType,
}

impl Rom {
    /// The natural identity key.
    pub fn identity(&self) -> (&str, u64, &str) {
        (&self.name, self.size, &self.crc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc_canonical_form_is_uppercase() {
        assert_eq!(canonical_crc("deadbeef"), "DEADBEEF");
        assert_eq!(canonical_crc("1234ABCD"), "1234ABCD");
    }

    #[test]
    fn type_codes_roundtrip() {
        for ty in [RomType::Regular, RomType::Bios, RomType::Device] {
            assert_eq!(RomType::from_code(ty.code()), ty);
        }
    }
}
