// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Machine records as stored in the catalog database.

use std::fmt;

/// Classification of a catalog machine.
///
/// The store persists this as a single-character column: `'b'` for BIOS
/// providers, `'d'` for device providers, `NULL` for regular machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MachineType {
    #[default]
    Regular,
    Bios,
    Device,
}

impl MachineType {
    /// The single-character database code, `None` for regular machines.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            MachineType::Regular => None,
            MachineType::Bios => Some("b"),
            MachineType::Device => Some("d"),
        }
    }

    /// Decode the database column value. Unknown codes read as regular.
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("b") => MachineType::Bios,
            Some("d") => MachineType::Device,
            _ => MachineType::Regular,
        }
    }
}

impl fmt::Display for MachineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MachineType::Regular => "regular",
            MachineType::Bios => "bios",
            MachineType::Device => "device",
        };
        write!(f, "{name}")
    }
}

/// One machine row: a runnable system, a BIOS provider, or a device
/// provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    /// Surrogate key assigned at insert; insert order is id order.
    pub machine_id: i64,
    /// Natural key, unique within a store.
    pub name: String,
    pub description: Option<String>,
    pub year: Option<String>,
    pub manufacturer: Option<String>,
    /// Parent machine name for ROM inheritance.
    pub romof: Option<String>,
    /// Parent machine name; set on clones only.
    pub cloneof: Option<String>,
    pub machine_type: MachineType,
}

impl Machine {
    /// Whether this machine declares a parent.
    pub fn is_clone(&self) -> bool {
        self.cloneof.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_codes_roundtrip() {
        for ty in [MachineType::Regular, MachineType::Bios, MachineType::Device] {
            assert_eq!(MachineType::from_code(ty.code()), ty);
        }
    }

    #[test]
    fn unknown_code_reads_as_regular() {
        assert_eq!(MachineType::from_code(Some("x")), MachineType::Regular);
        assert_eq!(MachineType::from_code(None), MachineType::Regular);
    }
}
