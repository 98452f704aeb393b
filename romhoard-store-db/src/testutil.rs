// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Shared helpers for in-crate tests.

use romhoard_catalog::{normalize, parse_catalog};

use crate::connection::StoreDb;
use crate::write::build_memory_store;

/// Load a catalog XML literal into an in-memory store.
pub(crate) fn memory_store(xml: &str) -> StoreDb {
    let catalog = parse_catalog(xml.as_bytes()).unwrap();
    build_memory_store(normalize(catalog)).unwrap()
}

/// The S1 fixture: parent puckman {a, b}, clone pacman {b2 merge=b},
/// plus a device and a BIOS machine wired to pacman.
pub(crate) const FAMILY_XML: &str = r#"
<mame build="0.250 (mame0250)" debug="no" mameconfig="10">
  <machine name="neogeo" isbios="yes">
    <rom name="neo-bios.bin" size="128" crc="B105"/>
  </machine>
  <machine name="z80" isdevice="yes">
    <rom name="z80.bin" size="4" crc="DE01"/>
  </machine>
  <machine name="puckman">
    <description>Puck Man</description>
    <year>1980</year>
    <manufacturer>Namco</manufacturer>
    <rom name="a.bin" size="16" crc="1111"/>
    <rom name="b.bin" size="16" crc="2222"/>
  </machine>
  <machine name="pacman" cloneof="puckman" romof="puckman">
    <description>Pac Man</description>
    <rom name="b2.bin" size="16" crc="2233" merge="b.bin"/>
    <rom name="neo-bios.bin" size="128" crc="B105"/>
    <device_ref name="z80"/>
  </machine>
</mame>
"#;
