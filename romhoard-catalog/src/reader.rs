// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Streaming event reader for the catalog XML.
//!
//! The reader walks the document once and emits machine records with
//! their attributes, ROM entries and device references. Elements and
//! attributes outside the consumed subset are skipped without buffering
//! the document.

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::error::{CatalogError, Result};

/// Attributes of the catalog root element, emitted once per document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogHeader {
    pub build: Option<String>,
    pub debug: Option<String>,
    pub mameconfig: Option<String>,
}

/// One `<rom>` entry of a machine. Entries lacking any of name, size or
/// crc never make it into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomEntry {
    pub name: String,
    pub size: u64,
    pub crc: String,
    /// Name of the parent ROM this entry replaces.
    pub merge: Option<String>,
    /// Non-empty when the entry belongs to a selectable BIOS.
    pub bios: Option<String>,
}

/// One `<machine>` scope with the nested content the store consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineRecord {
    pub name: String,
    pub description: Option<String>,
    pub year: Option<String>,
    pub manufacturer: Option<String>,
    pub cloneof: Option<String>,
    pub romof: Option<String>,
    pub is_bios: bool,
    pub is_device: bool,
    pub roms: Vec<RomEntry>,
    pub device_refs: Vec<String>,
}

/// A fully read catalog document.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub header: Option<CatalogHeader>,
    pub machines: Vec<MachineRecord>,
}

/// Read a catalog from a file on disk.
pub fn read_catalog<P: AsRef<Path>>(path: P) -> Result<Catalog> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| CatalogError::Io {
        path: path.to_owned(),
        source: e,
    })?;
    parse_catalog(BufReader::new(file))
}

/// Parse a catalog from any buffered reader.
pub fn parse_catalog<R: BufRead>(input: R) -> Result<Catalog> {
    let mut reader = Reader::from_reader(input);
    reader.config_mut().trim_text(true);

    let mut catalog = Catalog::default();
    let mut machine: Option<PendingMachine> = None;
    // Name of the scalar element whose text is pending, e.g. description.
    let mut scalar: Option<Vec<u8>> = None;
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| parse_error(&reader, e))?;
        match event {
            Event::Start(ref e) => match e.name().as_ref() {
                b"mame" => catalog.header = Some(read_header(&reader, e)?),
                b"machine" => machine = Some(read_machine_open(&reader, e)?),
                b"rom" => {
                    if let Some(machine) = machine.as_mut() {
                        machine.push_rom(read_rom(&reader, e)?);
                    }
                }
                b"device_ref" => {
                    if let Some(machine) = machine.as_mut() {
                        if let Some(name) = read_name_attr(&reader, e)? {
                            machine.record.device_refs.push(name);
                        }
                    }
                }
                other => {
                    if machine.is_some() {
                        scalar = Some(other.to_owned());
                    }
                }
            },
            Event::Empty(ref e) => match e.name().as_ref() {
                b"mame" => catalog.header = Some(read_header(&reader, e)?),
                b"machine" => {
                    if let Some(record) = read_machine_open(&reader, e)?.finish() {
                        catalog.machines.push(record);
                    }
                }
                b"rom" => {
                    if let Some(machine) = machine.as_mut() {
                        machine.push_rom(read_rom(&reader, e)?);
                    }
                }
                b"device_ref" => {
                    if let Some(machine) = machine.as_mut() {
                        if let Some(name) = read_name_attr(&reader, e)? {
                            machine.record.device_refs.push(name);
                        }
                    }
                }
                _ => {}
            },
            Event::Text(ref t) => {
                if let (Some(machine), Some(name)) = (machine.as_mut(), scalar.as_deref()) {
                    let text = t.unescape().map_err(|e| parse_error(&reader, e))?;
                    machine.assign_scalar(name, text.trim());
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"machine" => {
                    if let Some(record) = machine.take().and_then(PendingMachine::finish) {
                        catalog.machines.push(record);
                    }
                    scalar = None;
                }
                _ => scalar = None,
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    debug!(
        machines = catalog.machines.len(),
        build = catalog.header.as_ref().and_then(|h| h.build.as_deref()),
        "read catalog"
    );
    Ok(catalog)
}

fn parse_error<R>(reader: &Reader<R>, source: impl Into<quick_xml::Error>) -> CatalogError {
    CatalogError::Parse {
        offset: reader.buffer_position(),
        source: source.into(),
    }
}

/// A machine scope still being read; `name` may be missing, in which
/// case the whole record is dropped at scope end.
#[derive(Debug, Default)]
struct PendingMachine {
    name: Option<String>,
    record: MachineRecord,
}

impl PendingMachine {
    fn push_rom(&mut self, rom: Option<RomEntry>) {
        // Entries with a missing name, size or crc were dropped by the
        // attribute reader.
        if let Some(rom) = rom {
            self.record.roms.push(rom);
        }
    }

    fn assign_scalar(&mut self, element: &[u8], text: &str) {
        if text.is_empty() {
            return;
        }
        match element {
            b"description" => self.record.description = Some(text.to_owned()),
            b"year" => self.record.year = Some(text.to_owned()),
            b"manufacturer" => self.record.manufacturer = Some(text.to_owned()),
            _ => {}
        }
    }

    fn finish(mut self) -> Option<MachineRecord> {
        let name = self.name?;
        self.record.name = name;
        Some(self.record)
    }
}

fn read_machine_open<R>(reader: &Reader<R>, e: &BytesStart<'_>) -> Result<PendingMachine> {
    let mut pending = PendingMachine::default();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| parse_error(reader, quick_xml::Error::from(e)))?;
        let value = attr
            .unescape_value()
            .map_err(|e| parse_error(reader, e))?
            .into_owned();
        match attr.key.as_ref() {
            b"name" => pending.name = Some(value),
            b"cloneof" => pending.record.cloneof = Some(value),
            b"romof" => pending.record.romof = Some(value),
            b"isbios" => pending.record.is_bios = value == "yes",
            b"isdevice" => pending.record.is_device = value == "yes",
            _ => {}
        }
    }
    Ok(pending)
}

fn read_header<R>(reader: &Reader<R>, e: &BytesStart<'_>) -> Result<CatalogHeader> {
    let mut header = CatalogHeader::default();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| parse_error(reader, quick_xml::Error::from(e)))?;
        let value = attr
            .unescape_value()
            .map_err(|e| parse_error(reader, e))?
            .into_owned();
        match attr.key.as_ref() {
            b"build" => header.build = Some(value),
            b"debug" => header.debug = Some(value),
            b"mameconfig" => header.mameconfig = Some(value),
            _ => {}
        }
    }
    Ok(header)
}

/// Read a `<rom>` entry. Returns `None` when name, size or crc is
/// missing or the size does not parse; such entries are dropped
/// silently.
fn read_rom<R>(reader: &Reader<R>, e: &BytesStart<'_>) -> Result<Option<RomEntry>> {
    let mut name = None;
    let mut size = None;
    let mut crc = None;
    let mut merge = None;
    let mut bios = None;
    for attr in e.attributes() {
        let attr = attr.map_err(|e| parse_error(reader, quick_xml::Error::from(e)))?;
        let value = attr
            .unescape_value()
            .map_err(|e| parse_error(reader, e))?
            .into_owned();
        match attr.key.as_ref() {
            b"name" => name = Some(value),
            b"size" => size = value.parse::<u64>().ok(),
            b"crc" => crc = Some(value),
            b"merge" => merge = Some(value),
            b"bios" => bios = Some(value),
            _ => {}
        }
    }
    Ok(match (name, size, crc) {
        (Some(name), Some(size), Some(crc)) => Some(RomEntry {
            name,
            size,
            crc,
            merge,
            bios,
        }),
        _ => None,
    })
}

fn read_name_attr<R>(reader: &Reader<R>, e: &BytesStart<'_>) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| parse_error(reader, quick_xml::Error::from(e)))?;
        if attr.key.as_ref() == b"name" {
            return Ok(Some(
                attr.unescape_value()
                    .map_err(|e| parse_error(reader, e))?
                    .into_owned(),
            ));
        }
    }
    Ok(None)
}
