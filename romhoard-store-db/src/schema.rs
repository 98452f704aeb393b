// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Schema of the catalog store.
//!
//! Exactly four tables. `machine_type` and `rom_type` hold 'b' for BIOS
//! rows, 'd' for device rows and NULL for regular rows.

/// Store schema SQL (mame, machine, rom, machine_rom)
pub const SCHEMA_SQL: &str = r#"
create table if not exists mame (
    mame_id    integer primary key autoincrement not null,
    build      text,
    debug      text,
    mameconfig text
);

create table if not exists machine (
    machine_id   integer primary key autoincrement not null,
    name         text unique not null,
    description  text,
    year         text,
    manufacturer text,
    romof        text,
    cloneof      text,
    machine_type char(1)
);

create index if not exists IndexMachineCloneof on machine(cloneof);

create table if not exists rom (
    rom_id   integer primary key autoincrement not null,
    name     text not null,
    size     integer not null,
    crc      text not null,
    rom_type char(1),
    unique(name, size, crc)
);

create index if not exists IndexRomCrc on rom(crc);

create table if not exists machine_rom (
    machine_rom_id integer primary key autoincrement not null,
    machine_id     integer not null,
    rom_id         integer not null,
    merge          text,
    unique(machine_id, rom_id),
    foreign key (machine_id) references machine(machine_id),
    foreign key (rom_id) references rom(rom_id)
);

create index if not exists IndexMachineRomMachine on machine_rom(machine_id);
create index if not exists IndexMachineRomRom on machine_rom(rom_id);
"#;
