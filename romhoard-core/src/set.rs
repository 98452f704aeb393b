// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Derivation of the seven canonical ROM-set views over a dossier.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::dossier::{Dossier, RomSource, RomWithProvenance};

/// The seven canonical set views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetKind {
    /// Only the ROMs unique to a clone; a parent's full set.
    Split,
    /// Parent and clone ROMs folded together, superseded slots removed.
    Merged,
    /// `Merged` plus device ROMs.
    MergedPlus,
    /// `MergedPlus` plus BIOS artifacts.
    MergedFull,
    /// A self-contained set: the machine's ROMs plus the parent ROMs it
    /// does not override.
    NonMerged,
    /// `NonMerged` plus device ROMs.
    NonMergedPlus,
    /// `NonMergedPlus` plus BIOS artifacts.
    NonMergedFull,
}

impl SetKind {
    pub const ALL: [SetKind; 7] = [
        SetKind::Split,
        SetKind::Merged,
        SetKind::MergedPlus,
        SetKind::MergedFull,
        SetKind::NonMerged,
        SetKind::NonMergedPlus,
        SetKind::NonMergedFull,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SetKind::Split => "split",
            SetKind::Merged => "merged",
            SetKind::MergedPlus => "mergedplus",
            SetKind::MergedFull => "mergedfull",
            SetKind::NonMerged => "nonmerged",
            SetKind::NonMergedPlus => "nonmergedplus",
            SetKind::NonMergedFull => "nonmergedfull",
        }
    }
}

impl fmt::Display for SetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error for an unrecognized set-kind name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSetKindError(pub String);

impl fmt::Display for ParseSetKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown set kind: {}", self.0)
    }
}

impl std::error::Error for ParseSetKindError {}

impl FromStr for SetKind {
    type Err = ParseSetKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SetKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ParseSetKindError(s.to_owned()))
    }
}

/// Derive one set view from a dossier.
///
/// Pure over its inputs; result order follows the dossier traversal
/// order within each scan, appended scans follow in rule order.
pub fn derive_set(dossier: &Dossier, kind: SetKind) -> Vec<RomWithProvenance> {
    match kind {
        SetKind::Split => split(dossier),
        SetKind::Merged => deduped(dossier, &MERGED_SOURCES, false),
        SetKind::MergedPlus => deduped(dossier, &MERGED_PLUS_SOURCES, false),
        SetKind::MergedFull => deduped(dossier, &MERGED_FULL_SOURCES, false),
        SetKind::NonMerged => non_merged(dossier),
        SetKind::NonMergedPlus => {
            let mut out = non_merged(dossier);
            out.extend(deduped(dossier, &[RomSource::Device], false));
            out
        }
        SetKind::NonMergedFull => {
            let mut out = non_merged(dossier);
            out.extend(deduped(dossier, &[RomSource::Device], false));
            out.extend(deduped(dossier, &[RomSource::Bios], false));
            out
        }
    }
}

const MERGED_SOURCES: [RomSource; 3] = [RomSource::Machine, RomSource::Parent, RomSource::Clone];
const MERGED_PLUS_SOURCES: [RomSource; 4] = [
    RomSource::Machine,
    RomSource::Parent,
    RomSource::Clone,
    RomSource::Device,
];
const MERGED_FULL_SOURCES: [RomSource; 5] = [
    RomSource::Machine,
    RomSource::Parent,
    RomSource::Clone,
    RomSource::Device,
    RomSource::Bios,
];

/// Scan the dossier in order, keeping rows from `sources`, dropping
/// superseded rows unless `include_replaced`, and emitting each distinct
/// `(name, crc)` once in first-seen order.
fn deduped(
    dossier: &Dossier,
    sources: &[RomSource],
    include_replaced: bool,
) -> Vec<RomWithProvenance> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut out = Vec::new();
    for row in &dossier.roms {
        if !sources.contains(&row.source) {
            continue;
        }
        if !include_replaced && !row.replaced_by.is_empty() {
            continue;
        }
        if seen.insert((row.rom.name.as_str(), row.rom.crc.as_str())) {
            out.push(row.clone());
        }
    }
    out
}

/// The target's direct rows, in dossier order, no dedup.
fn direct_rows(dossier: &Dossier) -> impl Iterator<Item = &RomWithProvenance> {
    dossier
        .roms
        .iter()
        .filter(|row| row.source == RomSource::Machine)
}

fn split(dossier: &Dossier) -> Vec<RomWithProvenance> {
    if !dossier.machine.is_clone() {
        return direct_rows(dossier).cloned().collect();
    }
    // A clone's split set holds only the ROMs whose name does not
    // already exist in the parent set.
    let parent_names: HashSet<&str> = dossier
        .roms
        .iter()
        .filter(|row| row.source == RomSource::Parent)
        .map(|row| row.rom.name.as_str())
        .collect();
    direct_rows(dossier)
        .filter(|row| !parent_names.contains(row.rom.name.as_str()))
        .cloned()
        .collect()
}

fn non_merged(dossier: &Dossier) -> Vec<RomWithProvenance> {
    let mut out: Vec<RomWithProvenance> = direct_rows(dossier).cloned().collect();
    if !dossier.machine.is_clone() {
        return out;
    }
    // Parent ROMs complete the clone's set unless the clone overrides
    // the slot (declares it in `replaces`) or some other row supersedes
    // it.
    let replaced_slots: HashSet<&str> = direct_rows(dossier)
        .filter_map(|row| row.replaces.as_deref())
        .collect();
    for row in &dossier.roms {
        if row.source != RomSource::Parent {
            continue;
        }
        if replaced_slots.contains(row.rom.name.as_str()) {
            continue;
        }
        if !row.replaced_by.is_empty() {
            continue;
        }
        out.push(row.clone());
    }
    out
}
