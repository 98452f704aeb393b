// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Transitive device-dependency closure.
//!
//! Each machine pulls in the ROMs of every device it references,
//! directly or through other devices. The resolver memoizes per machine
//! and breaks reference cycles by returning the empty set for a
//! re-entered node.

use std::collections::{HashMap, HashSet};

use crate::normalize::MachineSeed;

/// Memoizing resolver over one normalized machine list.
pub struct DeviceClosureResolver<'a> {
    machines: &'a [MachineSeed],
    by_name: HashMap<&'a str, usize>,
    memo: HashMap<usize, Vec<usize>>,
    in_progress: HashSet<usize>,
}

impl<'a> DeviceClosureResolver<'a> {
    pub fn new(machines: &'a [MachineSeed]) -> Self {
        let by_name = machines
            .iter()
            .enumerate()
            .map(|(idx, machine)| (machine.name.as_str(), idx))
            .collect();
        DeviceClosureResolver {
            machines,
            by_name,
            memo: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// The machines reachable from `index` via `device_ref` edges, in
    /// first-discovery order, exclusive of the machine itself.
    ///
    /// References naming no known machine are skipped.
    pub fn closure(&mut self, index: usize) -> Vec<usize> {
        if let Some(cached) = self.memo.get(&index) {
            return cached.clone();
        }
        if !self.in_progress.insert(index) {
            // Cycle: the caller higher up the stack owns this node.
            return Vec::new();
        }

        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for name in &self.machines[index].device_refs {
            let Some(&device) = self.by_name.get(name.as_str()) else {
                continue;
            };
            if device != index && seen.insert(device) {
                out.push(device);
            }
            for transitive in self.closure(device) {
                if transitive != index && seen.insert(transitive) {
                    out.push(transitive);
                }
            }
        }

        self.in_progress.remove(&index);
        self.memo.insert(index, out.clone());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use romhoard_core::MachineType;

    fn seed(name: &str, device_refs: &[&str]) -> MachineSeed {
        MachineSeed {
            name: name.into(),
            description: None,
            year: None,
            manufacturer: None,
            romof: None,
            cloneof: None,
            machine_type: MachineType::Device,
            rom_claims: Vec::new(),
            device_refs: device_refs.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn closure_names(machines: &[MachineSeed], index: usize) -> Vec<String> {
        let mut resolver = DeviceClosureResolver::new(machines);
        resolver
            .closure(index)
            .into_iter()
            .map(|idx| machines[idx].name.clone())
            .collect()
    }

    #[test]
    fn direct_references_only() {
        let machines = vec![seed("m", &["z80", "ay8910"]), seed("z80", &[]), seed("ay8910", &[])];
        assert_eq!(closure_names(&machines, 0), ["z80", "ay8910"]);
    }

    #[test]
    fn transitive_chain_in_discovery_order() {
        let machines = vec![
            seed("m", &["bus"]),
            seed("bus", &["ram"]),
            seed("ram", &[]),
        ];
        assert_eq!(closure_names(&machines, 0), ["bus", "ram"]);
    }

    #[test]
    fn diamond_is_deduplicated() {
        let machines = vec![
            seed("m", &["a", "b"]),
            seed("a", &["shared"]),
            seed("b", &["shared"]),
            seed("shared", &[]),
        ];
        assert_eq!(closure_names(&machines, 0), ["a", "shared", "b"]);
    }

    #[test]
    fn cycle_does_not_recurse_forever() {
        let machines = vec![seed("a", &["b"]), seed("b", &["a"])];
        assert_eq!(closure_names(&machines, 0), ["b"]);
    }

    #[test]
    fn self_reference_is_excluded() {
        let machines = vec![seed("selfish", &["selfish"])];
        assert!(closure_names(&machines, 0).is_empty());
    }

    #[test]
    fn unknown_reference_is_skipped() {
        let machines = vec![seed("m", &["ghost", "real"]), seed("real", &[])];
        assert_eq!(closure_names(&machines, 0), ["real"]);
    }

    #[test]
    fn memoized_result_is_stable() {
        let machines = vec![
            seed("m", &["bus"]),
            seed("bus", &["ram"]),
            seed("ram", &[]),
        ];
        let mut resolver = DeviceClosureResolver::new(&machines);
        let first = resolver.closure(0);
        let second = resolver.closure(0);
        assert_eq!(first, second);
        // The inner node was computed along the way.
        assert_eq!(resolver.closure(1), vec![2]);
    }
}
