//! Topological levelization of the gate graph.
//!
//! Assigns each gate a level by a Kahn-style pass over the driver-to-fanout
//! DAG: primary inputs sit at level 0 and each gate sits one above the
//! highest of its input levels. Gates left unassigned at the end form the
//! feedback set.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use slotmap::SecondaryMap;

use crate::netlist::graph::{GateKey, NetKey, NetlistGraph};

pub(crate) struct Levels {
    /// Level per leveled gate; feedback gates are absent.
    pub levels: SecondaryMap<GateKey, u32>,
    /// Leveled gates in ascending (level, ordinal) order.
    pub order: Vec<GateKey>,
    /// The levelizer residue, in ordinal order.
    pub feedback: Vec<GateKey>,
}

/// Runs the levelizer. Ready gates are processed lowest ordinal first so the
/// assignment is deterministic.
pub(crate) fn levelize(graph: &NetlistGraph) -> Levels {
    let mut indegree: SecondaryMap<GateKey, usize> = SecondaryMap::new();
    let mut net_level: SecondaryMap<NetKey, u32> = SecondaryMap::new();

    for (key, net) in graph.nets.iter() {
        if net.driver.is_none() {
            net_level.insert(key, 0);
        }
    }
    for (key, gate) in graph.gates.iter() {
        let driven = gate
            .inputs
            .iter()
            .filter(|&&n| graph[n].driver.is_some())
            .count();
        indegree.insert(key, driven);
    }

    let mut ready: BinaryHeap<Reverse<(usize, GateKey)>> = graph
        .gates
        .iter()
        .filter(|(key, _)| indegree[*key] == 0)
        .map(|(key, gate)| Reverse((gate.ordinal, key)))
        .collect();

    let mut levels: SecondaryMap<GateKey, u32> = SecondaryMap::new();
    let mut order = Vec::with_capacity(graph.gates.len());

    while let Some(Reverse((_, key))) = ready.pop() {
        let gate = &graph[key];
        let level = 1 + gate
            .inputs
            .iter()
            .map(|&n| net_level.get(n).copied().unwrap_or(0))
            .max()
            .unwrap_or(0);
        levels.insert(key, level);
        order.push(key);
        net_level.insert(gate.output, level);

        for &next in graph[gate.output].fanout.iter() {
            let uses = graph[next]
                .inputs
                .iter()
                .filter(|&&n| n == gate.output)
                .count();
            indegree[next] -= uses;
            if indegree[next] == 0 {
                ready.push(Reverse((graph[next].ordinal, next)));
            }
        }
    }

    order.sort_by_key(|&k| (levels[k], graph[k].ordinal));

    let mut feedback: Vec<GateKey> = graph
        .gates
        .keys()
        .filter(|&k| !levels.contains_key(k))
        .collect();
    feedback.sort_by_key(|&k| graph[k].ordinal);

    Levels {
        levels,
        order,
        feedback,
    }
}
