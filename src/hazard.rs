//! Hazard classification over a vector's transition trace.
//!
//! A net's transition history within one vector is classified as clean,
//! static (the value returns to its starting point after one or more
//! intermediate toggles), or dynamic (the value settles somewhere new after
//! three or more transitions). The baseline value a net holds when the
//! vector begins is never counted as a toggle.

use indexmap::IndexMap;
use itertools::Itertools;

use crate::logic::Logic;
use crate::netlist::Netlist;
use crate::trace::Trace;

/// Per-net hazard classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Hazard {
    /// No hazard: at most one transition, or no intermediate toggle.
    None,
    /// Started and ended at 0 with an intermediate 1.
    Static0,
    /// Started and ended at 1 with an intermediate 0.
    Static1,
    /// Settled at a different value after three or more transitions.
    Dynamic,
}

impl std::fmt::Display for Hazard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Hazard::None => "none",
            Hazard::Static0 => "static-0",
            Hazard::Static1 => "static-1",
            Hazard::Dynamic => "dynamic",
        };
        write!(f, "{name}")
    }
}

/// Classifies every non-input net of the netlist from the trace.
///
/// Pure with respect to its arguments: classifying the same trace twice
/// yields identical reports.
pub fn analyze(netlist: &Netlist, trace: &Trace) -> IndexMap<String, Hazard> {
    let per_net = trace
        .iter()
        .map(|t| (t.net, (t.old, t.new)))
        .into_group_map();

    netlist
        .nets()
        .filter(|(_, net)| !net.is_input())
        .map(|(key, net)| {
            let hazard = match per_net.get(&key) {
                Some(transitions) => classify(transitions),
                None => Hazard::None,
            };
            (net.name().to_owned(), hazard)
        })
        .collect()
}

/// Classifies one net's ordered transition history.
pub(crate) fn classify(transitions: &[(Logic, Logic)]) -> Hazard {
    if transitions.len() <= 1 {
        return Hazard::None;
    }
    let baseline = transitions[0].0;
    let settled = transitions[transitions.len() - 1].1;
    if baseline == settled {
        let mut intermediate = transitions[..transitions.len() - 1].iter().map(|&(_, v)| v);
        match baseline {
            Logic::Zero if intermediate.any(|v| v == Logic::One) => Hazard::Static0,
            Logic::One if intermediate.any(|v| v == Logic::Zero) => Hazard::Static1,
            _ => Hazard::None,
        }
    } else if transitions.len() >= 3 {
        Hazard::Dynamic
    } else {
        Hazard::None
    }
}
