//! Per-vector simulation records: the transition trace and the vector result.

use indexmap::IndexMap;
use serde::Serialize;

use crate::hazard::Hazard;
use crate::logic::Logic;
use crate::netlist::graph::NetKey;

/// One committed change of a net's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    /// The time unit (or logical tick) at which the change was committed.
    pub time: u64,
    /// The net that changed.
    pub net: NetKey,
    /// The value before the change.
    pub old: Logic,
    /// The value after the change.
    pub new: Logic,
}

/// The ordered list of transitions committed during one vector.
///
/// The trace reflects exactly the order in which net values were committed:
/// times are non-decreasing, and entries with equal times appear in
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Trace {
    transitions: Vec<Transition>,
}

impl Trace {
    pub(crate) fn push(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// The transitions of a single net, in commit order.
    pub fn of_net(&self, net: NetKey) -> impl Iterator<Item = &Transition> {
        self.transitions.iter().filter(move |t| t.net == net)
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a Transition;
    type IntoIter = std::slice::Iter<'a, Transition>;

    fn into_iter(self) -> Self::IntoIter {
        self.transitions.iter()
    }
}

/// The immutable outcome of simulating one input vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VectorResult {
    pub(crate) outputs: IndexMap<String, Logic>,
    pub(crate) trace: Trace,
    pub(crate) gate_evals: Vec<u64>,
    pub(crate) hazards: IndexMap<String, Hazard>,
}

impl VectorResult {
    /// Final primary-output values, in output declaration order.
    pub fn outputs(&self) -> &IndexMap<String, Logic> {
        &self.outputs
    }

    /// The final value of one primary output.
    pub fn output(&self, name: &str) -> Option<Logic> {
        self.outputs.get(name).copied()
    }

    /// The full transition trace for this vector.
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Evaluation counts indexed by gate ordinal.
    pub fn gate_evals(&self) -> &[u64] {
        &self.gate_evals
    }

    /// Total number of gate evaluations performed for this vector.
    pub fn total_evals(&self) -> u64 {
        self.gate_evals.iter().sum()
    }

    /// Hazard classification for every non-input net, keyed by net name.
    pub fn hazards(&self) -> &IndexMap<String, Hazard> {
        &self.hazards
    }

    /// The hazard classification of one net.
    pub fn hazard(&self, name: &str) -> Option<Hazard> {
        self.hazards.get(name).copied()
    }
}
