//! Types for describing the structure of a frozen netlist.
//!
//! This module notably includes:
//! - [`NetlistGraph`]: the arena holding all nets and gates
//! - [`Net`]: a named wire carrying a single logic value
//! - [`Gate`]: a Boolean operator reading input nets and driving one output

use std::ops::{Index, IndexMut};

use slotmap::{new_key_type, SlotMap};

use crate::logic::GateKind;

new_key_type! {
    /// Key type for maps to nets.
    pub struct NetKey;
    /// Key type for maps to gates.
    pub struct GateKey;
}

/// A named wire.
///
/// Every non-input net has exactly one driving gate, and every entry of its
/// fanout list names this net among its inputs.
#[derive(Debug, Clone)]
pub struct Net {
    pub(crate) name: String,
    pub(crate) is_input: bool,
    pub(crate) is_output: bool,
    pub(crate) driver: Option<GateKey>,
    pub(crate) fanout: Vec<GateKey>,
}

impl Net {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            is_input: false,
            is_output: false,
            driver: None,
            fanout: Vec::new(),
        }
    }

    /// The user-supplied name of this net.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this net is a declared primary input.
    pub fn is_input(&self) -> bool {
        self.is_input
    }

    /// Whether this net is a declared primary output.
    pub fn is_output(&self) -> bool {
        self.is_output
    }

    /// The gate driving this net, absent for primary inputs.
    pub fn driver(&self) -> Option<GateKey> {
        self.driver
    }

    /// The gates reading this net, in gate-ordinal order.
    pub fn fanout(&self) -> &[GateKey] {
        &self.fanout
    }
}

/// A typed Boolean gate.
#[derive(Debug, Clone)]
pub struct Gate {
    pub(crate) kind: GateKind,
    pub(crate) inputs: Vec<NetKey>,
    pub(crate) output: NetKey,
    pub(crate) ordinal: usize,
    pub(crate) level: Option<u32>,
}

impl Gate {
    /// The gate type.
    pub fn kind(&self) -> GateKind {
        self.kind
    }

    /// The ordered input nets.
    pub fn inputs(&self) -> &[NetKey] {
        &self.inputs
    }

    /// The single output net.
    pub fn output(&self) -> NetKey {
        self.output
    }

    /// Dense insertion index; all deterministic tie-breaking uses it.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Topological level, `None` when the gate sits on a feedback path.
    pub fn level(&self) -> Option<u32> {
        self.level
    }
}

/// The arena of nets and gates underlying a circuit.
#[derive(Debug, Clone, Default)]
pub struct NetlistGraph {
    pub(crate) nets: SlotMap<NetKey, Net>,
    pub(crate) gates: SlotMap<GateKey, Gate>,
}

impl NetlistGraph {
    /// Adds a new net to the arena and returns its key.
    pub(crate) fn add_net(&mut self, name: String) -> NetKey {
        self.nets.insert(Net::new(name))
    }

    /// Adds a new gate to the arena and returns its key.
    ///
    /// The ordinal is the number of gates added before this one.
    pub(crate) fn add_gate(&mut self, kind: GateKind, inputs: Vec<NetKey>, output: NetKey) -> GateKey {
        let ordinal = self.gates.len();
        self.gates.insert(Gate {
            kind,
            inputs,
            output,
            ordinal,
            level: None,
        })
    }

    /// Scans every gate's inputs and materializes the per-net fanout lists.
    ///
    /// Gates are scanned in ordinal order, so each fanout list ends up in
    /// gate-ordinal order. A gate reading the same net through several
    /// inputs appears once.
    pub(crate) fn build_fanout(&mut self) {
        let mut edges: Vec<(NetKey, GateKey)> = Vec::new();
        for (key, gate) in self.gates.iter() {
            for &input in &gate.inputs {
                edges.push((input, key));
            }
        }
        for (net, gate) in edges {
            let fanout = &mut self.nets[net].fanout;
            if fanout.last() != Some(&gate) {
                fanout.push(gate);
            }
        }
    }
}

impl Index<NetKey> for NetlistGraph {
    type Output = Net;

    fn index(&self, index: NetKey) -> &Self::Output {
        &self.nets[index]
    }
}
impl IndexMut<NetKey> for NetlistGraph {
    fn index_mut(&mut self, index: NetKey) -> &mut Self::Output {
        &mut self.nets[index]
    }
}
impl Index<GateKey> for NetlistGraph {
    type Output = Gate;

    fn index(&self, index: GateKey) -> &Self::Output {
        &self.gates[index]
    }
}
impl IndexMut<GateKey> for NetlistGraph {
    fn index_mut(&mut self, index: GateKey) -> &mut Self::Output {
        &mut self.gates[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fanout_is_ordinal_ordered_and_deduplicated() {
        let mut graph = NetlistGraph::default();
        let a = graph.add_net("A".into());
        let b = graph.add_net("B".into());
        let x = graph.add_net("X".into());
        let y = graph.add_net("Y".into());

        let g0 = graph.add_gate(GateKind::And, vec![a, b], x);
        let g1 = graph.add_gate(GateKind::Xor, vec![a, a], y);
        graph.build_fanout();

        assert_eq!(graph[a].fanout(), &[g0, g1], "dedup keeps one entry per gate");
        assert_eq!(graph[b].fanout(), &[g0]);
        assert!(graph[x].fanout().is_empty());
    }

    #[test]
    fn ordinals_follow_insertion_order() {
        let mut graph = NetlistGraph::default();
        let a = graph.add_net("A".into());
        let b = graph.add_net("B".into());
        let x = graph.add_net("X".into());
        let g0 = graph.add_gate(GateKind::Not, vec![a], x);
        let g1 = graph.add_gate(GateKind::Or, vec![a, b], x);
        assert_eq!(graph[g0].ordinal(), 0);
        assert_eq!(graph[g1].ordinal(), 1);
    }
}
