//! Circuit construction and the frozen netlist.
//!
//! [`CircuitBuilder`] is the public construction surface: declare primary
//! inputs and outputs, add gates (nets are created implicitly as they are
//! named), then [`freeze`](CircuitBuilder::freeze) into an immutable
//! [`Netlist`]. Freezing checks for undriven nets, materializes fanout
//! lists, runs the levelizer, and binds the threaded-code thunks.

pub mod graph;
pub(crate) mod level;

use std::collections::HashMap;
use std::ops::Index;

use crate::error::SimError;
use crate::logic::GateKind;
use crate::netlist::graph::{Gate, GateKey, Net, NetKey, NetlistGraph};
use crate::netlist::level::levelize;

/// A gate's evaluation, pre-resolved at freeze time for the threaded-code
/// engine: input keys, the evaluator tag, the output key, and the ordinals
/// of the thunks reading the output.
#[derive(Debug, Clone)]
pub(crate) struct Thunk {
    pub kind: GateKind,
    pub inputs: Vec<NetKey>,
    pub output: NetKey,
    pub fanout: Vec<usize>,
}

/// Builder for a [`Netlist`].
#[derive(Debug, Default)]
pub struct CircuitBuilder {
    graph: NetlistGraph,
    names: HashMap<String, NetKey>,
    inputs: Vec<NetKey>,
    outputs: Vec<NetKey>,
    frozen: bool,
}

impl CircuitBuilder {
    /// Constructs an empty builder.
    pub fn new() -> Self {
        Default::default()
    }

    fn intern(&mut self, name: &str) -> NetKey {
        match self.names.get(name) {
            Some(&key) => key,
            None => {
                let key = self.graph.add_net(name.to_owned());
                self.names.insert(name.to_owned(), key);
                key
            }
        }
    }

    fn check_open(&self) -> Result<(), SimError> {
        match self.frozen {
            true => Err(SimError::NetlistFrozen),
            false => Ok(()),
        }
    }

    /// Declares primary inputs, creating their nets if unknown.
    ///
    /// A net that already has a driving gate cannot become an input.
    pub fn declare_inputs<'a, I>(&mut self, names: I) -> Result<(), SimError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.check_open()?;
        for name in names {
            let key = self.intern(name);
            if self.graph[key].driver.is_some() {
                return Err(SimError::MultipleDrivers(name.to_owned()));
            }
            if !self.graph[key].is_input {
                self.graph[key].is_input = true;
                self.inputs.push(key);
            }
        }
        Ok(())
    }

    /// Declares primary outputs. The named nets may be created here and
    /// driven by a gate added later.
    pub fn declare_outputs<'a, I>(&mut self, names: I) -> Result<(), SimError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.check_open()?;
        for name in names {
            let key = self.intern(name);
            if !self.graph[key].is_output {
                self.graph[key].is_output = true;
                self.outputs.push(key);
            }
        }
        Ok(())
    }

    /// Adds a gate, creating any unknown nets implicitly.
    pub fn add_gate<'a, I>(
        &mut self,
        kind: GateKind,
        inputs: I,
        output: &str,
    ) -> Result<GateKey, SimError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.check_open()?;
        let input_keys: Vec<NetKey> = inputs.into_iter().map(|n| self.intern(n)).collect();
        if !kind.arity_ok(input_keys.len()) {
            return Err(SimError::ArityMismatch {
                kind,
                expected: kind.expected_arity(),
                found: input_keys.len(),
            });
        }
        let out = self.intern(output);
        if self.graph[out].driver.is_some() || self.graph[out].is_input {
            return Err(SimError::MultipleDrivers(output.to_owned()));
        }
        let key = self.graph.add_gate(kind, input_keys, out);
        self.graph[out].driver = Some(key);
        Ok(key)
    }

    /// Freezes the builder into an immutable netlist.
    ///
    /// Rejects nets that are neither driven nor declared inputs, then builds
    /// fanout lists, levelizes, and binds the threaded-code thunks. The
    /// builder refuses any further use afterwards.
    pub fn freeze(&mut self) -> Result<Netlist, SimError> {
        self.check_open()?;
        for (_, net) in self.graph.nets.iter() {
            if net.driver.is_none() && !net.is_input {
                return Err(SimError::Undriven(net.name.clone()));
            }
        }
        self.frozen = true;

        let mut graph = std::mem::take(&mut self.graph);
        graph.build_fanout();

        let lv = levelize(&graph);
        for (key, gate) in graph.gates.iter_mut() {
            gate.level = lv.levels.get(key).copied();
        }

        let mut order: Vec<GateKey> = graph.gates.keys().collect();
        order.sort_by_key(|&k| graph[k].ordinal);

        let thunks = order
            .iter()
            .map(|&k| {
                let gate = &graph[k];
                Thunk {
                    kind: gate.kind,
                    inputs: gate.inputs.clone(),
                    output: gate.output,
                    fanout: graph[gate.output]
                        .fanout
                        .iter()
                        .map(|&g| graph[g].ordinal)
                        .collect(),
                }
            })
            .collect();

        log::debug!(
            "froze netlist: {} nets, {} gates, {} leveled, {} feedback",
            graph.nets.len(),
            graph.gates.len(),
            lv.order.len(),
            lv.feedback.len()
        );

        Ok(Netlist {
            graph,
            names: std::mem::take(&mut self.names),
            inputs: std::mem::take(&mut self.inputs),
            outputs: std::mem::take(&mut self.outputs),
            order,
            topo: lv.order,
            feedback: lv.feedback,
            thunks,
        })
    }
}

/// An immutable gate-level netlist, reused read-only across vectors.
#[derive(Debug)]
pub struct Netlist {
    graph: NetlistGraph,
    names: HashMap<String, NetKey>,
    inputs: Vec<NetKey>,
    outputs: Vec<NetKey>,
    /// All gates in ordinal order.
    order: Vec<GateKey>,
    /// Leveled gates in ascending (level, ordinal) order.
    topo: Vec<GateKey>,
    /// The levelizer residue, in ordinal order.
    feedback: Vec<GateKey>,
    thunks: Vec<Thunk>,
}

impl Netlist {
    /// Looks a net up by name.
    pub fn find_net(&self, name: &str) -> Option<NetKey> {
        self.names.get(name).copied()
    }

    /// Primary inputs in declaration order.
    pub fn inputs(&self) -> &[NetKey] {
        &self.inputs
    }

    /// Primary outputs in declaration order.
    pub fn outputs(&self) -> &[NetKey] {
        &self.outputs
    }

    /// All nets in creation order.
    pub fn nets(&self) -> impl Iterator<Item = (NetKey, &Net)> {
        self.graph.nets.iter()
    }

    /// All gates in ordinal order.
    pub fn gates(&self) -> impl Iterator<Item = &Gate> + '_ {
        self.order.iter().map(move |&k| &self.graph[k])
    }

    /// Gate keys in ordinal order; `order()[ordinal]` is the gate's key.
    pub fn order(&self) -> &[GateKey] {
        &self.order
    }

    /// Leveled gates in ascending (level, ordinal) order.
    pub fn topo(&self) -> &[GateKey] {
        &self.topo
    }

    /// Gates the levelizer could not assign, in ordinal order.
    pub fn feedback(&self) -> &[GateKey] {
        &self.feedback
    }

    pub(crate) fn thunks(&self) -> &[Thunk] {
        &self.thunks
    }

    pub fn net_count(&self) -> usize {
        self.graph.nets.len()
    }

    pub fn gate_count(&self) -> usize {
        self.graph.gates.len()
    }
}

impl Index<NetKey> for Netlist {
    type Output = Net;

    fn index(&self, index: NetKey) -> &Self::Output {
        &self.graph[index]
    }
}
impl Index<GateKey> for Netlist {
    type Output = Gate;

    fn index(&self, index: GateKey) -> &Self::Output {
        &self.graph[index]
    }
}
