//! The five simulation engines and their shared per-vector substrate.
//!
//! Every engine consumes a frozen [`Netlist`] plus one input vector and
//! produces a [`VectorResult`]. The engines agree on final output values for
//! race-free acyclic circuits and differ in their intermediate traces,
//! hazard reports, and evaluation counts.
//!
//! ## This module notably consists of:
//! - **[`Engine`]**: the dispatch surface over the five paradigms.
//! - **[`SimOptions`]**: logic model, iteration caps, reset value.
//! - **[`SimState`]**: per-vector mutable state, allocated fresh per vector.

use enum_dispatch::enum_dispatch;
use indexmap::IndexMap;
use slotmap::SecondaryMap;

use crate::error::SimError;
use crate::hazard;
use crate::logic::{Logic, LogicModel};
use crate::netlist::graph::{GateKey, NetKey};
use crate::netlist::Netlist;
use crate::trace::{Trace, Transition, VectorResult};

mod levelized;
mod single_event;
mod single_gate;
mod threaded;
mod two_list;

pub use levelized::Levelized;
pub use single_event::SingleEvent;
pub use single_gate::SingleGate;
pub use threaded::Threaded;
pub use two_list::TwoList;

/// One input vector: a mapping from primary-input name to value.
///
/// Primary inputs absent from the mapping hold their current value.
pub type Stimulus = IndexMap<String, Logic>;

/// Knobs shared by all engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimOptions {
    /// The active logic model.
    pub model: LogicModel,
    /// Scheduler iteration cap for the event- and stack-driven engines.
    pub max_units: usize,
    /// Feedback re-iteration cap for the zero-delay levelized engine.
    pub max_passes: usize,
    /// Reset value for nets under the three-valued model.
    pub unknown_init: Logic,
    /// Makes the levelized engine reject netlists with feedback outright.
    pub strict_levelized: bool,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            model: LogicModel::Two,
            max_units: 10_000,
            max_passes: 64,
            unknown_init: Logic::Unknown,
            strict_levelized: false,
        }
    }
}

impl SimOptions {
    /// Options for the three-valued model, otherwise defaults.
    pub fn three_valued() -> Self {
        Self {
            model: LogicModel::Three,
            ..Default::default()
        }
    }
}

/// A scheduled change of a net to a target value at a target time.
///
/// The sequence number breaks same-time ties deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Event {
    pub time: u64,
    pub net: NetKey,
    pub value: Logic,
    pub seq: u64,
}

/// Mutable per-vector simulation state.
///
/// Allocated fresh for every vector and never aliased into the next one;
/// the frozen netlist is never touched.
pub(crate) struct SimState {
    /// Current value per net.
    pub values: SecondaryMap<NetKey, Logic>,
    /// Primary inputs that must propagate on first application even when
    /// their value is unchanged, so internal nets settle consistently from
    /// the reset state.
    pub marked: SecondaryMap<NetKey, ()>,
    /// Resolved stimulus: every primary input with its target value, in
    /// declaration order.
    pub inputs: Vec<(NetKey, Logic)>,
    pub trace: Trace,
    /// Evaluation counts indexed by gate ordinal.
    pub evals: Vec<u64>,
    /// Current unit (or logical tick, engine-dependent).
    pub time: u64,
}

impl SimState {
    /// A fresh state at the reset point: all nets at the model's initial
    /// value, every primary input marked for forced establishment.
    fn reset(netlist: &Netlist, opts: &SimOptions) -> Self {
        let init = match opts.model {
            LogicModel::Two => Logic::Zero,
            LogicModel::Three => opts.unknown_init,
        };
        let mut values = SecondaryMap::new();
        for (key, _) in netlist.nets() {
            values.insert(key, init);
        }
        let mut marked = SecondaryMap::new();
        for &key in netlist.inputs() {
            marked.insert(key, ());
        }
        Self {
            values,
            marked,
            inputs: Vec::new(),
            trace: Trace::default(),
            evals: vec![0; netlist.gate_count()],
            time: 0,
        }
    }

    /// A fresh state seeded with the settled values of a previous vector.
    fn seeded(netlist: &Netlist, prior: &SecondaryMap<NetKey, Logic>) -> Self {
        Self {
            values: prior.clone(),
            marked: SecondaryMap::new(),
            inputs: Vec::new(),
            trace: Trace::default(),
            evals: vec![0; netlist.gate_count()],
            time: 0,
        }
    }

    /// Validates the stimulus and resolves it against all primary inputs.
    fn apply_stimulus(
        &mut self,
        netlist: &Netlist,
        stimulus: &Stimulus,
        opts: &SimOptions,
    ) -> Result<(), SimError> {
        for (name, &value) in stimulus {
            let is_input = netlist
                .find_net(name)
                .map(|k| netlist[k].is_input())
                .unwrap_or(false);
            if !is_input {
                return Err(SimError::UnknownNet(name.clone()));
            }
            if !opts.model.admits(value) {
                return Err(SimError::BadValue {
                    symbol: value.symbol(),
                });
            }
        }
        self.inputs = netlist
            .inputs()
            .iter()
            .map(|&key| {
                let value = stimulus
                    .get(netlist[key].name())
                    .copied()
                    .unwrap_or(self.values[key]);
                (key, value)
            })
            .collect();
        Ok(())
    }

    /// Commits a value to a net, recording the transition at the current
    /// time. Returns whether the value actually changed.
    pub fn commit(&mut self, net: NetKey, value: Logic) -> bool {
        let old = self.values[net];
        if old == value {
            return false;
        }
        self.values[net] = value;
        self.trace.push(Transition {
            time: self.time,
            net,
            old,
            new: value,
        });
        true
    }

    /// Clears a net's establishment mark, reporting whether it was set.
    pub fn unmark(&mut self, net: NetKey) -> bool {
        self.marked.remove(net).is_some()
    }

    /// Evaluates a gate against the current net values, counting the
    /// evaluation.
    pub fn evaluate(&mut self, netlist: &Netlist, gate: GateKey, model: LogicModel) -> Logic {
        let g = &netlist[gate];
        self.evals[g.ordinal()] += 1;
        g.kind()
            .eval(model, g.inputs().iter().map(|&n| self.values[n]))
    }

    /// The error raised when an engine exhausts its iteration cap, carrying
    /// the partial trace.
    pub fn non_convergence(&self, limit: usize) -> SimError {
        SimError::NonConvergence {
            limit,
            trace: self.trace.clone(),
        }
    }

    fn into_result(self, netlist: &Netlist) -> VectorResult {
        let outputs = netlist
            .outputs()
            .iter()
            .map(|&key| (netlist[key].name().to_owned(), self.values[key]))
            .collect();
        let hazards = hazard::analyze(netlist, &self.trace);
        VectorResult {
            outputs,
            trace: self.trace,
            gate_evals: self.evals,
            hazards,
        }
    }
}

/// The capability every engine realizes: drive one prepared vector to
/// completion over the shared state.
#[enum_dispatch]
pub(crate) trait Paradigm {
    fn run(&self, netlist: &Netlist, state: &mut SimState, opts: &SimOptions)
        -> Result<(), SimError>;

    fn label(&self) -> &'static str;
}

/// A simulation engine, selected by paradigm.
#[enum_dispatch(Paradigm)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    /// Two-list unit-delay event-driven simulation.
    TwoList,
    /// Single-list event-driven simulation with event cancellation.
    SingleEvent,
    /// Single-list gate-driven simulation with staged commits.
    SingleGate,
    /// Zero-delay levelized sweep with feedback iteration.
    Levelized,
    /// Threaded-code execution from a work stack.
    Threaded,
}

impl Engine {
    /// All five engines, handy for cross-engine comparison.
    pub fn all() -> [Engine; 5] {
        [
            TwoList.into(),
            SingleEvent.into(),
            SingleGate.into(),
            Levelized.into(),
            Threaded.into(),
        ]
    }

    /// Simulates one vector from the reset state.
    pub fn simulate_vector(
        &self,
        netlist: &Netlist,
        stimulus: &Stimulus,
        opts: &SimOptions,
    ) -> Result<VectorResult, SimError> {
        let mut state = SimState::reset(netlist, opts);
        state.apply_stimulus(netlist, stimulus, opts)?;
        log::trace!("{} engine: vector start", self.label());
        self.run(netlist, &mut state, opts)?;
        Ok(state.into_result(netlist))
    }

    /// Simulates a series of vectors, each one starting from a copy of the
    /// previous vector's settled values. Results share nothing.
    pub fn simulate_sequence<'a, I>(
        &self,
        netlist: &Netlist,
        stimuli: I,
        opts: &SimOptions,
    ) -> Result<Vec<VectorResult>, SimError>
    where
        I: IntoIterator<Item = &'a Stimulus>,
    {
        let mut results = Vec::new();
        let mut settled: Option<SecondaryMap<NetKey, Logic>> = None;
        for stimulus in stimuli {
            let mut state = match &settled {
                None => SimState::reset(netlist, opts),
                Some(values) => SimState::seeded(netlist, values),
            };
            state.apply_stimulus(netlist, stimulus, opts)?;
            self.run(netlist, &mut state, opts)?;
            settled = Some(state.values.clone());
            results.push(state.into_result(netlist));
        }
        Ok(results)
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::logic::GateKind;
    use crate::logic::Logic::{One, Unknown, Zero};
    use crate::netlist::CircuitBuilder;

    pub fn stim(pairs: &[(&str, Logic)]) -> Stimulus {
        pairs.iter().map(|&(n, v)| (n.to_owned(), v)).collect()
    }

    /// X = AND(A, B); Y = OR(X, C).
    pub fn two_gate_circuit() -> Netlist {
        let mut builder = CircuitBuilder::new();
        builder.declare_inputs(["A", "B", "C"]).unwrap();
        builder.declare_outputs(["Y"]).unwrap();
        builder.add_gate(GateKind::And, ["A", "B"], "X").unwrap();
        builder.add_gate(GateKind::Or, ["X", "C"], "Y").unwrap();
        builder.freeze().unwrap()
    }

    /// Y = (A AND B) OR (NOT A AND C): the textbook static-1 hazard shape.
    pub fn hazard_circuit() -> Netlist {
        let mut builder = CircuitBuilder::new();
        builder.declare_inputs(["A", "B", "C"]).unwrap();
        builder.declare_outputs(["Y"]).unwrap();
        builder.add_gate(GateKind::And, ["A", "B"], "X").unwrap();
        builder.add_gate(GateKind::Not, ["A"], "N").unwrap();
        builder.add_gate(GateKind::And, ["N", "C"], "D").unwrap();
        builder.add_gate(GateKind::Or, ["X", "D"], "Y").unwrap();
        builder.freeze().unwrap()
    }

    /// X1 = XOR(A, B); X2 = XOR(C, D); Y = XOR(X1, X2).
    pub fn xor_tree() -> Netlist {
        let mut builder = CircuitBuilder::new();
        builder.declare_inputs(["A", "B", "C", "D"]).unwrap();
        builder.declare_outputs(["Y"]).unwrap();
        builder.add_gate(GateKind::Xor, ["A", "B"], "X1").unwrap();
        builder.add_gate(GateKind::Xor, ["C", "D"], "X2").unwrap();
        builder.add_gate(GateKind::Xor, ["X1", "X2"], "Y").unwrap();
        builder.freeze().unwrap()
    }

    /// Ring of three inverters with no primary inputs.
    pub fn inverter_ring() -> Netlist {
        let mut builder = CircuitBuilder::new();
        builder.declare_outputs(["a"]).unwrap();
        builder.add_gate(GateKind::Not, ["a"], "b").unwrap();
        builder.add_gate(GateKind::Not, ["b"], "c").unwrap();
        builder.add_gate(GateKind::Not, ["c"], "a").unwrap();
        builder.freeze().unwrap()
    }

    /// Q = NAND(EN, Q): oscillates once EN rises.
    pub fn nand_oscillator() -> Netlist {
        let mut builder = CircuitBuilder::new();
        builder.declare_inputs(["EN"]).unwrap();
        builder.declare_outputs(["Q"]).unwrap();
        builder.add_gate(GateKind::Nand, ["EN", "Q"], "Q").unwrap();
        builder.freeze().unwrap()
    }

    /// X1 = AND(A, B); X2 = OR(C, D); Y = XOR(X1, X2).
    pub fn multi_level_circuit() -> Netlist {
        let mut builder = CircuitBuilder::new();
        builder.declare_inputs(["A", "B", "C", "D"]).unwrap();
        builder.declare_outputs(["Y"]).unwrap();
        builder.add_gate(GateKind::And, ["A", "B"], "X1").unwrap();
        builder.add_gate(GateKind::Or, ["C", "D"], "X2").unwrap();
        builder.add_gate(GateKind::Xor, ["X1", "X2"], "Y").unwrap();
        builder.freeze().unwrap()
    }

    fn four_bit_stim(bits: u8) -> Stimulus {
        stim(&[
            ("A", (bits & 1 != 0).into()),
            ("B", (bits & 2 != 0).into()),
            ("C", (bits & 4 != 0).into()),
            ("D", (bits & 8 != 0).into()),
        ])
    }

    #[test]
    fn all_engines_agree_on_final_outputs() {
        let opts = SimOptions::default();
        for netlist in [xor_tree(), multi_level_circuit()] {
            for bits in 0..16u8 {
                let vector = four_bit_stim(bits);
                let mut outputs = Vec::new();
                for engine in Engine::all() {
                    let result = engine.simulate_vector(&netlist, &vector, &opts).unwrap();
                    outputs.push((engine.label(), result.outputs().clone()));
                }
                for window in outputs.windows(2) {
                    assert_eq!(
                        window[0].1, window[1].1,
                        "{} and {} disagree on bits {bits:04b}",
                        window[0].0, window[1].0
                    );
                }
            }
        }
    }

    #[test]
    fn simulate_vector_is_idempotent() {
        let netlist = multi_level_circuit();
        let opts = SimOptions::default();
        let vector = four_bit_stim(0b1011);
        for engine in Engine::all() {
            let first = engine.simulate_vector(&netlist, &vector, &opts).unwrap();
            let second = engine.simulate_vector(&netlist, &vector, &opts).unwrap();
            assert_eq!(first, second, "{engine} must be repeatable");
        }
    }

    #[test]
    fn sequence_and_fresh_run_settle_identically() {
        let netlist = multi_level_circuit();
        let opts = SimOptions::default();
        let v1 = four_bit_stim(0b0110);
        let v2 = four_bit_stim(0b1101);
        for engine in Engine::all() {
            let seq = engine.simulate_sequence(&netlist, [&v1, &v2], &opts).unwrap();
            let fresh = engine.simulate_vector(&netlist, &v2, &opts).unwrap();
            assert_eq!(
                seq[1].outputs(),
                fresh.outputs(),
                "{engine}: final outputs are a function of the vector alone"
            );
        }
    }

    #[test]
    fn trace_times_never_decrease() {
        let opts = SimOptions::default();
        let netlist = hazard_circuit();
        let v1 = stim(&[("A", One), ("B", One), ("C", One)]);
        let v2 = stim(&[("A", Zero), ("B", One), ("C", One)]);
        for engine in Engine::all() {
            let results = engine.simulate_sequence(&netlist, [&v1, &v2], &opts).unwrap();
            for result in results {
                let mut last = 0;
                for t in result.trace().iter() {
                    assert!(t.time >= last, "{engine}: trace went backwards");
                    last = t.time;
                }
            }
        }
    }

    #[test]
    fn hazard_reports_are_repeatable() {
        let netlist = hazard_circuit();
        let opts = SimOptions::default();
        let v1 = stim(&[("A", One), ("B", One), ("C", One)]);
        let v2 = stim(&[("A", Zero), ("B", One), ("C", One)]);
        let engine = Engine::from(TwoList);
        let a = engine.simulate_sequence(&netlist, [&v1, &v2], &opts).unwrap();
        let b = engine.simulate_sequence(&netlist, [&v1, &v2], &opts).unwrap();
        assert_eq!(a[1].hazards(), b[1].hazards());
        assert_eq!(
            crate::hazard::analyze(&netlist, a[1].trace()),
            crate::hazard::analyze(&netlist, a[1].trace()),
            "classification is a pure function of the trace"
        );
    }

    #[test]
    fn unknown_stimulus_propagates_in_every_engine() {
        let netlist = two_gate_circuit();
        let opts = SimOptions::three_valued();
        let vector = stim(&[("A", Unknown), ("B", One), ("C", Zero)]);
        for engine in Engine::all() {
            let result = engine.simulate_vector(&netlist, &vector, &opts).unwrap();
            assert_eq!(result.output("Y"), Some(Unknown), "{engine}");
        }
    }

    #[test]
    fn three_valued_reset_value_is_configurable() {
        let netlist = two_gate_circuit();
        let opts = SimOptions {
            model: LogicModel::Three,
            unknown_init: Logic::Zero,
            ..Default::default()
        };
        let result = Engine::from(TwoList)
            .simulate_vector(
                &netlist,
                &stim(&[("A", Unknown), ("B", One), ("C", Zero)]),
                &opts,
            )
            .unwrap();
        // Nets start at the configured value instead of unknown, so the
        // unknown arriving through the AND gate is a visible transition.
        let x = netlist.find_net("X").unwrap();
        let x_change = result.trace().of_net(x).next().unwrap();
        assert_eq!((x_change.old, x_change.new), (Zero, Unknown));
        assert_eq!(result.output("Y"), Some(Unknown));
    }

    #[test]
    fn marks_establish_inputs_matching_the_three_valued_reset_value() {
        // Y = NOT(A). With the reset value configured to 0 and A stimulated
        // to that same 0, no change-driven event exists; only A's
        // establishment mark can wake the inverter. Were it skipped, Y
        // would stay frozen at its own reset value 0 instead of settling
        // at NOT(0) = 1.
        let mut builder = CircuitBuilder::new();
        builder.declare_inputs(["A"]).unwrap();
        builder.declare_outputs(["Y"]).unwrap();
        builder.add_gate(GateKind::Not, ["A"], "Y").unwrap();
        let netlist = builder.freeze().unwrap();

        let opts = SimOptions {
            model: LogicModel::Three,
            unknown_init: Logic::Zero,
            ..Default::default()
        };
        for engine in Engine::all() {
            let result = engine
                .simulate_vector(&netlist, &stim(&[("A", Zero)]), &opts)
                .unwrap();
            assert_eq!(
                result.output("Y"),
                Some(One),
                "{engine}: inverter must re-evaluate despite the unchanged input"
            );
        }
    }

    #[test]
    fn stimulus_for_undeclared_net_is_rejected() {
        let netlist = two_gate_circuit();
        let err = Engine::from(TwoList)
            .simulate_vector(&netlist, &stim(&[("Q", One)]), &SimOptions::default())
            .unwrap_err();
        assert!(matches!(err, SimError::UnknownNet(name) if name == "Q"));

        // Internal nets cannot be stimulated either.
        let err = Engine::from(TwoList)
            .simulate_vector(&netlist, &stim(&[("X", One)]), &SimOptions::default())
            .unwrap_err();
        assert!(matches!(err, SimError::UnknownNet(name) if name == "X"));
    }

    #[test]
    fn unknown_value_is_rejected_under_the_two_valued_model() {
        let netlist = two_gate_circuit();
        let err = Engine::from(TwoList)
            .simulate_vector(&netlist, &stim(&[("A", Unknown)]), &SimOptions::default())
            .unwrap_err();
        assert!(matches!(err, SimError::BadValue { symbol: 'U' }));
    }

    #[test]
    fn multi_level_circuit_example() {
        // Original demo: A=1 B=1 C=0 D=1 gives X1=1, X2=1, Y=0.
        let netlist = multi_level_circuit();
        let vector = stim(&[("A", One), ("B", One), ("C", Zero), ("D", One)]);
        for engine in Engine::all() {
            let result = engine
                .simulate_vector(&netlist, &vector, &SimOptions::default())
                .unwrap();
            assert_eq!(result.output("Y"), Some(Zero), "{engine}");
        }
    }

    #[test]
    fn engines_never_mutate_the_netlist() {
        let netlist = two_gate_circuit();
        let before: Vec<_> = netlist.nets().map(|(_, n)| n.name().to_owned()).collect();
        let opts = SimOptions::default();
        for engine in Engine::all() {
            engine
                .simulate_vector(&netlist, &stim(&[("A", One)]), &opts)
                .unwrap();
        }
        let after: Vec<_> = netlist.nets().map(|(_, n)| n.name().to_owned()).collect();
        assert_eq!(before, after);
    }
}
