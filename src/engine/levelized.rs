//! Zero-delay levelized simulation.
//!
//! Applies the input vector, then evaluates every leveled gate exactly once
//! in ascending (level, ordinal) order. Gates the levelizer could not
//! assign (the feedback set) are re-evaluated together with their forward
//! cones until the values stop changing or the pass cap is hit. The trace
//! carries only initial and final values, so this engine never reports a
//! hazard.

use std::collections::BTreeSet;

use slotmap::SecondaryMap;

use crate::engine::{Paradigm, SimOptions, SimState};
use crate::error::SimError;
use crate::netlist::graph::NetKey;
use crate::netlist::Netlist;
use crate::trace::Transition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Levelized;

impl Levelized {
    /// Re-evaluates the leveled gates downstream of a changed net, in
    /// ascending (level, ordinal) order.
    fn ripple(
        &self,
        netlist: &Netlist,
        state: &mut SimState,
        opts: &SimOptions,
        from: NetKey,
    ) {
        let mut worklist: BTreeSet<(u32, usize)> = BTreeSet::new();
        let seed = |worklist: &mut BTreeSet<(u32, usize)>, net: NetKey| {
            for &gate in netlist[net].fanout() {
                if let Some(level) = netlist[gate].level() {
                    worklist.insert((level, netlist[gate].ordinal()));
                }
            }
        };
        seed(&mut worklist, from);
        while let Some((_, ordinal)) = worklist.pop_first() {
            let gate = netlist.order()[ordinal];
            let out = state.evaluate(netlist, gate, opts.model);
            let target = netlist[gate].output();
            if out != state.values[target] {
                state.values[target] = out;
                seed(&mut worklist, target);
            }
        }
    }
}

impl Paradigm for Levelized {
    fn run(
        &self,
        netlist: &Netlist,
        state: &mut SimState,
        opts: &SimOptions,
    ) -> Result<(), SimError> {
        if opts.strict_levelized && !netlist.feedback().is_empty() {
            return Err(SimError::FeedbackInLevelized {
                gates: netlist.feedback().len(),
            });
        }

        // Snapshot for the initial/final trace; intermediate values are
        // deliberately invisible.
        let initial: SecondaryMap<NetKey, _> = state.values.clone();

        state.time = 0;
        for i in 0..state.inputs.len() {
            let (net, value) = state.inputs[i];
            state.unmark(net);
            state.commit(net, value);
        }

        // Main sweep: every leveled gate exactly once.
        for i in 0..netlist.topo().len() {
            let gate = netlist.topo()[i];
            let out = state.evaluate(netlist, gate, opts.model);
            let target = netlist[gate].output();
            state.values[target] = out;
        }

        // Feedback iteration: the levelizer residue and its forward cones,
        // until a full pass leaves every feedback output unchanged.
        if !netlist.feedback().is_empty() {
            let mut pass = 0;
            loop {
                let mut settled = true;
                for i in 0..netlist.feedback().len() {
                    let gate = netlist.feedback()[i];
                    let out = state.evaluate(netlist, gate, opts.model);
                    let target = netlist[gate].output();
                    if out != state.values[target] {
                        state.values[target] = out;
                        settled = false;
                        self.ripple(netlist, state, opts, target);
                    }
                }
                if settled {
                    break;
                }
                pass += 1;
                log::trace!("levelized: feedback pass {pass}");
                if pass >= opts.max_passes {
                    return Err(state.non_convergence(opts.max_passes));
                }
            }
        }

        // Final trace: one transition per settled non-input net.
        state.time = 1;
        let changed: Vec<NetKey> = netlist
            .nets()
            .filter(|(key, net)| !net.is_input() && state.values[*key] != initial[*key])
            .map(|(key, _)| key)
            .collect();
        for net in changed {
            state.trace.push(Transition {
                time: 1,
                net,
                old: initial[net],
                new: state.values[net],
            });
        }
        Ok(())
    }

    fn label(&self) -> &'static str {
        "levelized"
    }
}
