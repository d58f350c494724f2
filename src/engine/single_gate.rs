//! Single-list gate-driven simulation.
//!
//! Only gates are queued. Each unit evaluates every scheduled gate exactly
//! once against the values committed at the previous unit boundary, staging
//! new outputs in a next-value slot; the staged values are committed
//! together at the end of the unit and their fanout gates become the next
//! unit's queue. Converges when a unit stages no change.

use slotmap::SecondaryMap;

use crate::engine::{Paradigm, SimOptions, SimState};
use crate::error::SimError;
use crate::logic::Logic;
use crate::netlist::graph::{GateKey, NetKey};
use crate::netlist::Netlist;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SingleGate;

impl Paradigm for SingleGate {
    fn run(
        &self,
        netlist: &Netlist,
        state: &mut SimState,
        opts: &SimOptions,
    ) -> Result<(), SimError> {
        // Input changes are committed directly at unit 0.
        state.time = 0;
        let mut active: Vec<NetKey> = Vec::new();
        for i in 0..state.inputs.len() {
            let (net, value) = state.inputs[i];
            let forced = state.unmark(net);
            if state.commit(net, value) || forced {
                active.push(net);
            }
        }

        let mut scheduled: SecondaryMap<GateKey, ()> = SecondaryMap::new();
        let mut queue: Vec<GateKey> = Vec::new();
        for &net in &active {
            for &gate in netlist[net].fanout() {
                if scheduled.insert(gate, ()).is_none() {
                    queue.push(gate);
                }
            }
        }
        queue.sort_by_key(|&g| netlist[g].ordinal());

        while !queue.is_empty() {
            state.time += 1;
            if state.time as usize > opts.max_units {
                return Err(state.non_convergence(opts.max_units));
            }

            // Evaluate this unit's gates against the committed values,
            // staging outputs in evaluation order.
            let mut staged: Vec<(NetKey, Logic)> = Vec::new();
            for i in 0..queue.len() {
                let gate = queue[i];
                let out = state.evaluate(netlist, gate, opts.model);
                if out != state.values[netlist[gate].output()] {
                    staged.push((netlist[gate].output(), out));
                }
            }
            log::trace!(
                "single-gate unit {}: {} gates, {} staged",
                state.time,
                queue.len(),
                staged.len()
            );

            // Unit boundary: commit the staged values and collect the next
            // unit's gates.
            queue.clear();
            scheduled.clear();
            for (net, value) in staged {
                if state.commit(net, value) {
                    for &gate in netlist[net].fanout() {
                        if scheduled.insert(gate, ()).is_none() {
                            queue.push(gate);
                        }
                    }
                }
            }
            queue.sort_by_key(|&g| netlist[g].ordinal());
        }
        Ok(())
    }

    fn label(&self) -> &'static str {
        "single-gate"
    }
}
