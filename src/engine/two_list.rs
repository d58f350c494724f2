//! Two-list unit-delay event-driven simulation.
//!
//! Keeps two structures per unit: a FIFO event list of pending net updates
//! scheduled one unit ahead, and a gate list of gates queued for evaluation
//! at the current unit. Gates whose output differs from the net's current
//! value schedule a fresh event at `time + 1`.

use std::collections::VecDeque;

use slotmap::SecondaryMap;

use crate::engine::{Event, Paradigm, SimOptions, SimState};
use crate::error::SimError;
use crate::netlist::graph::GateKey;
use crate::netlist::Netlist;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TwoList;

impl Paradigm for TwoList {
    fn run(
        &self,
        netlist: &Netlist,
        state: &mut SimState,
        opts: &SimOptions,
    ) -> Result<(), SimError> {
        let mut events: VecDeque<Event> = VecDeque::new();
        let mut pending: SecondaryMap<GateKey, ()> = SecondaryMap::new();
        let mut seq = 0u64;

        for i in 0..state.inputs.len() {
            let (net, value) = state.inputs[i];
            if value != state.values[net] || state.unmark(net) {
                events.push_back(Event {
                    time: 0,
                    net,
                    value,
                    seq,
                });
                seq += 1;
            }
        }

        state.time = 0;
        loop {
            if state.time as usize > opts.max_units {
                return Err(state.non_convergence(opts.max_units));
            }

            // Apply this unit's events in insertion order; every applied
            // event wakes the net's fanout, deduplicated per gate.
            let mut due: Vec<Event> = Vec::new();
            while let Some(event) = events.front().copied() {
                if event.time != state.time {
                    break;
                }
                events.pop_front();
                due.push(event);
            }
            due.sort_by_key(|e| e.seq);

            let mut gate_list: Vec<GateKey> = Vec::new();
            for event in due {
                state.commit(event.net, event.value);
                for &gate in netlist[event.net].fanout() {
                    if pending.insert(gate, ()).is_none() {
                        gate_list.push(gate);
                    }
                }
            }

            if gate_list.is_empty() && events.is_empty() {
                break;
            }

            gate_list.sort_by_key(|&g| netlist[g].ordinal());
            log::trace!(
                "two-list unit {}: {} gates queued",
                state.time,
                gate_list.len()
            );
            for gate in gate_list {
                pending.remove(gate);
                let out = state.evaluate(netlist, gate, opts.model);
                let target = netlist[gate].output();
                if out != state.values[target] {
                    events.push_back(Event {
                        time: state.time + 1,
                        net: target,
                        value: out,
                        seq,
                    });
                    seq += 1;
                }
            }
            state.time += 1;
        }
        Ok(())
    }

    fn label(&self) -> &'static str {
        "two-list"
    }
}
