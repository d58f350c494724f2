//! Single-list event-driven simulation.
//!
//! One priority queue carries both net updates and gate evaluations, keyed
//! by `(time, phase, rank)`: updates run in phase 0 so every application at
//! time `t` lands before any gate evaluation at `t`, and same-time
//! evaluations run in gate-ordinal order. A per-net side table tracks the
//! live pending event; superseded entries are skipped on pop rather than
//! searched for, and a pending event whose transition a later evaluation
//! reverses is cancelled by dropping its table entry.

use std::cmp::Ordering;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use slotmap::SecondaryMap;

use crate::engine::{Paradigm, SimOptions, SimState};
use crate::error::SimError;
use crate::logic::Logic;
use crate::netlist::graph::{GateKey, NetKey};
use crate::netlist::Netlist;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SingleEvent;

#[derive(Debug, Clone, Copy)]
enum Action {
    Apply { net: NetKey, value: Logic, seq: u64 },
    Eval(GateKey),
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    time: u64,
    phase: u8,
    rank: u64,
    action: Action,
}

impl Entry {
    fn key(&self) -> (u64, u8, u64) {
        (self.time, self.phase, self.rank)
    }
}
impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}
impl Eq for Entry {}
impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl Paradigm for SingleEvent {
    fn run(
        &self,
        netlist: &Netlist,
        state: &mut SimState,
        opts: &SimOptions,
    ) -> Result<(), SimError> {
        let mut queue: BinaryHeap<Reverse<Entry>> = BinaryHeap::new();
        // Live pending event per net: (sequence number, target value).
        // A popped application whose sequence number no longer matches has
        // been superseded and is skipped.
        let mut pending: SecondaryMap<NetKey, (u64, Logic)> = SecondaryMap::new();
        // Unit for which a gate evaluation is already queued.
        let mut queued_eval: SecondaryMap<GateKey, u64> = SecondaryMap::new();
        let mut seq = 0u64;

        for i in 0..state.inputs.len() {
            let (net, value) = state.inputs[i];
            if value != state.values[net] || state.unmark(net) {
                pending.insert(net, (seq, value));
                queue.push(Reverse(Entry {
                    time: 0,
                    phase: 0,
                    rank: seq,
                    action: Action::Apply { net, value, seq },
                }));
                seq += 1;
            }
        }

        while let Some(Reverse(entry)) = queue.pop() {
            if entry.time as usize > opts.max_units {
                return Err(state.non_convergence(opts.max_units));
            }
            state.time = entry.time;

            match entry.action {
                Action::Apply { net, value, seq: ev_seq } => {
                    let live = pending.get(net).map(|&(s, _)| s) == Some(ev_seq);
                    if !live {
                        continue;
                    }
                    pending.remove(net);
                    state.commit(net, value);
                    for &gate in netlist[net].fanout() {
                        if queued_eval.get(gate) != Some(&entry.time) {
                            queued_eval.insert(gate, entry.time);
                            queue.push(Reverse(Entry {
                                time: entry.time,
                                phase: 1,
                                rank: netlist[gate].ordinal() as u64,
                                action: Action::Eval(gate),
                            }));
                        }
                    }
                }
                Action::Eval(gate) => {
                    let out = state.evaluate(netlist, gate, opts.model);
                    let target = netlist[gate].output();
                    let current = state.values[target];
                    if out != current {
                        // Suppress a duplicate of an already-pending event;
                        // otherwise supersede it.
                        if pending.get(target).map(|&(_, v)| v) == Some(out) {
                            continue;
                        }
                        pending.insert(target, (seq, out));
                        queue.push(Reverse(Entry {
                            time: entry.time + 1,
                            phase: 0,
                            rank: seq,
                            action: Action::Apply {
                                net: target,
                                value: out,
                                seq,
                            },
                        }));
                        seq += 1;
                    } else if pending.remove(target).is_some() {
                        // The earlier transition would have been reversed;
                        // the pending event dies before it fires.
                        log::trace!("single-event: cancelled pending event at unit {}", entry.time);
                    }
                }
            }
        }
        Ok(())
    }

    fn label(&self) -> &'static str {
        "single-event"
    }
}
