//! Threaded-code simulation.
//!
//! Each gate was bound at freeze time to a thunk: its input keys, evaluator
//! tag, output key, and the ordinals of the thunks reading its output. A
//! LIFO work stack holds thunk ordinals; executing a thunk reads its
//! inputs, writes its output, records any transition at a monotonically
//! increasing logical tick, and pushes its output's fanout thunks. An
//! on-stack flag keeps each thunk on the stack at most once.

use crate::engine::{Paradigm, SimOptions, SimState};
use crate::error::SimError;
use crate::netlist::Netlist;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Threaded;

impl Paradigm for Threaded {
    fn run(
        &self,
        netlist: &Netlist,
        state: &mut SimState,
        opts: &SimOptions,
    ) -> Result<(), SimError> {
        let thunks = netlist.thunks();
        let mut stack: Vec<usize> = Vec::new();
        let mut on_stack = vec![false; thunks.len()];

        state.time = 0;
        for i in 0..state.inputs.len() {
            let (net, value) = state.inputs[i];
            let forced = state.unmark(net);
            if state.commit(net, value) {
                state.time += 1;
            } else if !forced {
                continue;
            }
            for &gate in netlist[net].fanout() {
                let ordinal = netlist[gate].ordinal();
                if !on_stack[ordinal] {
                    on_stack[ordinal] = true;
                    stack.push(ordinal);
                }
            }
        }

        let mut executed = 0usize;
        while let Some(ordinal) = stack.pop() {
            executed += 1;
            if executed > opts.max_units {
                return Err(state.non_convergence(opts.max_units));
            }
            on_stack[ordinal] = false;

            let thunk = &thunks[ordinal];
            state.evals[ordinal] += 1;
            let out = thunk
                .kind
                .eval(opts.model, thunk.inputs.iter().map(|&n| state.values[n]));
            if state.commit(thunk.output, out) {
                state.time += 1;
                for &next in &thunk.fanout {
                    if !on_stack[next] {
                        on_stack[next] = true;
                        stack.push(next);
                    }
                }
            }
        }
        Ok(())
    }

    fn label(&self) -> &'static str {
        "threaded"
    }
}
