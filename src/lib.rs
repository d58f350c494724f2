//! Gate-level combinational logic simulation under five scheduling
//! paradigms.
//!
//! A circuit is built through [`CircuitBuilder`] and frozen into an
//! immutable [`Netlist`]; any of the five [`Engine`]s then evaluates input
//! vectors against it, producing a [`VectorResult`] with final output
//! values, a time-ordered transition trace, per-gate evaluation counts, and
//! a per-net hazard report.
//!
//! ## This crate notably consists of:
//! - **[`logic`]**: two- and three-valued logic values and the gate
//!   evaluation kernel.
//! - **[`netlist`]**: the construction API, the frozen net/gate arenas, and
//!   the levelizer.
//! - **[`engine`]**: the five simulation engines (two-list, single-list
//!   event, single-list gate, zero-delay levelized, threaded-code) over a
//!   shared per-vector substrate.
//! - **[`hazard`]**: static/dynamic hazard classification of a trace.
//!
//! ```
//! use gatesim_engine::{CircuitBuilder, Engine, GateKind, Logic, SimOptions, TwoList};
//!
//! let mut builder = CircuitBuilder::new();
//! builder.declare_inputs(["A", "B", "C"]).unwrap();
//! builder.declare_outputs(["Y"]).unwrap();
//! builder.add_gate(GateKind::And, ["A", "B"], "X").unwrap();
//! builder.add_gate(GateKind::Or, ["X", "C"], "Y").unwrap();
//! let netlist = builder.freeze().unwrap();
//!
//! let vector = [
//!     ("A".to_owned(), Logic::One),
//!     ("B".to_owned(), Logic::One),
//!     ("C".to_owned(), Logic::Zero),
//! ]
//! .into_iter()
//! .collect();
//! let result = Engine::from(TwoList)
//!     .simulate_vector(&netlist, &vector, &SimOptions::default())
//!     .unwrap();
//! assert_eq!(result.output("Y"), Some(Logic::One));
//! ```

pub mod engine;
pub mod error;
pub mod hazard;
pub mod logic;
pub mod netlist;
pub mod trace;

pub use engine::{
    Engine, Levelized, SimOptions, SingleEvent, SingleGate, Stimulus, Threaded, TwoList,
};
pub use error::SimError;
pub use hazard::Hazard;
pub use logic::{GateKind, Logic, LogicModel};
pub use netlist::{CircuitBuilder, Netlist};
pub use trace::{Trace, Transition, VectorResult};
