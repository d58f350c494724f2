//! Error types for netlist construction and simulation.
//!
//! Construction errors are raised eagerly at the offending builder call;
//! simulation errors are surfaced at the `simulate_vector` boundary.

use crate::logic::GateKind;
use crate::trace::Trace;

/// Errors that can occur while building a netlist or running a vector.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A value symbol outside the active logic model.
    #[error("value symbol {symbol:?} is outside the active logic model")]
    BadValue {
        /// The offending symbol.
        symbol: char,
    },

    /// A stimulus referred to a net that is not a declared primary input.
    #[error("net {0:?} is not a declared primary input")]
    UnknownNet(String),

    /// Two gates attempted to drive the same net.
    #[error("net {0:?} already has a driver")]
    MultipleDrivers(String),

    /// Freeze found an internal net with no driver.
    #[error("net {0:?} has no driver and is not a primary input")]
    Undriven(String),

    /// A gate was constructed with the wrong number of inputs.
    #[error("{kind} gate expects {expected} inputs, found {found}")]
    ArityMismatch {
        /// The gate type being constructed.
        kind: GateKind,
        /// Description of the legal input count.
        expected: &'static str,
        /// The input count that was supplied.
        found: usize,
    },

    /// Mutation was attempted after the netlist was frozen.
    #[error("netlist is frozen; no further construction is allowed")]
    NetlistFrozen,

    /// An engine exceeded its iteration cap.
    ///
    /// Carries the partial trace recorded up to the point of failure.
    #[error("simulation did not converge within {limit} scheduler steps")]
    NonConvergence {
        /// The iteration cap that was exceeded.
        limit: usize,
        /// Transitions recorded before the cap was hit.
        trace: Trace,
    },

    /// The zero-delay levelized engine was asked to run a netlist with
    /// feedback while strict mode is enabled.
    #[error("netlist has {gates} feedback gates; the levelized engine rejects feedback in strict mode")]
    FeedbackInLevelized {
        /// Number of gates the levelizer could not assign a level.
        gates: usize,
    },
}
