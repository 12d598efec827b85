//! Configuration types for neural_perf.
//!
//! Burn-style configuration structs for evaluation runs and generator
//! architectures.

mod eval;
mod network;

pub use eval::EvalConfig;
pub use network::{GeneratorConfig, GeneratorKind, NormLayer};
