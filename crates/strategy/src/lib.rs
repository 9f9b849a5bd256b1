//! Strategy crate: Model Probability (C5's numerical core), the `evaluate`
//! decision function, and the Gate pipeline (C6) that admits or refuses a
//! signal before it reaches order placement.

pub mod engine;
pub mod gates;
pub mod probability;

pub use engine::evaluate;
pub use gates::{run as run_gates, GateResult};
