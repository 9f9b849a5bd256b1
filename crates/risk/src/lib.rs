//! Risk Engine crate (C7): position sizing bounded by the per-trade, city,
//! and cluster exposure caps, plus the daily-loss and rejection-burst
//! circuit breakers.

pub mod engine;

pub use engine::{daily_loss_tripped, size, ExposureAccumulator, RejectionTracker, SizingResult};
