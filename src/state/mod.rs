// src/state/mod.rs
//! Flat-file state shared between runs: delivered ids and the last heartbeat tag.

pub mod dedup;
pub mod heartbeat;

pub use dedup::{DedupStore, SeenSet};
pub use heartbeat::{ActiveSchedule, HeartbeatDecision, HeartbeatGate};
