//! Beneficial-ownership verification workflow: flow orchestration, roster
//! editing, requirement gating and the HTTP surface that drives them.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
