//! Draw-order ranking for borrowing facility tranches.
//!
//! Turns a loosely structured table of loan draw lines into a deterministic,
//! explainable draw order and, optionally, a greedy plan of how much to draw
//! from which lines to reach a target amount.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
