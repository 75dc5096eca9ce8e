//! Shared test utilities for the save-shuffle workspace.
//!
//! A dev-dependency only; never published.
//!
//! # Modules
//!
//! - [`fixtures`]: paths to the shipped rules and sample traces
//! - [`ops`]: operation builders against a fixed share root
//! - [`share`]: [`TestShare`], a replayer with assertion helpers

pub mod fixtures;
pub mod ops;
pub mod share;

pub use share::TestShare;
