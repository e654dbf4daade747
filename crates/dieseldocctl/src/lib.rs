//! DieselDoc Control - CLI for the diagnostic consensus engine.
//!
//! Loads malfunction reports from JSON files, runs the processing
//! pipeline against HTTP capabilities or in offline mode, and renders
//! consensus results, Q&A training pairs, and batch metrics.

pub mod commands;
pub mod output;
