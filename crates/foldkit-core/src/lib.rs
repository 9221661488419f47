//! # FoldKit Core Library
//!
//! Structure alignment and prediction-pipeline orchestration for protein
//! folding and design models served on a managed compute platform.
//!
//! ## Architectural Philosophy
//!
//! The library keeps the three-layer split of pure data, stateful logic and
//! user-facing procedures.
//!
//! - **[`core`]: The Foundation.** Structure models, PDB/mmCIF reading and
//!   writing, selection, local sequence alignment and rigid superposition.
//!   Everything here is synchronous and free of I/O beyond readers and writers.
//!
//! - **[`engine`]: The Logic Core.** Chain matching, atom correspondence, the
//!   two-stage fold contract and run state machine, and the traits through
//!   which external schedulers, volumes and predictors are reached.
//!
//! - **[`workflows`]: The Public API.** `select_and_align`, the fold
//!   coordinator and the design loop.

pub mod core;
pub mod engine;
pub mod workflows;

#[cfg(test)]
pub(crate) mod testing;
