//! # Workflows Module
//!
//! End-to-end procedures built on the engine. Each workflow takes its
//! collaborators and configuration explicitly, reports through `tracing`
//! and returns [`crate::engine::error::EngineError`] on the first failure.
//!
//! - **Alignment** ([`align`]) - `select_and_align`: superpose a candidate onto its best-matching reference chain
//! - **Folding** ([`fold`]) - Submit, track and collect two-stage fold runs
//! - **Design** ([`design`]) - Predict, in-paint, redesign, re-predict and align

pub mod align;
pub mod design;
pub mod fold;
