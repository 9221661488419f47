//! # Engine Module
//!
//! The stateful and effectful layer between the pure structure primitives in
//! [`crate::core`] and the end-to-end procedures in [`crate::workflows`].
//!
//! ## Overview
//!
//! - **Matching** ([`matching`]) - Chooses the reference chain that best explains a candidate
//! - **Correspondence** ([`correspondence`]) - Turns a sequence alignment into atom pairs
//! - **Masks** ([`mask`]) - Parsing of bracket-marked redesign regions
//! - **Pipeline** ([`pipeline`]) - The two-stage featurize/fold contract, run states and registry
//! - **Services** ([`services`]) - Traits for the job scheduler, blob volume and predictors
//! - **Configuration** ([`config`]) - Builders for alignment, pipeline and design settings
//! - **Progress** ([`progress`]) - Observer callbacks for long-running workflows
//! - **Errors** ([`error`]) - [`error::EngineError`], the error every workflow returns

pub mod config;
pub mod correspondence;
pub mod error;
pub mod mask;
pub mod matching;
pub mod pipeline;
pub mod progress;
pub mod services;
