//! # Core Module
//!
//! Stateless building blocks of the structural alignment engine.
//!
//! - **Structure model** ([`models`]) - Models, chains, residues and atoms backed by slot maps
//! - **File I/O** ([`io`]) - PDB and mmCIF reading, PDB writing, dialect detection
//! - **Selection** ([`selection`]) - Predicate-based filtering, chain reduction, renumbering
//! - **Sequence alignment** ([`alignment`]) - Local identity-scored alignment with deterministic ties
//! - **Superposition** ([`superposition`]) - Kabsch rigid-body fitting
//! - **Utilities** ([`utils`]) - Geometry helpers and residue/atom identifier tables
//!
//! Everything here is synchronous, allocation-local and free of shared state,
//! so independent calls can run in parallel.

pub mod alignment;
pub mod io;
pub mod models;
pub mod selection;
pub mod superposition;
pub mod utils;
