//! # Core Models Module
//!
//! In-memory representation of macromolecular structures.
//!
//! A [`structure::Structure`] holds an ordered list of models, each an ordered
//! list of chains; chains hold residues and residues hold atoms. Entities live
//! in slot maps and are addressed by the stable keys in [`ids`].
//!
//! ## Key Components
//!
//! - [`atom`] - Atom name, element, coordinates, occupancy and B-factor
//! - [`residue`] - Residue identity, numbering and polymer/hetero kind
//! - [`chain`] - Ordered residues under a single-character identifier
//! - [`structure`] - The structure container and its models
//! - [`builder`] - Incremental construction with ordering checks
//! - [`ids`] - Stable identifiers for atoms, residues and chains

pub mod atom;
pub mod builder;
pub mod chain;
pub mod ids;
pub mod residue;
pub mod structure;
