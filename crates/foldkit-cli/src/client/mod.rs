//! HTTP adapters for the remote workspace: the job scheduler and file volume
//! ([`WorkspaceClient`]) and model-serving endpoints (`ServingEndpoint`).

mod serving;
mod workspace;

pub use serving::{BackboneEndpoint, ComplexEndpoint, DesignerEndpoint, StructureEndpoint};
pub use workspace::WorkspaceClient;
