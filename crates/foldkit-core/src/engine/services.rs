//! Contracts of the external collaborators: the job scheduler, the shared
//! blob volume and the model-serving predictors.
//!
//! Every call is asynchronous and returns as soon as the remote side has
//! answered; nothing here waits for a run to finish.

use super::pipeline::WorkflowSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Final outcome of a terminated run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunResult {
    Success,
    Failed,
    Cancelled,
}

/// Scheduler-side view of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Queued,
    Running,
    Terminated {
        result: RunResult,
        message: Option<String>,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExternalError {
    #[error("No job named '{name}' exists")]
    JobNotFound { name: String },
    #[error("{count} jobs are named '{name}'")]
    AmbiguousJob { name: String, count: usize },
    #[error("Path '{path}' not found on the volume")]
    NotFound { path: String },
    #[error("{service} request failed: {message}")]
    Service { service: String, message: String },
    #[error("{service} answered HTTP {status}: {body}")]
    Http {
        service: String,
        status: u16,
        body: String,
    },
}

impl ExternalError {
    pub fn service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn http(service: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            service: service.into(),
            status,
            body: body.into(),
        }
    }
}

/// A failure reported by, or while talking to, a model-serving endpoint.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Predictor '{endpoint}' failed: {message}")]
pub struct PredictorError {
    pub endpoint: String,
    pub message: String,
    /// Set when the endpoint answered with a non-success HTTP status.
    pub status: Option<u16>,
}

impl PredictorError {
    pub fn new(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn http(endpoint: impl Into<String>, status: u16, body: &str) -> Self {
        Self {
            endpoint: endpoint.into(),
            message: format!("HTTP {}: {}", status, body.trim()),
            status: Some(status),
        }
    }

    pub fn empty_response(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint, "response contained no predictions")
    }
}

pub trait JobService: Send + Sync {
    /// Registers a workflow and returns its job id.
    fn submit(&self, spec: &WorkflowSpec)
    -> impl Future<Output = Result<JobId, ExternalError>> + Send;

    /// Starts a run of a job. Returns once the scheduler has accepted it.
    fn run(
        &self,
        job: JobId,
        parameters: &BTreeMap<String, String>,
    ) -> impl Future<Output = Result<RunId, ExternalError>> + Send;

    fn status(&self, run: RunId) -> impl Future<Output = Result<RunStatus, ExternalError>> + Send;

    /// Every job whose name matches exactly; zero or several matches are legal answers.
    fn list_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Vec<JobId>, ExternalError>> + Send;

    fn cancel(&self, run: RunId) -> impl Future<Output = Result<(), ExternalError>> + Send;
}

/// Read side of the shared volume. The pipeline stages write to it on the
/// cluster; the coordinator only reads results and checks for artifacts.
pub trait BlobVolume: Send + Sync {
    fn read(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, ExternalError>> + Send;

    fn exists(&self, path: &str) -> impl Future<Output = Result<bool, ExternalError>> + Send;
}

/// A served model: a batch of inputs in, a batch of outputs out.
///
/// The output batch need not match the input batch in length; a sequence
/// designer returns several sequences for one backbone.
pub trait Predictor: Send + Sync {
    type Input: Send;
    type Output: Send;

    fn endpoint(&self) -> &str;

    fn predict(
        &self,
        inputs: Vec<Self::Input>,
    ) -> impl Future<Output = Result<Vec<Self::Output>, PredictorError>> + Send;
}

/// Backbone in-painting request: a structure plus the mask bounds to redesign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InpaintRequest {
    pub pdb: String,
    pub start_idx: usize,
    pub end_idx: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MsaMode {
    #[default]
    #[serde(rename = "no_msa")]
    NoMsa,
    #[serde(rename = "jh")]
    Jackhmmer,
}

impl MsaMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MsaMode::NoMsa => "no_msa",
            MsaMode::Jackhmmer => "jh",
        }
    }
}

/// Multi-entity structure prediction request (proteins, nucleic acids, ligands).
///
/// `input` lists entities as `kind_chains:sequence` records separated by `;`,
/// e.g. `protein_A:MKV...;rna_B:ACGU...`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiEntityRequest {
    pub input: String,
    pub msa: MsaMode,
    pub use_msa_server: bool,
}

/// Column-oriented table payload accepted by tabular serving endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataframeSplit {
    pub columns: Vec<String>,
    pub data: Vec<Vec<String>>,
}

impl MultiEntityRequest {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
            msa: MsaMode::NoMsa,
            use_msa_server: false,
        }
    }

    /// Encodes a batch as one table row per request.
    pub fn to_dataframe_split(batch: &[MultiEntityRequest]) -> DataframeSplit {
        DataframeSplit {
            columns: vec![
                "input".to_string(),
                "msa".to_string(),
                "use_msa_server".to_string(),
            ],
            data: batch
                .iter()
                .map(|r| {
                    vec![
                        r.input.clone(),
                        r.msa.as_str().to_string(),
                        if r.use_msa_server { "True" } else { "False" }.to_string(),
                    ]
                })
                .collect(),
        }
    }
}

/// One structure returned by a multi-entity predictor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexPrediction {
    pub pdb: String,
}
