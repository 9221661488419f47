use super::workspace::WorkspaceClient;
use foldkit::engine::services::{
    ComplexPrediction, InpaintRequest, MultiEntityRequest, Predictor, PredictorError,
};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::marker::PhantomData;
use tracing::{debug, info};

/// How a batch of inputs is laid out in an invocation body.
pub trait InvocationInput: Sized + Send {
    fn encode(batch: &[Self]) -> Value;
}

impl InvocationInput for String {
    fn encode(batch: &[Self]) -> Value {
        json!({ "inputs": batch })
    }
}

impl InvocationInput for InpaintRequest {
    fn encode(batch: &[Self]) -> Value {
        json!({ "inputs": batch })
    }
}

impl InvocationInput for MultiEntityRequest {
    fn encode(batch: &[Self]) -> Value {
        json!({ "dataframe_split": MultiEntityRequest::to_dataframe_split(batch) })
    }
}

#[derive(Deserialize)]
struct Invocation<O> {
    predictions: Vec<O>,
}

/// A model-serving endpoint queried through `/serving-endpoints/{name}/invocations`.
pub struct ServingEndpoint<I, O> {
    http: Client,
    url: String,
    token: String,
    name: String,
    _marker: PhantomData<fn(I) -> O>,
}

impl<I, O> ServingEndpoint<I, O> {
    pub fn new(workspace: &WorkspaceClient, name: &str) -> Self {
        Self {
            http: workspace.http().clone(),
            url: invocation_url(workspace.base_url(), name),
            token: workspace.token().to_string(),
            name: name.to_string(),
            _marker: PhantomData,
        }
    }
}

fn invocation_url(base_url: &str, name: &str) -> String {
    format!("{}/serving-endpoints/{}/invocations", base_url, name)
}

fn decode<O: DeserializeOwned>(endpoint: &str, body: &str) -> Result<Vec<O>, PredictorError> {
    let invocation: Invocation<O> = serde_json::from_str(body)
        .map_err(|e| PredictorError::new(endpoint, format!("malformed response: {}", e)))?;
    Ok(invocation.predictions)
}

impl<I, O> Predictor for ServingEndpoint<I, O>
where
    I: InvocationInput,
    O: DeserializeOwned + Send,
{
    type Input = I;
    type Output = O;

    fn endpoint(&self) -> &str {
        &self.name
    }

    async fn predict(&self, inputs: Vec<I>) -> Result<Vec<O>, PredictorError> {
        debug!(endpoint = %self.name, batch = inputs.len(), "Querying serving endpoint");
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&I::encode(&inputs))
            .send()
            .await
            .map_err(|e| PredictorError::new(&self.name, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PredictorError::new(&self.name, e.to_string()))?;
        if !status.is_success() {
            return Err(PredictorError::http(&self.name, status.as_u16(), &body));
        }

        let outputs = decode(&self.name, &body)?;
        info!(endpoint = %self.name, outputs = outputs.len(), "Endpoint answered");
        Ok(outputs)
    }
}

/// Sequence in, PDB text out.
pub type StructureEndpoint = ServingEndpoint<String, String>;
/// Masked backbone in, in-painted PDB text out.
pub type BackboneEndpoint = ServingEndpoint<InpaintRequest, String>;
/// Backbone PDB text in, designed sequences out.
pub type DesignerEndpoint = ServingEndpoint<String, String>;
pub type ComplexEndpoint = ServingEndpoint<MultiEntityRequest, ComplexPrediction>;
