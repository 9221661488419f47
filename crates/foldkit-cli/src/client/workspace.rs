use crate::config::WorkspaceSettings;
use foldkit::engine::pipeline::{StageSpec, WorkflowSpec};
use foldkit::engine::services::{
    BlobVolume, ExternalError, JobId, JobService, RunId, RunResult, RunStatus,
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use tracing::{debug, trace};

const JOBS_API: &str = "/api/2.1/jobs";
const FILES_API: &str = "/api/2.0/fs/files";

const JOBS_SERVICE: &str = "jobs";
const FILES_SERVICE: &str = "files";

#[derive(Deserialize)]
struct CreateResponse {
    job_id: u64,
}

#[derive(Deserialize)]
struct RunNowResponse {
    run_id: u64,
}

#[derive(Deserialize)]
struct RunResponse {
    state: WireRunState,
}

#[derive(Deserialize, Debug, Clone)]
struct WireRunState {
    life_cycle_state: String,
    result_state: Option<String>,
    state_message: Option<String>,
}

#[derive(Deserialize, Default)]
struct ListResponse {
    #[serde(default)]
    jobs: Vec<JobSummary>,
    #[serde(default)]
    has_more: bool,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct JobSummary {
    job_id: u64,
    settings: Option<JobSummarySettings>,
}

#[derive(Deserialize)]
struct JobSummarySettings {
    name: Option<String>,
}

/// REST client for a workspace's job scheduler and file volume.
#[derive(Clone)]
pub struct WorkspaceClient {
    http: Client,
    base_url: String,
    token: String,
}

impl WorkspaceClient {
    pub fn new(settings: &WorkspaceSettings) -> crate::error::Result<Self> {
        let (base_url, token) = settings.credentials()?;
        let http = Client::builder()
            .user_agent(concat!("foldkit/", env!("CARGO_PKG_VERSION")))
            .build()?;
        debug!("Workspace client targets {}", base_url);
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
    }

    async fn send(
        &self,
        service: &str,
        request: RequestBuilder,
    ) -> Result<Response, ExternalError> {
        request
            .send()
            .await
            .map_err(|e| ExternalError::service(service, e.to_string()))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        service: &str,
        request: RequestBuilder,
    ) -> Result<T, ExternalError> {
        let response = ensure_success(service, self.send(service, request).await?).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ExternalError::service(service, format!("malformed response: {}", e)))
    }
}

async fn ensure_success(service: &str, response: Response) -> Result<Response, ExternalError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ExternalError::http(service, status.as_u16(), body.trim()))
}

fn task_payload(stage: &StageSpec) -> Value {
    let resources = &stage.resources;
    let mut task = json!({
        "task_key": stage.key,
        "depends_on": stage
            .depends_on
            .iter()
            .map(|key| json!({ "task_key": key }))
            .collect::<Vec<_>>(),
        "notebook_task": {
            "notebook_path": stage.notebook_path,
            "base_parameters": stage.base_parameters,
        },
        "new_cluster": {
            "spark_version": resources.runtime_version,
            "node_type_id": resources.node_type,
            "num_workers": resources.num_workers,
        },
        "max_retries": resources.max_retries,
    });
    if let Some(timeout) = resources.timeout_seconds {
        task["timeout_seconds"] = json!(timeout);
    }
    task
}

/// Body of a `jobs/create` request for a workflow.
pub(crate) fn workflow_payload(spec: &WorkflowSpec) -> Value {
    let mut payload = json!({
        "name": spec.name,
        "tasks": spec.stages.iter().map(task_payload).collect::<Vec<_>>(),
        "parameters": spec
            .parameters
            .iter()
            .map(|p| json!({ "name": p.name, "default": p.default }))
            .collect::<Vec<_>>(),
    });
    if let Some(email) = &spec.notification_email {
        payload["email_notifications"] = json!({
            "on_success": [email],
            "on_failure": [email],
        });
    }
    payload
}

fn run_status(state: &WireRunState) -> RunStatus {
    match state.life_cycle_state.as_str() {
        "QUEUED" | "PENDING" | "BLOCKED" | "WAITING_FOR_RETRY" => RunStatus::Queued,
        "RUNNING" | "TERMINATING" => RunStatus::Running,
        _ => {
            let result = match state.result_state.as_deref() {
                Some("SUCCESS") | Some("SUCCESS_WITH_FAILURES") => RunResult::Success,
                Some("CANCELED") | Some("CANCELLED") => RunResult::Cancelled,
                _ => RunResult::Failed,
            };
            RunStatus::Terminated {
                result,
                message: state
                    .state_message
                    .clone()
                    .filter(|m| !m.trim().is_empty()),
            }
        }
    }
}

fn files_path(path: &str) -> String {
    format!("{}/{}", FILES_API, path.trim_start_matches('/'))
}

impl JobService for WorkspaceClient {
    async fn submit(&self, spec: &WorkflowSpec) -> Result<JobId, ExternalError> {
        let request = self
            .request(Method::POST, &format!("{}/create", JOBS_API))
            .json(&workflow_payload(spec));
        let created: CreateResponse = self.send_json(JOBS_SERVICE, request).await?;
        Ok(JobId(created.job_id))
    }

    async fn run(
        &self,
        job: JobId,
        parameters: &BTreeMap<String, String>,
    ) -> Result<RunId, ExternalError> {
        let request = self
            .request(Method::POST, &format!("{}/run-now", JOBS_API))
            .json(&json!({ "job_id": job.0, "job_parameters": parameters }));
        let started: RunNowResponse = self.send_json(JOBS_SERVICE, request).await?;
        Ok(RunId(started.run_id))
    }

    async fn status(&self, run: RunId) -> Result<RunStatus, ExternalError> {
        let request = self
            .request(Method::GET, &format!("{}/runs/get", JOBS_API))
            .query(&[("run_id", run.0)]);
        let response: RunResponse = self.send_json(JOBS_SERVICE, request).await?;
        trace!(run_id = %run, state = ?response.state, "Scheduler run state");
        Ok(run_status(&response.state))
    }

    async fn list_by_name(&self, name: &str) -> Result<Vec<JobId>, ExternalError> {
        let mut found = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self
                .request(Method::GET, &format!("{}/list", JOBS_API))
                .query(&[("name", name)]);
            if let Some(token) = &page_token {
                request = request.query(&[("page_token", token.as_str())]);
            }
            let page: ListResponse = self.send_json(JOBS_SERVICE, request).await?;
            found.extend(
                page.jobs
                    .into_iter()
                    .filter(|job| {
                        job.settings
                            .as_ref()
                            .and_then(|s| s.name.as_deref())
                            .is_none_or(|n| n == name)
                    })
                    .map(|job| JobId(job.job_id)),
            );
            match page.next_page_token {
                Some(token) if page.has_more => page_token = Some(token),
                _ => break,
            }
        }
        Ok(found)
    }

    async fn cancel(&self, run: RunId) -> Result<(), ExternalError> {
        let request = self
            .request(Method::POST, &format!("{}/runs/cancel", JOBS_API))
            .json(&json!({ "run_id": run.0 }));
        ensure_success(JOBS_SERVICE, self.send(JOBS_SERVICE, request).await?).await?;
        Ok(())
    }
}

impl BlobVolume for WorkspaceClient {
    async fn read(&self, path: &str) -> Result<Vec<u8>, ExternalError> {
        let request = self.request(Method::GET, &files_path(path));
        let response = self.send(FILES_SERVICE, request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ExternalError::NotFound {
                path: path.to_string(),
            });
        }
        let response = ensure_success(FILES_SERVICE, response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExternalError::service(FILES_SERVICE, e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn exists(&self, path: &str) -> Result<bool, ExternalError> {
        let request = self.request(Method::HEAD, &files_path(path));
        let response = self.send(FILES_SERVICE, request).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(ExternalError::http(
                FILES_SERVICE,
                status.as_u16(),
                format!("checking '{}'", path),
            )),
        }
    }
}
