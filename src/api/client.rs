// src/api/client.rs

use std::collections::BTreeMap;
use std::time::Duration;

use futures_util::TryStreamExt;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ConsoleConfig;
use crate::engine::SnapshotSource;
use crate::errors::{ConsoleError, Result};
use crate::events::{EventFilter, EventTransport};
use crate::logs::{LogResponse, LogSource};
use crate::model::{Atom, Job, JobDag, JobRun, JobTask, StatsResponse, Trigger};
use crate::types::{BoxFuture, ByteStream};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON client for the `/v1` REST surface.
///
/// Two underlying HTTP clients are kept: one with the configured request
/// timeout for ordinary calls, and one with only a connect timeout for the
/// long-lived event and log streams.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    streaming: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: &ConsoleConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(config.http_timeout))
            .build()?;
        let streaming = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(config.http_timeout))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            streaming,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/v1{}", self.base_url, path)
    }

    pub async fn list_jobs(&self) -> Result<Vec<Job>> {
        self.get_json("/jobs").await
    }

    pub async fn get_job(&self, job_id: &str) -> Result<Job> {
        self.get_json(&format!("/jobs/{job_id}")).await
    }

    pub async fn list_runs(&self, job_id: &str) -> Result<Vec<JobRun>> {
        self.get_json(&format!("/jobs/{job_id}/runs")).await
    }

    pub async fn get_run(&self, job_id: &str, run_id: &str) -> Result<JobRun> {
        self.get_json(&format!("/jobs/{job_id}/runs/{run_id}")).await
    }

    pub async fn get_dag(&self, job_id: &str) -> Result<JobDag> {
        self.get_json(&format!("/jobs/{job_id}/dag")).await
    }

    pub async fn list_tasks(&self, job_id: &str) -> Result<Vec<JobTask>> {
        self.get_json(&format!("/jobs/{job_id}/tasks")).await
    }

    pub async fn list_atoms(&self) -> Result<Vec<Atom>> {
        self.get_json("/atoms").await
    }

    pub async fn get_atom(&self, atom_id: &str) -> Result<Atom> {
        self.get_json(&format!("/atoms/{atom_id}")).await
    }

    pub async fn list_triggers(&self) -> Result<Vec<Trigger>> {
        self.get_json("/triggers").await
    }

    pub async fn get_trigger(&self, trigger_id: &str) -> Result<Trigger> {
        self.get_json(&format!("/triggers/{trigger_id}")).await
    }

    pub async fn stats(&self) -> Result<StatsResponse> {
        self.get_json("/stats").await
    }

    /// Start a run of `job_id` and return the new run.
    pub async fn trigger_run(&self, job_id: &str) -> Result<JobRun> {
        let request = self.http.request(Method::POST, self.url(&format!("/jobs/{job_id}/run")));
        let response = send(request).await?;
        Ok(response.json().await?)
    }

    /// Atoms referenced by `dag`, keyed by atom id.
    ///
    /// Atoms that fail to load are skipped; decoration falls back to the raw
    /// atom id for them.
    pub async fn atoms_for(&self, dag: &JobDag) -> Result<BTreeMap<String, Atom>> {
        let mut ids: Vec<&str> = dag
            .nodes
            .iter()
            .map(|n| n.atom_id.as_str())
            .filter(|id| !id.is_empty())
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let mut atoms = BTreeMap::new();
        for id in ids {
            match self.get_atom(id).await {
                Ok(atom) => {
                    atoms.insert(atom.id.clone(), atom);
                }
                Err(err) => warn!(atom_id = id, error = %err, "failed to load atom"),
            }
        }
        Ok(atoms)
    }

    /// `GET /events` as a raw byte stream.
    pub async fn open_events(&self, filter: &EventFilter) -> Result<ByteStream> {
        let request = self
            .streaming
            .get(self.url("/events"))
            .query(&filter.query_pairs())
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .header(reqwest::header::CACHE_CONTROL, "no-cache");
        let response = send(request).await?;
        Ok(body_stream(response))
    }

    /// `GET /jobs/{job}/runs/{run}/logs?task_id=...`.
    ///
    /// A non-success answer is returned as [`LogResponse::Rejected`] with the
    /// body text rather than as an error.
    pub async fn open_logs(&self, job_id: &str, run_id: &str, task_id: &str) -> Result<LogResponse> {
        let response = self
            .streaming
            .get(self.url(&format!("/jobs/{job_id}/runs/{run_id}/logs")))
            .query(&[("task_id", task_id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Ok(LogResponse::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(LogResponse::Stream(body_stream(response)))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = send(self.http.get(url)).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

async fn send(request: RequestBuilder) -> Result<Response> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match body.trim() {
        "" => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        text => text.to_string(),
    };
    Err(ConsoleError::Api {
        status: status.as_u16(),
        message,
    })
}

fn body_stream(response: Response) -> ByteStream {
    Box::pin(
        response
            .bytes_stream()
            .map_ok(|chunk| chunk.to_vec())
            .map_err(ConsoleError::from),
    )
}

impl EventTransport for ApiClient {
    fn open<'a>(&'a self, filter: &'a EventFilter) -> BoxFuture<'a, Result<ByteStream>> {
        Box::pin(self.open_events(filter))
    }
}

impl LogSource for ApiClient {
    fn open_logs<'a>(
        &'a self,
        job_id: &'a str,
        run_id: &'a str,
        task_id: &'a str,
    ) -> BoxFuture<'a, Result<LogResponse>> {
        Box::pin(ApiClient::open_logs(self, job_id, run_id, task_id))
    }
}

impl SnapshotSource for ApiClient {
    fn fetch_run<'a>(&'a self, job_id: &'a str, run_id: &'a str) -> BoxFuture<'a, Result<JobRun>> {
        Box::pin(self.get_run(job_id, run_id))
    }

    fn fetch_dag<'a>(&'a self, job_id: &'a str) -> BoxFuture<'a, Result<JobDag>> {
        Box::pin(self.get_dag(job_id))
    }

    fn fetch_atoms<'a>(&'a self, dag: &'a JobDag) -> BoxFuture<'a, Result<BTreeMap<String, Atom>>> {
        Box::pin(self.atoms_for(dag))
    }
}
