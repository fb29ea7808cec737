// Delivers host and metric records to the server over HTTP.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::models::{HostMetricSnapshot, HostReport};

pub const REPORT_HOST_PATH: &str = "report_host";
pub const REPORT_HOST_METRIC_PATH: &str = "report_host_metric";
/// Header carrying the shared secret.
pub const TOKEN_HEADER: &str = "token";

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("POST {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("POST {url}: server answered {status}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },
}

#[derive(Debug, Clone)]
pub struct Reporter {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl Reporter {
    pub fn new(
        api_base: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ReportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ReportError::Client)?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    #[instrument(skip(self, report), fields(operation = "post_host", hostname = %report.hostname))]
    pub async fn post_host(&self, report: &HostReport) -> Result<(), ReportError> {
        self.post(REPORT_HOST_PATH, report).await
    }

    #[instrument(skip(self, snapshot), fields(operation = "post_metric", hostname = %snapshot.hostname))]
    pub async fn post_metric(&self, snapshot: &HostMetricSnapshot) -> Result<(), ReportError> {
        self.post(REPORT_HOST_METRIC_PATH, snapshot).await
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(), ReportError> {
        let url = self.endpoint(path);
        let resp = self
            .http
            .post(&url)
            .header(TOKEN_HEADER, &self.token)
            .json(body)
            .send()
            .await
            .map_err(|source| ReportError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ReportError::Status { url, status, body });
        }
        debug!(url = %url, status = %status, "report delivered");
        Ok(())
    }
}
