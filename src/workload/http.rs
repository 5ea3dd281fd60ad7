//! JSON-over-HTTP client for the workload inspection API
//!
//! ## Endpoints
//!
//! ```text
//! GET {base}/apps/{name}/pods        → [Pod]
//! GET {base}/apps/{name}/pods/usage  → [PodUsage]
//! GET {base}/apps/{name}/deployment  → Deployment
//! GET {base}/apps/{name}/service     → ServiceEndpoint
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{instrument, trace};

use crate::config::WorkloadSettings;

use super::{
    Deployment, Pod, PodUsage, ServiceEndpoint, WorkloadApi, WorkloadError, WorkloadResult,
};

/// HTTP implementation of [`WorkloadApi`]
///
/// The client is built once and reused across requests.
#[derive(Debug, Clone)]
pub struct HttpWorkloadApi {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpWorkloadApi {
    pub fn new(settings: &WorkloadSettings) -> WorkloadResult<Self> {
        let base_url = Url::parse(&settings.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                WorkloadError::Unavailable(format!("invalid base URL '{}'", settings.base_url))
            })?;

        // A zero timeout would fail every request immediately
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .build()
            .map_err(|e| WorkloadError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            token: settings.token.clone(),
        })
    }

    /// `{base}/apps/{app_name}/{resource}` with the app name as one escaped segment
    fn url(&self, app_name: &str, resource: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("apps")
                .push(app_name)
                .extend(resource.split('/'));
        }
        url
    }

    #[instrument(skip(self))]
    async fn fetch<T: DeserializeOwned>(
        &self,
        app_name: &str,
        resource: &str,
    ) -> WorkloadResult<T> {
        let url = self.url(app_name, resource);
        trace!("requesting {url}");

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.header("X-MONITORING-SECRET", token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| WorkloadError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WorkloadError::Status {
                resource: format!("{app_name}/{resource}"),
                status: response.status().as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| WorkloadError::Unavailable(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| WorkloadError::Decode {
            resource: format!("{app_name}/{resource}"),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl WorkloadApi for HttpWorkloadApi {
    async fn list_pods(&self, app_name: &str) -> WorkloadResult<Vec<Pod>> {
        self.fetch(app_name, "pods").await
    }

    async fn pod_resource_usage(&self, app_name: &str) -> WorkloadResult<Vec<PodUsage>> {
        self.fetch(app_name, "pods/usage").await
    }

    async fn get_deployment(&self, app_name: &str) -> WorkloadResult<Deployment> {
        self.fetch(app_name, "deployment").await
    }

    async fn get_service(&self, app_name: &str) -> WorkloadResult<ServiceEndpoint> {
        self.fetch(app_name, "service").await
    }
}
