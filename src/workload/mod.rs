//! Read-only view of the workloads behind an application
//!
//! The monitor never talks to the orchestration platform directly; it goes
//! through [`WorkloadApi`]. [`http::HttpWorkloadApi`] is the shipped adapter,
//! tests substitute their own implementations.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::HttpWorkloadApi;

pub type WorkloadResult<T> = Result<T, WorkloadError>;

#[derive(Debug, Error)]
pub enum WorkloadError {
    /// The inspection API could not be reached
    #[error("workload API unavailable: {0}")]
    Unavailable(String),

    /// The inspection API answered with a non-success status
    #[error("workload API returned {status} for {resource}")]
    Status { resource: String, status: u16 },

    /// The response body did not match the expected shape
    #[error("failed to decode {resource}: {message}")]
    Decode { resource: String, message: String },
}

/// One pod of an application's workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pod {
    pub name: String,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub ready: bool,
}

/// Resource usage of one container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerUsage {
    #[serde(default)]
    pub name: String,
    pub cpu_millicores: f64,
    pub memory_bytes: f64,
}

/// Resource usage sample of one pod, one entry per container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodUsage {
    pub name: String,
    pub containers: Vec<ContainerUsage>,
}

impl PodUsage {
    /// Usage taken as representative of the whole pod
    ///
    /// Only the first container is considered; multi-container pods are not
    /// disaggregated.
    pub fn representative(&self) -> Option<&ContainerUsage> {
        self.containers.first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub desired_replicas: u32,
    pub ready_replicas: u32,
}

/// Cluster-internal address of an application's service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEndpoint {
    pub cluster_address: String,
    /// Declared ports in declaration order
    pub ports: Vec<u16>,
}

impl ServiceEndpoint {
    pub fn first_port(&self) -> Option<u16> {
        self.ports.first().copied()
    }
}

/// Query interface of the workload inspection API
#[async_trait]
pub trait WorkloadApi: Send + Sync {
    async fn list_pods(&self, app_name: &str) -> WorkloadResult<Vec<Pod>>;

    async fn pod_resource_usage(&self, app_name: &str) -> WorkloadResult<Vec<PodUsage>>;

    async fn get_deployment(&self, app_name: &str) -> WorkloadResult<Deployment>;

    async fn get_service(&self, app_name: &str) -> WorkloadResult<ServiceEndpoint>;
}
