//! Per-application collection stages
//!
//! - **ConfigResolver**: loads or lazily creates the monitoring configuration
//! - **MetricSampler**: records pod, resource and replica metrics
//! - **HealthProber**: probes the application's service endpoint

pub mod prober;
pub mod resolver;
pub mod sampler;

pub use prober::HealthProber;
pub use resolver::ConfigResolver;
pub use sampler::{MetricSampler, SampleReport, SampleStep};
