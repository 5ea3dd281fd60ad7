pub mod alerts;
pub mod clock;
pub mod config;
pub mod error;
pub mod monitors;
pub mod orchestrator;
pub mod storage;
pub mod util;
pub mod workload;

pub use alerts::{AlertEngine, EvaluationReport, Transition};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{MonitorSettings, read_config_file};
pub use error::{MonitorError, MonitorResult};
pub use orchestrator::{CollectionOrchestrator, CycleReport, Stage};
