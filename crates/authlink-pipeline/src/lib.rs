//! Authlink Pipeline
//!
//! Orchestrates linking for a range of local authority ids.
//!
//! ## Architecture
//!
//! ```text
//! ScanController ──► IdProcessor (LinkagePipeline)
//!     │                  ├─ LinkageDiscovery  → Vec<Task>
//!     │                  └─ Dispatcher        → TaskHandler per batch
//!     └─ CheckpointStore / AllowListSource
//! ```
//!
//! - [`discovery`]: one source id to the tasks of all six variants
//! - [`dispatcher`]: groups tasks per target, runs handlers with bounded
//!   fan-out for union bibliographic records
//! - [`handlers`]: per-variant record transforms and the single save
//! - [`controller`]: checkpointed scan with backoff restart
//!
//! Collaborators come from `authlink_core::catalog` and are injected as
//! `Arc<dyn Trait>`.

pub mod checkpoint;
pub mod controller;
pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod estimate;
pub mod handlers;
pub mod pipeline;
pub mod task;

pub use checkpoint::{FileAllowList, FileCheckpointStore};
pub use controller::{ScanConfig, ScanController, ScanSummary, StopReason};
pub use discovery::{DiscoveryConfig, LinkageDiscovery};
pub use dispatcher::{group_tasks, DispatchConfig, DispatchReport, Dispatcher, TaskBatch};
pub use error::{ErrorClass, PipelineError, Result};
pub use estimate::TimeEstimator;
pub use handlers::{HandlerContext, HandlerRegistry, Outcome, TaskHandler};
pub use pipeline::{IdProcessor, LinkagePipeline, LinkagePipelineConfig};
pub use task::{LinkageContext, Task, TaskKind};
