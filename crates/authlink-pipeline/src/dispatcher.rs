//! Task classification and dispatch
//!
//! Tasks are grouped by `(variant, target)` so each physical record is
//! saved at most once per discovery round, no matter how many discovery
//! paths found it.
//!
//! ## Execution order
//!
//! 1. Authority-targeted batches, one at a time
//! 2. Local bibliographic batches, one at a time
//! 3. Union bibliographic batches in windows of `union_window` concurrent
//!    handlers; each window completes before the next starts
//!
//! Batches in the same window have disjoint targets by construction.

use crate::error::{PipelineError, Result};
use crate::handlers::{HandlerRegistry, Outcome};
use crate::task::{LinkageContext, Task, TaskKind};
use authlink_core::{Record, RecordRef};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// All tasks aimed at one target record
#[derive(Debug, Clone)]
pub struct TaskBatch {
    pub kind: TaskKind,
    pub target: RecordRef,
    pub tasks: Vec<Task>,
    record: Record,
    context: Arc<LinkageContext>,
}

impl TaskBatch {
    fn start(task: Task) -> Self {
        Self {
            kind: task.kind,
            target: task.target.clone(),
            record: task.record.clone(),
            context: task.context.clone(),
            tasks: vec![task],
        }
    }

    /// Target content as read by the first discovery path
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Source context of the batch
    pub fn context(&self) -> &LinkageContext {
        &self.context
    }
}

/// Group tasks by `(variant, target)`, keeping first-seen order
pub fn group_tasks(tasks: Vec<Task>) -> Vec<TaskBatch> {
    let mut batches: Vec<TaskBatch> = Vec::new();
    let mut index: HashMap<(TaskKind, RecordRef), usize> = HashMap::new();

    for task in tasks {
        let key = (task.kind, task.target.clone());
        match index.get(&key) {
            Some(&position) => batches[position].tasks.push(task),
            None => {
                index.insert(key, batches.len());
                batches.push(TaskBatch::start(task));
            }
        }
    }

    batches
}

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Concurrent union bibliographic handlers per window
    pub union_window: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { union_window: 10 }
    }
}

/// Outcome counts of one dispatch round
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub batches: usize,
    pub saved: usize,
    pub unchanged: usize,
    pub dry_run: usize,
    pub skipped: usize,
    pub abandoned: usize,
}

impl DispatchReport {
    fn record(&mut self, outcome: &Outcome) {
        self.batches += 1;
        match outcome {
            Outcome::Saved => self.saved += 1,
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::DryRun => self.dry_run += 1,
            Outcome::Skipped(_) => self.skipped += 1,
            Outcome::Abandoned(_) => self.abandoned += 1,
        }
    }
}

/// Runs grouped batches through their handlers
pub struct Dispatcher {
    handlers: HandlerRegistry,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(handlers: HandlerRegistry) -> Self {
        Self::with_config(handlers, DispatchConfig::default())
    }

    pub fn with_config(handlers: HandlerRegistry, config: DispatchConfig) -> Self {
        Self { handlers, config }
    }

    /// Group and run `tasks`
    ///
    /// # Errors
    ///
    /// Returns the first system-class failure. In a union window the
    /// remaining handlers of that window still run to completion.
    pub async fn dispatch(&self, tasks: Vec<Task>) -> Result<DispatchReport> {
        let batches = group_tasks(tasks);
        let mut report = DispatchReport::default();
        if batches.is_empty() {
            return Ok(report);
        }

        let (authority, bibliographic): (Vec<_>, Vec<_>) =
            batches.into_iter().partition(|b| b.kind.is_authority_targeted());
        let (windowed, sequential): (Vec<_>, Vec<_>) =
            bibliographic.into_iter().partition(|b| b.kind.is_windowed());

        info!(
            authority = authority.len(),
            local = sequential.len(),
            union = windowed.len(),
            "Dispatching batches"
        );

        for batch in authority.iter().chain(sequential.iter()) {
            let outcome = self.run(batch).await?;
            report.record(&outcome);
        }

        let window = self.config.union_window.max(1);
        for (number, chunk) in windowed.chunks(window).enumerate() {
            debug!(window = number, size = chunk.len(), "Running union window");
            let results = join_all(chunk.iter().map(|batch| self.run(batch))).await;

            let mut failure: Option<PipelineError> = None;
            for result in results {
                match result {
                    Ok(outcome) => report.record(&outcome),
                    Err(e) if failure.is_none() => failure = Some(e),
                    Err(_) => {}
                }
            }
            if let Some(e) = failure {
                return Err(e);
            }
        }

        Ok(report)
    }

    async fn run(&self, batch: &TaskBatch) -> Result<Outcome> {
        let handler = self.handlers.get(batch.kind)?;
        debug!(target = %batch.target, variant = %batch.kind, tasks = batch.tasks.len(), "Handling batch");
        handler.handle(batch).await
    }
}
