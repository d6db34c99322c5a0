//! Dispatcher grouping and bounded fan-out

mod common;

use async_trait::async_trait;
use authlink_core::StoreError;
use authlink_pipeline::{
    group_tasks, DispatchConfig, Dispatcher, HandlerRegistry, Outcome, PipelineError, Result,
    TaskBatch, TaskHandler, TaskKind,
};
use common::task;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Mock Handler
// ============================================================================

struct ProbeState {
    handled: Vec<String>,
    in_flight: usize,
    max_in_flight: usize,
    fail_on: HashSet<String>,
}

/// Handler that tracks concurrency and fails on request
#[derive(Clone)]
struct ProbeHandler {
    kind: TaskKind,
    state: Arc<Mutex<ProbeState>>,
}

impl ProbeHandler {
    fn new(kind: TaskKind) -> Self {
        Self {
            kind,
            state: Arc::new(Mutex::new(ProbeState {
                handled: Vec::new(),
                in_flight: 0,
                max_in_flight: 0,
                fail_on: HashSet::new(),
            })),
        }
    }

    fn fail_on(&self, id: &str) {
        self.state.lock().unwrap().fail_on.insert(id.to_string());
    }

    fn handled(&self) -> Vec<String> {
        self.state.lock().unwrap().handled.clone()
    }

    fn max_in_flight(&self) -> usize {
        self.state.lock().unwrap().max_in_flight
    }
}

#[async_trait]
impl TaskHandler for ProbeHandler {
    fn kind(&self) -> TaskKind {
        self.kind
    }

    async fn handle(&self, batch: &TaskBatch) -> Result<Outcome> {
        {
            let mut state = self.state.lock().unwrap();
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
        }

        tokio::time::sleep(Duration::from_millis(10)).await;

        let mut state = self.state.lock().unwrap();
        state.in_flight -= 1;
        state.handled.push(batch.target.id.clone());
        if state.fail_on.contains(&batch.target.id) {
            return Err(PipelineError::Store(StoreError::Transport("connection reset".into())));
        }
        Ok(Outcome::Saved)
    }
}

fn dispatcher_with(handler: &ProbeHandler, window: usize) -> Dispatcher {
    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(handler.clone()));
    Dispatcher::with_config(registry, DispatchConfig { union_window: window })
}

fn union_tasks(count: usize) -> Vec<authlink_pipeline::Task> {
    (0..count).map(|i| task(TaskKind::Melinda, &i.to_string())).collect()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn union_batches_run_in_bounded_windows() {
    let handler = ProbeHandler::new(TaskKind::Melinda);
    let dispatcher = dispatcher_with(&handler, 3);

    let report = dispatcher.dispatch(union_tasks(7)).await.unwrap();

    assert_eq!(report.saved, 7);
    assert_eq!(handler.max_in_flight(), 3);
}

#[tokio::test(start_paused = true)]
async fn local_batches_run_one_at_a_time() {
    let handler = ProbeHandler::new(TaskKind::Fenni);
    let dispatcher = dispatcher_with(&handler, 10);

    let tasks = (0..4).map(|i| task(TaskKind::Fenni, &i.to_string())).collect();
    dispatcher.dispatch(tasks).await.unwrap();

    assert_eq!(handler.max_in_flight(), 1);
    assert_eq!(handler.handled(), vec!["0", "1", "2", "3"]);
}

#[tokio::test(start_paused = true)]
async fn failing_window_completes_before_error_is_returned() {
    let handler = ProbeHandler::new(TaskKind::Melinda);
    handler.fail_on("1");
    let dispatcher = dispatcher_with(&handler, 3);

    let result = dispatcher.dispatch(union_tasks(7)).await;

    assert!(result.is_err_and(|e| e.is_system()));
    let mut handled = handler.handled();
    handled.sort();
    assert_eq!(handled, vec!["0", "1", "2"]);
}

#[tokio::test(start_paused = true)]
async fn duplicate_targets_are_handled_once() {
    let handler = ProbeHandler::new(TaskKind::Fenni);
    let dispatcher = dispatcher_with(&handler, 10);

    let report = dispatcher
        .dispatch(vec![task(TaskKind::Fenni, "10"), task(TaskKind::Fenni, "10")])
        .await
        .unwrap();

    assert_eq!(report.batches, 1);
    assert_eq!(handler.handled(), vec!["10"]);
}

fn any_kind() -> impl Strategy<Value = TaskKind> {
    prop::sample::select(TaskKind::ALL.to_vec())
}

proptest! {
    #[test]
    fn grouping_yields_disjoint_targets(
        specs in prop::collection::vec((any_kind(), 0u8..6), 0..40)
    ) {
        let tasks: Vec<_> = specs.iter().map(|(kind, id)| task(*kind, &id.to_string())).collect();
        let total = tasks.len();

        let batches = group_tasks(tasks);

        let mut keys = HashSet::new();
        for batch in &batches {
            prop_assert!(keys.insert((batch.kind, batch.target.clone())));
            prop_assert!(batch.tasks.iter().all(|t| t.kind == batch.kind && t.target == batch.target));
        }
        prop_assert_eq!(batches.iter().map(|b| b.tasks.len()).sum::<usize>(), total);
    }
}
