//! Bibliographic link handlers (FENNI and MELINDA)

use super::logging::log_task_error;
use super::{HandlerContext, Outcome, TaskHandler};
use crate::dispatcher::TaskBatch;
use crate::error::{PipelineError, Result};
use crate::task::{Task, TaskKind};
use async_trait::async_trait;
use authlink_core::{
    merge_duplicate_fields, see_from_matches, select_field_for_linking, ConflictPolicy, Link,
    LinkError, LinkPrefix, LinkReconciler, Record, RuleSet,
};
use tracing::warn;

/// Link every matching name field of `record` for one task
fn link_bibliographic_record(
    record: &Record,
    task: &Task,
    reconciler: &LinkReconciler,
    prefix: LinkPrefix,
) -> Result<Record> {
    let context = &task.context;
    let link = Link::new(prefix, context.asteri_id.clone());
    let positions = select_field_for_linking(record, &context.query_terms)?;

    let mut updated = record.clone();
    for position in positions {
        let field = &record.fields[position];
        if field.is_linked() {
            warn!(target = %task.target, field = %field, "Record contains linked fields (cyrillic)");
            continue;
        }
        let (reconciled, _) = reconciler.reconcile_field(field, &context.fixed_record, &link)?;
        updated.fields[position] = reconciled;
    }
    Ok(updated)
}

async fn handle_bibliographic(
    context: &HandlerContext,
    batch: &TaskBatch,
    reconciler: &LinkReconciler,
    prefix: LinkPrefix,
) -> Result<Outcome> {
    let original = batch.record();

    let transformed = batch.tasks.iter().try_fold(original.clone(), |record, task| {
        link_bibliographic_record(&record, task, reconciler, prefix)
    });

    match transformed {
        Ok(fixed) => {
            let compacted = merge_duplicate_fields(&fixed);
            context.finish(batch, original, compacted).await
        }
        Err(e) if e.is_system() => Err(e),
        Err(PipelineError::Link(LinkError::FieldNotFound))
            if !see_from_matches(&batch.context().fixed_record, original).is_empty() =>
        {
            let matches: Vec<String> = see_from_matches(&batch.context().fixed_record, original)
                .iter()
                .map(|f| f.to_string())
                .collect();
            warn!(
                target = %batch.target,
                auth_id = %batch.context().auth_id,
                fields = ?matches,
                "Linked by a see from tracing (4XX) field, not adding links"
            );
            Ok(Outcome::Skipped("linked by see-from tracing".to_string()))
        }
        Err(e) => Ok(Outcome::Abandoned(log_task_error(batch, original, &e))),
    }
}

/// Links local bibliographic records to the national authority
pub struct FenniHandler {
    context: HandlerContext,
    reconciler: LinkReconciler,
}

impl FenniHandler {
    pub fn new(context: HandlerContext) -> Self {
        let reconciler = LinkReconciler::new(context.fixer.clone(), RuleSet::Bibliographic);
        Self { context, reconciler }
    }
}

#[async_trait]
impl TaskHandler for FenniHandler {
    fn kind(&self) -> TaskKind {
        TaskKind::Fenni
    }

    async fn handle(&self, batch: &TaskBatch) -> Result<Outcome> {
        handle_bibliographic(&self.context, batch, &self.reconciler, LinkPrefix::Asteri).await
    }
}

/// Links union bibliographic records to the union authority
///
/// Links from other catalogs already present in a field are tolerated.
pub struct MelindaHandler {
    context: HandlerContext,
    reconciler: LinkReconciler,
}

impl MelindaHandler {
    pub fn new(context: HandlerContext) -> Self {
        let reconciler = LinkReconciler::new(context.fixer.clone(), RuleSet::Bibliographic)
            .with_policy(ConflictPolicy::TolerateForeign);
        Self { context, reconciler }
    }
}

#[async_trait]
impl TaskHandler for MelindaHandler {
    fn kind(&self) -> TaskKind {
        TaskKind::Melinda
    }

    async fn handle(&self, batch: &TaskBatch) -> Result<Outcome> {
        handle_bibliographic(&self.context, batch, &self.reconciler, LinkPrefix::Fin11).await
    }
}
