//! Authority record handlers
//!
//! `FenauFix` and `AsteriFix` update the source authority and its union
//! counterpart. `LinkedFenau` and `LinkedAsteri` add links to the related
//! heading (5XX) fields of authorities that refer to the source.

use super::logging::log_task_error;
use super::{HandlerContext, Outcome, TaskHandler};
use crate::dispatcher::TaskBatch;
use crate::error::Result;
use crate::task::{Task, TaskKind};
use async_trait::async_trait;
use authlink_core::utils::is_index_term_record;
use authlink_core::{
    merge_duplicate_fields, select_authority_field_for_linking, select_field_for_linking, Link,
    LinkPrefix, LinkReconciler, Record, RuleSet,
};
use tracing::{debug, warn};

const HEADING_TAG: &str = "100";

/// Run `transform` over every task, then merge and save
async fn apply<F>(context: &HandlerContext, batch: &TaskBatch, transform: F) -> Result<Outcome>
where
    F: Fn(Record, &Task) -> Result<Record>,
{
    let original = batch.record();
    match batch.tasks.iter().try_fold(original.clone(), transform) {
        Ok(fixed) => {
            let compacted = merge_duplicate_fields(&fixed);
            context.finish(batch, original, compacted).await
        }
        Err(e) if e.is_system() => Err(e),
        Err(e) => Ok(Outcome::Abandoned(log_task_error(batch, original, &e))),
    }
}

/// Links the source local authority and writes corrected years back
pub struct FenauFixHandler {
    context: HandlerContext,
    reconciler: LinkReconciler,
}

impl FenauFixHandler {
    pub fn new(context: HandlerContext) -> Self {
        let reconciler = LinkReconciler::new(context.fixer.clone(), RuleSet::Authority);
        Self { context, reconciler }
    }

    fn transform(&self, record: Record, task: &Task) -> Result<Record> {
        let context = &task.context;
        let link = Link::new(LinkPrefix::Asteri, context.asteri_id.clone());

        if context.has_fixed_content() {
            // Years were fixed: the donor becomes the new record content
            let mut fixed = context.fixed_record.clone();
            let Some(heading) = fixed.first_field(HEADING_TAG).cloned() else {
                return Ok(record);
            };
            let (linked, _) = self.reconciler.link_field(&heading, &link)?;

            if let Some(before) = record.first_field(HEADING_TAG) {
                if before != &heading {
                    warn!(target = %task.target, "Fixing years in the heading");
                    warn!(target = %task.target, field = %before, "Before");
                    warn!(target = %task.target, field = %linked, "After");
                }
            }

            if let Some(slot) = fixed.first_field_mut(HEADING_TAG) {
                *slot = linked;
            }
            return Ok(fixed);
        }

        let positions = select_field_for_linking(&record, &context.query_terms)?;
        let mut updated = record.clone();
        for position in positions {
            let (linked, _) = self.reconciler.link_field(&record.fields[position], &link)?;
            updated.fields[position] = linked;
        }
        Ok(updated)
    }
}

#[async_trait]
impl TaskHandler for FenauFixHandler {
    fn kind(&self) -> TaskKind {
        TaskKind::FenauFix
    }

    async fn handle(&self, batch: &TaskBatch) -> Result<Outcome> {
        apply(&self.context, batch, |record, task| self.transform(record, task)).await
    }
}

/// Links the union authority and merges the corrected heading into it
pub struct AsteriFixHandler {
    context: HandlerContext,
    reconciler: LinkReconciler,
}

impl AsteriFixHandler {
    pub fn new(context: HandlerContext) -> Self {
        let reconciler = LinkReconciler::new(context.fixer.clone(), RuleSet::Authority);
        Self { context, reconciler }
    }

    fn transform(&self, record: Record, task: &Task) -> Result<Record> {
        let context = &task.context;
        let link = Link::new(LinkPrefix::Fin11, context.asteri_id.clone());
        let positions = select_field_for_linking(&record, &context.query_terms)?;

        let mut updated = record.clone();
        for position in positions {
            let field = &record.fields[position];
            let (linked, _) = if field.tag == HEADING_TAG {
                self.reconciler
                    .reconcile_field(field, &context.fixed_record, &link)?
            } else {
                self.reconciler.link_field(field, &link)?
            };
            updated.fields[position] = linked;
        }
        Ok(updated)
    }
}

#[async_trait]
impl TaskHandler for AsteriFixHandler {
    fn kind(&self) -> TaskKind {
        TaskKind::AsteriFix
    }

    async fn handle(&self, batch: &TaskBatch) -> Result<Outcome> {
        apply(&self.context, batch, |record, task| self.transform(record, task)).await
    }
}

fn link_related_headings(
    reconciler: &LinkReconciler,
    record: Record,
    task: &Task,
    prefix: LinkPrefix,
) -> Result<Record> {
    let context = &task.context;
    let link = Link::new(prefix, context.asteri_id.clone());
    let positions = select_authority_field_for_linking(&record, &context.query_terms)?;

    let mut updated = record.clone();
    for position in positions {
        let (linked, _) = reconciler.link_field(&record.fields[position], &link)?;
        updated.fields[position] = linked;
    }
    Ok(updated)
}

async fn handle_related(
    context: &HandlerContext,
    reconciler: &LinkReconciler,
    batch: &TaskBatch,
    prefix: LinkPrefix,
) -> Result<Outcome> {
    if is_index_term_record(batch.record()) {
        warn!(target = %batch.target, "Record is an index term record, not linking");
        return Ok(Outcome::Skipped("index term record".to_string()));
    }
    debug!(target = %batch.target, tasks = batch.tasks.len(), "Linking related headings");
    apply(context, batch, |record, task| {
        link_related_headings(reconciler, record, task, prefix)
    })
    .await
}

/// Links local authorities that refer to the source
pub struct LinkedFenauHandler {
    context: HandlerContext,
    reconciler: LinkReconciler,
}

impl LinkedFenauHandler {
    pub fn new(context: HandlerContext) -> Self {
        let reconciler = LinkReconciler::new(context.fixer.clone(), RuleSet::Authority);
        Self { context, reconciler }
    }
}

#[async_trait]
impl TaskHandler for LinkedFenauHandler {
    fn kind(&self) -> TaskKind {
        TaskKind::LinkedFenau
    }

    async fn handle(&self, batch: &TaskBatch) -> Result<Outcome> {
        handle_related(&self.context, &self.reconciler, batch, LinkPrefix::Asteri).await
    }
}

/// Links union authorities that refer to the source
pub struct LinkedAsteriHandler {
    context: HandlerContext,
    reconciler: LinkReconciler,
}

impl LinkedAsteriHandler {
    pub fn new(context: HandlerContext) -> Self {
        let reconciler = LinkReconciler::new(context.fixer.clone(), RuleSet::Authority);
        Self { context, reconciler }
    }
}

#[async_trait]
impl TaskHandler for LinkedAsteriHandler {
    fn kind(&self) -> TaskKind {
        TaskKind::LinkedAsteri
    }

    async fn handle(&self, batch: &TaskBatch) -> Result<Outcome> {
        handle_related(&self.context, &self.reconciler, batch, LinkPrefix::Fin11).await
    }
}
