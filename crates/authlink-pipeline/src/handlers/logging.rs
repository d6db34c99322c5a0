//! Abandoned-task log lines
//!
//! ERROR lines are followed by the text form of the target and donor
//! records so the failure can be reproduced from the log alone.

use crate::dispatcher::TaskBatch;
use crate::error::{ErrorClass, PipelineError};
use authlink_core::{LinkError, Record};
use tracing::{error, warn};

fn dump(batch: &TaskBatch, record: &Record) {
    let context = batch.context();
    error!(
        "{}:\n{}\nAUTH:\n{}",
        batch.target.kind,
        record,
        context.fixed_record
    );
}

/// Log why the batch was dropped and return the failure class
pub(crate) fn log_task_error(batch: &TaskBatch, record: &Record, failure: &PipelineError) -> ErrorClass {
    let context = batch.context();
    let target = &batch.target;

    match failure {
        PipelineError::Punctuation(e) => {
            error!(target = %target, variant = %batch.kind, "{}", e);
        }
        PipelineError::Link(LinkError::OnlySeeAlso) => {
            warn!(
                target = %target,
                auth_id = %context.auth_id,
                terms = %context.terms_description(),
                "Found only 8XX field for linking"
            );
        }
        PipelineError::Link(LinkError::FieldNotFound) => {
            error!(
                target = %target,
                auth_id = %context.auth_id,
                terms = %context.terms_description(),
                "Could not find field to add the link to"
            );
            dump(batch, record);
        }
        other => {
            error!(target = %target, variant = %batch.kind, error = %other, "Task abandoned");
            dump(batch, record);
        }
    }

    failure.class()
}
