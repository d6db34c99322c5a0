//! Link reconciliation
//!
//! Takes a matched field through the reconciliation states:
//!
//! ```text
//! matched -> content merged -> link validated -> link inserted
//!                           \-> link conflict    \-> link already present
//! ```
//!
//! The input field is never mutated; callers receive a new field together
//! with a [`FieldOutcome`] describing what happened.

use crate::error::{LinkError, ReconcileError};
use crate::links::{has_invalid_link, has_link, validate_link, Link};
use crate::portion::fix_bib_field;
use crate::punctuation::{PunctuationFixer, RuleSet};
use crate::record::{Field, Record, Subfield};
use std::sync::Arc;
use tracing::{info, warn};

/// How a pre-existing link that differs from the inserted one is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Any differing link aborts the task
    #[default]
    Strict,
    /// Links from another prefix family only warn; a differing link within
    /// the same family still aborts
    TolerateForeign,
}

/// Terminal state of one reconciled field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome {
    LinkInserted,
    LinkAlreadyPresent,
    ContentMerged {
        before: String,
        after: String,
        link_inserted: bool,
    },
}

impl FieldOutcome {
    pub fn changed(&self) -> bool {
        !matches!(self, FieldOutcome::LinkAlreadyPresent)
    }
}

/// Merges donor content into matched fields and inserts `‡0` links
#[derive(Clone)]
pub struct LinkReconciler {
    fixer: Arc<dyn PunctuationFixer>,
    rules: RuleSet,
    policy: ConflictPolicy,
}

impl LinkReconciler {
    pub fn new(fixer: Arc<dyn PunctuationFixer>, rules: RuleSet) -> Self {
        Self {
            fixer,
            rules,
            policy: ConflictPolicy::Strict,
        }
    }

    pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Splice the donor's authorized portion into `field`, re-punctuate and
    /// link it
    pub fn reconcile_field(
        &self,
        field: &Field,
        donor: &Record,
        link: &Link,
    ) -> Result<(Field, FieldOutcome), ReconcileError> {
        let mut merged = fix_bib_field(field, donor)?;
        self.fixer.fix(&mut merged, self.rules)?;
        self.check_conflict(&merged, link)?;

        let link_inserted = attach_link(&mut merged, link);

        if merged.subfields == field.subfields && merged.ind1 == field.ind1 {
            return Ok((merged, FieldOutcome::LinkAlreadyPresent));
        }

        let content_changed = without_links(&merged) != without_links(field) || merged.ind1 != field.ind1;
        if !content_changed {
            return Ok((merged, FieldOutcome::LinkInserted));
        }

        warn!(before = %field, after = %merged, "Field content changed");
        let outcome = FieldOutcome::ContentMerged {
            before: field.to_string(),
            after: merged.to_string(),
            link_inserted,
        };
        Ok((merged, outcome))
    }

    /// Link `field` without touching its content
    pub fn link_field(&self, field: &Field, link: &Link) -> Result<(Field, FieldOutcome), ReconcileError> {
        self.check_conflict(field, link)?;
        let mut linked = field.clone();
        if attach_link(&mut linked, link) {
            Ok((linked, FieldOutcome::LinkInserted))
        } else {
            Ok((linked, FieldOutcome::LinkAlreadyPresent))
        }
    }

    /// Reconcile the fields at `positions` and return the new record
    pub fn reconcile_record(
        &self,
        record: &Record,
        positions: &[usize],
        donor: &Record,
        link: &Link,
    ) -> Result<(Record, Vec<FieldOutcome>), ReconcileError> {
        let mut updated = record.clone();
        let mut outcomes = Vec::with_capacity(positions.len());
        for &position in positions {
            let Some(field) = record.fields.get(position) else {
                continue;
            };
            let (field, outcome) = self.reconcile_field(field, donor, link)?;
            updated.fields[position] = field;
            outcomes.push(outcome);
        }
        Ok((updated, outcomes))
    }

    fn check_conflict(&self, field: &Field, link: &Link) -> Result<(), LinkError> {
        if validate_link(field, link) {
            return Ok(());
        }
        let conflict = LinkError::ConflictingLink {
            field: field.to_string(),
            expected: link.to_string(),
        };
        match self.policy {
            ConflictPolicy::Strict => Err(conflict),
            ConflictPolicy::TolerateForeign if has_invalid_link(field, link) => Err(conflict),
            ConflictPolicy::TolerateForeign => {
                warn!(field = %field, link = %link, "Field has a link from another catalog");
                Ok(())
            }
        }
    }
}

/// Insert `link` unless present; returns whether it was inserted
fn attach_link(field: &mut Field, link: &Link) -> bool {
    if has_link(field, link) {
        return false;
    }
    info!(field = %field, link = %link, "Adding link");
    field.add_subfield('0', link.to_string(), '9');
    true
}

fn without_links(field: &Field) -> Vec<&Subfield> {
    field.subfields.iter().filter(|s| s.code != '0').collect()
}
