//! Work items produced by discovery
//!
//! A [`Task`] names one target record to update on behalf of one source
//! authority. Every task derived from the same source id shares the same
//! read-only [`LinkageContext`].

use authlink_core::permutations::describe_terms;
use authlink_core::{QueryTerm, Record, RecordKind, RecordRef};
use std::fmt;
use std::sync::Arc;

/// Task variants, one per integration path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskKind {
    /// Link (and fix the years of) the source local authority itself
    FenauFix,
    /// Link related local authorities to the source
    LinkedFenau,
    /// Link local bibliographic records
    Fenni,
    /// Link union bibliographic records
    Melinda,
    /// Link (and fix) the union authority of the source
    AsteriFix,
    /// Link related union authorities to the source
    LinkedAsteri,
}

impl TaskKind {
    pub const ALL: [TaskKind; 6] = [
        TaskKind::FenauFix,
        TaskKind::LinkedFenau,
        TaskKind::Fenni,
        TaskKind::Melinda,
        TaskKind::AsteriFix,
        TaskKind::LinkedAsteri,
    ];

    /// Whether the task writes an authority record
    pub fn is_authority_targeted(&self) -> bool {
        !matches!(self, TaskKind::Fenni | TaskKind::Melinda)
    }

    /// Whether batches of this kind run with bounded fan-out
    pub fn is_windowed(&self) -> bool {
        matches!(self, TaskKind::Melinda)
    }

    /// Catalog the task writes to
    pub fn target_kind(&self) -> RecordKind {
        match self {
            TaskKind::FenauFix | TaskKind::LinkedFenau => RecordKind::LocalAuthority,
            TaskKind::Fenni => RecordKind::LocalBibliographic,
            TaskKind::Melinda => RecordKind::UnionBibliographic,
            TaskKind::AsteriFix | TaskKind::LinkedAsteri => RecordKind::UnionAuthority,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::FenauFix => "FENAU-fix",
            TaskKind::LinkedFenau => "linked-FENAU",
            TaskKind::Fenni => "FENNI-link",
            TaskKind::Melinda => "MELINDA-link",
            TaskKind::AsteriFix => "ASTERI-fix",
            TaskKind::LinkedAsteri => "linked-ASTERI",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-source bundle shared by every task of one source id
#[derive(Debug, Clone, PartialEq)]
pub struct LinkageContext {
    /// Local authority id being processed
    pub auth_id: String,
    /// Union authority id the local authority resolved to
    pub asteri_id: String,
    pub query_terms: Vec<QueryTerm>,
    /// Source record as read
    pub authority_record: Record,
    /// Source record with corrected years; the content donor
    pub fixed_record: Record,
}

impl LinkageContext {
    pub fn source(&self) -> RecordRef {
        RecordRef::new(RecordKind::LocalAuthority, self.auth_id.clone())
    }

    /// Query terms rendered for log lines
    pub fn terms_description(&self) -> String {
        describe_terms(&self.query_terms)
    }

    /// Whether year fixing changed the donor
    pub fn has_fixed_content(&self) -> bool {
        self.fixed_record != self.authority_record
    }
}

/// One target record to update
#[derive(Debug, Clone)]
pub struct Task {
    pub kind: TaskKind,
    pub target: RecordRef,
    /// Target content as read during discovery
    pub record: Record,
    pub context: Arc<LinkageContext>,
}

impl Task {
    pub fn new(kind: TaskKind, id: impl Into<String>, record: Record, context: Arc<LinkageContext>) -> Self {
        Self {
            kind,
            target: RecordRef::new(kind.target_kind(), id),
            record,
            context,
        }
    }

    /// Identity used to batch tasks: one batch, one save
    pub fn group_key(&self) -> (TaskKind, &RecordRef) {
        (self.kind, &self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bibliographic_variants_are_not_authority_targeted() {
        let bib: Vec<TaskKind> = TaskKind::ALL
            .into_iter()
            .filter(|k| !k.is_authority_targeted())
            .collect();
        assert_eq!(bib, vec![TaskKind::Fenni, TaskKind::Melinda]);
    }

    #[test]
    fn only_union_bibliographic_tasks_fan_out() {
        assert!(TaskKind::Melinda.is_windowed());
        assert!(!TaskKind::Fenni.is_windowed());
        assert!(!TaskKind::LinkedAsteri.is_windowed());
    }

    #[test]
    fn target_identity_includes_catalog() {
        let context = Arc::new(LinkageContext {
            auth_id: "1".into(),
            asteri_id: "000001".into(),
            query_terms: Vec::new(),
            authority_record: Record::default(),
            fixed_record: Record::default(),
        });
        let fenni = Task::new(TaskKind::Fenni, "7", Record::default(), context.clone());
        let fenau = Task::new(TaskKind::LinkedFenau, "7", Record::default(), context);
        assert_ne!(fenni.target, fenau.target);
        assert_eq!(fenni.target.kind, RecordKind::LocalBibliographic);
    }
}
