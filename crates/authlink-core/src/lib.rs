//! Authlink Core
//!
//! Record model and the linkage algorithms that decide which field of a
//! catalog record receives a cross-reference and what authorized content
//! is merged into it.
//!
//! ## Architecture
//!
//! Leaves first:
//!
//! - [`normalize`]: heading canonicalization, the single source of truth
//!   for heading equality
//! - [`permutations`]: candidate query terms from an authority record
//! - [`matcher`]: selects the fields of a target record to link
//! - [`merge`]: collapses structurally duplicate fields
//! - [`reconcile`]: merges authorized content and inserts `‡0` links
//!
//! Catalog I/O is abstracted behind the traits in [`catalog`]. Everything
//! else in this crate is synchronous and pure.

pub mod catalog;
pub mod error;
pub mod links;
pub mod matcher;
pub mod memory;
pub mod merge;
pub mod normalize;
pub mod permutations;
pub mod portion;
pub mod punctuation;
pub mod reconcile;
pub mod record;
pub mod utils;
pub mod years;

pub use catalog::{
    AllowAll, AllowListSource, CatalogIndex, CheckpointStore, IdResolver, RecordStore,
    ResolutionBase, ResolveResult, StoreResult,
};
pub use error::{
    LifeEvent, LinkError, PunctuationError, ReconcileError, RecordParseError, ResolveError,
    StoreError,
};
pub use links::{has_invalid_link, has_link, validate_link, Link, LinkPrefix};
pub use matcher::{see_from_matches, select_authority_field_for_linking, select_field_for_linking};
pub use merge::merge_duplicate_fields;
pub use normalize::normalize;
pub use permutations::{name_heading_permutations, QueryTerm};
pub use punctuation::{NameRules, PunctuationFixer, RuleSet};
pub use reconcile::{ConflictPolicy, FieldOutcome, LinkReconciler};
pub use record::{Field, Record, RecordKind, RecordRef, Subfield};
pub use years::fix_authority_years;
