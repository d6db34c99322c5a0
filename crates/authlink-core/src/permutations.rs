//! Query term generation
//!
//! A source authority record yields an ordered list of [`QueryTerm`]s, the
//! bare name first and then progressively more specific date qualified
//! forms. Consumers try every term, not just the last one.
//!
//! ## Year Sources
//!
//! Personal names carry years in two places that are read independently:
//!
//! 1. the structured pair `046 ‡f` (birth) and `046 ‡g` (death)
//! 2. the date subfield `100 ‡d`, split on its first hyphen
//!
//! Three families of date fragments are built: one per source and one from
//! the merged years (birth prefers the structured pair, death prefers the
//! date subfield). Their union, deduplicated, gives the date permutations.

use crate::error::LinkError;
use crate::normalize::normalize;
use crate::portion::heading_subfields;
use crate::record::{Record, Subfield};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// One normalized heading permutation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryTerm(pub Vec<Subfield>);

impl QueryTerm {
    pub fn subfields(&self) -> &[Subfield] {
        &self.0
    }

    /// Normalize raw subfields into a term
    pub fn from_raw(subfields: &[Subfield]) -> Self {
        Self(
            subfields
                .iter()
                .map(|s| Subfield::new(s.code, normalize(&s.value)))
                .collect(),
        )
    }

    fn with_date(&self, date: &str) -> Self {
        let mut subfields = self.0.clone();
        subfields.push(Subfield::new('d', date));
        Self(subfields)
    }
}

impl fmt::Display for QueryTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|s| format!("{} {}", s.code, s.value))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// Render terms for log lines
pub fn describe_terms(terms: &[QueryTerm]) -> String {
    terms
        .iter()
        .map(|t| format!("[{}]", t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Birth and death years read from a date subfield
///
/// Content after a second hyphen is lost; characters other than ASCII
/// letters, digits, underscore and whitespace are dropped.
pub fn years_from_date_subfield(date: &str) -> (Option<String>, Option<String>) {
    let mut parts = date.split('-');
    let keep_ascii = |part: Option<&str>| {
        part.map(|p| {
            p.chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_ascii_whitespace())
                .collect::<String>()
        })
        .filter(|p| !p.is_empty())
    };
    let birth = keep_ascii(parts.next());
    let death = keep_ascii(parts.next());
    (birth, death)
}

fn date_fragments(birth: Option<&str>, death: Option<&str>) -> Vec<String> {
    let years: Vec<&str> = [birth, death].into_iter().flatten().collect();
    (1..=years.len())
        .map(|n| normalize(&years[..n].join(" ")))
        .collect()
}

/// Build the query terms for a source authority record
pub fn name_heading_permutations(record: &Record) -> Result<Vec<QueryTerm>, LinkError> {
    if let Some(field) = record
        .first_field("110")
        .or_else(|| record.first_field("111"))
    {
        return Ok(vec![QueryTerm::from_raw(&heading_subfields(field))]);
    }

    let name = record.first_value("100", 'a').map(normalize);
    let qualifier = record.first_value("100", 'q').map(normalize);
    let specifier = record.first_value("100", 'c').map(normalize);

    let bare = QueryTerm(
        [('a', name), ('q', qualifier), ('c', specifier)]
            .into_iter()
            .filter_map(|(code, value)| value.map(|v| Subfield::new(code, v)))
            .collect(),
    );

    let date = record
        .first_value("100", 'd')
        .map(normalize)
        .filter(|d| !d.is_empty());

    let Some(date) = date else {
        return Ok(expand(bare, record, None));
    };

    let numeric = !date.chars().any(|c| c.is_ascii_alphabetic());
    if !numeric {
        debug!(date = %date, "Free-text date, no permutation");
        return Ok(vec![bare.with_date(&date)]);
    }

    let birth_structured = record.first_value("046", 'f');
    let death_structured = record.first_value("046", 'g');

    let permutations = expand(bare.clone(), record, Some(&date));
    let reconstructable = permutations
        .iter()
        .filter_map(|term| term.0.last())
        .any(|s| s.code == 'd' && s.value == date);

    if !reconstructable {
        return Err(LinkError::UnreconstructableDate { date });
    }

    if birth_structured.is_none() && death_structured.is_none() {
        return Ok(vec![bare.with_date(&date)]);
    }

    Ok(permutations)
}

fn expand(bare: QueryTerm, record: &Record, date: Option<&str>) -> Vec<QueryTerm> {
    let birth_structured = record.first_value("046", 'f');
    let death_structured = record.first_value("046", 'g');

    let (birth_heading, death_heading) = match date {
        Some(_) => record
            .first_value("100", 'd')
            .map(years_from_date_subfield)
            .unwrap_or_default(),
        None => (None, None),
    };
    let birth_heading = birth_heading.map(|b| normalize(&b)).filter(|b| !b.is_empty());
    let death_heading = death_heading.map(|d| normalize(&d)).filter(|d| !d.is_empty());

    let birth = birth_structured.or(birth_heading.as_deref());
    let death = death_heading.as_deref().or(death_structured);

    let mut fragments: Vec<String> = Vec::new();
    for fragment in date_fragments(birth, death)
        .into_iter()
        .chain(date_fragments(birth_structured, death_structured))
        .chain(date_fragments(birth_heading.as_deref(), death_heading.as_deref()))
    {
        if !fragments.contains(&fragment) {
            fragments.push(fragment);
        }
    }

    debug!(?fragments, "Date permutations");

    let mut terms = vec![bare.clone()];
    terms.extend(fragments.iter().map(|f| bare.with_date(f)));
    terms
}
