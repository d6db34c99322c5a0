//! Authority year correction
//!
//! Produces the "fixed" donor record: the personal name's date subfield is
//! rebuilt from the structured years (046) and the existing date, and the
//! same date is written to every see-from (400) field. Only the first 100
//! field is rewritten.

use crate::error::{LifeEvent, LinkError, ReconcileError};
use crate::permutations::years_from_date_subfield;
use crate::punctuation::{PunctuationFixer, RuleSet};
use crate::record::Record;
use tracing::debug;

fn is_year(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

fn check_agreement(
    event: LifeEvent,
    structured: Option<&str>,
    heading: Option<&str>,
) -> Result<(), LinkError> {
    match (structured, heading) {
        (Some(s), Some(h)) if s != h => Err(LinkError::YearMismatch {
            event,
            structured: s.to_string(),
            heading: h.to_string(),
        }),
        _ => Ok(()),
    }
}

fn date_content(birth: Option<&str>, death: Option<&str>) -> Option<String> {
    match (birth, death) {
        (Some(b), Some(d)) => Some(format!("{}-{}", b, d)),
        (Some(b), None) => Some(format!("{}-", b)),
        (None, Some(d)) => Some(format!("-{}", d)),
        (None, None) => None,
    }
}

/// Rebuild the personal name dates of an authority record
///
/// Returns an unchanged copy when there is no 100 field or when any year
/// is not purely numeric. Disagreeing years are an error.
pub fn fix_authority_years(
    record: &Record,
    fixer: &dyn PunctuationFixer,
) -> Result<Record, ReconcileError> {
    let mut fixed = record.clone();
    let Some(name_index) = fixed.fields.iter().position(|f| f.tag == "100") else {
        return Ok(fixed);
    };

    let birth_structured = record.first_value("046", 'f');
    let death_structured = record.first_value("046", 'g');
    let (birth_heading, death_heading) = record
        .first_value("100", 'd')
        .map(years_from_date_subfield)
        .unwrap_or_default();

    let all_numeric = [
        birth_structured,
        death_structured,
        birth_heading.as_deref(),
        death_heading.as_deref(),
    ]
    .into_iter()
    .flatten()
    .all(is_year);

    if !all_numeric {
        debug!("Years are not numeric, leaving record as is");
        return Ok(fixed);
    }

    check_agreement(LifeEvent::Birth, birth_structured, birth_heading.as_deref())?;
    check_agreement(LifeEvent::Death, death_structured, death_heading.as_deref())?;

    let birth = birth_structured.or(birth_heading.as_deref());
    let death = death_structured.or(death_heading.as_deref());

    let Some(date) = date_content(birth, death) else {
        return Ok(fixed);
    };

    for (_, field) in fixed
        .fields
        .iter_mut()
        .enumerate()
        .filter(|(i, f)| *i == name_index || f.tag == "400")
    {
        field.set_subfield('d', date.clone(), 'j');
        fixer.fix(field, RuleSet::Authority)?;
    }

    Ok(fixed)
}
