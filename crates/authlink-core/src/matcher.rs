//! Field selection for link insertion
//!
//! Both selectors return positions into `record.fields` so callers can
//! rebuild the record without relying on structural equality.

use crate::error::LinkError;
use crate::normalize::normalize;
use crate::permutations::QueryTerm;
use crate::portion::heading_subfields;
use crate::record::{Field, Record, Subfield};
use once_cell::sync::Lazy;
use regex::Regex;

pub const PERSONAL_NAME_TAGS: [&str; 3] = ["100", "600", "700"];
pub const CORPORATE_NAME_TAGS: [&str; 3] = ["110", "610", "710"];
pub const MEETING_NAME_TAGS: [&str; 3] = ["111", "611", "711"];
pub const SEE_ALSO_TAGS: [&str; 3] = ["800", "810", "811"];

/// Related-heading fields of an authority record
pub const AUTHORITY_LINK_TAGS: [&str; 3] = ["500", "510", "511"];
pub const AUTHORITY_LINK_CODES: [char; 8] = ['a', 'b', 'c', 'd', 'e', 'g', 'n', 'q'];

/// See-from tracing fields of an authority record
pub const SEE_FROM_TAGS: [&str; 3] = ["400", "410", "411"];

const FICTION_MARKERS: [&str; 2] = ["(fiktiivinen hahmo)", "(fiktiv gestalt)"];

static ORDINAL_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\(\d+\)$").expect("valid ordinal pattern"));

/// Subject fields count only when they come from the national thesauri
fn is_eligible_subject(field: &Field) -> bool {
    if !field.tag.starts_with('6') {
        return true;
    }
    field.ind2 == '4'
        || field
            .values('2')
            .any(|v| v.eq_ignore_ascii_case("ysa"))
}

fn personal_heading(field: &Field) -> Vec<Subfield> {
    heading_subfields(field)
        .into_iter()
        .filter(|s| !(s.code == 'd' && ORDINAL_DATE.is_match(&s.value)))
        .filter(|s| {
            !(field.tag == "600" && s.code == 'c' && FICTION_MARKERS.contains(&s.value.as_str()))
        })
        .collect()
}

fn matches_any(heading: &[Subfield], terms: &[QueryTerm]) -> bool {
    let normalized = QueryTerm::from_raw(heading);
    terms.iter().any(|term| *term == normalized)
}

/// Positions of name fields whose heading equals one of `terms`
///
/// Fails with [`LinkError::OnlySeeAlso`] when only a see-also (8XX)
/// field matches and with [`LinkError::FieldNotFound`] when nothing does.
pub fn select_field_for_linking(record: &Record, terms: &[QueryTerm]) -> Result<Vec<usize>, LinkError> {
    let mut matches = Vec::new();
    let mut see_also_matches = 0usize;

    for (index, field) in record.fields.iter().enumerate() {
        let tag = field.tag.as_str();
        if field.is_control() {
            continue;
        }

        if PERSONAL_NAME_TAGS.contains(&tag) {
            if is_eligible_subject(field) && matches_any(&personal_heading(field), terms) {
                matches.push(index);
            }
        } else if CORPORATE_NAME_TAGS.contains(&tag) || MEETING_NAME_TAGS.contains(&tag) {
            if is_eligible_subject(field) && matches_any(&heading_subfields(field), terms) {
                matches.push(index);
            }
        } else if SEE_ALSO_TAGS.contains(&tag) && matches_any(&heading_subfields(field), terms) {
            see_also_matches += 1;
        }
    }

    if matches.is_empty() && see_also_matches > 0 {
        return Err(LinkError::OnlySeeAlso);
    }
    if matches.is_empty() {
        return Err(LinkError::FieldNotFound);
    }
    Ok(matches)
}

fn is_two_way_subset(a: &[Subfield], b: &[Subfield]) -> bool {
    a.iter().all(|s| b.contains(s)) && b.iter().all(|s| a.contains(s))
}

/// Positions of related-heading fields of an authority record that
/// contain exactly the pairs of one of `terms`, in any order
pub fn select_authority_field_for_linking(
    record: &Record,
    terms: &[QueryTerm],
) -> Result<Vec<usize>, LinkError> {
    let matches: Vec<usize> = record
        .fields
        .iter()
        .enumerate()
        .filter(|(_, field)| AUTHORITY_LINK_TAGS.contains(&field.tag.as_str()))
        .filter(|(_, field)| {
            let heading: Vec<Subfield> = field
                .subfields
                .iter()
                .filter(|s| AUTHORITY_LINK_CODES.contains(&s.code))
                .cloned()
                .collect();
            let normalized = QueryTerm::from_raw(&heading);
            terms
                .iter()
                .any(|term| is_two_way_subset(term.subfields(), normalized.subfields()))
        })
        .map(|(index, _)| index)
        .collect();

    if matches.is_empty() {
        return Err(LinkError::FieldNotFound);
    }
    Ok(matches)
}

fn flatten_heading(field: &Field) -> String {
    field
        .subfields
        .iter()
        .map(|s| normalize(&s.value))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Target fields that equal one of the donor's see-from (4XX) headings
///
/// A target that only carries a see-from form of the name was linked by a
/// variant heading and must not receive the link.
pub fn see_from_matches<'a>(donor: &Record, target: &'a Record) -> Vec<&'a Field> {
    let variants: Vec<String> = donor
        .fields
        .iter()
        .filter(|f| SEE_FROM_TAGS.contains(&f.tag.as_str()))
        .map(flatten_heading)
        .collect();

    if variants.is_empty() {
        return Vec::new();
    }

    target
        .fields
        .iter()
        .filter(|f| !f.is_control())
        .filter(|f| variants.contains(&flatten_heading(f)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permutations::name_heading_permutations;

    fn record(text: &str) -> Record {
        text.parse().unwrap()
    }

    fn terms() -> Vec<QueryTerm> {
        name_heading_permutations(&record("046    ‡f1992‡g2017\n100 1  ‡aAakkula, Immo")).unwrap()
    }

    #[test]
    fn selects_matching_added_entry() {
        let bib = record("245 10 ‡aTeos\n700 1  ‡aAakkula, Immo,‡d1992-2017,‡ekirjoittaja.");
        assert_eq!(select_field_for_linking(&bib, &terms()).unwrap(), vec![1]);
    }

    #[test]
    fn selects_every_matching_field() {
        let bib = record("100 1  ‡aAakkula, Immo.\n600 14 ‡aAakkula, Immo,‡d1992-");
        assert_eq!(select_field_for_linking(&bib, &terms()).unwrap(), vec![0, 1]);
    }

    #[test]
    fn ignores_ordinal_date_qualifier() {
        let bib = record("700 1  ‡aAakkula, Immo,‡d(1)");
        assert_eq!(select_field_for_linking(&bib, &terms()).unwrap(), vec![0]);
    }

    #[test]
    fn ignores_fiction_marker_on_subjects() {
        let bib = record("600 04 ‡aAakkula, Immo‡c(fiktiivinen hahmo)");
        assert_eq!(select_field_for_linking(&bib, &terms()).unwrap(), vec![0]);
    }

    #[test]
    fn subject_needs_national_thesaurus() {
        let bib = record("600 10 ‡aAakkula, Immo");
        assert_eq!(select_field_for_linking(&bib, &terms()), Err(LinkError::FieldNotFound));

        let ysa = record("600 17 ‡aAakkula, Immo‡2YSA");
        assert_eq!(select_field_for_linking(&ysa, &terms()).unwrap(), vec![0]);
    }

    #[test]
    fn see_also_only_is_distinct() {
        let bib = record("800 1  ‡aAakkula, Immo.‡tSarja");
        assert_eq!(select_field_for_linking(&bib, &terms()), Err(LinkError::OnlySeeAlso));
    }

    #[test]
    fn nothing_matches() {
        let bib = record("700 1  ‡aMeikäläinen, Matti");
        assert_eq!(select_field_for_linking(&bib, &terms()), Err(LinkError::FieldNotFound));
    }

    #[test]
    fn authority_fields_match_as_sets() {
        let auth = record("500 1  ‡d1992-2017‡aAakkula, Immo\n500 1  ‡aAakkula, Immo‡d1900-");
        assert_eq!(select_authority_field_for_linking(&auth, &terms()).unwrap(), vec![0]);
    }

    #[test]
    fn authority_fields_need_both_directions() {
        let auth = record("500 1  ‡aAakkula, Immo‡d1992-2017‡qboink");
        assert_eq!(
            select_authority_field_for_linking(&auth, &terms()),
            Err(LinkError::FieldNotFound)
        );
    }

    #[test]
    fn finds_see_from_tracing() {
        let donor = record("100 1  ‡aAakkula, Immo\n400 1  ‡aImmo Aakkula");
        let bib = record("700 1  ‡aImmo Aakkula.");
        assert_eq!(see_from_matches(&donor, &bib).len(), 1);
    }
}
