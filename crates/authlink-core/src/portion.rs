//! Authorized portions of name fields
//!
//! The authorized portion is the controlled part of a name field: the
//! name, numeration, titles, dates and qualifiers that come before any
//! title subfield (`‡t`). Everything else (relator terms, form
//! subdivisions, links) is free text that must survive reconciliation.

use crate::error::LinkError;
use crate::record::{Field, Record, Subfield};
use std::ops::Range;

/// Codes copied out of the donor's 100 field
pub const AUTHORIZED_CODES: [char; 7] = ['a', 'b', 'c', 'd', 'g', 'j', 'q'];

/// Codes recognised as name content when locating the range to replace
pub const NAME_PORTION_CODES: [char; 7] = ['a', 'b', 'c', 'd', 'g', 'h', 'q'];

/// Tags whose name portion can be replaced
pub const SPLICEABLE_TAGS: [&str; 4] = ["100", "600", "700", "800"];

/// Fictional character qualifiers and the genre subdivision each maps to
pub const FICTION_QUALIFIERS: [(&str, &str); 2] = [
    ("(fiktiivinen hahmo)", "fiktio."),
    ("(fiktiv gestalt)", "fiktion."),
];

/// Authorized content taken from a donor authority record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedPortion {
    pub ind1: char,
    pub subfields: Vec<Subfield>,
}

impl AuthorizedPortion {
    /// The authorized portion of the donor's first 100 field
    pub fn from_authority(record: &Record) -> Option<Self> {
        let field = record.first_field("100")?;
        Some(Self {
            ind1: field.ind1,
            subfields: field
                .subfields
                .iter()
                .filter(|s| AUTHORIZED_CODES.contains(&s.code))
                .cloned()
                .collect(),
        })
    }

    fn has_fiction_qualifier(&self) -> bool {
        self.subfields.iter().any(is_fiction_qualifier)
    }
}

fn is_fiction_qualifier(subfield: &Subfield) -> bool {
    subfield.code == 'c'
        && FICTION_QUALIFIERS
            .iter()
            .any(|(qualifier, _)| subfield.value == *qualifier)
}

/// Subfields of `field` that take part in heading comparison
///
/// Only codes from [`AUTHORIZED_CODES`] before the first `‡t` count,
/// for every name family.
pub fn heading_subfields(field: &Field) -> Vec<Subfield> {
    field
        .subfields
        .iter()
        .take_while(|s| s.code != 't')
        .filter(|s| AUTHORIZED_CODES.contains(&s.code))
        .cloned()
        .collect()
}

/// Locate the contiguous name portion of a personal name field
pub fn find_name_portion(field: &Field) -> Result<Range<usize>, LinkError> {
    if !SPLICEABLE_TAGS.contains(&field.tag.as_str()) {
        return Err(LinkError::AuthorizedPortion {
            field: field.to_string(),
            reason: format!("tag {} has no name portion", field.tag),
        });
    }

    let classified: Vec<bool> = field
        .subfields
        .iter()
        .take_while(|s| s.code != 't')
        .map(|s| NAME_PORTION_CODES.contains(&s.code))
        .collect();

    let start = classified.iter().position(|is_name| *is_name);
    let end = classified.iter().rposition(|is_name| *is_name);

    match (start, end) {
        (Some(start), Some(end)) => {
            if !classified[start..=end].iter().all(|is_name| *is_name) {
                return Err(LinkError::AuthorizedPortion {
                    field: field.to_string(),
                    reason: "field contains extra subfields in the middle of the name portion"
                        .to_string(),
                });
            }
            Ok(start..end + 1)
        }
        _ => Err(LinkError::AuthorizedPortion {
            field: field.to_string(),
            reason: "field has no name subfields".to_string(),
        }),
    }
}

/// Replace the name portion of `field` with `portion`
pub fn set_authorized_portion(field: &mut Field, portion: &AuthorizedPortion) -> Result<(), LinkError> {
    let range = find_name_portion(field)?;
    field.subfields.splice(range, portion.subfields.iter().cloned());
    field.ind1 = portion.ind1;
    Ok(())
}

/// Move a fictional character qualifier into a genre subdivision
///
/// Left untouched when both the donor and the field carry a qualifier;
/// the authorized portion splice settles that case.
pub fn migrate_fiction_qualifier(portion: &AuthorizedPortion, mut field: Field) -> Field {
    if portion.has_fiction_qualifier() && field.subfields.iter().any(is_fiction_qualifier) {
        return field;
    }

    for (qualifier, genre) in FICTION_QUALIFIERS {
        if field.contains('c', qualifier) {
            if !field.contains('v', genre) {
                field.subfields.push(Subfield::new('v', genre));
            }
            field
                .subfields
                .retain(|s| !(s.code == 'c' && s.value == qualifier));
        }
    }

    field
}

/// Bring a bibliographic name field in line with the donor authority
///
/// Returns the field unchanged when the donor has no personal name.
pub fn fix_bib_field(field: &Field, donor: &Record) -> Result<Field, LinkError> {
    let Some(portion) = AuthorizedPortion::from_authority(donor) else {
        return Ok(field.clone());
    };

    let mut fixed = migrate_fiction_qualifier(&portion, field.clone());
    set_authorized_portion(&mut fixed, &portion)?;
    Ok(fixed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(line: &str) -> Field {
        line.parse().unwrap()
    }

    fn authority(line_100: &str) -> Record {
        format!("001    115575\n{}", line_100).parse().unwrap()
    }

    #[test]
    fn portion_stops_at_title() {
        let f = field("600 14 ‡aAakkula, Immo,‡d1974-‡tTeos‡xhistoria");
        assert_eq!(find_name_portion(&f).unwrap(), 0..2);
    }

    #[test]
    fn portion_rejects_gaps() {
        let f = field("700 1  ‡aAakkula, Immo,‡ekirjoittaja‡d1974-");
        assert!(matches!(
            find_name_portion(&f),
            Err(LinkError::AuthorizedPortion { .. })
        ));
    }

    #[test]
    fn portion_rejects_other_tags() {
        let f = field("110 2  ‡aYhtiö");
        assert!(find_name_portion(&f).is_err());
    }

    #[test]
    fn fixes_dates_from_donor() {
        let donor = authority("100 1  ‡aAakkula, Immo‡d1974-2099");
        let bib = field("100 1  ‡aAakkula, Immo");
        let fixed = fix_bib_field(&bib, &donor).unwrap();
        assert_eq!(fixed.to_string(), "100 1  ‡aAakkula, Immo‡d1974-2099");
    }

    #[test]
    fn keeps_non_authorized_subfields() {
        let donor = authority("100 1  ‡aAakkula, Immo‡d1974-2099");
        let bib = field("700 1  ‡aAakkula, Immo‡ekirjoittaja‡0(FI-ASTERI-N)000001");
        let fixed = fix_bib_field(&bib, &donor).unwrap();
        assert_eq!(
            fixed.to_string(),
            "700 1  ‡aAakkula, Immo‡d1974-2099‡ekirjoittaja‡0(FI-ASTERI-N)000001"
        );
    }

    #[test]
    fn fiction_qualifier_becomes_genre() {
        let donor = authority("100 0  ‡aLardot, Raisa");
        let bib = field("600 04 ‡aLardot, Raisa‡c(fiktiivinen hahmo)");
        let fixed = fix_bib_field(&bib, &donor).unwrap();
        assert_eq!(fixed.to_string(), "600 04 ‡aLardot, Raisa‡vfiktio.");
    }

    #[test]
    fn swedish_fiction_qualifier_becomes_genre() {
        let donor = authority("100 0  ‡aLardot, Raisa");
        let bib = field("600 04 ‡aLardot, Raisa‡c(fiktiv gestalt)");
        let fixed = fix_bib_field(&bib, &donor).unwrap();
        assert_eq!(fixed.to_string(), "600 04 ‡aLardot, Raisa‡vfiktion.");
    }

    #[test]
    fn existing_genre_is_not_duplicated() {
        let donor = authority("100 0  ‡aLardot, Raisa");
        let bib = field("600 04 ‡aLardot, Raisa‡c(fiktiivinen hahmo)‡vfiktio.");
        let fixed = fix_bib_field(&bib, &donor).unwrap();
        assert_eq!(fixed.to_string(), "600 04 ‡aLardot, Raisa‡vfiktio.");
    }

    #[test]
    fn qualifier_on_both_sides_is_kept() {
        let donor = authority("100 0  ‡aRinta-Puhkuri, Tyyne‡c(fiktiivinen hahmo)");
        let bib = field("600 04 ‡aRinta-Puhkuri, Tyyne‡vfiktio.");
        let fixed = fix_bib_field(&bib, &donor).unwrap();
        assert_eq!(
            fixed.to_string(),
            "600 04 ‡aRinta-Puhkuri, Tyyne‡c(fiktiivinen hahmo)‡vfiktio."
        );
    }

    #[test]
    fn other_qualifiers_are_replaced_by_donor_portion() {
        let donor = authority("100 0  ‡aLardot, Raisa");
        let bib = field("600 04 ‡aLardot, Raisa,‡cjotain muuta");
        let fixed = fix_bib_field(&bib, &donor).unwrap();
        assert_eq!(fixed.to_string(), "600 04 ‡aLardot, Raisa");
    }

    #[test]
    fn donor_without_personal_name_leaves_field() {
        let donor: Record = "110 2  ‡aYhtiö Oy".parse().unwrap();
        let bib = field("710 2  ‡aYhtiö Oy");
        assert_eq!(fix_bib_field(&bib, &donor).unwrap(), bib);
    }
}
