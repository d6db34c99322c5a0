//! Duplicate field merging
//!
//! Fields that are equal once control subfields (`‡5`, `‡9`) are ignored
//! form one group. Each group collapses into its first member, which gains
//! every subfield of the later members that it does not already hold.

use crate::record::{Field, Record};

/// Subfield codes ignored when comparing fields
pub const CONTROL_SUBFIELD_CODES: [char; 2] = ['5', '9'];

fn is_duplicate(a: &Field, b: &Field) -> bool {
    if a.tag == "CAT" {
        return false;
    }
    if a.tag != b.tag || a.ind1 != b.ind1 || a.ind2 != b.ind2 || a.value != b.value {
        return false;
    }
    let significant = |f: &Field| {
        f.subfields
            .iter()
            .filter(|s| !CONTROL_SUBFIELD_CODES.contains(&s.code))
            .cloned()
            .collect::<Vec<_>>()
    };
    significant(a) == significant(b)
}

/// Collapse structurally duplicate fields, keeping first-seen order
pub fn merge_duplicate_fields(record: &Record) -> Record {
    let mut groups: Vec<Field> = Vec::with_capacity(record.fields.len());

    for field in &record.fields {
        match groups.iter_mut().find(|merged| is_duplicate(merged, field)) {
            Some(merged) => {
                for subfield in &field.subfields {
                    if !merged.subfields.contains(subfield) {
                        merged.subfields.push(subfield.clone());
                    }
                }
            }
            None => groups.push(field.clone()),
        }
    }

    Record {
        leader: record.leader.clone(),
        fields: groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str) -> Record {
        text.parse().unwrap()
    }

    #[test]
    fn merges_fields_differing_in_control_subfields() {
        let r = record(
            "700 1  ‡aAakkula, Immo‡9FENNI<KEEP>\n245 10 ‡aTeos\n700 1  ‡aAakkula, Immo‡5FENNI",
        );
        let merged = merge_duplicate_fields(&r);
        assert_eq!(
            merged.to_string(),
            "700 1  ‡aAakkula, Immo‡9FENNI<KEEP>‡5FENNI\n245 10 ‡aTeos"
        );
    }

    #[test]
    fn keeps_distinct_fields() {
        let r = record("700 1  ‡aAakkula, Immo\n700 1  ‡aAakkula, Immo‡d1974-");
        assert_eq!(merge_duplicate_fields(&r), r);
    }

    #[test]
    fn catalogers_fields_never_merge() {
        let r = record("CAT    ‡aLOAD\nCAT    ‡aLOAD");
        assert_eq!(merge_duplicate_fields(&r).fields.len(), 2);
    }

    #[test]
    fn exact_duplicates_collapse() {
        let r = record("650  7 ‡akissat‡2ysa\n650  7 ‡akissat‡2ysa");
        assert_eq!(merge_duplicate_fields(&r).fields.len(), 1);
    }

    #[test]
    fn merging_twice_changes_nothing() {
        let r = record("700 1  ‡aA‡9X\n700 1  ‡aA‡9Y\n700 1  ‡aB\n700 1  ‡aA‡5Z");
        let once = merge_duplicate_fields(&r);
        assert_eq!(merge_duplicate_fields(&once), once);
    }
}
