//! Record predicates and small edits shared across handlers

use crate::record::Record;

/// Name tags of agent (person, corporate body, meeting) authorities
pub const AGENT_NAME_TAGS: [&str; 3] = ["100", "110", "111"];

/// Whether the authority describes an agent rather than a work
///
/// A name heading with a title subfield (`‡t`) is a name/title authority
/// and is not linked.
pub fn is_agent_authority(record: &Record) -> bool {
    let names: Vec<_> = record
        .fields
        .iter()
        .filter(|f| AGENT_NAME_TAGS.contains(&f.tag.as_str()))
        .collect();
    !names.is_empty() && names.iter().all(|f| !f.has_code('t'))
}

/// Topical index-term records (040 ‡f ysa) are never linked
pub fn is_index_term_record(record: &Record) -> bool {
    record
        .fields_with_tag("040")
        .flat_map(|f| f.values('f'))
        .any(|v| v == "ysa")
}

/// Mark a union record for redistribution by flipping `UPD ‡a N` to `Y`
pub fn update_upd_to_y(record: &mut Record) {
    for field in record.fields.iter_mut().filter(|f| f.tag == "UPD") {
        for subfield in field
            .subfields
            .iter_mut()
            .filter(|s| s.code == 'a' && s.value == "N")
        {
            subfield.value = "Y".to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str) -> Record {
        text.parse().unwrap()
    }

    #[test]
    fn personal_name_is_agent() {
        assert!(is_agent_authority(&record("001    1\n100 1  ‡aAakkula, Immo")));
        assert!(is_agent_authority(&record("110 2  ‡aYhtiö Oy")));
    }

    #[test]
    fn name_title_is_not_agent() {
        assert!(!is_agent_authority(&record("100 1  ‡aKivi, Aleksis‡tSeitsemän veljestä")));
    }

    #[test]
    fn topical_term_is_not_agent() {
        assert!(!is_agent_authority(&record("150    ‡akissat")));
    }

    #[test]
    fn detects_index_terms() {
        assert!(is_index_term_record(&record("040    ‡aFI-NL‡fysa")));
        assert!(!is_index_term_record(&record("040    ‡aFI-NL")));
    }

    #[test]
    fn flips_update_flag() {
        let mut r = record("001    1\nUPD    ‡aN");
        update_upd_to_y(&mut r);
        assert_eq!(r.to_string(), "001    1\nUPD    ‡aY");
    }
}
