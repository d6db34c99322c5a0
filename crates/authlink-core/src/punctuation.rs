//! Punctuation fixing
//!
//! Reconciled fields are re-punctuated by a [`PunctuationFixer`] using the
//! rule set of the record kind being written. [`NameRules`] is a compact
//! rule table for personal name headings; other engines plug in through
//! the trait.

use crate::error::PunctuationError;
use crate::record::{Field, Subfield};

/// Which catalog's conventions apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSet {
    Authority,
    Bibliographic,
}

impl RuleSet {
    /// Tags the rule set punctuates
    pub fn tags(&self) -> &'static [&'static str] {
        match self {
            RuleSet::Authority => &["100", "400", "500"],
            RuleSet::Bibliographic => &["100", "600", "700", "800"],
        }
    }
}

/// Field punctuation engine
pub trait PunctuationFixer: Send + Sync {
    fn fix(&self, field: &mut Field, rules: RuleSet) -> Result<(), PunctuationError>;
}

/// Comma before dates, qualifiers and relators; terminal period
#[derive(Debug, Clone, Copy, Default)]
pub struct NameRules;

const COMMA_BEFORE: [char; 3] = ['d', 'e', 'j'];
const CLOSING: [char; 5] = ['.', '?', '!', '-', ')'];

fn needs_comma_before(next: &Subfield) -> bool {
    COMMA_BEFORE.contains(&next.code) || (next.code == 'c' && !next.value.starts_with('('))
}

fn strip_separator(value: &mut String) {
    while value.ends_with(&[',', ';', ':'][..]) {
        value.pop();
    }
    // a period after a date or qualifier is punctuation, not an abbreviation
    let date_period = value.ends_with('.') && {
        let before = value.chars().rev().nth(1);
        before.is_some_and(|c| c.is_ascii_digit() || c == '-' || c == ')')
    };
    if date_period {
        value.pop();
    }
}

impl PunctuationFixer for NameRules {
    fn fix(&self, field: &mut Field, rules: RuleSet) -> Result<(), PunctuationError> {
        if field.is_control() || !rules.tags().contains(&field.tag.as_str()) {
            return Ok(());
        }

        if let Some(empty) = field.subfields.iter().find(|s| s.value.is_empty()) {
            return Err(PunctuationError {
                field: field.to_string(),
                message: format!("subfield ‡{} is empty", empty.code),
            });
        }

        // Punctuation applies up to the first control subfield
        let content_len = field
            .subfields
            .iter()
            .position(|s| s.code.is_ascii_digit())
            .unwrap_or(field.subfields.len());
        if content_len == 0 {
            return Ok(());
        }

        for i in 0..content_len - 1 {
            if !needs_comma_before(&field.subfields[i + 1]) {
                continue;
            }
            let value = &mut field.subfields[i].value;
            if value.ends_with('-') {
                continue;
            }
            strip_separator(value);
            value.push(',');
        }

        let last = &mut field.subfields[content_len - 1].value;
        while last.ends_with(&[',', ';', ':'][..]) {
            last.pop();
        }
        if !last.ends_with(&CLOSING[..]) {
            last.push('.');
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn fixed(line: &str, rules: RuleSet) -> String {
        let mut field: Field = line.parse().unwrap();
        NameRules.fix(&mut field, rules).unwrap();
        field.to_string()
    }

    #[test_case("100 1  ‡aAakkula, Immo‡d1974-", "100 1  ‡aAakkula, Immo,‡d1974-"; "open date")]
    #[test_case("100 1  ‡aAakkula, Immo‡d-2099", "100 1  ‡aAakkula, Immo,‡d-2099."; "death only")]
    #[test_case("100 1  ‡aAakkula, Immo‡bfakecontent‡d-2099‡jfakerelation", "100 1  ‡aAakkula, Immo‡bfakecontent,‡d-2099,‡jfakerelation."; "relation")]
    #[test_case("100 1  ‡aAakkula, Immo‡d1974-2099‡eTyyppi", "100 1  ‡aAakkula, Immo,‡d1974-2099,‡eTyyppi."; "relator")]
    #[test_case("100 1  ‡aAakkula, Immo,‡d1974-2099.‡eTyyppi.", "100 1  ‡aAakkula, Immo,‡d1974-2099,‡eTyyppi."; "already punctuated")]
    #[test_case("400 1  ‡aImmo Aakkula‡d1974-2099", "400 1  ‡aImmo Aakkula,‡d1974-2099."; "see from")]
    #[test_case("100 1  ‡aEliot, T. S.‡d1888-1965", "100 1  ‡aEliot, T. S.,‡d1888-1965."; "abbreviation kept")]
    #[test_case("100 0  ‡aLardot, Raisa‡c(fiktiivinen hahmo)", "100 0  ‡aLardot, Raisa‡c(fiktiivinen hahmo)"; "parenthesized qualifier")]
    fn authority_rules(input: &str, expected: &str) {
        assert_eq!(fixed(input, RuleSet::Authority), expected);
    }

    #[test]
    fn stops_at_control_subfields() {
        assert_eq!(
            fixed("700 1  ‡aAakkula, Immo‡d1974-2099‡0(FI-ASTERI-N)1‡9FENNI<KEEP>", RuleSet::Bibliographic),
            "700 1  ‡aAakkula, Immo,‡d1974-2099.‡0(FI-ASTERI-N)1‡9FENNI<KEEP>"
        );
    }

    #[test]
    fn other_tags_are_untouched() {
        assert_eq!(fixed("110 2  ‡aYhtiö Oy", RuleSet::Authority), "110 2  ‡aYhtiö Oy");
        assert_eq!(fixed("600 04 ‡aLardot, Raisa", RuleSet::Authority), "600 04 ‡aLardot, Raisa");
    }

    #[test]
    fn empty_subfield_is_an_error() {
        let mut field: Field = "100 1  ‡aAakkula, Immo‡d".parse().unwrap();
        assert!(NameRules.fix(&mut field, RuleSet::Authority).is_err());
    }
}
