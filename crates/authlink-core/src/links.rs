//! Cross-reference links (`‡0`)
//!
//! A link is a catalog prefix followed by the target id. Union catalog
//! links (`(FIN11)`) are also accepted in their national authority form
//! (`(FI-ASTERI-N)`).

use crate::record::Field;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Link prefix families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkPrefix {
    /// National authority prefix used by the local catalogs
    Asteri,
    /// Union catalog authority prefix
    Fin11,
}

impl LinkPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkPrefix::Asteri => "(FI-ASTERI-N)",
            LinkPrefix::Fin11 => "(FIN11)",
        }
    }

    /// Equivalent prefix accepted in place of this one
    pub fn alternate(&self) -> Option<LinkPrefix> {
        match self {
            LinkPrefix::Fin11 => Some(LinkPrefix::Asteri),
            LinkPrefix::Asteri => None,
        }
    }
}

/// A link value: prefix plus target id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub prefix: LinkPrefix,
    pub id: String,
}

impl Link {
    pub fn new(prefix: LinkPrefix, id: impl Into<String>) -> Self {
        Self {
            prefix,
            id: id.into(),
        }
    }

    /// Whether `value` is this link in either accepted form
    pub fn accepts(&self, value: &str) -> bool {
        let matches = |prefix: LinkPrefix| {
            value
                .strip_prefix(prefix.as_str())
                .is_some_and(|id| id == self.id)
        };
        matches(self.prefix) || self.prefix.alternate().is_some_and(matches)
    }

    /// Whether `value` belongs to this link's prefix family
    pub fn shares_prefix(&self, value: &str) -> bool {
        value.starts_with(self.prefix.as_str())
            || self
                .prefix
                .alternate()
                .is_some_and(|alt| value.starts_with(alt.as_str()))
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix.as_str(), self.id)
    }
}

/// The field already carries `link`
pub fn has_link(field: &Field, link: &Link) -> bool {
    field.values('0').any(|v| link.accepts(v))
}

/// Every existing link of the field is `link` (true when there are none)
pub fn validate_link(field: &Field, link: &Link) -> bool {
    field.values('0').all(|v| link.accepts(v))
}

/// The field links to a different target within the same prefix family
pub fn has_invalid_link(field: &Field, link: &Link) -> bool {
    field
        .values('0')
        .filter(|v| link.shares_prefix(v))
        .any(|v| !link.accepts(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(line: &str) -> Field {
        line.parse().unwrap()
    }

    #[test]
    fn union_link_accepts_national_form() {
        let link = Link::new(LinkPrefix::Fin11, "000001");
        assert!(link.accepts("(FIN11)000001"));
        assert!(link.accepts("(FI-ASTERI-N)000001"));
        assert!(!link.accepts("(FIN11)000002"));
    }

    #[test]
    fn national_link_has_no_alternate() {
        let link = Link::new(LinkPrefix::Asteri, "000001");
        assert!(!link.accepts("(FIN11)000001"));
    }

    #[test]
    fn field_without_links_validates() {
        let link = Link::new(LinkPrefix::Asteri, "000001");
        let f = field("700 1  ‡aAakkula, Immo");
        assert!(validate_link(&f, &link));
        assert!(!has_link(&f, &link));
    }

    #[test]
    fn differing_link_fails_validation() {
        let link = Link::new(LinkPrefix::Asteri, "000001");
        let f = field("700 1  ‡aAakkula, Immo‡0(FI-ASTERI-N)000002");
        assert!(!validate_link(&f, &link));
        assert!(has_invalid_link(&f, &link));
    }

    #[test]
    fn foreign_link_is_not_invalid() {
        let link = Link::new(LinkPrefix::Fin11, "000001");
        let f = field("700 1  ‡aAakkula, Immo‡0http://example.org/person/1");
        assert!(!validate_link(&f, &link));
        assert!(!has_invalid_link(&f, &link));
    }

    #[test]
    fn displays_value() {
        assert_eq!(Link::new(LinkPrefix::Fin11, "42").to_string(), "(FIN11)42");
    }
}
