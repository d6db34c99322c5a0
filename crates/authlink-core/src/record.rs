//! Catalog record model
//!
//! Records are ordered lists of fields. Data fields carry a tag, two
//! indicators and an ordered list of subfields; control fields (tags
//! starting with `00`) carry a single value.
//!
//! ## Text Form
//!
//! Records print to and parse from the line-oriented form used in logs and
//! fixtures:
//!
//! ```text
//! LDR    00533cz  a2200193n  4500
//! 001    115575
//! 100 1  ‡aAakkula, Immo,‡d1974-
//! ```

use crate::error::RecordParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subfield delimiter used in the text form
pub const SUBFIELD_DELIMITER: char = '‡';

/// A single coded subfield
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subfield {
    pub code: char,
    pub value: String,
}

impl Subfield {
    pub fn new(code: char, value: impl Into<String>) -> Self {
        Self {
            code,
            value: value.into(),
        }
    }
}

/// Sort key used when inserting subfields: letters by code point, digits after all letters
pub fn subfield_order(code: char) -> u32 {
    if code.is_ascii_digit() {
        code as u32 + 200
    } else {
        code as u32
    }
}

/// A record field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub tag: String,
    pub ind1: char,
    pub ind2: char,
    #[serde(default)]
    pub subfields: Vec<Subfield>,
    /// Value of a control field; `None` for data fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Field {
    /// Create a data field
    pub fn data(tag: impl Into<String>, ind1: char, ind2: char, subfields: Vec<Subfield>) -> Self {
        Self {
            tag: tag.into(),
            ind1,
            ind2,
            subfields,
            value: None,
        }
    }

    /// Create a control field
    pub fn control(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ind1: ' ',
            ind2: ' ',
            subfields: Vec::new(),
            value: Some(value.into()),
        }
    }

    pub fn is_control(&self) -> bool {
        self.value.is_some()
    }

    /// Value of the first subfield with `code`
    pub fn first(&self, code: char) -> Option<&str> {
        self.subfields
            .iter()
            .find(|s| s.code == code)
            .map(|s| s.value.as_str())
    }

    /// Values of every subfield with `code`, in field order
    pub fn values(&self, code: char) -> impl Iterator<Item = &str> {
        self.subfields
            .iter()
            .filter(move |s| s.code == code)
            .map(|s| s.value.as_str())
    }

    pub fn has_code(&self, code: char) -> bool {
        self.subfields.iter().any(|s| s.code == code)
    }

    pub fn contains(&self, code: char, value: &str) -> bool {
        self.subfields
            .iter()
            .any(|s| s.code == code && s.value == value)
    }

    /// Replace the first `code` subfield, or insert a new one before the
    /// first subfield that sorts at or after `before`.
    pub fn set_subfield(&mut self, code: char, value: impl Into<String>, before: char) {
        let value = value.into();
        if let Some(existing) = self.subfields.iter_mut().find(|s| s.code == code) {
            existing.value = value;
            return;
        }
        let at = self.insertion_point(before);
        self.subfields.insert(at, Subfield::new(code, value));
    }

    /// Insert a `code` subfield next to an existing one of the same code,
    /// or before the first subfield that sorts at or after `before`.
    pub fn add_subfield(&mut self, code: char, value: impl Into<String>, before: char) {
        let at = self
            .subfields
            .iter()
            .position(|s| s.code == code)
            .unwrap_or_else(|| self.insertion_point(before));
        self.subfields.insert(at, Subfield::new(code, value));
    }

    fn insertion_point(&self, before: char) -> usize {
        let limit = subfield_order(before);
        self.subfields
            .iter()
            .position(|s| subfield_order(s.code) >= limit)
            .unwrap_or(self.subfields.len())
    }

    /// Fields with a `‡6` are linked to an alternate-script field
    pub fn is_linked(&self) -> bool {
        self.has_code('6')
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(value) = &self.value {
            return write!(f, "{}    {}", self.tag, value);
        }
        write!(f, "{} {}{} ", self.tag, self.ind1, self.ind2)?;
        for subfield in &self.subfields {
            write!(f, "{}{}{}", SUBFIELD_DELIMITER, subfield.code, subfield.value)?;
        }
        Ok(())
    }
}

impl FromStr for Field {
    type Err = RecordParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = line.chars().collect();
        if chars.len() < 3 {
            return Err(RecordParseError::new(line, "line is shorter than a tag"));
        }
        let tag: String = chars[..3].iter().collect();

        if tag.starts_with("00") {
            let value: String = chars.iter().skip(7).collect();
            return Ok(Field::control(tag, value));
        }

        let ind1 = chars.get(4).copied().unwrap_or(' ');
        let ind2 = chars.get(5).copied().unwrap_or(' ');
        let rest: String = chars.iter().skip(6).collect();

        let mut pieces = rest.split(SUBFIELD_DELIMITER);
        // Anything before the first delimiter is padding
        pieces.next();

        let mut subfields = Vec::new();
        for piece in pieces {
            let mut piece_chars = piece.chars();
            let code = piece_chars
                .next()
                .ok_or_else(|| RecordParseError::new(line, "subfield without a code"))?;
            subfields.push(Subfield::new(code, piece_chars.as_str()));
        }

        Ok(Field::data(tag, ind1, ind2, subfields))
    }
}

/// An ordered list of fields with an optional leader
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader: Option<String>,
    pub fields: Vec<Field>,
}

impl Record {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            leader: None,
            fields,
        }
    }

    pub fn fields_with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields.iter().filter(move |f| f.tag == tag)
    }

    pub fn first_field(&self, tag: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.tag == tag)
    }

    pub fn first_field_mut(&mut self, tag: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.tag == tag)
    }

    /// First `code` value across all fields tagged `tag`
    pub fn first_value(&self, tag: &str, code: char) -> Option<&str> {
        self.fields
            .iter()
            .filter(|f| f.tag == tag)
            .find_map(|f| f.first(code))
    }

    /// The control number (001), if present
    pub fn control_number(&self) -> Option<&str> {
        self.first_field("001").and_then(|f| f.value.as_deref())
    }

    /// `035 ‡a` values starting with `prefix`, prefix stripped
    pub fn link_hints(&self, prefix: &str) -> Vec<String> {
        self.fields_with_tag("035")
            .flat_map(|f| f.values('a'))
            .filter_map(|v| v.strip_prefix(prefix))
            .map(str::to_string)
            .collect()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        if let Some(leader) = &self.leader {
            write!(f, "LDR    {}", leader)?;
            first = false;
        }
        for field in &self.fields {
            if !first {
                writeln!(f)?;
            }
            write!(f, "{}", field)?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for Record {
    type Err = RecordParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut record = Record::default();
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            if let Some(leader) = line.strip_prefix("LDR") {
                record.leader = Some(leader.chars().skip(4).collect());
                continue;
            }
            record.fields.push(line.parse()?);
        }
        Ok(record)
    }
}

/// The four catalogs the pipeline reads from and writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Local authority catalog (FENAU)
    LocalAuthority,
    /// Local bibliographic catalog (FENNI)
    LocalBibliographic,
    /// Union authority catalog (ASTERI)
    UnionAuthority,
    /// Union bibliographic catalog (MELINDA)
    UnionBibliographic,
}

impl RecordKind {
    pub fn catalog_name(&self) -> &'static str {
        match self {
            RecordKind::LocalAuthority => "FENAU",
            RecordKind::LocalBibliographic => "FENNI",
            RecordKind::UnionAuthority => "ASTERI",
            RecordKind::UnionBibliographic => "MELINDA",
        }
    }

    pub fn is_authority(&self) -> bool {
        matches!(self, RecordKind::LocalAuthority | RecordKind::UnionAuthority)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.catalog_name())
    }
}

/// Explicit identity of a physical record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordRef {
    pub kind: RecordKind,
    pub id: String,
}

impl RecordRef {
    pub fn new(kind: RecordKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}
