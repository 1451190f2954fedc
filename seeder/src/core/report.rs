//! Structured error report returned as data by loading and validation.
//!
//! Every entry is a `(key, code, detail?)` triple. Reports aggregate: callers
//! receive all violations of a pass at once, never just the first one.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Key used for violations about step order.
pub const KEY_ORDER: &str = "order";
/// Key used for violations about the declared item type.
pub const KEY_ITEM_TYPE: &str = "itemType";
/// Key used for content-hash drift.
pub const KEY_VALIDATION_HASH: &str = "validationHash";

/// Stable violation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    EmptyFile,
    FailedToParse,
    NullResult,
    Duplicate,
    Invalid,
    NotFound,
    Unmapped,
    Mismatch,
    OutOfOrder,
    AlreadyRun,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::EmptyFile => "EmptyFile",
            ErrorCode::FailedToParse => "FailedToParse",
            ErrorCode::NullResult => "NullResult",
            ErrorCode::Duplicate => "Duplicate",
            ErrorCode::Invalid => "Invalid",
            ErrorCode::NotFound => "NotFound",
            ErrorCode::Unmapped => "Unmapped",
            ErrorCode::Mismatch => "Mismatch",
            ErrorCode::OutOfOrder => "OutOfOrder",
            ErrorCode::AlreadyRun => "AlreadyRun",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional payload attached to a violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Detail {
    Text(String),
    List(Vec<String>),
}

impl fmt::Display for Detail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Detail::Text(text) => f.write_str(text),
            Detail::List(items) => f.write_str(&items.join(",")),
        }
    }
}

/// One reported violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCode {
    /// Offending field name, or the identifier of the offending blob.
    pub key: String,
    pub code: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Detail>,
}

impl KeyCode {
    pub fn new(key: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            key: key.into(),
            code,
            detail: None,
        }
    }

    pub fn with_text(key: impl Into<String>, code: ErrorCode, text: impl Into<String>) -> Self {
        Self {
            detail: Some(Detail::Text(text.into())),
            ..Self::new(key, code)
        }
    }

    pub fn with_list<I, S>(key: impl Into<String>, code: ErrorCode, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            detail: Some(Detail::List(items.into_iter().map(Into::into).collect())),
            ..Self::new(key, code)
        }
    }

    /// List detail, or an empty slice for text/no detail.
    pub fn detail_list(&self) -> &[String] {
        match &self.detail {
            Some(Detail::List(items)) => items,
            _ => &[],
        }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.code)?;
        if let Some(detail) = &self.detail {
            write!(f, ":{detail}")?;
        }
        Ok(())
    }
}

/// Make free text safe to embed after the `:` delimiter of a rendered entry.
pub fn sanitize_detail(text: &str) -> String {
    text.replace(':', "=")
}

/// Ordered, aggregated list of violations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Violations(Vec<KeyCode>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: KeyCode) {
        self.0.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, KeyCode> {
        self.0.iter()
    }

    /// First entry with the given code and key, if any.
    pub fn find(&self, code: ErrorCode, key: &str) -> Option<&KeyCode> {
        self.0.iter().find(|entry| entry.code == code && entry.key == key)
    }

    pub fn contains(&self, code: ErrorCode, key: &str) -> bool {
        self.find(code, key).is_some()
    }

    pub fn has_code(&self, code: ErrorCode) -> bool {
        self.0.iter().any(|entry| entry.code == code)
    }

    /// `Ok(())` when nothing was reported.
    pub fn into_result(self) -> Result<(), Violations> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<KeyCode> for Violations {
    fn from(entry: KeyCode) -> Self {
        Self(vec![entry])
    }
}

impl FromIterator<KeyCode> for Violations {
    fn from_iter<I: IntoIterator<Item = KeyCode>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<KeyCode> for Violations {
    fn extend<I: IntoIterator<Item = KeyCode>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for Violations {
    type Item = KeyCode;
    type IntoIter = std::vec::IntoIter<KeyCode>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a KeyCode;
    type IntoIter = std::slice::Iter<'a, KeyCode>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, entry) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_key_code_and_detail() {
        let plain = KeyCode::new(KEY_ORDER, ErrorCode::AlreadyRun);
        assert_eq!(plain.to_string(), "order:AlreadyRun");

        let listed = KeyCode::with_list(KEY_ORDER, ErrorCode::Duplicate, ["1", "3"]);
        assert_eq!(listed.to_string(), "order:Duplicate:1,3");
    }

    #[test]
    fn sanitized_detail_keeps_rendered_entry_splittable() {
        let entry = KeyCode::with_text(
            "001.json",
            ErrorCode::FailedToParse,
            sanitize_detail("expected value at line 1 column 2: eof"),
        );
        let rendered = entry.to_string();
        assert_eq!(rendered.split(':').count(), 3);
        assert!(rendered.starts_with("001.json:FailedToParse:"));
    }

    #[test]
    fn violations_join_entries_in_order() {
        let violations: Violations = vec![
            KeyCode::new(KEY_ORDER, ErrorCode::OutOfOrder),
            KeyCode::new(KEY_ITEM_TYPE, ErrorCode::NotFound),
        ]
        .into_iter()
        .collect();
        assert_eq!(violations.to_string(), "order:OutOfOrder; itemType:NotFound");
        assert!(violations.contains(ErrorCode::NotFound, KEY_ITEM_TYPE));
        assert!(!violations.contains(ErrorCode::NotFound, KEY_ORDER));
    }

    #[test]
    fn empty_violations_are_ok() {
        assert!(Violations::new().into_result().is_ok());
        let err = Violations::from(KeyCode::new(KEY_ORDER, ErrorCode::Invalid))
            .into_result()
            .expect_err("should fail");
        assert_eq!(err.len(), 1);
    }
}
