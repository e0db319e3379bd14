//! Sequential catalog codes.
//!
//! Categories carry a 2-digit code (`"01"`..`"99"`); menu items carry their category's code
//! followed by a 3-digit sequence (`"10001"`..`"10999"`). The next code is always
//! `max(existing) + 1` within its scope. When the width is used up the generator reports
//! [`CodeError::Exhausted`] instead of wrapping, so a suggestion can never collide with an
//! existing code.
//!
//! Suggestions are advisory: the server decides uniqueness and may still reject a code that
//! another admin took in the meantime.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const CATEGORY_WIDTH: usize = 2;
const SEQUENCE_WIDTH: usize = 3;
const MAX_CATEGORY: u32 = 99;
const MAX_SEQUENCE: u32 = 999;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    #[error("No {scope} codes left")]
    Exhausted { scope: String },

    #[error("Category code must be exactly 2 digits, got {0:?}")]
    InvalidCategoryCode(String),

    #[error("Item code must be a 2-digit category code and a 3-digit sequence, got {0:?}")]
    InvalidItemCode(String),
}

fn all_digits(s: &str, width: usize) -> bool {
    s.len() == width && s.bytes().all(|b| b.is_ascii_digit())
}

/// A validated 2-digit category code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryCode(String);

impl CategoryCode {
    pub fn parse(code: &str) -> Result<Self, CodeError> {
        let code = code.trim();
        if all_digits(code, CATEGORY_WIDTH) {
            Ok(Self(code.to_string()))
        } else {
            Err(CodeError::InvalidCategoryCode(code.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn value(&self) -> u32 {
        self.0.parse().unwrap_or(0)
    }
}

impl TryFrom<String> for CategoryCode {
    type Error = CodeError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        Self::parse(&code)
    }
}

impl From<CategoryCode> for String {
    fn from(code: CategoryCode) -> Self {
        code.0
    }
}

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated 5-digit item code: category prefix plus sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemCode(String);

impl ItemCode {
    pub fn parse(code: &str) -> Result<Self, CodeError> {
        let code = code.trim();
        if all_digits(code, CATEGORY_WIDTH + SEQUENCE_WIDTH) && &code[CATEGORY_WIDTH..] != "000" {
            Ok(Self(code.to_string()))
        } else {
            Err(CodeError::InvalidItemCode(code.to_string()))
        }
    }

    fn compose(prefix: &CategoryCode, sequence: u32) -> Self {
        Self(format!("{}{:0width$}", prefix, sequence, width = SEQUENCE_WIDTH))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn category(&self) -> &str {
        &self.0[..CATEGORY_WIDTH]
    }

    pub fn sequence(&self) -> u32 {
        self.0[CATEGORY_WIDTH..].parse().unwrap_or(0)
    }
}

impl TryFrom<String> for ItemCode {
    type Error = CodeError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        Self::parse(&code)
    }
}

impl From<ItemCode> for String {
    fn from(code: ItemCode) -> Self {
        code.0
    }
}

impl fmt::Display for ItemCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Next free category code. Malformed existing codes are ignored.
pub fn next_category_code<I, S>(existing: I) -> Result<CategoryCode, CodeError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let max = existing
        .into_iter()
        .filter_map(|code| CategoryCode::parse(code.as_ref()).ok())
        .map(|code| code.value())
        .max()
        .unwrap_or(0);

    let next = max + 1;
    if next > MAX_CATEGORY {
        return Err(CodeError::Exhausted {
            scope: "category".to_string(),
        });
    }
    Ok(CategoryCode(format!("{:0width$}", next, width = CATEGORY_WIDTH)))
}

/// Next free item code under `prefix`. Codes of other categories and malformed codes are ignored.
pub fn next_item_code<I, S>(prefix: &str, existing: I) -> Result<ItemCode, CodeError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let prefix = CategoryCode::parse(prefix)?;
    let max = existing
        .into_iter()
        .filter_map(|code| ItemCode::parse(code.as_ref()).ok())
        .filter(|code| code.category() == prefix.as_str())
        .map(|code| code.sequence())
        .max()
        .unwrap_or(0);

    let next = max + 1;
    if next > MAX_SEQUENCE {
        return Err(CodeError::Exhausted {
            scope: format!("item (category {prefix})"),
        });
    }
    Ok(ItemCode::compose(&prefix, next))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: [&str; 0] = [];

    #[test]
    fn test_first_category_code() {
        assert_eq!(next_category_code(NONE).unwrap().as_str(), "01");
    }

    #[test]
    fn test_category_code_follows_max_not_gaps() {
        let next = next_category_code(["01", "02", "05"]).unwrap();
        assert_eq!(next.as_str(), "06");
    }

    #[test]
    fn test_category_codes_fail_closed() {
        assert!(matches!(
            next_category_code(["99"]),
            Err(CodeError::Exhausted { .. })
        ));
        assert_eq!(next_category_code(["98", "12"]).unwrap().as_str(), "99");
    }

    #[test]
    fn test_malformed_category_codes_are_ignored() {
        let next = next_category_code(["1", "abc", "100", "07"]).unwrap();
        assert_eq!(next.as_str(), "08");
    }

    #[test]
    fn test_item_code_within_prefix() {
        let next = next_item_code("10", ["10001", "10002"]).unwrap();
        assert_eq!(next.as_str(), "10003");
    }

    #[test]
    fn test_item_code_scope_is_limited_to_prefix() {
        let next = next_item_code("20", ["10001"]).unwrap();
        assert_eq!(next.as_str(), "20001");
        assert_eq!(next.category(), "20");
        assert_eq!(next.sequence(), 1);
    }

    #[test]
    fn test_item_codes_fail_closed() {
        assert!(matches!(
            next_item_code("10", ["10999", "11001"]),
            Err(CodeError::Exhausted { .. })
        ));
    }

    #[test]
    fn test_item_code_rejects_bad_prefix() {
        assert!(matches!(
            next_item_code("1", NONE),
            Err(CodeError::InvalidCategoryCode(_))
        ));
    }

    #[test]
    fn test_parse_codes() {
        assert!(CategoryCode::parse("10").is_ok());
        assert!(CategoryCode::parse("1a").is_err());
        assert!(ItemCode::parse("10001").is_ok());
        assert!(ItemCode::parse("10000").is_err());
        assert!(ItemCode::parse("1001").is_err());
    }
}
