use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static UID_ROOT_REGEX: OnceLock<Regex> = OnceLock::new();

const UID_ROOT_MAX_LENGTH: usize = 32;
pub(crate) const UID_ROOT_DEFAULT_VALUE: &str = "9999";

/// A DICOM UID root used as prefix for the UIDs generated during anonymization.
///
/// The [`UidRoot`] must follow DICOM UID format rules:
/// - Start with a digit 1-9
/// - Contain only numbers and dots
///
/// It also must not have more than 32 characters. An empty root is allowed.
///
/// # Example
///
/// ```
/// use dicom_anonymization::config::UidRoot;
///
/// let uid_root = "1.2.840.123".parse::<UidRoot>().unwrap();
/// assert_eq!(uid_root.as_prefix(), "1.2.840.123.");
///
/// let invalid = "0.1.2".parse::<UidRoot>();
/// assert!(invalid.is_err());
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
#[serde(try_from = "String", into = "String")]
pub struct UidRoot(pub(crate) String);

#[derive(Error, Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
#[error("{0} is not a valid UID root")]
pub struct UidRootError(pub(crate) String);

impl UidRoot {
    pub fn new(uid_root: &str) -> Result<Self, UidRootError> {
        let regex = UID_ROOT_REGEX.get_or_init(|| {
            Regex::new(&format!(
                r"^([1-9][0-9.]{{0,{}}})?$",
                UID_ROOT_MAX_LENGTH - 1
            ))
            .unwrap()
        });

        if !regex.is_match(uid_root) {
            return Err(UidRootError(format!(
                "'{uid_root}': UID root must be empty or start with 1-9, contain only numbers and dots, and be no longer than {UID_ROOT_MAX_LENGTH} characters"
            )));
        }

        Ok(Self(uid_root.into()))
    }

    /// Returns the root followed by a dot, ready to be put in front of a UID suffix. An empty
    /// root gives an empty prefix.
    pub fn as_prefix(&self) -> String {
        if !self.0.is_empty() && !self.0.ends_with('.') {
            format!("{}.", self.0)
        } else {
            self.0.clone()
        }
    }
}

impl Default for UidRoot {
    fn default() -> Self {
        Self("".into())
    }
}

impl FromStr for UidRoot {
    type Err = UidRootError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UidRoot::new(s)
    }
}

impl TryFrom<String> for UidRoot {
    type Error = UidRootError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        UidRoot::new(&value)
    }
}

impl From<UidRoot> for String {
    fn from(uid_root: UidRoot) -> Self {
        uid_root.0
    }
}

impl AsRef<str> for UidRoot {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_uid_roots() {
        assert!(UidRoot::new("").is_ok());
        assert!(UidRoot::new("9999").is_ok());
        assert!(UidRoot::new("1.2.840.10008").is_ok());
        assert!(UidRoot::new("2.16.").is_ok());
        assert!(UidRoot::new(&"1".repeat(32)).is_ok());
    }

    #[test]
    fn test_invalid_uid_roots() {
        assert!(UidRoot::new("0.1.2").is_err());
        assert!(UidRoot::new(".1.2").is_err());
        assert!(UidRoot::new("1.2.a").is_err());
        assert!(UidRoot::new(" 1.2").is_err());
        assert!(UidRoot::new(&"1".repeat(33)).is_err());
    }

    #[test]
    fn test_error_message() {
        let err = UidRoot::new("abc").unwrap_err();
        assert!(err.to_string().contains("'abc'"));
    }

    #[test]
    fn test_as_prefix() {
        assert_eq!(UidRoot::new("").unwrap().as_prefix(), "");
        assert_eq!(UidRoot::new("9999").unwrap().as_prefix(), "9999.");
        assert_eq!(UidRoot::new("9999.").unwrap().as_prefix(), "9999.");
    }

    #[test]
    fn test_serde() {
        let uid_root: UidRoot = serde_json::from_str(r#""1.2.3""#).unwrap();
        assert_eq!(uid_root.as_ref(), "1.2.3");
        assert_eq!(serde_json::to_string(&uid_root).unwrap(), r#""1.2.3""#);

        let result: Result<UidRoot, _> = serde_json::from_str(r#""0.1""#);
        assert!(result.is_err());
    }
}
