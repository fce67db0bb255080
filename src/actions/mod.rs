pub mod custom;
pub mod errors;
pub mod hash;

use dicom_core::Tag;
use garde::Validate;
use serde::{Deserialize, Serialize};

use hash::HASH_LENGTH_MINIMUM;

/// Parses a tag written as `GGGGEEEE` or `(GGGG,EEEE)`, with hexadecimal digits.
pub(crate) fn parse_tag(tag_str: &str) -> Option<Tag> {
    let digits = match tag_str
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
    {
        Some(inner) => {
            let (group, element) = inner.split_once(',')?;
            if group.len() != 4 || element.len() != 4 {
                return None;
            }
            format!("{group}{element}")
        }
        None => tag_str.to_string(),
    };

    if digits.len() != 8 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let group = u16::from_str_radix(&digits[..4], 16).ok()?;
    let element = u16::from_str_radix(&digits[4..], 16).ok()?;
    Some(Tag(group, element))
}

pub(crate) fn format_tag(tag: &Tag) -> String {
    format!("{:04X}{:04X}", tag.group(), tag.element())
}

mod tag_string_wrapper {
    use super::{format_tag, parse_tag};
    use dicom_core::Tag;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(tag: &Tag, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_tag(tag))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Tag, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag_str = String::deserialize(deserializer)?;
        parse_tag(&tag_str).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "Tag must be in format 'GGGGEEEE' or '(GGGG,EEEE)' where G and E are hex digits, got: {}",
                tag_str
            ))
        })
    }
}

/// Specifies the action to perform on DICOM data elements during processing.
#[derive(Validate, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Action {
    /// Clear the value of the data element.
    Empty,

    /// Hash the data element value using an optional custom hash length.
    Hash {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        #[garde(inner(range(min = HASH_LENGTH_MINIMUM)))]
        length: Option<usize>,
    },

    /// Change a date, using a hash of the given other tag value to determine the offset.
    HashDate {
        #[serde(with = "tag_string_wrapper")]
        #[garde(skip)]
        other_tag: Tag,
    },

    /// Generate a new unique identifier (UID) by hashing the original UID.
    #[serde(rename = "uid", alias = "hashuid")]
    HashUID,

    /// Preserve the original data element value without modification.
    Keep,

    /// No action specified.
    None,

    /// Completely remove the data element from the DICOM dataset.
    Remove,

    /// Replace the data element value with the specified string.
    Replace {
        #[garde(skip)]
        value: String,
    },

    /// Transform the data element with a custom transform registered under `name`.
    Custom {
        #[garde(length(min = 1))]
        name: String,
    },
}
