use std::collections::btree_map;
use std::collections::BTreeMap;

use dicom_core::{DataDictionary, Tag};
use dicom_dictionary_std::StandardDataDictionary;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::actions::{format_tag, Action};
use crate::config::validation::validate_tag_action;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TagActionMap(BTreeMap<Tag, Action>);

impl TagActionMap {
    pub fn new() -> Self {
        TagActionMap(BTreeMap::new())
    }

    pub fn insert(&mut self, tag: Tag, action: Action) -> Option<Action> {
        self.0.insert(tag, action)
    }

    pub fn get(&self, tag: &Tag) -> Option<&Action> {
        self.0.get(tag)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Tag, Action> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Tag, Action)> for TagActionMap {
    fn from_iter<I: IntoIterator<Item = (Tag, Action)>>(iter: I) -> Self {
        TagActionMap(iter.into_iter().collect())
    }
}

impl Extend<(Tag, Action)> for TagActionMap {
    fn extend<I: IntoIterator<Item = (Tag, Action)>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

impl<'a> IntoIterator for &'a TagActionMap {
    type Item = (&'a Tag, &'a Action);
    type IntoIter = btree_map::Iter<'a, Tag, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// Struct to hold the action and an optional comment
#[derive(Serialize)]
struct TagActionWithComment<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
    #[serde(flatten)]
    action: &'a Action,
}

// For deserialization, we need an owned version
#[derive(Deserialize)]
pub(crate) struct OwnedTagActionWithComment {
    #[serde(default)]
    #[allow(dead_code)]
    comment: Option<String>,
    #[serde(flatten)]
    pub(crate) action: Action,
}

fn get_tag_alias(tag: &Tag) -> Option<&'static str> {
    StandardDataDictionary.by_tag(*tag).map(|entry| entry.alias)
}

impl Serialize for TagActionMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;

        for (tag, action) in &self.0 {
            let action_with_comment = TagActionWithComment {
                comment: get_tag_alias(tag),
                action,
            };
            map.serialize_entry(&format_tag(tag), &action_with_comment)?;
        }

        map.end()
    }
}

impl<'de> Deserialize<'de> for TagActionMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string_map: BTreeMap<String, serde_json::Value> = BTreeMap::deserialize(deserializer)?;

        let mut tag_map = BTreeMap::new();
        for (tag_str, value) in string_map {
            let (tag, action) =
                validate_tag_action(&tag_str, value).map_err(serde::de::Error::custom)?;
            tag_map.insert(tag, action);
        }

        Ok(TagActionMap(tag_map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags;

    #[test]
    fn test_tag_action_map() {
        let mut map = TagActionMap::new();
        assert!(map.is_empty());

        map.insert(tags::PATIENT_NAME, Action::Empty);
        map.insert(tags::PATIENT_ID, Action::Remove);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&tags::PATIENT_NAME), Some(&Action::Empty));

        let previous = map.insert(tags::PATIENT_NAME, Action::Keep);
        assert_eq!(previous, Some(Action::Empty));
        assert_eq!(map.get(&tags::PATIENT_NAME), Some(&Action::Keep));
    }

    #[test]
    fn test_tag_ordering() {
        let map: TagActionMap = [
            (tags::PATIENT_ID, Action::Remove),
            (tags::ACCESSION_NUMBER, Action::Empty),
            (tags::PATIENT_NAME, Action::Keep),
        ]
        .into_iter()
        .collect();

        let tags: Vec<Tag> = map.iter().map(|(tag, _)| *tag).collect();
        assert_eq!(
            tags,
            vec![tags::ACCESSION_NUMBER, tags::PATIENT_NAME, tags::PATIENT_ID]
        );
    }

    #[test]
    fn test_serialization_with_comment() {
        let mut map = TagActionMap::new();
        map.insert(tags::PATIENT_NAME, Action::Hash { length: Some(10) });
        map.insert(Tag(0x0033, 0x1010), Action::Keep);

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(
            json,
            r#"{"00100010":{"comment":"PatientName","action":"hash","length":10},"00331010":{"action":"keep"}}"#
        );
    }

    #[test]
    fn test_deserialization_with_optional_comment() {
        let json = r#"{
            "00100010": {"comment": "PatientName", "action": "empty"},
            "(0008,0050)": {"action": "uid"}
        }"#;
        let map: TagActionMap = serde_json::from_str(json).unwrap();
        assert_eq!(map.get(&tags::PATIENT_NAME), Some(&Action::Empty));
        assert_eq!(map.get(&tags::ACCESSION_NUMBER), Some(&Action::HashUID));
    }

    #[test]
    fn test_roundtrip() {
        let mut map = TagActionMap::new();
        map.insert(tags::PATIENT_NAME, Action::Empty);
        map.insert(
            tags::STUDY_DATE,
            Action::HashDate {
                other_tag: tags::PATIENT_ID,
            },
        );
        map.insert(
            tags::DEIDENTIFICATION_METHOD,
            Action::Replace {
                value: "ANON".into(),
            },
        );

        let json = serde_json::to_string(&map).unwrap();
        let deserialized: TagActionMap = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, map);
    }

    #[test]
    fn test_malformed_json() {
        let json = r#"{"00100010":{"comment":"PatientName","action":123}}"#;
        let result: Result<TagActionMap, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_tag() {
        let json = r#"{"0010001":{"action":"keep"}}"#;
        let result: Result<TagActionMap, _> = serde_json::from_str(json);
        let error_message = result.unwrap_err().to_string();
        assert!(error_message.contains("Validation error for tag 0010001"));
    }

    #[test]
    fn test_hash_length_error() {
        let json = r#"{"00100010":{"comment":"PatientName","action":"hash","length":5}}"#;
        let result: Result<TagActionMap, _> = serde_json::from_str(json);
        let error_message = result.unwrap_err().to_string();
        assert!(error_message.contains("Validation error for tag 00100010: length: lower than 8"));
    }
}
