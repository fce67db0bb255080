//! Anonymization configuration: which action to take for which tag, plus the rules for whole
//! groups of tags (private tags, curves and overlays).

pub mod builder;
pub mod profile;
pub mod tag_action_map;
pub mod uid_root;
pub(crate) mod validation;

use dicom_core::Tag;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::hash::HashLengthError;
use crate::actions::{format_tag, Action};

pub use builder::ConfigBuilder;
pub use tag_action_map::TagActionMap;
pub use uid_root::{UidRoot, UidRootError};

#[derive(Error, Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum ConfigError {
    #[error("invalid UID root: {0}")]
    InvalidUidRoot(String),

    #[error("invalid hash length: {0}")]
    InvalidHashLength(String),

    #[error("Validation error for tag {tag}: {message}")]
    Validation { tag: String, message: String },

    #[error("no custom transform registered with name '{name}' (used for tag {tag})")]
    UnknownCustomTransform { tag: String, name: String },

    #[error("unable to parse configuration: {0}")]
    Parse(String),
}

impl From<UidRootError> for ConfigError {
    fn from(err: UidRootError) -> Self {
        ConfigError::InvalidUidRoot(err.0)
    }
}

impl From<HashLengthError> for ConfigError {
    fn from(err: HashLengthError) -> Self {
        ConfigError::InvalidHashLength(err.0)
    }
}

/// Configuration for DICOM anonymization.
///
/// # Fields
///
/// * `uid_root` - The [`UidRoot`] to use as prefix when generating new UIDs
/// * `remove_private_tags` - Whether to remove private tags (odd group numbers)
/// * `remove_curves` - Whether to remove curve data (groups `0x5000-0x50FF`)
/// * `remove_overlays` - Whether to remove overlay data (groups `0x6000-0x60FF`)
/// * `seed` - Optional secret from which the pseudonym key is derived, so that separate
///   anonymizers produce the same pseudonyms
/// * `tag_actions` - Mapping of specific DICOM tags to their corresponding actions
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    uid_root: UidRoot,

    #[serde(default = "default_true")]
    remove_private_tags: bool,
    #[serde(default = "default_true")]
    remove_curves: bool,
    #[serde(default = "default_true")]
    remove_overlays: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    seed: Option<String>,

    #[serde(default)]
    tag_actions: TagActionMap,
}

fn default_true() -> bool {
    true
}

pub(crate) fn is_private_tag(tag: &Tag) -> bool {
    // tags with odd group numbers are private tags
    tag.group() % 2 != 0
}

pub(crate) fn is_curve_tag(tag: &Tag) -> bool {
    (tag.group() & 0xFF00) == 0x5000
}

pub(crate) fn is_overlay_tag(tag: &Tag) -> bool {
    (tag.group() & 0xFF00) == 0x6000
}

impl Config {
    pub fn get_uid_root(&self) -> &UidRoot {
        &self.uid_root
    }

    pub fn get_seed(&self) -> Option<&str> {
        self.seed.as_deref()
    }

    pub fn get_tag_actions(&self) -> &TagActionMap {
        &self.tag_actions
    }

    pub fn removes_private_tags(&self) -> bool {
        self.remove_private_tags
    }

    /// Returns the [`Action`] to take for a given DICOM tag.
    ///
    /// # Priority Rules
    /// - If the tag has an explicit action of `Action::None` but one of the group rules
    ///   (private tags, curves, overlays) removes it, returns `Action::Remove`
    /// - If the tag has any other explicit action, returns that action
    /// - If the tag has no explicit action but a group rule removes it, returns `Action::Remove`
    /// - Otherwise returns `Action::Keep`
    pub fn get_action(&self, tag: &Tag) -> &Action {
        match self.tag_actions.get(tag) {
            Some(action) if action == &Action::None && self.should_be_removed(tag) => {
                &Action::Remove
            }
            Some(action) => action,
            None if self.should_be_removed(tag) => &Action::Remove,
            None => &Action::Keep,
        }
    }

    fn should_be_removed(&self, tag: &Tag) -> bool {
        self.remove_private_tags && is_private_tag(tag)
            || self.remove_curves && is_curve_tag(tag)
            || self.remove_overlays && is_overlay_tag(tag)
    }

    /// Checks every tag action, failing on the first one that violates a constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (tag, action) in self.tag_actions.iter() {
            validation::check_action(*tag, action).map_err(|message| ConfigError::Validation {
                tag: format_tag(tag),
                message,
            })?;
        }
        Ok(())
    }
}
