use dicom_core::Tag;
use serde::Deserialize;

use crate::actions::Action;
use crate::config::profile::default_tag_actions;
use crate::config::uid_root::{UidRoot, UID_ROOT_DEFAULT_VALUE};
use crate::config::validation::validate_tag_action;
use crate::config::{Config, ConfigError};

/// A builder for [`Config`].
///
/// [`ConfigBuilder::new`] starts from an empty configuration, [`ConfigBuilder::default`] from
/// the built-in profile.
///
/// # Example
///
/// ```
/// use dicom_anonymization::config::ConfigBuilder;
/// use dicom_anonymization::actions::Action;
/// use dicom_anonymization::tags;
///
/// let config = ConfigBuilder::default()
///     .uid_root("1.2.840.123".parse().unwrap())
///     .tag_action(tags::PATIENT_NAME, Action::Empty)
///     .tag_action(tags::PATIENT_ID, Action::Hash { length: Some(12) })
///     .remove_private_tags(false)
///     .build();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigBuilder(Config);

/// The JSON document accepted by [`ConfigBuilder::from_json`]. Every key is optional.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct UserConfig {
    uid_root: Option<String>,
    remove_private_tags: Option<bool>,
    remove_curves: Option<bool>,
    remove_overlays: Option<bool>,
    seed: Option<String>,
    #[serde(default)]
    tag_actions: serde_json::Map<String, serde_json::Value>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        ConfigBuilder(Config::default())
    }

    /// Starts from the built-in profile and applies everything set in `config` on top of it.
    /// Tag actions of `config` take precedence over the profile's.
    pub fn from_config(config: &Config) -> Self {
        let mut builder = Self::default()
            .uid_root(config.uid_root.clone())
            .remove_private_tags(config.remove_private_tags)
            .remove_curves(config.remove_curves)
            .remove_overlays(config.remove_overlays);
        builder.0.seed = config.seed.clone();
        builder
            .0
            .tag_actions
            .extend(config.tag_actions.iter().map(|(tag, action)| (*tag, action.clone())));
        builder
    }

    /// Parses a JSON configuration and applies it on top of the built-in profile.
    ///
    /// All entries of `tag_actions` are checked before anything is applied; the first violation
    /// is returned and the configuration is rejected as a whole.
    ///
    /// # Example
    ///
    /// ```
    /// use dicom_anonymization::config::ConfigBuilder;
    ///
    /// let json = r#"{
    ///     "uid_root": "1.2.3",
    ///     "tag_actions": {
    ///         "00080050": {"action": "hash", "length": 4}
    ///     }
    /// }"#;
    /// let err = ConfigBuilder::from_json(json).unwrap_err();
    /// assert_eq!(err.to_string(), "Validation error for tag 00080050: length: lower than 8");
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let user_config: UserConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let tag_actions = user_config
            .tag_actions
            .into_iter()
            .map(|(key, value)| validate_tag_action(&key, value))
            .collect::<Result<Vec<(Tag, Action)>, ConfigError>>()?;

        let mut builder = Self::default();
        if let Some(uid_root) = user_config.uid_root {
            builder = builder.uid_root(UidRoot::new(&uid_root)?);
        }
        if let Some(remove) = user_config.remove_private_tags {
            builder = builder.remove_private_tags(remove);
        }
        if let Some(remove) = user_config.remove_curves {
            builder = builder.remove_curves(remove);
        }
        if let Some(remove) = user_config.remove_overlays {
            builder = builder.remove_overlays(remove);
        }
        if let Some(seed) = user_config.seed {
            builder = builder.seed(seed);
        }
        builder.0.tag_actions.extend(tag_actions);

        Ok(builder)
    }

    /// Sets the UID root, the prefix of every UID generated with [`Action::HashUID`].
    pub fn uid_root(mut self, uid_root: UidRoot) -> Self {
        self.0.uid_root = uid_root;
        self
    }

    /// Sets the action to take for a specific DICOM tag, replacing any action set before.
    ///
    /// # Examples
    ///
    /// ```
    /// use dicom_anonymization::actions::Action;
    /// use dicom_anonymization::config::ConfigBuilder;
    /// use dicom_anonymization::tags;
    /// use dicom_core::Tag;
    ///
    /// let config = ConfigBuilder::new()
    ///     .tag_action(tags::MODALITY, Action::None)
    ///     .tag_action(tags::SERIES_DATE, Action::Remove)
    ///     .tag_action(tags::PATIENT_SEX, Action::Empty)
    ///     .tag_action(tags::PATIENT_ID, Action::Hash { length: Some(10) })
    ///     .tag_action(tags::STUDY_INSTANCE_UID, Action::HashUID)
    ///     .tag_action(tags::STUDY_DATE, Action::HashDate { other_tag: tags::PATIENT_ID })
    ///     .tag_action(tags::DEIDENTIFICATION_METHOD, Action::Replace { value: "MYAPP".into() })
    ///     .remove_private_tags(true)
    ///     .tag_action(Tag(0x0033, 0x0010), Action::Keep)
    ///     .build();
    /// ```
    pub fn tag_action(mut self, tag: Tag, action: Action) -> Self {
        self.0.tag_actions.insert(tag, action);
        self
    }

    /// Controls whether private tags (odd group numbers) are removed. Individual private tags
    /// can still be kept with an explicit action other than [`Action::None`].
    pub fn remove_private_tags(mut self, remove: bool) -> Self {
        self.0.remove_private_tags = remove;
        self
    }

    /// Controls whether curve tags (groups `0x5000-0x50FF`) are removed.
    pub fn remove_curves(mut self, remove: bool) -> Self {
        self.0.remove_curves = remove;
        self
    }

    /// Controls whether overlay tags (groups `0x6000-0x60FF`) are removed.
    pub fn remove_overlays(mut self, remove: bool) -> Self {
        self.0.remove_overlays = remove;
        self
    }

    /// Sets the secret the pseudonym key is derived from. Anonymizers built with the same seed
    /// generate the same UIDs and hashes for the same input. Without a seed every anonymizer
    /// gets a random key.
    pub fn seed(mut self, seed: impl Into<String>) -> Self {
        self.0.seed = Some(seed.into());
        self
    }

    pub fn build(self) -> Config {
        self.0
    }
}

impl Default for ConfigBuilder {
    /// Creates a `ConfigBuilder` with the built-in profile: its tag actions, removal of private
    /// tags, curves and overlays, and UID root `"9999"`.
    fn default() -> Self {
        let mut builder = Self::new()
            .remove_private_tags(true)
            .remove_curves(true)
            .remove_overlays(true);
        builder.0.uid_root = UidRoot(UID_ROOT_DEFAULT_VALUE.into());
        builder.0.tag_actions = default_tag_actions().clone();
        builder
    }
}
