//! Anonymization of DICOM files.
//!
//! An [`Anonymizer`] reads a DICOM Part 10 file, applies the action its [`config::Config`]
//! resolves for every element (including elements nested in sequences) and writes the result
//! back. Elements that are kept are written byte for byte as they were read.
//!
//! # Example
//!
//! ```no_run
//! use dicom_anonymization::config::ConfigBuilder;
//! use dicom_anonymization::Anonymizer;
//!
//! let config = ConfigBuilder::default()
//!     .uid_root("1.2.840.123".parse().unwrap())
//!     .build();
//! let mut anonymizer = Anonymizer::new(config).unwrap();
//!
//! let bytes = std::fs::read("tests/data/test.dcm").unwrap();
//! let anonymized = anonymizer.anonymize_bytes(&bytes).unwrap();
//! ```

pub mod actions;
pub mod codec;
pub mod config;
pub mod hasher;
pub mod processor;
pub mod pseudonym;
pub mod vr;

#[cfg(test)]
mod test_utils;

use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use log::debug;
use thiserror::Error;

use crate::actions::custom::{CustomTransform, CustomTransforms};
use crate::actions::errors::ActionError;
use crate::actions::{format_tag, Action};
use crate::codec::{Dataset, Element, EncodingError, FormatError, Item, Value};
use crate::config::builder::ConfigBuilder;
use crate::config::{Config, ConfigError};
use crate::processor::{DefaultProcessor, Processor};
use crate::pseudonym::Pseudonymizer;

pub use dicom_core::Tag;
pub use dicom_dictionary_std::tags;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnonymizationError {
    #[error("Read error: {0}")]
    ReadError(#[from] FormatError),

    #[error("Processing error: {0}")]
    ProcessingError(#[from] ActionError),

    #[error("Write error: {0}")]
    WriteError(#[from] EncodingError),

    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for AnonymizationError {
    fn from(err: std::io::Error) -> Self {
        AnonymizationError::IoError(err.to_string())
    }
}

pub type Result<T, E = AnonymizationError> = std::result::Result<T, E>;

/// The outcome of anonymizing one file.
#[derive(Debug, Clone, PartialEq)]
pub struct AnonymizationResult {
    pub original: Dataset,
    pub anonymized: Dataset,
}

impl AnonymizationResult {
    /// Writes the anonymized file.
    pub fn write<W: Write>(&self, to: W) -> Result<()> {
        self.anonymized.write(to)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.anonymized.encode()?)
    }
}

/// Anonymizes DICOM files.
///
/// Each anonymizer keeps its own pseudonym session: within one anonymizer the same UID always
/// maps to the same new UID, in every element and across calls. Clones share the pseudonym key,
/// so clones handed to different threads also agree with each other.
#[derive(Clone)]
pub struct Anonymizer {
    processor: Arc<dyn Processor>,
    pseudonymizer: Pseudonymizer,
}

impl Anonymizer {
    /// Creates an anonymizer for `config`, after checking all of its tag actions.
    ///
    /// Use [`Anonymizer::builder`] for configurations with custom actions.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        AnonymizerBuilder::new(config).build()
    }

    pub fn builder(config: Config) -> AnonymizerBuilder {
        AnonymizerBuilder::new(config)
    }

    /// Creates an anonymizer with a processor of your own.
    pub fn with_processor<P>(processor: P, pseudonymizer: Pseudonymizer) -> Self
    where
        P: Processor + 'static,
    {
        Self {
            processor: Arc::new(processor),
            pseudonymizer,
        }
    }

    pub fn pseudonymizer(&self) -> &Pseudonymizer {
        &self.pseudonymizer
    }

    /// Reads a complete file from `src` and anonymizes it.
    pub fn anonymize<R: Read>(&mut self, mut src: R) -> Result<AnonymizationResult> {
        let mut bytes = Vec::new();
        src.read_to_end(&mut bytes)?;
        let original = Dataset::decode(&bytes)?;
        let anonymized = self.anonymize_dataset(&original)?;
        Ok(AnonymizationResult {
            original,
            anonymized,
        })
    }

    /// Anonymizes a complete file held in memory and returns the re-encoded file.
    pub fn anonymize_bytes(&mut self, bytes: &[u8]) -> Result<Vec<u8>> {
        let original = Dataset::decode(bytes)?;
        let anonymized = self.anonymize_dataset(&original)?;
        Ok(anonymized.encode()?)
    }

    pub fn anonymize_path<P: AsRef<Path>>(&mut self, path: P) -> Result<Vec<u8>> {
        let file = File::open(path.as_ref()).map_err(|e| {
            AnonymizationError::IoError(format!("{}: {}", path.as_ref().display(), e))
        })?;
        self.anonymize(file)?.to_bytes()
    }

    /// Applies the actions to the file meta group and the data set, depth first.
    pub fn anonymize_dataset(&mut self, obj: &Dataset) -> Result<Dataset> {
        debug!(
            "anonymizing data set with {} elements, transfer syntax {}",
            obj.elements().len(),
            obj.transfer_syntax().uid()
        );

        let meta = self.process_elements(obj, obj.meta())?;
        let elements = self.process_elements(obj, obj.elements())?;

        debug!(
            "kept {} of {} elements, {} pseudonyms in session",
            elements.len(),
            obj.elements().len(),
            self.pseudonymizer.session_len()
        );
        Ok(obj.with_elements(meta, elements))
    }

    fn process_elements(&mut self, obj: &Dataset, elements: &[Element]) -> Result<Vec<Element>> {
        let mut processed = Vec::with_capacity(elements.len());
        for elem in elements {
            if let Some(new_elem) =
                self.processor
                    .process_element(&mut self.pseudonymizer, obj, elem)?
            {
                processed.push(self.process_items(obj, new_elem)?);
            }
        }
        Ok(processed)
    }

    fn process_items(&mut self, obj: &Dataset, elem: Cow<'_, Element>) -> Result<Element> {
        let Value::Sequence {
            items,
            undefined_length,
        } = elem.value()
        else {
            return Ok(elem.into_owned());
        };

        let mut new_items = Vec::with_capacity(items.len());
        for item in items {
            new_items.push(Item {
                elements: self.process_elements(obj, item.elements())?,
                undefined_length: item.undefined_length,
            });
        }

        Ok(elem.with_value(Value::Sequence {
            items: new_items,
            undefined_length: *undefined_length,
        }))
    }
}

impl Default for Anonymizer {
    /// Anonymizer with the built-in profile and a random pseudonym key.
    fn default() -> Self {
        let config = ConfigBuilder::default().build();
        let pseudonymizer = Pseudonymizer::new(config.get_uid_root().clone(), None);
        Self::with_processor(
            DefaultProcessor::new(config, CustomTransforms::new()),
            pseudonymizer,
        )
    }
}

impl fmt::Debug for Anonymizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Anonymizer")
            .field("pseudonymizer", &self.pseudonymizer)
            .finish_non_exhaustive()
    }
}

/// Builds an [`Anonymizer`], with custom transforms for the `custom` actions of the config.
///
/// # Example
///
/// ```
/// use dicom_anonymization::actions::errors::ActionError;
/// use dicom_anonymization::actions::Action;
/// use dicom_anonymization::codec::Element;
/// use dicom_anonymization::config::ConfigBuilder;
/// use dicom_anonymization::{tags, Anonymizer};
///
/// let config = ConfigBuilder::default()
///     .tag_action(tags::PATIENT_SEX, Action::Custom { name: "drop".into() })
///     .build();
/// let anonymizer = Anonymizer::builder(config)
///     .custom_transform(
///         "drop",
///         |_elem: &Element| -> Result<Option<Element>, ActionError> { Ok(None) },
///     )
///     .build()
///     .unwrap();
/// ```
pub struct AnonymizerBuilder {
    config: Config,
    custom_transforms: CustomTransforms,
}

impl AnonymizerBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            custom_transforms: CustomTransforms::new(),
        }
    }

    pub fn custom_transform<T>(mut self, name: &str, transform: T) -> Self
    where
        T: CustomTransform + 'static,
    {
        self.custom_transforms.insert(name, transform);
        self
    }

    /// Checks the configuration and creates the anonymizer. Nothing is created when any tag
    /// action is invalid or refers to a custom transform that is not registered.
    pub fn build(self) -> Result<Anonymizer, ConfigError> {
        self.config.validate()?;

        for (tag, action) in self.config.get_tag_actions().iter() {
            if let Action::Custom { name } = action {
                if !self.custom_transforms.contains(name) {
                    return Err(ConfigError::UnknownCustomTransform {
                        tag: format_tag(tag),
                        name: name.clone(),
                    });
                }
            }
        }

        let pseudonymizer = Pseudonymizer::new(
            self.config.get_uid_root().clone(),
            self.config.get_seed(),
        );
        Ok(Anonymizer::with_processor(
            DefaultProcessor::new(self.config, self.custom_transforms),
            pseudonymizer,
        ))
    }
}
