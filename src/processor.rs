use std::borrow::Cow;

use dicom_core::{Tag, VR};
use log::warn;

use crate::actions::custom::CustomTransforms;
use crate::actions::errors::ActionError;
use crate::actions::hash::HashLength;
use crate::actions::Action;
use crate::codec::{Dataset, Element, Endianness, Value};
use crate::config::Config;
use crate::pseudonym::Pseudonymizer;
use crate::vr;

const MULTI_VALUE_SEPARATOR: char = '\\';

/// Hash length when none is configured, or less when the VR does not allow that many characters.
const DEFAULT_HASH_LENGTH: usize = 64;

pub type Result<T, E = ActionError> = std::result::Result<T, E>;

pub trait Processor: Send + Sync {
    /// Processes a single element of `obj`, which may also be an element nested in one of its
    /// sequences.
    ///
    /// Returns `None` when the element has to be removed.
    fn process_element<'a>(
        &self,
        pseudonymizer: &mut Pseudonymizer,
        obj: &Dataset,
        elem: &'a Element,
    ) -> Result<Option<Cow<'a, Element>>>;
}

/// Applies the action the [`Config`] resolves for the tag of each element.
#[derive(Debug, Clone)]
pub struct DefaultProcessor {
    config: Config,
    custom_transforms: CustomTransforms,
}

impl DefaultProcessor {
    pub fn new(config: Config, custom_transforms: CustomTransforms) -> Self {
        Self {
            config,
            custom_transforms,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Processor for DefaultProcessor {
    fn process_element<'a>(
        &self,
        pseudonymizer: &mut Pseudonymizer,
        obj: &Dataset,
        elem: &'a Element,
    ) -> Result<Option<Cow<'a, Element>>> {
        match self.config.get_action(&elem.tag()) {
            Action::Keep | Action::None => Ok(Some(Cow::Borrowed(elem))),
            Action::Remove => Ok(None),
            Action::Empty => Ok(Some(Cow::Owned(Element::empty(elem.tag(), elem.vr())))),
            Action::Replace { value } => process_replace(obj, elem, value),
            Action::Hash { length } => process_hash(pseudonymizer, elem, *length),
            Action::HashUID => process_hash_uid(pseudonymizer, elem),
            Action::HashDate { other_tag } => {
                process_hash_date(pseudonymizer, obj, elem, *other_tag)
            }
            Action::Custom { name } => {
                let transform = self.custom_transforms.get(name).ok_or_else(|| {
                    ActionError::InternalError(format!("no custom transform named {name}"))
                })?;
                Ok(transform.transform(elem)?.map(Cow::Owned))
            }
        }
    }
}

/// Passes every element through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProcessor;

impl NoopProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Processor for NoopProcessor {
    fn process_element<'a>(
        &self,
        _pseudonymizer: &mut Pseudonymizer,
        _obj: &Dataset,
        elem: &'a Element,
    ) -> Result<Option<Cow<'a, Element>>> {
        Ok(Some(Cow::Borrowed(elem)))
    }
}

fn text_value(elem: &Element) -> Result<String> {
    if !vr::is_text(elem.vr()) && elem.vr() != VR::UN {
        return Err(ActionError::InvalidInput(format!(
            "element {} with VR {:?} does not hold a text value",
            elem.tag(),
            elem.vr()
        )));
    }
    elem.to_str().ok_or_else(|| {
        ActionError::InvalidInput(format!("element {} has no text value", elem.tag()))
    })
}

fn process_replace<'a>(
    obj: &Dataset,
    elem: &'a Element,
    value: &str,
) -> Result<Option<Cow<'a, Element>>> {
    // the file meta group is always little endian
    let order = if elem.tag().group() == 0x0002 {
        Endianness::Little
    } else {
        obj.transfer_syntax().byte_order()
    };
    let bytes = vr::encode_value(elem.vr(), value, order)?;
    Ok(Some(Cow::Owned(elem.with_value(Value::Primitive(bytes)))))
}

/// Hash length to use for an element: the configured length, or the default length when there is
/// none, but never more than the maximum length of the VR.
fn effective_hash_length(elem: &Element, length: Option<usize>) -> HashLength {
    let max_length = vr::max_length(elem.vr());
    let length = match (length, max_length) {
        (Some(length), Some(max_length)) if length > max_length => {
            warn!(
                "hash length {} for tag {} exceeds the maximum length of VR {:?}, using {}",
                length,
                elem.tag(),
                elem.vr(),
                max_length
            );
            max_length
        }
        (Some(length), _) => length,
        (None, Some(max_length)) => max_length.min(DEFAULT_HASH_LENGTH),
        (None, None) => DEFAULT_HASH_LENGTH,
    };
    HashLength(length)
}

fn process_hash<'a>(
    pseudonymizer: &mut Pseudonymizer,
    elem: &'a Element,
    length: Option<usize>,
) -> Result<Option<Cow<'a, Element>>> {
    let value = text_value(elem)?;
    if value.is_empty() {
        return Ok(Some(Cow::Borrowed(elem)));
    }

    let length = effective_hash_length(elem, length);
    let hash = pseudonymizer.hash_value(&value, length);
    Ok(Some(Cow::Owned(Element::text(elem.tag(), elem.vr(), &hash))))
}

fn process_hash_uid<'a>(
    pseudonymizer: &mut Pseudonymizer,
    elem: &'a Element,
) -> Result<Option<Cow<'a, Element>>> {
    let value = text_value(elem)?;
    if value.is_empty() {
        return Ok(Some(Cow::Borrowed(elem)));
    }

    let uids = value
        .split(MULTI_VALUE_SEPARATOR)
        .map(|uid| {
            let uid = uid.trim_matches(|c| c == '\0' || c == ' ');
            if uid.is_empty() {
                Ok(String::new())
            } else {
                pseudonymizer.pseudonymize_identifier(uid)
            }
        })
        .collect::<Result<Vec<String>>>()?;

    let new_value = uids.join(&MULTI_VALUE_SEPARATOR.to_string());
    Ok(Some(Cow::Owned(Element::text(
        elem.tag(),
        elem.vr(),
        &new_value,
    ))))
}

fn process_hash_date<'a>(
    pseudonymizer: &mut Pseudonymizer,
    obj: &Dataset,
    elem: &'a Element,
    other_tag: Tag,
) -> Result<Option<Cow<'a, Element>>> {
    let value = text_value(elem)?;
    if value.is_empty() {
        return Ok(Some(Cow::Borrowed(elem)));
    }

    let other_value = match obj.element(other_tag) {
        Some(other_elem) => other_elem.to_str().filter(|v| !v.is_empty()),
        None => {
            warn!(
                "did not change tag {} because the other tag {} is not available",
                elem.tag(),
                other_tag
            );
            return Ok(Some(Cow::Borrowed(elem)));
        }
    };

    match other_value {
        Some(other_value) => {
            let new_value = pseudonymizer.shift_date(&value, &other_value)?;
            Ok(Some(Cow::Owned(Element::text(
                elem.tag(),
                elem.vr(),
                &new_value,
            ))))
        }
        None => {
            warn!(
                "did not change tag {} because the other tag {} does not have a valid value",
                elem.tag(),
                other_tag
            );
            Ok(Some(Cow::Borrowed(elem)))
        }
    }
}
