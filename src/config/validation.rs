use dicom_core::{Tag, VR};
use dicom_dictionary_std::tags;
use garde::Validate;

use crate::actions::{parse_tag, Action};
use crate::codec::Endianness;
use crate::config::tag_action_map::OwnedTagActionWithComment;
use crate::config::ConfigError;
use crate::vr::{dictionary_vr, encode_value};

/// Checks the constraints of an action for the given tag.
///
/// The message of the returned error has the form `<field>: <constraint>`.
pub(crate) fn check_action(tag: Tag, action: &Action) -> Result<(), String> {
    if let Err(report) = action.validate() {
        return Err(report.to_string().trim().to_string());
    }

    // data sets are always written back in the transfer syntax they were read in
    if tag == tags::TRANSFER_SYNTAX_UID && !matches!(action, Action::Keep | Action::None) {
        return Err("action: transfer syntax UID can only be kept".into());
    }

    if let Action::Replace { value } = action {
        match dictionary_vr(tag) {
            VR::SQ => return Err("value: cannot replace a sequence".into()),
            VR::UN => {}
            vr => {
                encode_value(vr, value, Endianness::Little).map_err(|e| format!("value: {e}"))?;
            }
        }
    }

    Ok(())
}

/// Parses and checks a single `tag_actions` entry of a JSON configuration, where `key` is the
/// tag as written by the user.
pub(crate) fn validate_tag_action(
    key: &str,
    value: serde_json::Value,
) -> Result<(Tag, Action), ConfigError> {
    let validation_error = |message: String| ConfigError::Validation {
        tag: key.to_string(),
        message,
    };

    let tag = parse_tag(key)
        .ok_or_else(|| validation_error("tag: must be GGGGEEEE or (GGGG,EEEE) hex digits".into()))?;

    let entry: OwnedTagActionWithComment =
        serde_json::from_value(value).map_err(|e| validation_error(format!("action: {e}")))?;

    check_action(tag, &entry.action).map_err(validation_error)?;

    Ok((tag, entry.action))
}
