use chrono::NaiveDate;
use std::str::FromStr;

use dicom_core::dictionary::VirtualVr;
use dicom_core::value::C;
use dicom_core::{DataDictionary, PrimitiveValue, Tag, VR};
use dicom_dictionary_std::StandardDataDictionary;
use dicom_encoding::encode::basic::{BigEndianBasicEncoder, LittleEndianBasicEncoder};
use dicom_encoding::encode::BasicEncode;
use dicom_encoding::Endianness;
use thiserror::Error;

const MULTI_VALUE_SEPARATOR: char = '\\';

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("cannot encode a value for VR {0:?}")]
    UnsupportedVr(VR),

    #[error("'{value}' exceeds the maximum length of {max} for VR {vr:?}")]
    TooLong { value: String, vr: VR, max: usize },

    #[error("'{value}' is not a valid {vr:?} value")]
    Invalid { value: String, vr: VR },
}

/// Returns the maximum number of characters of a single value for the given VR, if the
/// standard defines one.
pub(crate) fn max_length(vr: VR) -> Option<usize> {
    match vr {
        VR::AE => Some(16),
        VR::AS => Some(4),
        VR::CS => Some(16),
        VR::DA => Some(8),
        VR::DS => Some(16),
        VR::DT => Some(26),
        VR::IS => Some(12),
        VR::LO => Some(64),
        VR::LT => Some(10240),
        VR::PN => Some(64),
        VR::SH => Some(16),
        VR::ST => Some(1024),
        VR::TM => Some(14),
        VR::UI => Some(64),
        _ => None,
    }
}

pub(crate) fn is_text(vr: VR) -> bool {
    matches!(
        vr,
        VR::AE
            | VR::AS
            | VR::CS
            | VR::DA
            | VR::DS
            | VR::DT
            | VR::IS
            | VR::LO
            | VR::LT
            | VR::PN
            | VR::SH
            | VR::ST
            | VR::TM
            | VR::UC
            | VR::UI
            | VR::UR
            | VR::UT
    )
}

/// VRs that use a reserved 2-byte field followed by a 4-byte length in explicit VR encodings,
/// as read and written by the `dicom-encoding` element codecs.
pub(crate) fn has_long_length(vr: VR) -> bool {
    matches!(
        vr,
        VR::OB | VR::OD | VR::OF | VR::OL | VR::OW | VR::SQ | VR::UC | VR::UN | VR::UR | VR::UT
    )
}

/// Splits a textual value into its single values. LT, ST, UT and UR never hold more than one.
pub(crate) fn split_values(vr: VR, value: &str) -> impl Iterator<Item = &str> {
    let multi_valued = !matches!(vr, VR::LT | VR::ST | VR::UT | VR::UR);
    value.split(move |c| multi_valued && c == MULTI_VALUE_SEPARATOR)
}

pub(crate) fn padding(vr: VR) -> u8 {
    if vr != VR::UI && is_text(vr) {
        b' '
    } else {
        0
    }
}

/// Pads the value to an even length, as required for every encoded value.
pub(crate) fn pad(vr: VR, mut bytes: Vec<u8>) -> Vec<u8> {
    if bytes.len() % 2 != 0 {
        bytes.push(padding(vr));
    }
    bytes
}

/// Looks up the VR of a tag in the standard data dictionary, as needed for implicit VR
/// encodings. Tags that are unknown (or private) resolve to `UN`.
pub(crate) fn dictionary_vr(tag: Tag) -> VR {
    if tag.element() == 0x0000 {
        return VR::UL;
    }
    if tag.group() % 2 != 0 {
        // private creator elements
        if (0x0010..=0x00FF).contains(&tag.element()) {
            return VR::LO;
        }
        return VR::UN;
    }

    match StandardDataDictionary.by_tag(tag) {
        Some(entry) => match entry.vr {
            VirtualVr::Exact(vr) => vr,
            _ => VR::UN,
        },
        None => VR::UN,
    }
}

/// Encodes a textual value into the raw bytes for the given VR, checking that it is a valid
/// value for that VR. Numeric binary VRs accept backslash separated numbers.
pub(crate) fn encode_value(
    vr: VR,
    value: &str,
    order: Endianness,
) -> Result<Vec<u8>, ValueError> {
    let invalid = || ValueError::Invalid {
        value: value.into(),
        vr,
    };

    match vr {
        VR::US => encode_numbers(value, order, PrimitiveValue::U16).ok_or_else(invalid),
        VR::SS => encode_numbers(value, order, PrimitiveValue::I16).ok_or_else(invalid),
        VR::UL => encode_numbers(value, order, PrimitiveValue::U32).ok_or_else(invalid),
        VR::SL => encode_numbers(value, order, PrimitiveValue::I32).ok_or_else(invalid),
        VR::UV => encode_numbers(value, order, PrimitiveValue::U64).ok_or_else(invalid),
        VR::SV => encode_numbers(value, order, PrimitiveValue::I64).ok_or_else(invalid),
        VR::FL => encode_numbers(value, order, PrimitiveValue::F32).ok_or_else(invalid),
        VR::FD => encode_numbers(value, order, PrimitiveValue::F64).ok_or_else(invalid),
        VR::UN => Ok(pad(vr, value.as_bytes().to_vec())),
        vr if is_text(vr) => {
            for single in split_values(vr, value) {
                check_text_value(vr, single)?;
            }
            Ok(pad(vr, value.as_bytes().to_vec()))
        }
        vr => Err(ValueError::UnsupportedVr(vr)),
    }
}

fn check_text_value(vr: VR, value: &str) -> Result<(), ValueError> {
    if let Some(max) = max_length(vr) {
        if value.chars().count() > max {
            return Err(ValueError::TooLong {
                value: value.into(),
                vr,
                max,
            });
        }
    }

    let valid = match vr {
        VR::UI => value.chars().all(|c| c.is_ascii_digit() || c == '.'),
        VR::DA => value.is_empty() || NaiveDate::parse_from_str(value, "%Y%m%d").is_ok(),
        VR::IS => value.trim().is_empty() || value.trim().parse::<i64>().is_ok(),
        VR::DS => value.trim().is_empty() || value.trim().parse::<f64>().is_ok(),
        _ => true,
    };

    if valid {
        Ok(())
    } else {
        Err(ValueError::Invalid {
            value: value.into(),
            vr,
        })
    }
}

fn encode_numbers<T, F>(value: &str, order: Endianness, primitive: F) -> Option<Vec<u8>>
where
    T: FromStr,
    F: FnOnce(C<T>) -> PrimitiveValue,
{
    let numbers = value
        .split(MULTI_VALUE_SEPARATOR)
        .map(|single| single.trim().parse().ok())
        .collect::<Option<C<T>>>()?;
    let value = primitive(numbers);

    let mut bytes = Vec::new();
    match order {
        Endianness::Little => LittleEndianBasicEncoder.encode_primitive(&mut bytes, &value),
        Endianness::Big => BigEndianBasicEncoder.encode_primitive(&mut bytes, &value),
    }
    .ok()?;
    Some(bytes)
}
