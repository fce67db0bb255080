use std::io::Write;

use dicom_core::header::{DataElementHeader, Length};
use dicom_core::{Tag, VR};
use dicom_dictionary_std::tags;
use dicom_encoding::encode::basic::LittleEndianBasicEncoder;
use dicom_encoding::encode::{BasicEncode, EncodeTo};
use dicom_encoding::transfer_syntax::DynEncoder;

use super::dataset::{Dataset, Element, Item, TransferSyntax, Value};
use super::errors::EncodingError;
use super::{MAGIC, UNDEFINED_LENGTH};
use crate::vr;

impl Dataset {
    /// Serializes the file. Lengths are recomputed, as is the file meta group length when the
    /// meta group carries one.
    ///
    /// Fails when a value does not fit its VR, or when the transfer syntax UID of the file meta
    /// group no longer names the transfer syntax the data set is encoded in.
    pub fn encode(&self) -> Result<Vec<u8>, EncodingError> {
        self.check_transfer_syntax()?;

        let mut out = Vec::new();
        if let Some(preamble) = &self.preamble {
            out.extend_from_slice(preamble);
        }
        out.extend_from_slice(MAGIC);
        write_meta(&mut out, &self.meta)?;
        Writer::new(&self.transfer_syntax)?.write_elements(&mut out, &self.elements)?;
        Ok(out)
    }

    pub fn write<W: Write>(&self, mut to: W) -> Result<(), EncodingError> {
        let bytes = self.encode()?;
        to.write_all(&bytes)
            .map_err(|e| EncodingError::Io(e.to_string()))
    }

    fn check_transfer_syntax(&self) -> Result<(), EncodingError> {
        let expected = self.transfer_syntax.uid();
        let found = self
            .meta
            .iter()
            .find(|e| e.tag() == tags::TRANSFER_SYNTAX_UID)
            .and_then(Element::to_str);
        if found.as_deref() != Some(expected) {
            return Err(EncodingError::TransferSyntaxMismatch {
                expected: expected.into(),
                found,
            });
        }
        Ok(())
    }
}

fn write_meta(out: &mut Vec<u8>, meta: &[Element]) -> Result<(), EncodingError> {
    let writer = Writer::new(&TransferSyntax::ExplicitVrLittleEndian)?;
    let mut body = Vec::new();
    let mut has_group_length = false;
    for elem in meta {
        if elem.tag() == tags::FILE_META_INFORMATION_GROUP_LENGTH {
            has_group_length = true;
            continue;
        }
        writer.write_element(&mut body, elem)?;
    }

    if has_group_length {
        let tag = tags::FILE_META_INFORMATION_GROUP_LENGTH;
        let length = value_length(tag, VR::UL, body.len())?;
        let mut value = Vec::with_capacity(4);
        LittleEndianBasicEncoder
            .encode_ul(&mut value, length)
            .map_err(|e| EncodingError::Io(e.to_string()))?;
        writer.write_element(out, &Element::new(tag, VR::UL, Value::Primitive(value)))?;
    }
    out.extend(body);
    Ok(())
}

/// Writes elements with the element encoder of one transfer syntax.
struct Writer {
    encoder: DynEncoder<'static, Vec<u8>>,
    explicit_vr: bool,
}

impl Writer {
    fn new(syntax: &TransferSyntax) -> Result<Self, EncodingError> {
        let encoder = syntax
            .element_codec()
            .encoder_for::<Vec<u8>>()
            .ok_or_else(|| EncodingError::UnsupportedTransferSyntax(syntax.uid().into()))?;
        Ok(Self {
            encoder,
            explicit_vr: syntax.is_explicit_vr(),
        })
    }

    fn write_elements(&self, out: &mut Vec<u8>, elements: &[Element]) -> Result<(), EncodingError> {
        for elem in elements {
            self.write_element(out, elem)?;
        }
        Ok(())
    }

    fn write_element(&self, out: &mut Vec<u8>, elem: &Element) -> Result<(), EncodingError> {
        let (tag, vr) = (elem.tag(), elem.vr());
        match elem.value() {
            Value::Primitive(bytes) => {
                check_value_lengths(tag, vr, bytes)?;
                let length = value_length(tag, vr, bytes.len())?;
                self.write_header(out, tag, vr, length)?;
                out.extend_from_slice(bytes);
            }
            Value::Sequence {
                items,
                undefined_length,
            } => {
                // UN sequences are always implicit VR little endian inside
                let implicit;
                let item_writer = if vr == VR::UN {
                    implicit = Writer::new(&TransferSyntax::ImplicitVrLittleEndian)?;
                    &implicit
                } else {
                    self
                };

                if *undefined_length {
                    self.write_header(out, tag, vr, UNDEFINED_LENGTH)?;
                    for item in items {
                        item_writer.write_item(out, item)?;
                    }
                    item_writer
                        .encoder
                        .encode_sequence_delimiter(out)
                        .map_err(|e| encode_error(tag, e))?;
                } else {
                    let mut body = Vec::new();
                    for item in items {
                        item_writer.write_item(&mut body, item)?;
                    }
                    let length = value_length(tag, vr, body.len())?;
                    self.write_header(out, tag, vr, length)?;
                    out.extend(body);
                }
            }
            Value::Fragments(fragments) => {
                self.write_header(out, tag, vr, UNDEFINED_LENGTH)?;
                for fragment in fragments {
                    let length = value_length(tag, vr, fragment.len())?;
                    self.encoder
                        .encode_item_header(out, length)
                        .map_err(|e| encode_error(tag, e))?;
                    out.extend_from_slice(fragment);
                }
                self.encoder
                    .encode_sequence_delimiter(out)
                    .map_err(|e| encode_error(tag, e))?;
            }
        }
        Ok(())
    }

    fn write_item(&self, out: &mut Vec<u8>, item: &Item) -> Result<(), EncodingError> {
        let tag = super::ITEM;
        if item.undefined_length {
            self.encoder
                .encode_item_header(out, UNDEFINED_LENGTH)
                .map_err(|e| encode_error(tag, e))?;
            self.write_elements(out, &item.elements)?;
            self.encoder
                .encode_item_delimiter(out)
                .map_err(|e| encode_error(tag, e))?;
        } else {
            let mut body = Vec::new();
            self.write_elements(&mut body, &item.elements)?;
            let length = value_length(tag, VR::SQ, body.len())?;
            self.encoder
                .encode_item_header(out, length)
                .map_err(|e| encode_error(tag, e))?;
            out.extend(body);
        }
        Ok(())
    }

    fn write_header(
        &self,
        out: &mut Vec<u8>,
        tag: Tag,
        vr: VR,
        length: u32,
    ) -> Result<(), EncodingError> {
        if self.explicit_vr && !vr::has_long_length(vr) && length > u32::from(u16::MAX) {
            return Err(EncodingError::ValueTooLong {
                tag,
                vr,
                length: length as usize,
                max: u16::MAX as usize,
            });
        }
        self.encoder
            .encode_element_header(out, DataElementHeader::new(tag, vr, Length(length)))
            .map_err(|e| encode_error(tag, e))?;
        Ok(())
    }
}

/// Checks every single value of a text VR against the maximum length of that VR.
fn check_value_lengths(tag: Tag, vr: VR, bytes: &[u8]) -> Result<(), EncodingError> {
    let Some(max) = vr::max_length(vr) else {
        return Ok(());
    };

    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_end_matches(|c| c == '\0' || c == ' ');
    for value in vr::split_values(vr, text) {
        let length = value.chars().count();
        if length > max {
            return Err(EncodingError::ValueTooLong {
                tag,
                vr,
                length,
                max,
            });
        }
    }
    Ok(())
}

fn value_length(tag: Tag, vr: VR, length: usize) -> Result<u32, EncodingError> {
    u32::try_from(length)
        .ok()
        .filter(|l| *l != UNDEFINED_LENGTH)
        .ok_or(EncodingError::ValueTooLong {
            tag,
            vr,
            length,
            max: (UNDEFINED_LENGTH - 1) as usize,
        })
}

fn encode_error(tag: Tag, err: dicom_encoding::encode::Error) -> EncodingError {
    EncodingError::Encode {
        tag,
        message: err.to_string(),
    }
}
