use dicom_core::{Tag, VR};
use dicom_dictionary_std::tags;
use dicom_encoding::decode::basic::BasicDecoder;
use dicom_encoding::decode::BasicDecode;
use dicom_encoding::text::SpecificCharacterSet;
use dicom_parser::{DynStatefulDecoder, StatefulDecode, StatefulDecoder};
use log::debug;

use super::dataset::{Dataset, Element, Item, TransferSyntax, Value};
use super::errors::FormatError;
use super::{
    ITEM, ITEM_DELIMITATION_ITEM, MAGIC, PREAMBLE_LENGTH, SEQUENCE_DELIMITATION_ITEM,
    UNDEFINED_LENGTH,
};
use crate::vr;

const MAX_DEPTH: usize = 64;
const META_GROUP: u16 = 0x0002;
const HEADER_LENGTH: usize = 8;
const LONG_HEADER_LENGTH: usize = 12;

/// Reads elements from a buffer with the element decoder of one transfer syntax.
///
/// Offsets are absolute positions in `bytes`. Every read is bounded by an `end` offset, which is
/// the end of the enclosing item or sequence, or of the buffer.
struct Reader<'a> {
    bytes: &'a [u8],
    decoder: DynStatefulDecoder<&'a [u8]>,
    basic: BasicDecoder,
    explicit_vr: bool,
}

struct Header {
    tag: Tag,
    vr: VR,
    length: u32,
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(
        bytes: &'a [u8],
        position: usize,
        syntax: &TransferSyntax,
    ) -> Result<Reader<'a>, FormatError> {
        let codec = syntax.element_codec();
        let decoder = codec
            .decoder_for::<&'a [u8]>()
            .ok_or_else(|| FormatError::UnsupportedTransferSyntax(syntax.uid().into()))?;
        let basic = codec.basic_decoder();

        Ok(Reader {
            bytes,
            decoder: StatefulDecoder::new_with_position(
                &bytes[position..],
                decoder,
                basic.clone(),
                SpecificCharacterSet::default(),
                position as u64,
            ),
            basic,
            explicit_vr: syntax.is_explicit_vr(),
        })
    }

    fn position(&self) -> usize {
        self.decoder.position() as usize
    }

    fn is_at(&self, end: usize) -> bool {
        self.position() >= end
    }

    fn remaining(&self, end: usize) -> usize {
        end.saturating_sub(self.position())
    }

    fn peek_group(&self) -> Option<u16> {
        let position = self.position();
        let bytes = self.bytes.get(position..position + 2)?;
        self.basic.decode_us(bytes).ok()
    }

    fn read_header(&mut self, end: usize) -> Result<Header, FormatError> {
        let offset = self.position();
        let available = self.remaining(end);
        let truncated = |needed| FormatError::Truncated {
            offset,
            needed,
            available,
        };

        let bytes = self.bytes;
        let rest = &bytes[offset..offset + available];
        if rest.len() < HEADER_LENGTH {
            return Err(truncated(HEADER_LENGTH));
        }
        let tag = self
            .basic
            .decode_tag(rest)
            .map_err(|_| truncated(HEADER_LENGTH))?;

        // items and delimiters never carry a VR
        if self.explicit_vr && tag.group() != 0xFFFE {
            let code = [rest[4], rest[5]];
            let vr = VR::from_binary(code).ok_or_else(|| FormatError::UnknownVr {
                tag,
                offset,
                code: String::from_utf8_lossy(&code).into_owned(),
            })?;
            if vr::has_long_length(vr) && rest.len() < LONG_HEADER_LENGTH {
                return Err(truncated(LONG_HEADER_LENGTH));
            }
        }

        let header = self
            .decoder
            .decode_header()
            .map_err(|e| FormatError::Decode {
                offset,
                message: e.to_string(),
            })?;

        // the data dictionary knows neither private elements nor group lengths
        let vr = if !self.explicit_vr && (tag.group() % 2 != 0 || tag.element() == 0x0000) {
            vr::dictionary_vr(tag)
        } else {
            header.vr
        };

        Ok(Header {
            tag: header.tag,
            vr,
            length: header.len.0,
            offset,
        })
    }

    /// Reads `length` raw value bytes, failing when they run past `end`.
    fn read_bytes(
        &mut self,
        tag: Tag,
        offset: usize,
        length: u32,
        end: usize,
    ) -> Result<Vec<u8>, FormatError> {
        self.check_length(tag, offset, length, end)?;
        let mut bytes = Vec::with_capacity(length as usize);
        self.decoder
            .read_to_vec(length, &mut bytes)
            .map_err(|e| FormatError::Decode {
                offset: self.position(),
                message: e.to_string(),
            })?;
        Ok(bytes)
    }

    fn check_length(
        &self,
        tag: Tag,
        offset: usize,
        length: u32,
        end: usize,
    ) -> Result<usize, FormatError> {
        let length = length as usize;
        let remaining = self.remaining(end);
        if length > remaining {
            return Err(FormatError::InvalidLength {
                tag,
                offset,
                length,
                remaining,
            });
        }
        Ok(self.position() + length)
    }

    fn skip_to(&mut self, position: usize) -> Result<(), FormatError> {
        let length = position.saturating_sub(self.position()) as u32;
        self.decoder
            .skip_bytes(length)
            .map_err(|e| FormatError::Decode {
                offset: self.position(),
                message: e.to_string(),
            })
    }
}

impl Dataset {
    /// Reads a DICOM Part 10 file. The 128-byte preamble is optional, the `DICM` magic code
    /// and the file meta group are not.
    pub fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        let magic_end = PREAMBLE_LENGTH + MAGIC.len();
        let (preamble, start) =
            if bytes.len() >= magic_end && &bytes[PREAMBLE_LENGTH..magic_end] == MAGIC {
                (Some(bytes[..PREAMBLE_LENGTH].to_vec()), magic_end)
            } else if bytes.len() >= MAGIC.len() && &bytes[..MAGIC.len()] == MAGIC {
                (None, MAGIC.len())
            } else {
                return Err(FormatError::MissingMagic);
            };

        let mut reader = Reader::new(bytes, start, &TransferSyntax::ExplicitVrLittleEndian)?;
        let meta = read_meta(&mut reader, bytes.len())?;

        let uid = meta
            .iter()
            .find(|e| e.tag() == tags::TRANSFER_SYNTAX_UID)
            .and_then(|e| e.to_str())
            .ok_or(FormatError::MissingTransferSyntax)?;
        let transfer_syntax = TransferSyntax::from_uid(&uid)?;
        debug!("transfer syntax: {}", transfer_syntax.uid());

        let mut reader = Reader::new(bytes, reader.position(), &transfer_syntax)?;
        let elements = read_elements(&mut reader, bytes.len(), 0, false)?;
        Ok(Dataset::from_parts(preamble, meta, transfer_syntax, elements))
    }
}

fn read_meta(reader: &mut Reader, end: usize) -> Result<Vec<Element>, FormatError> {
    let mut meta = Vec::new();
    while reader.peek_group() == Some(META_GROUP) {
        let header = reader.read_header(end)?;
        meta.push(read_value(reader, header, end, 0)?);
    }
    Ok(meta)
}

fn read_elements(
    reader: &mut Reader,
    end: usize,
    depth: usize,
    until_delimiter: bool,
) -> Result<Vec<Element>, FormatError> {
    let mut elements = Vec::new();
    while !reader.is_at(end) {
        let header = reader.read_header(end)?;
        if header.tag == ITEM_DELIMITATION_ITEM && until_delimiter {
            return Ok(elements);
        }
        if header.tag.group() == 0xFFFE {
            return Err(FormatError::UnexpectedTag {
                tag: header.tag,
                offset: header.offset,
            });
        }
        elements.push(read_value(reader, header, end, depth)?);
    }

    if until_delimiter {
        return Err(FormatError::MissingDelimiter {
            offset: reader.position(),
        });
    }
    Ok(elements)
}

fn read_value(
    reader: &mut Reader,
    header: Header,
    end: usize,
    depth: usize,
) -> Result<Element, FormatError> {
    let Header {
        tag,
        vr,
        length,
        offset,
    } = header;

    if length == UNDEFINED_LENGTH {
        return match vr {
            VR::SQ => {
                let items = read_items_until_delimiter(reader, end, depth)?;
                Ok(Element::new(
                    tag,
                    vr,
                    Value::Sequence {
                        items,
                        undefined_length: true,
                    },
                ))
            }
            // UN with undefined length holds an implicit VR little endian sequence
            VR::UN => {
                let mut implicit = Reader::new(
                    reader.bytes,
                    reader.position(),
                    &TransferSyntax::ImplicitVrLittleEndian,
                )?;
                let items = read_items_until_delimiter(&mut implicit, end, depth)?;
                reader.skip_to(implicit.position())?;
                Ok(Element::new(
                    tag,
                    vr,
                    Value::Sequence {
                        items,
                        undefined_length: true,
                    },
                ))
            }
            VR::OB | VR::OW => {
                let fragments = read_fragments(reader, end)?;
                Ok(Element::new(tag, vr, Value::Fragments(fragments)))
            }
            _ => Err(FormatError::UndefinedLength { tag, offset }),
        };
    }

    if vr == VR::SQ {
        let sequence_end = reader.check_length(tag, offset, length, end)?;
        let items = read_items(reader, sequence_end, depth)?;
        return Ok(Element::new(
            tag,
            vr,
            Value::Sequence {
                items,
                undefined_length: false,
            },
        ));
    }

    let bytes = reader.read_bytes(tag, offset, length, end)?;
    Ok(Element::new(tag, vr, Value::Primitive(bytes)))
}

fn check_depth(depth: usize, reader: &Reader) -> Result<usize, FormatError> {
    let depth = depth + 1;
    if depth > MAX_DEPTH {
        return Err(FormatError::NestingTooDeep {
            max: MAX_DEPTH,
            offset: reader.position(),
        });
    }
    Ok(depth)
}

fn read_items(reader: &mut Reader, end: usize, depth: usize) -> Result<Vec<Item>, FormatError> {
    let depth = check_depth(depth, reader)?;
    let mut items = Vec::new();
    while !reader.is_at(end) {
        let header = reader.read_header(end)?;
        if header.tag != ITEM {
            return Err(FormatError::UnexpectedTag {
                tag: header.tag,
                offset: header.offset,
            });
        }
        items.push(read_item(reader, header, end, depth)?);
    }
    Ok(items)
}

fn read_items_until_delimiter(
    reader: &mut Reader,
    end: usize,
    depth: usize,
) -> Result<Vec<Item>, FormatError> {
    let depth = check_depth(depth, reader)?;
    let mut items = Vec::new();
    loop {
        if reader.is_at(end) {
            return Err(FormatError::MissingDelimiter {
                offset: reader.position(),
            });
        }
        let header = reader.read_header(end)?;
        match header.tag {
            SEQUENCE_DELIMITATION_ITEM => return Ok(items),
            ITEM => items.push(read_item(reader, header, end, depth)?),
            tag => {
                return Err(FormatError::UnexpectedTag {
                    tag,
                    offset: header.offset,
                })
            }
        }
    }
}

fn read_item(
    reader: &mut Reader,
    header: Header,
    end: usize,
    depth: usize,
) -> Result<Item, FormatError> {
    if header.length == UNDEFINED_LENGTH {
        let elements = read_elements(reader, end, depth, true)?;
        return Ok(Item::new(elements));
    }

    let item_end = reader.check_length(header.tag, header.offset, header.length, end)?;
    let elements = read_elements(reader, item_end, depth, false)?;
    Ok(Item::with_defined_length(elements))
}

fn read_fragments(reader: &mut Reader, end: usize) -> Result<Vec<Vec<u8>>, FormatError> {
    let mut fragments = Vec::new();
    loop {
        if reader.is_at(end) {
            return Err(FormatError::MissingDelimiter {
                offset: reader.position(),
            });
        }
        let header = reader.read_header(end)?;
        match header.tag {
            SEQUENCE_DELIMITATION_ITEM => return Ok(fragments),
            ITEM if header.length != UNDEFINED_LENGTH => {
                fragments.push(reader.read_bytes(ITEM, header.offset, header.length, end)?);
            }
            tag => {
                return Err(FormatError::UnexpectedTag {
                    tag,
                    offset: header.offset,
                })
            }
        }
    }
}
