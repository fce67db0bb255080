use dicom_core::{Tag, VR};
use dicom_dictionary_std::{tags, uids};
use dicom_encoding::transfer_syntax::TransferSyntaxIndex;
use dicom_encoding::{AdapterFreeTransferSyntax, Codec, Endianness};
use dicom_transfer_syntax_registry::{entries, TransferSyntaxRegistry};

use super::errors::FormatError;
use super::PREAMBLE_LENGTH;
use crate::vr;

/// The transfer syntaxes that can be read and written.
///
/// Encapsulated (compressed) transfer syntaxes use explicit VR little endian for the data set;
/// their pixel data fragments are carried through without being decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferSyntax {
    ImplicitVrLittleEndian,
    ExplicitVrLittleEndian,
    ExplicitVrBigEndian,
    Encapsulated(String),
}

impl TransferSyntax {
    /// Looks up a transfer syntax UID in the transfer syntax registry. Deflated data sets and
    /// UIDs the registry does not know are rejected.
    pub fn from_uid(uid: &str) -> Result<Self, FormatError> {
        let uid = uid.trim_end_matches(|c| c == '\0' || c == ' ');
        let unsupported = || FormatError::UnsupportedTransferSyntax(uid.into());
        let ts = TransferSyntaxRegistry.get(uid).ok_or_else(unsupported)?;

        match (ts.uid(), ts.codec()) {
            (uids::IMPLICIT_VR_LITTLE_ENDIAN, _) => Ok(TransferSyntax::ImplicitVrLittleEndian),
            (uids::EXPLICIT_VR_LITTLE_ENDIAN, _) => Ok(TransferSyntax::ExplicitVrLittleEndian),
            (uids::EXPLICIT_VR_BIG_ENDIAN, _) => Ok(TransferSyntax::ExplicitVrBigEndian),
            (uid, Codec::EncapsulatedPixelData(..)) => Ok(TransferSyntax::Encapsulated(uid.into())),
            _ => Err(unsupported()),
        }
    }

    pub fn uid(&self) -> &str {
        match self {
            TransferSyntax::ImplicitVrLittleEndian => uids::IMPLICIT_VR_LITTLE_ENDIAN,
            TransferSyntax::ExplicitVrLittleEndian => uids::EXPLICIT_VR_LITTLE_ENDIAN,
            TransferSyntax::ExplicitVrBigEndian => uids::EXPLICIT_VR_BIG_ENDIAN,
            TransferSyntax::Encapsulated(uid) => uid,
        }
    }

    pub fn byte_order(&self) -> Endianness {
        self.element_codec().endianness()
    }

    pub fn is_explicit_vr(&self) -> bool {
        !matches!(self, TransferSyntax::ImplicitVrLittleEndian)
    }

    /// The registry entry whose element decoder and encoder lay out this data set.
    pub(crate) fn element_codec(&self) -> AdapterFreeTransferSyntax {
        match self {
            TransferSyntax::ImplicitVrLittleEndian => entries::IMPLICIT_VR_LITTLE_ENDIAN,
            TransferSyntax::ExplicitVrBigEndian => entries::EXPLICIT_VR_BIG_ENDIAN,
            TransferSyntax::ExplicitVrLittleEndian | TransferSyntax::Encapsulated(_) => {
                entries::EXPLICIT_VR_LITTLE_ENDIAN
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Raw value bytes, in the byte order of the data set they belong to.
    Primitive(Vec<u8>),
    Sequence {
        items: Vec<Item>,
        undefined_length: bool,
    },
    /// Encapsulated pixel data; the first fragment is the basic offset table.
    Fragments(Vec<Vec<u8>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub(crate) elements: Vec<Element>,
    pub(crate) undefined_length: bool,
}

impl Item {
    pub fn new(elements: Vec<Element>) -> Self {
        Self {
            elements,
            undefined_length: true,
        }
    }

    pub fn with_defined_length(elements: Vec<Element>) -> Self {
        Self {
            elements,
            undefined_length: false,
        }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn element(&self, tag: Tag) -> Option<&Element> {
        self.elements.iter().find(|e| e.tag == tag)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: Tag,
    vr: VR,
    value: Value,
}

impl Element {
    pub fn new(tag: Tag, vr: VR, value: Value) -> Self {
        Self { tag, vr, value }
    }

    /// Creates an element with a textual value, padded to an even length.
    pub fn text(tag: Tag, vr: VR, value: &str) -> Self {
        let bytes = vr::pad(vr, value.as_bytes().to_vec());
        Self::new(tag, vr, Value::Primitive(bytes))
    }

    /// Creates a sequence element with undefined length.
    pub fn sequence(tag: Tag, items: Vec<Item>) -> Self {
        Self::new(
            tag,
            VR::SQ,
            Value::Sequence {
                items,
                undefined_length: true,
            },
        )
    }

    pub fn empty(tag: Tag, vr: VR) -> Self {
        let value = match vr {
            VR::SQ => Value::Sequence {
                items: Vec::new(),
                undefined_length: true,
            },
            _ => Value::Primitive(Vec::new()),
        };
        Self::new(tag, vr, value)
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn vr(&self) -> VR {
        self.vr
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.value {
            Value::Primitive(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn items(&self) -> Option<&[Item]> {
        match &self.value {
            Value::Sequence { items, .. } => Some(items),
            _ => None,
        }
    }

    /// Returns the value as a string with trailing padding removed, or `None` for sequences
    /// and encapsulated pixel data.
    pub fn to_str(&self) -> Option<String> {
        self.bytes().map(|bytes| {
            String::from_utf8_lossy(bytes)
                .trim_end_matches(|c| c == '\0' || c == ' ')
                .to_string()
        })
    }

    pub fn is_empty(&self) -> bool {
        match &self.value {
            Value::Primitive(bytes) => bytes.is_empty(),
            Value::Sequence { items, .. } => items.is_empty(),
            Value::Fragments(fragments) => fragments.is_empty(),
        }
    }

    pub(crate) fn with_value(&self, value: Value) -> Self {
        Self::new(self.tag, self.vr, value)
    }
}

/// A DICOM Part 10 file: preamble, file meta information and the main data set.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub(crate) preamble: Option<Vec<u8>>,
    pub(crate) meta: Vec<Element>,
    pub(crate) transfer_syntax: TransferSyntax,
    pub(crate) elements: Vec<Element>,
}

impl Dataset {
    /// Creates an empty file with a zeroed preamble and a minimal file meta group.
    pub fn new(transfer_syntax: TransferSyntax) -> Self {
        let meta = vec![
            Element::new(
                tags::FILE_META_INFORMATION_GROUP_LENGTH,
                VR::UL,
                Value::Primitive(vec![0; 4]),
            ),
            Element::new(
                tags::FILE_META_INFORMATION_VERSION,
                VR::OB,
                Value::Primitive(vec![0, 1]),
            ),
            Element::text(tags::TRANSFER_SYNTAX_UID, VR::UI, transfer_syntax.uid()),
        ];

        Self {
            preamble: Some(vec![0; PREAMBLE_LENGTH]),
            meta,
            transfer_syntax,
            elements: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        preamble: Option<Vec<u8>>,
        meta: Vec<Element>,
        transfer_syntax: TransferSyntax,
        elements: Vec<Element>,
    ) -> Self {
        Self {
            preamble,
            meta,
            transfer_syntax,
            elements,
        }
    }

    /// Same preamble and transfer syntax, with new meta and data set elements.
    pub(crate) fn with_elements(&self, meta: Vec<Element>, elements: Vec<Element>) -> Self {
        Self::from_parts(
            self.preamble.clone(),
            meta,
            self.transfer_syntax.clone(),
            elements,
        )
    }

    pub fn preamble(&self) -> Option<&[u8]> {
        self.preamble.as_deref()
    }

    pub fn transfer_syntax(&self) -> &TransferSyntax {
        &self.transfer_syntax
    }

    pub fn meta(&self) -> &[Element] {
        &self.meta
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Looks up an element in the file meta group or the main data set.
    pub fn element(&self, tag: Tag) -> Option<&Element> {
        let elements = if tag.group() == 0x0002 {
            &self.meta
        } else {
            &self.elements
        };
        elements.iter().find(|e| e.tag == tag)
    }

    /// Inserts an element, replacing any existing element with the same tag and keeping the
    /// elements in ascending tag order.
    pub fn put(&mut self, element: Element) {
        let elements = if element.tag.group() == 0x0002 {
            &mut self.meta
        } else {
            &mut self.elements
        };
        match elements.binary_search_by_key(&element.tag, |e| e.tag) {
            Ok(index) => elements[index] = element,
            Err(index) => elements.insert(index, element),
        }
    }
}
