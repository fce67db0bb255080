use dicom_core::{Tag, VR};
use thiserror::Error;

/// Reasons a byte stream could not be read as a DICOM Part 10 file.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("missing DICM magic code")]
    MissingMagic,

    #[error("truncated stream at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error(
        "length {length} of element {tag} at offset {offset} exceeds the {remaining} remaining bytes"
    )]
    InvalidLength {
        tag: Tag,
        offset: usize,
        length: usize,
        remaining: usize,
    },

    #[error("unknown VR {code:?} for element {tag} at offset {offset}")]
    UnknownVr {
        tag: Tag,
        offset: usize,
        code: String,
    },

    #[error("unexpected {tag} at offset {offset}")]
    UnexpectedTag { tag: Tag, offset: usize },

    #[error("undefined length on non-sequence element {tag} at offset {offset}")]
    UndefinedLength { tag: Tag, offset: usize },

    #[error("missing delimiter before offset {offset}")]
    MissingDelimiter { offset: usize },

    #[error("sequence nesting deeper than {max} levels at offset {offset}")]
    NestingTooDeep { max: usize, offset: usize },

    #[error("unable to decode element at offset {offset}: {message}")]
    Decode { offset: usize, message: String },

    #[error("file meta group has no transfer syntax")]
    MissingTransferSyntax,

    #[error("unsupported transfer syntax {0}")]
    UnsupportedTransferSyntax(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodingError {
    #[error("value too large for its VR's maximum length: element {tag} ({vr:?}) has length {length}, maximum is {max}")]
    ValueTooLong {
        tag: Tag,
        vr: VR,
        length: usize,
        max: usize,
    },

    #[error("transfer syntax UID in the file meta group is {found:?}, data set is encoded as {expected}")]
    TransferSyntaxMismatch {
        expected: String,
        found: Option<String>,
    },

    #[error("cannot encode in transfer syntax {0}")]
    UnsupportedTransferSyntax(String),

    #[error("unable to encode element {tag}: {message}")]
    Encode { tag: Tag, message: String },

    #[error("I/O error: {0}")]
    Io(String),
}
