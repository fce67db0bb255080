//! Reading and writing of DICOM Part 10 files.
//!
//! Only the parts of the file format needed for anonymization are modeled: elements keep their
//! raw value bytes, so anything that is not touched is written back exactly as it was read.
//! Element headers are read and written with the `dicom-encoding` codecs of the data set's
//! transfer syntax, driven through a `dicom-parser` stateful decoder.

mod dataset;
mod decode;
mod encode;
mod errors;

use dicom_core::Tag;

pub use dataset::{Dataset, Element, Item, TransferSyntax, Value};
pub use dicom_encoding::Endianness;
pub use errors::{EncodingError, FormatError};

pub(crate) const PREAMBLE_LENGTH: usize = 128;
pub(crate) const MAGIC: &[u8; 4] = b"DICM";
pub(crate) const UNDEFINED_LENGTH: u32 = 0xFFFF_FFFF;

pub(crate) const ITEM: Tag = Tag(0xFFFE, 0xE000);
pub(crate) const ITEM_DELIMITATION_ITEM: Tag = Tag(0xFFFE, 0xE00D);
pub(crate) const SEQUENCE_DELIMITATION_ITEM: Tag = Tag(0xFFFE, 0xE0DD);
