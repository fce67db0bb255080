use dicom_core::{Tag, VR};

use crate::codec::{Dataset, Element, Item, TransferSyntax, Value};
use crate::tags;

pub(crate) fn explicit_header(group: u16, element: u16, vr: &[u8; 2], length: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&group.to_le_bytes());
    out.extend_from_slice(&element.to_le_bytes());
    out.extend_from_slice(vr);
    match vr {
        b"OB" | b"OD" | b"OF" | b"OL" | b"OW" | b"SQ" | b"UC" | b"UN" | b"UR" | b"UT" => {
            out.extend_from_slice(&[0, 0]);
            out.extend_from_slice(&length.to_le_bytes());
        }
        _ => out.extend_from_slice(&(length as u16).to_le_bytes()),
    }
    out
}

pub(crate) fn implicit_header(group: u16, element: u16, length: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&group.to_le_bytes());
    out.extend_from_slice(&element.to_le_bytes());
    out.extend_from_slice(&length.to_le_bytes());
    out
}

/// Builds a complete file: zeroed preamble, magic code, a file meta group with group length,
/// version and transfer syntax, followed by the given data set bytes.
pub(crate) fn file_bytes(transfer_syntax_uid: &str, body: &[u8]) -> Vec<u8> {
    let mut uid = transfer_syntax_uid.as_bytes().to_vec();
    if uid.len() % 2 != 0 {
        uid.push(0);
    }

    let mut meta = explicit_header(0x0002, 0x0001, b"OB", 2);
    meta.extend_from_slice(&[0, 1]);
    meta.extend(explicit_header(0x0002, 0x0010, b"UI", uid.len() as u32));
    meta.extend_from_slice(&uid);

    let mut out = vec![0; 128];
    out.extend_from_slice(b"DICM");
    out.extend(explicit_header(0x0002, 0x0000, b"UL", 4));
    out.extend_from_slice(&(meta.len() as u32).to_le_bytes());
    out.extend(meta);
    out.extend_from_slice(body);
    out
}

/// A small explicit VR little endian object with patient, study and referenced instance data.
pub(crate) fn make_test_object() -> Dataset {
    let mut obj = Dataset::new(TransferSyntax::ExplicitVrLittleEndian);
    obj.put(Element::text(
        tags::MEDIA_STORAGE_SOP_CLASS_UID,
        VR::UI,
        "1.2.840.10008.5.1.4.1.1.2",
    ));
    obj.put(Element::text(
        tags::MEDIA_STORAGE_SOP_INSTANCE_UID,
        VR::UI,
        "1.2.3.4.5.6.7.8",
    ));
    obj.put(Element::text(
        tags::SOP_CLASS_UID,
        VR::UI,
        "1.2.840.10008.5.1.4.1.1.2",
    ));
    obj.put(Element::text(tags::SOP_INSTANCE_UID, VR::UI, "1.2.3.4.5.6.7.8"));
    obj.put(Element::text(tags::STUDY_DATE, VR::DA, "20010102"));
    obj.put(Element::text(tags::ACCESSION_NUMBER, VR::SH, "0123456789ABCDEF"));
    obj.put(Element::text(tags::INSTITUTION_NAME, VR::LO, "Some Hospital"));
    obj.put(Element::sequence(
        tags::DERIVATION_IMAGE_SEQUENCE,
        vec![Item::new(vec![Element::text(
            tags::REFERENCED_SOP_INSTANCE_UID,
            VR::UI,
            "1.2.3.4.5.6.7.9",
        )])],
    ));
    obj.put(Element::text(tags::PATIENT_NAME, VR::PN, "Doe^Jane"));
    obj.put(Element::text(tags::PATIENT_ID, VR::LO, "12345678"));
    obj.put(Element::text(tags::PATIENT_BIRTH_DATE, VR::DA, "19700615"));
    obj.put(Element::text(Tag(0x0009, 0x0010), VR::LO, "GEMS_IDEN_01"));
    obj.put(Element::text(tags::STUDY_INSTANCE_UID, VR::UI, "1.2.3.4.5"));
    obj.put(Element::text(tags::SERIES_INSTANCE_UID, VR::UI, "1.2.3.4.5.6"));
    obj.put(Element::new(Tag(0x5000, 0x0010), VR::US, Value::Primitive(vec![1, 0])));
    obj.put(Element::new(Tag(0x6000, 0x0010), VR::US, Value::Primitive(vec![1, 0])));
    obj
}
