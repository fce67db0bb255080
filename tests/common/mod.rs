use dicom_anonymization::codec::{Dataset, Element, Item, TransferSyntax, Value};
use dicom_anonymization::{tags, Tag};
use dicom_core::VR;

pub const SOP_INSTANCE_UID: &str = "1.2.826.0.1.3680043.8.498.1";
pub const REFERENCED_SOP_INSTANCE_UID: &str = "1.2.826.0.1.3680043.8.498.2";
pub const STUDY_INSTANCE_UID: &str = "1.2.826.0.1.3680043.8.498.3";
pub const SERIES_INSTANCE_UID: &str = "1.2.826.0.1.3680043.8.498.4";
pub const ACCESSION_NUMBER: &str = "A0123456789";

/// A CT-like object with a referenced image sequence, a private block, curve and overlay data,
/// and a few bytes of pixel data.
pub fn make_dataset(transfer_syntax: TransferSyntax) -> Dataset {
    let mut obj = Dataset::new(transfer_syntax);
    obj.put(Element::text(
        tags::MEDIA_STORAGE_SOP_CLASS_UID,
        VR::UI,
        "1.2.840.10008.5.1.4.1.1.2",
    ));
    obj.put(Element::text(
        tags::MEDIA_STORAGE_SOP_INSTANCE_UID,
        VR::UI,
        SOP_INSTANCE_UID,
    ));
    obj.put(Element::text(tags::SPECIFIC_CHARACTER_SET, VR::CS, "ISO_IR 100"));
    obj.put(Element::text(
        tags::SOP_CLASS_UID,
        VR::UI,
        "1.2.840.10008.5.1.4.1.1.2",
    ));
    obj.put(Element::text(tags::SOP_INSTANCE_UID, VR::UI, SOP_INSTANCE_UID));
    obj.put(Element::text(tags::STUDY_DATE, VR::DA, "20240311"));
    obj.put(Element::text(tags::ACCESSION_NUMBER, VR::SH, ACCESSION_NUMBER));
    obj.put(Element::text(tags::MODALITY, VR::CS, "CT"));
    obj.put(Element::text(tags::INSTITUTION_NAME, VR::LO, "General Hospital"));
    obj.put(Element::sequence(
        tags::DERIVATION_IMAGE_SEQUENCE,
        vec![Item::new(vec![
            Element::text(
                tags::REFERENCED_SOP_CLASS_UID,
                VR::UI,
                "1.2.840.10008.5.1.4.1.1.2",
            ),
            Element::text(
                tags::REFERENCED_SOP_INSTANCE_UID,
                VR::UI,
                REFERENCED_SOP_INSTANCE_UID,
            ),
        ])],
    ));
    obj.put(Element::text(Tag(0x0009, 0x0010), VR::LO, "GEMS_IDEN_01"));
    obj.put(Element::text(tags::PATIENT_NAME, VR::PN, "Doe^John"));
    obj.put(Element::text(tags::PATIENT_ID, VR::LO, "P-000123"));
    obj.put(Element::text(tags::PATIENT_BIRTH_DATE, VR::DA, "19800101"));
    obj.put(Element::text(tags::PATIENT_SEX, VR::CS, "M"));
    obj.put(Element::text(
        tags::STUDY_INSTANCE_UID,
        VR::UI,
        STUDY_INSTANCE_UID,
    ));
    obj.put(Element::text(
        tags::SERIES_INSTANCE_UID,
        VR::UI,
        SERIES_INSTANCE_UID,
    ));
    obj.put(Element::text(
        tags::FRAME_OF_REFERENCE_UID,
        VR::UI,
        "1.2.826.0.1.3680043.8.498.5",
    ));
    obj.put(Element::new(
        Tag(0x5000, 0x0005),
        VR::US,
        Value::Primitive(vec![2, 0]),
    ));
    obj.put(Element::new(
        Tag(0x6000, 0x0010),
        VR::US,
        Value::Primitive(vec![4, 0]),
    ));
    obj.put(Element::new(
        tags::PIXEL_DATA,
        VR::OW,
        Value::Primitive(vec![0, 1, 2, 3, 4, 5, 6, 7]),
    ));
    obj
}

pub fn make_file(transfer_syntax: TransferSyntax) -> Vec<u8> {
    make_dataset(transfer_syntax)
        .encode()
        .expect("test object should encode")
}

pub fn text(obj: &Dataset, tag: Tag) -> Option<String> {
    obj.element(tag).and_then(|elem| elem.to_str())
}
