mod common;

use common::{make_file, text};
use dicom_anonymization::actions::errors::ActionError;
use dicom_anonymization::actions::Action;
use dicom_anonymization::codec::{Dataset, Element, EncodingError, TransferSyntax, Value};
use dicom_anonymization::config::{ConfigBuilder, ConfigError};
use dicom_anonymization::{tags, AnonymizationError, Anonymizer, Tag};
use dicom_core::VR;

fn anonymizer_from_json(json: &str) -> Result<Anonymizer, ConfigError> {
    Anonymizer::new(ConfigBuilder::from_json(json)?.build())
}

fn anonymize(anonymizer: &mut Anonymizer, bytes: &[u8]) -> Dataset {
    let output = anonymizer.anonymize_bytes(bytes).unwrap();
    Dataset::decode(&output).unwrap()
}

#[test]
fn test_uid_root() {
    let uid_root = "1.2.3.4.5.6.7.8";
    let mut anonymizer = anonymizer_from_json(r#"{"uid_root": "1.2.3.4.5.6.7.8"}"#).unwrap();

    for transfer_syntax in [
        TransferSyntax::ImplicitVrLittleEndian,
        TransferSyntax::ExplicitVrLittleEndian,
        TransferSyntax::ExplicitVrBigEndian,
    ] {
        let obj = anonymize(&mut anonymizer, &make_file(transfer_syntax));

        for tag in [
            tags::STUDY_INSTANCE_UID,
            tags::SERIES_INSTANCE_UID,
            tags::SOP_INSTANCE_UID,
            tags::MEDIA_STORAGE_SOP_INSTANCE_UID,
        ] {
            let uid = text(&obj, tag).unwrap();
            assert!(uid.starts_with(uid_root), "{tag}: {uid}");
            assert!(uid.len() <= 64);
        }
    }
}

#[test]
fn test_action_replace() {
    let mut anonymizer = anonymizer_from_json(
        r#"{
            "tag_actions": {
                "00100010": {"comment": "PatientName", "action": "replace", "value": "John Doe"}
            }
        }"#,
    )
    .unwrap();

    let obj = anonymize(
        &mut anonymizer,
        &make_file(TransferSyntax::ExplicitVrLittleEndian),
    );
    assert_eq!(text(&obj, tags::PATIENT_NAME).as_deref(), Some("John Doe"));
    assert_eq!(
        obj.element(tags::PATIENT_NAME).unwrap().bytes(),
        Some(&b"John Doe"[..])
    );
}

#[test]
fn test_action_hash() {
    for hash_length in [8, 11, 16] {
        let json = format!(
            r#"{{"tag_actions": {{"00080050": {{"comment": "AccessionNumber", "action": "hash", "length": {hash_length}}}}}}}"#
        );
        let mut anonymizer = anonymizer_from_json(&json).unwrap();

        let obj = anonymize(
            &mut anonymizer,
            &make_file(TransferSyntax::ExplicitVrLittleEndian),
        );
        let accession_number = text(&obj, tags::ACCESSION_NUMBER).unwrap();
        assert_eq!(accession_number.len(), hash_length);
        assert_ne!(accession_number, common::ACCESSION_NUMBER);
    }
}

#[test]
fn test_action_hash_length_too_small() {
    for hash_length in [1, 3, 5, 7] {
        let json = format!(
            r#"{{"tag_actions": {{"00080050": {{"comment": "AccessionNumber", "action": "hash", "length": {hash_length}}}}}}}"#
        );
        let err = anonymizer_from_json(&json).unwrap_err();
        assert!(err
            .to_string()
            .contains("Validation error for tag 00080050: length: lower than 8"));
    }
}

#[test]
fn test_invalid_entry_rejects_whole_config() {
    let err = anonymizer_from_json(
        r#"{
            "tag_actions": {
                "00100010": {"action": "empty"},
                "00100020": {"action": "shuffle"}
            }
        }"#,
    )
    .unwrap_err();
    assert!(err
        .to_string()
        .starts_with("Validation error for tag 00100020: action: "));
}

#[test]
fn test_all_config_keys() {
    let mut anonymizer = anonymizer_from_json(
        r#"{
            "remove_private_tags": false,
            "uid_root": "3333",
            "tag_actions": {
                "00080050": {"comment": "AccessionNumber", "action": "hash", "length": 16}
            }
        }"#,
    )
    .unwrap();

    let obj = anonymize(
        &mut anonymizer,
        &make_file(TransferSyntax::ExplicitVrLittleEndian),
    );

    assert!(text(&obj, tags::STUDY_INSTANCE_UID)
        .unwrap()
        .starts_with("3333"));
    assert!(text(&obj, tags::SERIES_INSTANCE_UID)
        .unwrap()
        .starts_with("3333"));
    assert!(text(&obj, tags::SOP_INSTANCE_UID)
        .unwrap()
        .starts_with("3333"));

    let accession_number = text(&obj, tags::ACCESSION_NUMBER).unwrap();
    assert_eq!(accession_number.len(), 16);
    assert_ne!(accession_number, common::ACCESSION_NUMBER);

    // private tags are kept
    assert_eq!(
        text(&obj, Tag(0x0009, 0x0010)).as_deref(),
        Some("GEMS_IDEN_01")
    );
}

#[test]
fn test_private_tags_removed_by_default() {
    let mut anonymizer = Anonymizer::default();
    let obj = anonymize(
        &mut anonymizer,
        &make_file(TransferSyntax::ExplicitVrLittleEndian),
    );
    assert!(obj.element(Tag(0x0009, 0x0010)).is_none());
    assert!(obj.element(Tag(0x5000, 0x0005)).is_none());
    assert!(obj.element(Tag(0x6000, 0x0010)).is_none());
}

#[test]
fn test_explicit_keep_wins_over_private_tag_removal() {
    let mut anonymizer =
        anonymizer_from_json(r#"{"tag_actions": {"00090010": {"action": "keep"}}}"#).unwrap();
    let obj = anonymize(
        &mut anonymizer,
        &make_file(TransferSyntax::ExplicitVrLittleEndian),
    );
    assert_eq!(
        text(&obj, Tag(0x0009, 0x0010)).as_deref(),
        Some("GEMS_IDEN_01")
    );
}

#[test]
fn test_uid_consistency_within_file() {
    let mut anonymizer = Anonymizer::default();
    let obj = anonymize(
        &mut anonymizer,
        &make_file(TransferSyntax::ImplicitVrLittleEndian),
    );

    assert_eq!(
        text(&obj, tags::SOP_INSTANCE_UID),
        text(&obj, tags::MEDIA_STORAGE_SOP_INSTANCE_UID)
    );

    let items = obj
        .element(tags::DERIVATION_IMAGE_SEQUENCE)
        .unwrap()
        .items()
        .unwrap();
    let referenced_uid = items[0]
        .element(tags::REFERENCED_SOP_INSTANCE_UID)
        .unwrap()
        .to_str()
        .unwrap();
    assert_ne!(referenced_uid, common::REFERENCED_SOP_INSTANCE_UID);
    assert!(referenced_uid.starts_with("9999."));
}

#[test]
fn test_uid_consistency_across_calls() {
    let bytes = make_file(TransferSyntax::ExplicitVrLittleEndian);

    // a second file that references the first one
    let mut other = Dataset::decode(&bytes).unwrap();
    other.put(Element::text(
        tags::SOP_INSTANCE_UID,
        VR::UI,
        common::REFERENCED_SOP_INSTANCE_UID,
    ));
    let other_bytes = other.encode().unwrap();

    let mut anonymizer = Anonymizer::default();
    let first = anonymize(&mut anonymizer, &bytes);
    let second = anonymize(&mut anonymizer, &other_bytes);

    assert_eq!(
        text(&first, tags::STUDY_INSTANCE_UID),
        text(&second, tags::STUDY_INSTANCE_UID)
    );
    let referenced_uid = first
        .element(tags::DERIVATION_IMAGE_SEQUENCE)
        .unwrap()
        .items()
        .unwrap()[0]
        .element(tags::REFERENCED_SOP_INSTANCE_UID)
        .unwrap()
        .to_str();
    assert_eq!(referenced_uid, text(&second, tags::SOP_INSTANCE_UID));
}

#[test]
fn test_seeded_anonymizers_agree() {
    let bytes = make_file(TransferSyntax::ExplicitVrLittleEndian);
    let json = r#"{"seed": "shared secret"}"#;

    let first = anonymize(&mut anonymizer_from_json(json).unwrap(), &bytes);
    let second = anonymize(&mut anonymizer_from_json(json).unwrap(), &bytes);
    assert_eq!(first, second);

    let unseeded = anonymize(&mut Anonymizer::default(), &bytes);
    assert_ne!(
        text(&first, tags::STUDY_INSTANCE_UID),
        text(&unseeded, tags::STUDY_INSTANCE_UID)
    );
}

#[test]
fn test_cloned_anonymizers_agree() {
    let bytes = make_file(TransferSyntax::ExplicitVrLittleEndian);
    let mut anonymizer = Anonymizer::default();
    let mut clone = anonymizer.clone();

    let first = anonymize(&mut anonymizer, &bytes);
    let second = anonymize(&mut clone, &bytes);
    assert_eq!(
        text(&first, tags::SOP_INSTANCE_UID),
        text(&second, tags::SOP_INSTANCE_UID)
    );
}

#[test]
fn test_dates_are_shifted_per_patient() {
    let mut anonymizer = Anonymizer::default();
    let obj = anonymize(
        &mut anonymizer,
        &make_file(TransferSyntax::ExplicitVrLittleEndian),
    );

    let study_date = text(&obj, tags::STUDY_DATE).unwrap();
    let birth_date = text(&obj, tags::PATIENT_BIRTH_DATE).unwrap();
    assert_ne!(study_date, "20240311");
    assert!(study_date.as_str() < "20240311");
    assert!(birth_date.as_str() < "19800101");
}

#[test]
fn test_untouched_elements_are_preserved() {
    let bytes = make_file(TransferSyntax::ExplicitVrBigEndian);
    let original = Dataset::decode(&bytes).unwrap();
    let obj = anonymize(&mut Anonymizer::default(), &bytes);

    for tag in [tags::SOP_CLASS_UID, tags::MODALITY, tags::PIXEL_DATA] {
        assert_eq!(obj.element(tag), original.element(tag), "{tag}");
    }
    assert_eq!(obj.preamble(), original.preamble());
    assert_eq!(obj.transfer_syntax(), original.transfer_syntax());
}

#[test]
fn test_rerun_on_anonymized_output() {
    let bytes = make_file(TransferSyntax::ExplicitVrLittleEndian);
    let once = Anonymizer::default().anonymize_bytes(&bytes).unwrap();
    let twice = Anonymizer::default().anonymize_bytes(&once).unwrap();

    let obj = Dataset::decode(&twice).unwrap();
    assert!(text(&obj, tags::SOP_INSTANCE_UID)
        .unwrap()
        .starts_with("9999."));
    assert_ne!(
        text(&obj, tags::SOP_INSTANCE_UID),
        text(&Dataset::decode(&once).unwrap(), tags::SOP_INSTANCE_UID)
    );
}

#[test]
fn test_truncated_file() {
    let bytes = make_file(TransferSyntax::ExplicitVrLittleEndian);
    let mut anonymizer = Anonymizer::default();
    let result = anonymizer.anonymize_bytes(&bytes[..bytes.len() - 3]);
    assert!(matches!(result, Err(AnonymizationError::ReadError(_))));

    // the anonymizer is still usable afterwards
    assert!(anonymizer.anonymize_bytes(&bytes).is_ok());
}

#[test]
fn test_unsupported_transfer_syntax() {
    let mut bytes = make_file(TransferSyntax::ExplicitVrLittleEndian);
    let uid = b"1.2.840.10008.1.2.1\0";
    let start = bytes.windows(uid.len()).position(|w| w == uid).unwrap();
    bytes[start..start + uid.len()].copy_from_slice(b"1.2.840.10008.1.2.99");

    let result = Anonymizer::default().anonymize_bytes(&bytes);
    assert!(matches!(result, Err(AnonymizationError::ReadError(_))));
}

#[test]
fn test_value_too_long_for_encoding() {
    let mut anonymizer = anonymizer_from_json(
        r#"{"tag_actions": {"00104000": {"action": "keep"}}}"#,
    )
    .unwrap();

    let mut obj = Dataset::decode(&make_file(TransferSyntax::ExplicitVrLittleEndian)).unwrap();
    obj.put(Element::new(
        tags::PATIENT_COMMENTS,
        VR::LT,
        Value::Primitive(vec![b'x'; 70_000]),
    ));

    let anonymized = anonymizer.anonymize_dataset(&obj).unwrap();
    let result = anonymized.encode().map_err(AnonymizationError::from);
    assert!(matches!(result, Err(AnonymizationError::WriteError(_))));
}

#[test]
fn test_custom_transform_value_too_long_for_vr() {
    let config = ConfigBuilder::new()
        .tag_action(
            tags::ACCESSION_NUMBER,
            Action::Custom {
                name: "long_accession".into(),
            },
        )
        .build();
    let mut anonymizer = Anonymizer::builder(config)
        .custom_transform(
            "long_accession",
            |elem: &Element| -> Result<Option<Element>, ActionError> {
                Ok(Some(Element::text(elem.tag(), elem.vr(), &"X".repeat(100))))
            },
        )
        .build()
        .unwrap();

    let result = anonymizer.anonymize_bytes(&make_file(TransferSyntax::ExplicitVrLittleEndian));
    match result {
        Err(AnonymizationError::WriteError(EncodingError::ValueTooLong {
            tag,
            vr,
            length,
            max,
        })) => {
            assert_eq!(tag, tags::ACCESSION_NUMBER);
            assert_eq!(vr, VR::SH);
            assert_eq!(length, 100);
            assert_eq!(max, 16);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_transfer_syntax_uid_cannot_be_removed() {
    let err = anonymizer_from_json(
        r#"{"tag_actions": {"00020010": {"action": "remove"}}}"#,
    )
    .unwrap_err();
    assert!(err
        .to_string()
        .contains("transfer syntax UID can only be kept"));

    let config = ConfigBuilder::new()
        .tag_action(tags::TRANSFER_SYNTAX_UID, Action::Empty)
        .build();
    assert!(matches!(
        Anonymizer::new(config),
        Err(ConfigError::Validation { .. })
    ));
}

#[test]
fn test_anonymize_path() {
    let path = std::env::temp_dir().join(format!("dcmanon-test-{}.dcm", std::process::id()));
    std::fs::write(&path, make_file(TransferSyntax::ExplicitVrLittleEndian)).unwrap();

    let result = Anonymizer::default().anonymize_path(&path);
    std::fs::remove_file(&path).unwrap();
    assert!(result.is_ok());

    let result = Anonymizer::default().anonymize_path(std::env::temp_dir().join("missing.dcm"));
    assert!(matches!(result, Err(AnonymizationError::IoError(_))));
}
