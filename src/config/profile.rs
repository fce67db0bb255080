//! The built-in de-identification profile.
//!
//! UIDs are remapped, patient and order identifiers hashed, dates shifted per patient and
//! identifying free text removed. Tags that are not listed are kept, unless a group rule
//! (private tags, curves, overlays) removes them.

use std::sync::OnceLock;

use dicom_core::Tag;
use dicom_dictionary_std::tags;

use crate::actions::Action;
use crate::config::tag_action_map::TagActionMap;

pub const DEIDENTIFIER: &str = "CARECODERS";

const IDENTIFIER_HASH_LENGTH: usize = 10;
const ORDER_NUMBER_HASH_LENGTH: usize = 16;

#[derive(Debug, Clone, Copy)]
enum Rule {
    Empty,
    Hash(usize),
    /// shift dates per patient, based on the patient ID
    HashDate,
    HashUid,
    Remove,
    Replace(&'static str),
}

impl Rule {
    fn to_action(self) -> Action {
        match self {
            Rule::Empty => Action::Empty,
            Rule::Hash(length) => Action::Hash {
                length: Some(length),
            },
            Rule::HashDate => Action::HashDate {
                other_tag: tags::PATIENT_ID,
            },
            Rule::HashUid => Action::HashUID,
            Rule::Remove => Action::Remove,
            Rule::Replace(value) => Action::Replace {
                value: value.into(),
            },
        }
    }
}

static PROFILE: &[(Tag, Rule)] = &[
    (tags::MEDIA_STORAGE_SOP_INSTANCE_UID, Rule::HashUid),
    (tags::INSTANCE_CREATION_DATE, Rule::HashDate),
    (tags::INSTANCE_CREATOR_UID, Rule::HashUid),
    (tags::INSTANCE_COERCION_DATE_TIME, Rule::HashDate),
    (tags::ACQUISITION_UID, Rule::HashUid),
    (tags::SOP_INSTANCE_UID, Rule::HashUid),
    (tags::STUDY_DATE, Rule::HashDate),
    (tags::SERIES_DATE, Rule::Remove),
    (tags::ACQUISITION_DATE, Rule::Remove),
    (tags::CONTENT_DATE, Rule::HashDate),
    (tags::OVERLAY_DATE, Rule::Remove),
    (tags::CURVE_DATE, Rule::Remove),
    (tags::ACQUISITION_DATE_TIME, Rule::Remove),
    (tags::STUDY_TIME, Rule::Empty),
    (tags::SERIES_TIME, Rule::Remove),
    (tags::ACQUISITION_TIME, Rule::Remove),
    (tags::CONTENT_TIME, Rule::Empty),
    (tags::OVERLAY_TIME, Rule::Remove),
    (tags::CURVE_TIME, Rule::Remove),
    (tags::ACCESSION_NUMBER, Rule::Hash(ORDER_NUMBER_HASH_LENGTH)),
    (tags::FAILED_SOP_INSTANCE_UID_LIST, Rule::HashUid),
    (tags::MANUFACTURER, Rule::Empty),
    (tags::INSTITUTION_NAME, Rule::Remove),
    (tags::INSTITUTION_ADDRESS, Rule::Remove),
    (tags::REFERRING_PHYSICIAN_NAME, Rule::Empty),
    (tags::REFERRING_PHYSICIAN_ADDRESS, Rule::Remove),
    (tags::REFERRING_PHYSICIAN_TELEPHONE_NUMBERS, Rule::Remove),
    (tags::REFERRING_PHYSICIAN_IDENTIFICATION_SEQUENCE, Rule::Remove),
    (tags::CONSULTING_PHYSICIAN_NAME, Rule::Remove),
    (tags::CONSULTING_PHYSICIAN_IDENTIFICATION_SEQUENCE, Rule::Remove),
    (tags::CODING_SCHEME_UID, Rule::HashUid),
    (tags::CONTEXT_GROUP_EXTENSION_CREATOR_UID, Rule::HashUid),
    (tags::CONTEXT_UID, Rule::HashUid),
    (tags::MAPPING_RESOURCE_UID, Rule::HashUid),
    (tags::TIMEZONE_OFFSET_FROM_UTC, Rule::Remove),
    (tags::STATION_NAME, Rule::Remove),
    (tags::INSTITUTIONAL_DEPARTMENT_NAME, Rule::Remove),
    (tags::PHYSICIANS_OF_RECORD, Rule::Remove),
    (tags::PHYSICIANS_OF_RECORD_IDENTIFICATION_SEQUENCE, Rule::Remove),
    (tags::PERFORMING_PHYSICIAN_NAME, Rule::Remove),
    (tags::PERFORMING_PHYSICIAN_IDENTIFICATION_SEQUENCE, Rule::Remove),
    (tags::NAME_OF_PHYSICIANS_READING_STUDY, Rule::Remove),
    (tags::PHYSICIANS_READING_STUDY_IDENTIFICATION_SEQUENCE, Rule::Remove),
    (tags::OPERATORS_NAME, Rule::Remove),
    (tags::OPERATOR_IDENTIFICATION_SEQUENCE, Rule::Remove),
    (tags::ADMITTING_DIAGNOSES_DESCRIPTION, Rule::Remove),
    (tags::ADMITTING_DIAGNOSES_CODE_SEQUENCE, Rule::Remove),
    (tags::MANUFACTURER_MODEL_NAME, Rule::Remove),
    (tags::REFERENCED_STUDY_SEQUENCE, Rule::Remove),
    (tags::REFERENCED_PERFORMED_PROCEDURE_STEP_SEQUENCE, Rule::Remove),
    (tags::REFERENCED_PATIENT_SEQUENCE, Rule::Remove),
    (tags::REFERENCED_IMAGE_SEQUENCE, Rule::Remove),
    (tags::REFERENCED_SOP_INSTANCE_UID, Rule::HashUid),
    (tags::TRANSACTION_UID, Rule::HashUid),
    (tags::DERIVATION_DESCRIPTION, Rule::Remove),
    (tags::SOURCE_IMAGE_SEQUENCE, Rule::Remove),
    (tags::IDENTIFYING_COMMENTS, Rule::Remove),
    (tags::PATIENT_NAME, Rule::Hash(IDENTIFIER_HASH_LENGTH)),
    (tags::PATIENT_ID, Rule::Hash(IDENTIFIER_HASH_LENGTH)),
    (tags::ISSUER_OF_PATIENT_ID, Rule::Remove),
    (tags::PATIENT_BIRTH_DATE, Rule::HashDate),
    (tags::PATIENT_BIRTH_TIME, Rule::Remove),
    (tags::PATIENT_SEX, Rule::Empty),
    (tags::PATIENT_INSURANCE_PLAN_CODE_SEQUENCE, Rule::Remove),
    (tags::PATIENT_PRIMARY_LANGUAGE_CODE_SEQUENCE, Rule::Remove),
    (tags::OTHER_PATIENT_I_DS, Rule::Remove),
    (tags::OTHER_PATIENT_NAMES, Rule::Remove),
    (tags::OTHER_PATIENT_I_DS_SEQUENCE, Rule::Remove),
    (tags::PATIENT_BIRTH_NAME, Rule::Remove),
    (tags::PATIENT_AGE, Rule::Remove),
    (tags::PATIENT_SIZE, Rule::Remove),
    (tags::PATIENT_WEIGHT, Rule::Remove),
    (tags::PATIENT_ADDRESS, Rule::Remove),
    (tags::INSURANCE_PLAN_IDENTIFICATION, Rule::Remove),
    (tags::PATIENT_MOTHER_BIRTH_NAME, Rule::Remove),
    (tags::MILITARY_RANK, Rule::Remove),
    (tags::BRANCH_OF_SERVICE, Rule::Remove),
    (tags::MEDICAL_RECORD_LOCATOR, Rule::Remove),
    (tags::MEDICAL_ALERTS, Rule::Remove),
    (tags::ALLERGIES, Rule::Remove),
    (tags::COUNTRY_OF_RESIDENCE, Rule::Remove),
    (tags::REGION_OF_RESIDENCE, Rule::Remove),
    (tags::PATIENT_TELEPHONE_NUMBERS, Rule::Remove),
    (tags::PATIENT_TELECOM_INFORMATION, Rule::Remove),
    (tags::ETHNIC_GROUP, Rule::Remove),
    (tags::OCCUPATION, Rule::Remove),
    (tags::SMOKING_STATUS, Rule::Remove),
    (tags::ADDITIONAL_PATIENT_HISTORY, Rule::Remove),
    (tags::PREGNANCY_STATUS, Rule::Remove),
    (tags::LAST_MENSTRUAL_DATE, Rule::Remove),
    (tags::PATIENT_RELIGIOUS_PREFERENCE, Rule::Remove),
    (tags::PATIENT_SEX_NEUTERED, Rule::Remove),
    (tags::RESPONSIBLE_PERSON, Rule::Remove),
    (tags::RESPONSIBLE_ORGANIZATION, Rule::Remove),
    (tags::PATIENT_COMMENTS, Rule::Remove),
    (tags::PATIENT_IDENTITY_REMOVED, Rule::Remove),
    (tags::DEIDENTIFICATION_METHOD, Rule::Replace(DEIDENTIFIER)),
    (tags::DEIDENTIFICATION_METHOD_CODE_SEQUENCE, Rule::Remove),
    (tags::CONTRAST_BOLUS_AGENT, Rule::Empty),
    (tags::DEVICE_SERIAL_NUMBER, Rule::Remove),
    (tags::DEVICE_UID, Rule::HashUid),
    (tags::PLATE_ID, Rule::Remove),
    (tags::GENERATOR_ID, Rule::Remove),
    (tags::CASSETTE_ID, Rule::Remove),
    (tags::GANTRY_ID, Rule::Remove),
    (tags::DATE_OF_SECONDARY_CAPTURE, Rule::HashDate),
    (tags::SOFTWARE_VERSIONS, Rule::Remove),
    (tags::PROTOCOL_NAME, Rule::Remove),
    (tags::DATE_OF_LAST_CALIBRATION, Rule::HashDate),
    (tags::ACQUISITION_DEVICE_PROCESSING_DESCRIPTION, Rule::Remove),
    (tags::ACQUISITION_COMMENTS, Rule::Remove),
    (tags::DETECTOR_ID, Rule::Remove),
    (tags::DATE_OF_LAST_DETECTOR_CALIBRATION, Rule::HashDate),
    (tags::FRAME_ACQUISITION_DATE_TIME, Rule::HashDate),
    (tags::FRAME_REFERENCE_DATE_TIME, Rule::HashDate),
    (tags::CONTRIBUTION_DESCRIPTION, Rule::Remove),
    (tags::STUDY_INSTANCE_UID, Rule::HashUid),
    (tags::SERIES_INSTANCE_UID, Rule::HashUid),
    (tags::STUDY_ID, Rule::Empty),
    (tags::FRAME_OF_REFERENCE_UID, Rule::HashUid),
    (tags::SYNCHRONIZATION_FRAME_OF_REFERENCE_UID, Rule::HashUid),
    (tags::MODIFYING_DEVICE_ID, Rule::Remove),
    (tags::MODIFYING_DEVICE_MANUFACTURER, Rule::Remove),
    (tags::MODIFIED_IMAGE_DESCRIPTION, Rule::Remove),
    (tags::IMAGE_COMMENTS, Rule::Remove),
    (tags::CONCATENATION_UID, Rule::HashUid),
    (tags::DIMENSION_ORGANIZATION_UID, Rule::HashUid),
    (tags::PALETTE_COLOR_LOOKUP_TABLE_UID, Rule::HashUid),
    (tags::LARGE_PALETTE_COLOR_LOOKUP_TABLE_UID, Rule::HashUid),
    (tags::IMAGE_PRESENTATION_COMMENTS, Rule::Remove),
    (tags::STUDY_ID_ISSUER, Rule::Remove),
    (tags::STUDY_VERIFIED_DATE, Rule::HashDate),
    (tags::STUDY_READ_DATE, Rule::HashDate),
    (tags::SCHEDULED_STUDY_START_DATE, Rule::HashDate),
    (tags::SCHEDULED_STUDY_STOP_DATE, Rule::HashDate),
    (tags::SCHEDULED_STUDY_LOCATION, Rule::Remove),
    (tags::SCHEDULED_STUDY_LOCATION_AE_TITLE, Rule::Remove),
    (tags::REASON_FOR_STUDY, Rule::Remove),
    (tags::REQUESTING_PHYSICIAN, Rule::Remove),
    (tags::REQUESTING_SERVICE, Rule::Remove),
    (tags::STUDY_ARRIVAL_DATE, Rule::HashDate),
    (tags::STUDY_COMPLETION_DATE, Rule::HashDate),
    (tags::REQUESTED_PROCEDURE_DESCRIPTION, Rule::Remove),
    (tags::REQUESTED_CONTRAST_AGENT, Rule::Remove),
    (tags::STUDY_COMMENTS, Rule::Remove),
    (tags::REFERENCED_PATIENT_ALIAS_SEQUENCE, Rule::Remove),
    (tags::ADMISSION_ID, Rule::Remove),
    (tags::ISSUER_OF_ADMISSION_ID, Rule::Remove),
    (tags::SCHEDULED_ADMISSION_DATE, Rule::HashDate),
    (tags::SCHEDULED_DISCHARGE_DATE, Rule::HashDate),
    (tags::ADMITTING_DATE, Rule::Remove),
    (tags::ADMITTING_TIME, Rule::Remove),
    (tags::DISCHARGE_DATE, Rule::HashDate),
    (tags::DISCHARGE_DIAGNOSIS_DESCRIPTION, Rule::Remove),
    (tags::SPECIAL_NEEDS, Rule::Remove),
    (tags::SERVICE_EPISODE_ID, Rule::Remove),
    (tags::ISSUER_OF_SERVICE_EPISODE_ID, Rule::Remove),
    (tags::SERVICE_EPISODE_DESCRIPTION, Rule::Remove),
    (tags::CURRENT_PATIENT_LOCATION, Rule::Remove),
    (tags::PATIENT_INSTITUTION_RESIDENCE, Rule::Remove),
    (tags::PATIENT_STATE, Rule::Remove),
    (tags::VISIT_COMMENTS, Rule::Remove),
    (tags::SCHEDULED_STATION_AE_TITLE, Rule::Remove),
    (tags::SCHEDULED_PROCEDURE_STEP_START_DATE, Rule::HashDate),
    (tags::SCHEDULED_PROCEDURE_STEP_END_DATE, Rule::HashDate),
    (tags::SCHEDULED_PERFORMING_PHYSICIAN_NAME, Rule::Remove),
    (tags::SCHEDULED_PROCEDURE_STEP_DESCRIPTION, Rule::Remove),
    (tags::SCHEDULED_PERFORMING_PHYSICIAN_IDENTIFICATION_SEQUENCE, Rule::Remove),
    (tags::SCHEDULED_STATION_NAME, Rule::Remove),
    (tags::SCHEDULED_PROCEDURE_STEP_LOCATION, Rule::Remove),
    (tags::PRE_MEDICATION, Rule::Remove),
    (tags::PERFORMED_STATION_AE_TITLE, Rule::Remove),
    (tags::PERFORMED_STATION_NAME, Rule::Remove),
    (tags::PERFORMED_LOCATION, Rule::Remove),
    (tags::PERFORMED_PROCEDURE_STEP_START_DATE, Rule::HashDate),
    (tags::PERFORMED_STATION_NAME_CODE_SEQUENCE, Rule::Remove),
    (tags::PERFORMED_PROCEDURE_STEP_END_DATE, Rule::HashDate),
    (tags::PERFORMED_PROCEDURE_STEP_ID, Rule::Remove),
    (tags::PERFORMED_PROCEDURE_STEP_DESCRIPTION, Rule::Remove),
    (tags::REQUEST_ATTRIBUTES_SEQUENCE, Rule::Remove),
    (tags::COMMENTS_ON_THE_PERFORMED_PROCEDURE_STEP, Rule::Remove),
    (tags::ACQUISITION_CONTEXT_SEQUENCE, Rule::Remove),
    (tags::PATIENT_TRANSPORT_ARRANGEMENTS, Rule::Remove),
    (tags::REQUESTED_PROCEDURE_LOCATION, Rule::Remove),
    (tags::NAMES_OF_INTENDED_RECIPIENTS_OF_RESULTS, Rule::Remove),
    (tags::INTENDED_RECIPIENTS_OF_RESULTS_IDENTIFICATION_SEQUENCE, Rule::Remove),
    (tags::PERSON_ADDRESS, Rule::Remove),
    (tags::PERSON_TELEPHONE_NUMBERS, Rule::Remove),
    (tags::REQUESTED_PROCEDURE_COMMENTS, Rule::Remove),
    (tags::REASON_FOR_THE_IMAGING_SERVICE_REQUEST, Rule::Remove),
    (tags::ISSUE_DATE_OF_IMAGING_SERVICE_REQUEST, Rule::HashDate),
    (tags::ORDER_ENTERED_BY, Rule::Remove),
    (tags::ORDER_ENTERER_LOCATION, Rule::Remove),
    (tags::ORDER_CALLBACK_PHONE_NUMBER, Rule::Remove),
    (tags::PLACER_ORDER_NUMBER_IMAGING_SERVICE_REQUEST, Rule::Hash(ORDER_NUMBER_HASH_LENGTH)),
    (tags::FILLER_ORDER_NUMBER_IMAGING_SERVICE_REQUEST, Rule::Hash(ORDER_NUMBER_HASH_LENGTH)),
    (tags::IMAGING_SERVICE_REQUEST_COMMENTS, Rule::Remove),
    (tags::CONFIDENTIALITY_CONSTRAINT_ON_PATIENT_DATA_DESCRIPTION, Rule::Remove),
    (tags::REFERENCED_GENERAL_PURPOSE_SCHEDULED_PROCEDURE_STEP_TRANSACTION_UID, Rule::HashUid),
    (tags::SCHEDULED_STATION_NAME_CODE_SEQUENCE, Rule::Remove),
    (tags::SCHEDULED_STATION_GEOGRAPHIC_LOCATION_CODE_SEQUENCE, Rule::Remove),
    (tags::PERFORMED_STATION_GEOGRAPHIC_LOCATION_CODE_SEQUENCE, Rule::Remove),
    (tags::SCHEDULED_HUMAN_PERFORMERS_SEQUENCE, Rule::Remove),
    (tags::ACTUAL_HUMAN_PERFORMERS_SEQUENCE, Rule::Remove),
    (tags::HUMAN_PERFORMER_ORGANIZATION, Rule::Remove),
    (tags::HUMAN_PERFORMER_NAME, Rule::Remove),
    (tags::VERIFYING_ORGANIZATION, Rule::Remove),
    (tags::VERIFICATION_DATE_TIME, Rule::HashDate),
    (tags::OBSERVATION_DATE_TIME, Rule::HashDate),
    (tags::VERIFYING_OBSERVER_SEQUENCE, Rule::Remove),
    (tags::VERIFYING_OBSERVER_NAME, Rule::Remove),
    (tags::AUTHOR_OBSERVER_SEQUENCE, Rule::Remove),
    (tags::PARTICIPANT_SEQUENCE, Rule::Remove),
    (tags::CUSTODIAL_ORGANIZATION_SEQUENCE, Rule::Remove),
    (tags::VERIFYING_OBSERVER_IDENTIFICATION_CODE_SEQUENCE, Rule::Remove),
    (tags::DATE_TIME, Rule::HashDate),
    (tags::DATE, Rule::HashDate),
    (tags::PERSON_NAME, Rule::Remove),
    (tags::UID, Rule::HashUid),
    (tags::REFERENCED_DATE_TIME, Rule::HashDate),
    (tags::CONTENT_SEQUENCE, Rule::Remove),
    (tags::TEMPLATE_EXTENSION_ORGANIZATION_UID, Rule::HashUid),
    (tags::TEMPLATE_EXTENSION_CREATOR_UID, Rule::HashUid),
    (tags::FIDUCIAL_UID, Rule::HashUid),
    (tags::STORAGE_MEDIA_FILE_SET_UID, Rule::HashUid),
    (tags::ICON_IMAGE_SEQUENCE, Rule::Remove),
    (tags::TOPIC_SUBJECT, Rule::Remove),
    (tags::TOPIC_AUTHOR, Rule::Remove),
    (tags::TOPIC_KEYWORDS, Rule::Remove),
    (tags::DIGITAL_SIGNATURE_UID, Rule::HashUid),
    (tags::TEXT_STRING, Rule::Remove),
    (tags::REFERENCED_FRAME_OF_REFERENCE_UID, Rule::HashUid),
    (tags::RELATED_FRAME_OF_REFERENCE_UID, Rule::HashUid),
    (tags::DOSE_REFERENCE_UID, Rule::HashUid),
    (tags::ARBITRARY, Rule::Remove),
    (tags::TEXT_COMMENTS, Rule::Remove),
    (tags::RESULTS_ID_ISSUER, Rule::Remove),
    (tags::INTERPRETATION_RECORDER, Rule::Remove),
    (tags::INTERPRETATION_TRANSCRIBER, Rule::Remove),
    (tags::INTERPRETATION_TEXT, Rule::Remove),
    (tags::INTERPRETATION_AUTHOR, Rule::Remove),
    (tags::INTERPRETATION_APPROVER_SEQUENCE, Rule::Remove),
    (tags::PHYSICIAN_APPROVING_INTERPRETATION, Rule::Remove),
    (tags::INTERPRETATION_DIAGNOSIS_DESCRIPTION, Rule::Remove),
    (tags::RESULTS_DISTRIBUTION_LIST_SEQUENCE, Rule::Remove),
    (tags::DISTRIBUTION_NAME, Rule::Remove),
    (tags::DISTRIBUTION_ADDRESS, Rule::Remove),
    (tags::INTERPRETATION_ID_ISSUER, Rule::Remove),
    (tags::IMPRESSIONS, Rule::Remove),
    (tags::RESULTS_COMMENTS, Rule::Remove),
    (tags::DIGITAL_SIGNATURES_SEQUENCE, Rule::Remove),
    (tags::DATA_SET_TRAILING_PADDING, Rule::Remove),
    (tags::IRRADIATION_EVENT_UID, Rule::HashUid),
    (tags::CREATOR_VERSION_UID, Rule::HashUid),
];

static DEFAULT_TAG_ACTIONS: OnceLock<TagActionMap> = OnceLock::new();

/// Returns the tag actions of the built-in profile.
pub fn default_tag_actions() -> &'static TagActionMap {
    DEFAULT_TAG_ACTIONS.get_or_init(|| {
        PROFILE
            .iter()
            .map(|(tag, rule)| (*tag, rule.to_action()))
            .collect()
    })
}
