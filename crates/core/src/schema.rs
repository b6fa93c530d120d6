//! Schema registry: column layouts and minimum arities per entity kind.
//!
//! Two layouts are known for the source files. The basic layout carries the
//! columns every export has; the extended layout adds administrative columns
//! (postcodes, durations, audit dates and so on). One variant is chosen per
//! process and applied to every kind.
//!
//! Column keys match the serde field names of the entity structs in
//! [`crate::entities`], which is how the decoder assigns values.

use crate::constants;
use crate::error::ClinicError;
use std::fmt;
use std::str::FromStr;

/// The seven record categories held by the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Patient,
    Clinician,
    Facility,
    Appointment,
    Prescription,
    Referral,
    Staff,
}

impl EntityKind {
    /// All kinds, in the order they are loaded.
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Patient,
        EntityKind::Clinician,
        EntityKind::Facility,
        EntityKind::Appointment,
        EntityKind::Prescription,
        EntityKind::Referral,
        EntityKind::Staff,
    ];

    /// Lower-case singular name, e.g. `"patient"`.
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Patient => "patient",
            EntityKind::Clinician => "clinician",
            EntityKind::Facility => "facility",
            EntityKind::Appointment => "appointment",
            EntityKind::Prescription => "prescription",
            EntityKind::Referral => "referral",
            EntityKind::Staff => "staff",
        }
    }

    /// Lower-case plural name, e.g. `"patients"`.
    pub fn plural(self) -> &'static str {
        match self {
            EntityKind::Patient => "patients",
            EntityKind::Clinician => "clinicians",
            EntityKind::Facility => "facilities",
            EntityKind::Appointment => "appointments",
            EntityKind::Prescription => "prescriptions",
            EntityKind::Referral => "referrals",
            EntityKind::Staff => "staff",
        }
    }

    /// Name of the source file for this kind inside the data directory.
    pub fn file_name(self) -> &'static str {
        match self {
            EntityKind::Patient => constants::PATIENTS_FILE_NAME,
            EntityKind::Clinician => constants::CLINICIANS_FILE_NAME,
            EntityKind::Facility => constants::FACILITIES_FILE_NAME,
            EntityKind::Appointment => constants::APPOINTMENTS_FILE_NAME,
            EntityKind::Prescription => constants::PRESCRIPTIONS_FILE_NAME,
            EntityKind::Referral => constants::REFERRALS_FILE_NAME,
            EntityKind::Staff => constants::STAFF_FILE_NAME,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityKind {
    type Err = ClinicError;

    /// Accepts the singular or plural name, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted || kind.plural() == wanted)
            .ok_or_else(|| ClinicError::UnknownEntityKind(s.to_owned()))
    }
}

/// Which column layout the source files use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SchemaVariant {
    Basic,
    #[default]
    Extended,
}

impl SchemaVariant {
    pub fn name(self) -> &'static str {
        match self {
            SchemaVariant::Basic => "basic",
            SchemaVariant::Extended => "extended",
        }
    }
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SchemaVariant {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(SchemaVariant::Basic),
            "extended" => Ok(SchemaVariant::Extended),
            _ => Err(ClinicError::UnknownSchemaVariant(s.to_owned())),
        }
    }
}

/// One column: the entity field it fills and its display label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
}

const fn field(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec { key, label }
}

/// Column layout and minimum arity for one entity kind.
///
/// `fields` is in file-column order. Rows with fewer than `min_arity` fields
/// are rejected; columns past the end of an accepted row decode as `""`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schema {
    pub kind: EntityKind,
    pub variant: SchemaVariant,
    pub fields: &'static [FieldSpec],
    pub min_arity: usize,
}

impl Schema {
    /// Looks up the registered schema for `kind` under `variant`.
    pub fn of(kind: EntityKind, variant: SchemaVariant) -> Schema {
        let fields = columns(kind, variant);
        Schema {
            kind,
            variant,
            fields,
            min_arity: fields.len(),
        }
    }
}

fn columns(kind: EntityKind, variant: SchemaVariant) -> &'static [FieldSpec] {
    use SchemaVariant::{Basic, Extended};

    match (kind, variant) {
        (EntityKind::Patient, _) => PATIENT,
        (EntityKind::Clinician, _) => CLINICIAN,
        (EntityKind::Facility, Basic) => FACILITY_BASIC,
        (EntityKind::Facility, Extended) => FACILITY_EXTENDED,
        (EntityKind::Appointment, Basic) => APPOINTMENT_BASIC,
        (EntityKind::Appointment, Extended) => APPOINTMENT_EXTENDED,
        (EntityKind::Prescription, Basic) => PRESCRIPTION_BASIC,
        (EntityKind::Prescription, Extended) => PRESCRIPTION_EXTENDED,
        (EntityKind::Referral, Basic) => REFERRAL_BASIC,
        (EntityKind::Referral, Extended) => REFERRAL_EXTENDED,
        (EntityKind::Staff, Basic) => STAFF_BASIC,
        (EntityKind::Staff, Extended) => STAFF_EXTENDED,
    }
}

// ============================================================================
// COLUMN TABLES
// ============================================================================

const PATIENT: &[FieldSpec] = &[
    field("patient_id", "Patient ID"),
    field("first_name", "First Name"),
    field("last_name", "Last Name"),
    field("date_of_birth", "DOB"),
    field("gender", "Gender"),
    field("nhs_number", "NHS Number"),
    field("email", "Email"),
    field("phone", "Phone"),
    field("address", "Address"),
    field("gp_surgery", "GP Surgery"),
];

const CLINICIAN: &[FieldSpec] = &[
    field("clinician_id", "Clinician ID"),
    field("first_name", "First Name"),
    field("last_name", "Last Name"),
    field("qualification", "Qualification"),
    field("specialty", "Specialty"),
    field("workplace", "Workplace"),
    field("email", "Email"),
    field("phone", "Phone"),
];

const FACILITY_BASIC: &[FieldSpec] = &[
    field("facility_id", "Facility ID"),
    field("name", "Name"),
    field("facility_type", "Type"),
    field("address", "Address"),
    field("phone", "Phone"),
    field("email", "Email"),
    field("services", "Services"),
    field("capacity", "Capacity"),
];

const FACILITY_EXTENDED: &[FieldSpec] = &[
    field("facility_id", "Facility ID"),
    field("name", "Name"),
    field("facility_type", "Type"),
    field("address", "Address"),
    field("postcode", "Postcode"),
    field("phone", "Phone"),
    field("email", "Email"),
    field("opening_hours", "Opening Hours"),
    field("manager", "Manager"),
    field("services", "Services"),
    field("capacity", "Capacity"),
];

const APPOINTMENT_BASIC: &[FieldSpec] = &[
    field("appointment_id", "Appointment ID"),
    field("patient_id", "Patient ID"),
    field("clinician_id", "Clinician ID"),
    field("facility_id", "Facility ID"),
    field("date", "Date"),
    field("time", "Time"),
    field("status", "Status"),
    field("reason", "Reason"),
    field("notes", "Notes"),
];

const APPOINTMENT_EXTENDED: &[FieldSpec] = &[
    field("appointment_id", "Appointment ID"),
    field("patient_id", "Patient ID"),
    field("clinician_id", "Clinician ID"),
    field("facility_id", "Facility ID"),
    field("date", "Date"),
    field("time", "Time"),
    field("duration_minutes", "Duration (min)"),
    field("appointment_type", "Type"),
    field("status", "Status"),
    field("reason", "Reason"),
    field("notes", "Notes"),
    field("created_date", "Created"),
    field("last_modified", "Last Modified"),
];

const PRESCRIPTION_BASIC: &[FieldSpec] = &[
    field("prescription_id", "Prescription ID"),
    field("patient_id", "Patient ID"),
    field("clinician_id", "Clinician ID"),
    field("medication", "Medication"),
    field("dosage", "Dosage"),
    field("quantity", "Quantity"),
    field("pharmacy", "Pharmacy"),
    field("date_prescribed", "Date Prescribed"),
    field("collection_status", "Collection Status"),
    field("notes", "Notes"),
];

const PRESCRIPTION_EXTENDED: &[FieldSpec] = &[
    field("prescription_id", "Prescription ID"),
    field("patient_id", "Patient ID"),
    field("clinician_id", "Clinician ID"),
    field("appointment_id", "Appointment ID"),
    field("medication", "Medication"),
    field("dosage", "Dosage"),
    field("frequency", "Frequency"),
    field("duration_days", "Duration Days"),
    field("quantity", "Quantity"),
    field("pharmacy", "Pharmacy"),
    field("date_prescribed", "Date Prescribed"),
    field("issue_date", "Issue Date"),
    field("collection_date", "Collection Date"),
    field("collection_status", "Collection Status"),
    field("notes", "Notes"),
];

const REFERRAL_BASIC: &[FieldSpec] = &[
    field("referral_id", "Referral ID"),
    field("patient_id", "Patient ID"),
    field("referring_clinician_id", "Referring Clinician"),
    field("receiving_clinician_id", "Receiving Clinician"),
    field("referring_facility_id", "Referring Facility"),
    field("receiving_facility_id", "Receiving Facility"),
    field("date", "Date"),
    field("urgency", "Urgency"),
    field("clinical_summary", "Clinical Summary"),
    field("status", "Status"),
];

const REFERRAL_EXTENDED: &[FieldSpec] = &[
    field("referral_id", "Referral ID"),
    field("patient_id", "Patient ID"),
    field("referring_clinician_id", "Referring Clinician"),
    field("receiving_clinician_id", "Receiving Clinician"),
    field("referring_facility_id", "Referring Facility"),
    field("receiving_facility_id", "Receiving Facility"),
    field("date", "Date"),
    field("urgency", "Urgency"),
    field("referral_reason", "Referral Reason"),
    field("clinical_summary", "Clinical Summary"),
    field("requested_investigations", "Requested Investigations"),
    field("status", "Status"),
    field("appointment_id", "Appointment ID"),
    field("notes", "Notes"),
    field("created_date", "Created"),
    field("last_updated", "Last Updated"),
];

const STAFF_BASIC: &[FieldSpec] = &[
    field("staff_id", "Staff ID"),
    field("first_name", "First Name"),
    field("last_name", "Last Name"),
    field("role", "Role"),
    field("facility_id", "Facility ID"),
    field("email", "Email"),
    field("phone", "Phone"),
];

const STAFF_EXTENDED: &[FieldSpec] = &[
    field("staff_id", "Staff ID"),
    field("first_name", "First Name"),
    field("last_name", "Last Name"),
    field("role", "Role"),
    field("department", "Department"),
    field("facility_id", "Facility ID"),
    field("email", "Email"),
    field("phone", "Phone"),
    field("employment_status", "Employment Status"),
    field("start_date", "Start Date"),
    field("line_manager", "Line Manager"),
    field("access_level", "Access Level"),
];
