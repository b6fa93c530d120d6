//! Constants used throughout the clinic core crate.
//!
//! File names and defaults live here so the loaders, the CLI and the REST
//! server agree on them.

/// Default data directory when none is configured.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Source file for patients.
pub const PATIENTS_FILE_NAME: &str = "patients.csv";

/// Source file for clinicians.
pub const CLINICIANS_FILE_NAME: &str = "clinicians.csv";

/// Source file for facilities.
pub const FACILITIES_FILE_NAME: &str = "facilities.csv";

/// Source file for appointments.
pub const APPOINTMENTS_FILE_NAME: &str = "appointments.csv";

/// Source file for prescriptions.
pub const PRESCRIPTIONS_FILE_NAME: &str = "prescriptions.csv";

/// Source file for referrals.
pub const REFERRALS_FILE_NAME: &str = "referrals.csv";

/// Source file for staff.
pub const STAFF_FILE_NAME: &str = "staff.csv";

/// Prefix and extension of the suggested referral letter file name.
pub const REFERRAL_LETTER_PREFIX: &str = "referral_";
pub const REFERRAL_LETTER_EXTENSION: &str = "txt";
