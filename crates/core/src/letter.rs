//! Referral letter export.
//!
//! Renders a single referral as a plain-text letter that can be handed to the
//! receiving clinician. Extended-layout attributes are included only when
//! they carry a value, so letters from basic-layout data stay compact.

use crate::constants::{REFERRAL_LETTER_EXTENSION, REFERRAL_LETTER_PREFIX};
use crate::entities::Referral;
use crate::error::{ClinicError, ClinicResult};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs;
use std::path::Path;

const TITLE: &str = "REFERRAL LETTER";

/// Suggested file name for a referral's letter, e.g. `referral_R1.txt`.
pub fn default_letter_file_name(referral: &Referral) -> String {
    format!(
        "{REFERRAL_LETTER_PREFIX}{}.{REFERRAL_LETTER_EXTENSION}",
        referral.referral_id
    )
}

/// Renders the letter text for `referral`.
pub fn render_referral_letter(referral: &Referral, generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();

    out.push_str(&format!("{TITLE}\n{}\n\n", "=".repeat(TITLE.len())));
    line(&mut out, "Referral ID", &referral.referral_id);
    line(&mut out, "Date", &referral.date);
    line(&mut out, "Urgency", &referral.urgency);
    line(&mut out, "Status", &referral.status);
    line(&mut out, "Patient ID", &referral.patient_id);

    out.push_str("\nFrom\n");
    line(&mut out, "  Clinician", &referral.referring_clinician_id);
    line(&mut out, "  Facility", &referral.referring_facility_id);

    out.push_str("\nTo\n");
    line(&mut out, "  Clinician", &referral.receiving_clinician_id);
    line(&mut out, "  Facility", &referral.receiving_facility_id);

    section(&mut out, "Reason for Referral", &referral.referral_reason);
    let summary = if referral.clinical_summary.is_empty() {
        "(none recorded)"
    } else {
        referral.clinical_summary.as_str()
    };
    section(&mut out, "Clinical Summary", summary);
    section(
        &mut out,
        "Requested Investigations",
        &referral.requested_investigations,
    );

    if !referral.appointment_id.is_empty() || !referral.notes.is_empty() {
        out.push('\n');
        if !referral.appointment_id.is_empty() {
            line(&mut out, "Linked Appointment", &referral.appointment_id);
        }
        if !referral.notes.is_empty() {
            line(&mut out, "Notes", &referral.notes);
        }
    }

    out.push_str(&format!(
        "\nGenerated: {}\n",
        generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));

    out
}

/// Writes the letter for `referral` to `path`, stamped with the current time.
///
/// # Errors
///
/// Returns `ClinicError::LetterWrite` if the file cannot be written.
pub fn write_referral_letter(referral: &Referral, path: &Path) -> ClinicResult<()> {
    let text = render_referral_letter(referral, Utc::now());
    fs::write(path, text).map_err(ClinicError::LetterWrite)?;
    tracing::info!(
        referral_id = %referral.referral_id,
        "wrote referral letter to {}",
        path.display()
    );
    Ok(())
}

fn line(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!("{label}: {value}\n"));
}

fn section(out: &mut String, heading: &str, body: &str) {
    if body.is_empty() {
        return;
    }
    out.push_str(&format!(
        "\n{heading}\n{}\n{body}\n",
        "-".repeat(heading.len())
    ));
}
