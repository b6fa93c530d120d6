//! Ingestion pipeline: delimited source files into the store.
//!
//! Per source:
//! - the first line is a header and is always discarded
//! - data lines are read until the first blank line or end of input
//! - each line is tokenized and decoded; rejected lines are logged and skipped
//! - accepted entities are committed with one `extend` once reading stops
//!
//! A source that cannot be opened or read fails that load only, and leaves
//! the repository as it was. Loads of different kinds are independent.

use crate::config::CoreConfig;
use crate::decoder::decode;
use crate::entities::{with_kind, Entity};
use crate::error::{ClinicError, ClinicResult};
use crate::schema::{EntityKind, Schema};
use crate::store::{ClinicStore, RepositoryFor};
use crate::tokenizer::tokenize_line;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

/// Outcome of loading one source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadReport {
    pub kind: EntityKind,
    pub source: String,
    pub inserted: usize,
    /// 1-based physical line numbers (the header is line 1).
    pub rejected_lines: Vec<usize>,
}

/// Loads entities of type `E` from `reader` into `store`.
///
/// # Errors
///
/// Returns `ClinicError::SourceUnavailable` if reading fails at any point; in
/// that case nothing from this source is inserted. Bytes that are not valid
/// UTF-8 are not a read failure: they decode to U+FFFD and the line is
/// processed like any other.
pub fn load<E, R>(
    store: &ClinicStore,
    schema: &Schema,
    mut reader: R,
    source_name: &str,
) -> ClinicResult<LoadReport>
where
    E: Entity,
    R: BufRead,
    ClinicStore: RepositoryFor<E>,
{
    let unavailable = |source: io::Error| ClinicError::SourceUnavailable {
        source_name: source_name.to_owned(),
        source,
    };

    let mut report = LoadReport {
        kind: E::KIND,
        source: source_name.to_owned(),
        inserted: 0,
        rejected_lines: Vec::new(),
    };

    let mut buf = Vec::new();
    if read_line_lossy(&mut reader, &mut buf)
        .map_err(&unavailable)?
        .is_none()
    {
        tracing::debug!(kind = %E::KIND, source = source_name, "source is empty");
        return Ok(report);
    }

    let mut accepted = Vec::new();
    let mut line_number = 1;
    while let Some(line) = read_line_lossy(&mut reader, &mut buf).map_err(&unavailable)? {
        line_number += 1;

        if line.trim().is_empty() {
            tracing::debug!(
                kind = %E::KIND,
                source = source_name,
                line = line_number,
                "blank line ends the source"
            );
            break;
        }

        let fields = tokenize_line(&line);
        match decode::<E>(schema, &fields) {
            Ok(entity) => accepted.push(entity),
            Err(rejection) => {
                tracing::warn!(
                    kind = %E::KIND,
                    source = source_name,
                    line = line_number,
                    "skipping row: {}",
                    rejection
                );
                report.rejected_lines.push(line_number);
            }
        }
    }

    report.inserted = accepted.len();
    store.extend(accepted);

    Ok(report)
}

/// Reads one line, decoding invalid UTF-8 lossily and dropping the line ending.
///
/// Returns `None` at end of input.
fn read_line_lossy<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    if buf.ends_with(b"\n") {
        buf.pop();
        if buf.ends_with(b"\r") {
            buf.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// Opens `path` and loads it with [`load`].
pub fn load_path<E>(store: &ClinicStore, schema: &Schema, path: &Path) -> ClinicResult<LoadReport>
where
    E: Entity,
    ClinicStore: RepositoryFor<E>,
{
    let source_name = path.display().to_string();
    let file = File::open(path).map_err(|source| ClinicError::SourceUnavailable {
        source_name: source_name.clone(),
        source,
    })?;

    load::<E, _>(store, schema, BufReader::new(file), &source_name)
}

/// Runtime-kind form of [`load`]; the schema's kind selects the entity type.
pub fn load_kind_from_reader<R: BufRead>(
    store: &ClinicStore,
    schema: &Schema,
    reader: R,
    source_name: &str,
) -> ClinicResult<LoadReport> {
    with_kind!(schema.kind, E => load::<E, R>(store, schema, reader, source_name))
}

/// Loads source files from the configured data directory.
#[derive(Clone, Debug)]
pub struct IngestService {
    cfg: Arc<CoreConfig>,
}

impl IngestService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Loads the source file for `kind` using the configured schema variant.
    pub fn load_kind(&self, store: &ClinicStore, kind: EntityKind) -> ClinicResult<LoadReport> {
        let schema = self.cfg.schema(kind);
        let path = self.cfg.source_path(kind);
        with_kind!(kind, E => load_path::<E>(store, &schema, &path))
    }

    /// Loads every kind. A failure for one kind is logged and returned in its
    /// slot; the remaining kinds are still loaded.
    pub fn load_all(&self, store: &ClinicStore) -> Vec<(EntityKind, ClinicResult<LoadReport>)> {
        EntityKind::ALL
            .into_iter()
            .map(|kind| {
                let result = self.load_kind(store, kind);
                match &result {
                    Ok(report) => tracing::info!(
                        kind = %kind,
                        inserted = report.inserted,
                        rejected = report.rejected_lines.len(),
                        "loaded {}",
                        report.source
                    ),
                    Err(e) => tracing::error!(kind = %kind, "load failed: {}", e),
                }
                (kind, result)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Appointment, Patient, Referral};
    use crate::schema::SchemaVariant;
    use std::fs;
    use std::io::{Cursor, Read};
    use tempfile::TempDir;

    const PATIENT_HEADER: &str = "Patient ID,First Name,Last Name,DOB,Gender,NHS Number,Email,Phone,Address,GP Surgery";

    fn patient_schema() -> Schema {
        Schema::of(EntityKind::Patient, SchemaVariant::Basic)
    }

    fn patient_row(id: &str, first: &str, last: &str) -> String {
        format!("{id},{first},{last},1980-01-01,F,4857773456,{first}@example.org,07700 900000,\"2 Mill Lane, York\",Riverside")
    }

    fn load_patients(store: &ClinicStore, text: &str) -> ClinicResult<LoadReport> {
        load::<Patient, _>(store, &patient_schema(), Cursor::new(text.to_owned()), "patients.csv")
    }

    fn ids(store: &ClinicStore) -> Vec<String> {
        store
            .all::<Patient>()
            .into_iter()
            .map(|p| p.patient_id)
            .collect()
    }

    #[test]
    fn loads_data_lines_in_order() {
        let text = format!(
            "{PATIENT_HEADER}\n{}\n{}\n",
            patient_row("P1", "John", "Doe"),
            patient_row("P2", "Jane", "Roe")
        );
        let store = ClinicStore::new();

        let report = load_patients(&store, &text).expect("load succeeds");

        assert_eq!(report.inserted, 2);
        assert!(report.rejected_lines.is_empty());
        assert_eq!(ids(&store), vec!["P1", "P2"]);
        let first = store.find_by_key::<Patient>("P1").unwrap();
        assert_eq!(first.first_name, "John");
        assert_eq!(first.address, "2 Mill Lane, York");
    }

    #[test]
    fn header_is_never_decoded() {
        // a header with enough columns would decode fine if it were treated as data
        let text = format!("{}\n{}\n", patient_row("HDR", "x", "y"), patient_row("P1", "a", "b"));
        let store = ClinicStore::new();

        load_patients(&store, &text).unwrap();

        assert_eq!(ids(&store), vec!["P1"]);
    }

    #[test]
    fn short_rows_are_skipped_and_loading_continues() {
        let text = format!(
            "{PATIENT_HEADER}\nP0,Too,Short\n{}\nP9\n{}\n",
            patient_row("P1", "John", "Doe"),
            patient_row("P2", "Jane", "Roe")
        );
        let store = ClinicStore::new();

        let report = load_patients(&store, &text).unwrap();

        assert_eq!(report.inserted, 2);
        assert_eq!(report.rejected_lines, vec![2, 4]);
        assert_eq!(ids(&store), vec!["P1", "P2"]);
    }

    #[test]
    fn blank_line_stops_ingestion() {
        let text = format!(
            "{PATIENT_HEADER}\n{}\n   \n{}\n",
            patient_row("P1", "John", "Doe"),
            patient_row("P2", "Jane", "Roe")
        );
        let store = ClinicStore::new();

        let report = load_patients(&store, &text).unwrap();

        assert_eq!(report.inserted, 1);
        assert_eq!(ids(&store), vec!["P1"]);
    }

    #[test]
    fn empty_source_and_header_only_source_insert_nothing() {
        let store = ClinicStore::new();

        assert_eq!(load_patients(&store, "").unwrap().inserted, 0);
        assert_eq!(load_patients(&store, PATIENT_HEADER).unwrap().inserted, 0);
        assert!(store.all::<Patient>().is_empty());
    }

    #[test]
    fn handles_crlf_line_endings() {
        let text = format!("{PATIENT_HEADER}\r\n{}\r\n", patient_row("P1", "John", "Doe"));
        let store = ClinicStore::new();

        load_patients(&store, &text).unwrap();

        assert_eq!(store.find_by_key::<Patient>("P1").unwrap().gp_surgery, "Riverside");
    }

    #[test]
    fn invalid_utf8_line_is_decoded_lossily_and_loading_continues() {
        let mut bytes = format!("{PATIENT_HEADER}\n{}\n", patient_row("P1", "John", "Doe")).into_bytes();
        // Latin-1 "René"
        bytes.extend_from_slice(b"P2,Ren\xe9,Roe,1975-05-05,M,1,r@x.org,0,Addr,Riverside\n");
        bytes.extend_from_slice(format!("{}\n", patient_row("P3", "Amy", "Lee")).as_bytes());
        let store = ClinicStore::new();

        let report = load::<Patient, _>(&store, &patient_schema(), Cursor::new(bytes), "latin1.csv")
            .expect("bad bytes do not fail the source");

        assert_eq!(report.inserted, 3);
        assert!(report.rejected_lines.is_empty());
        assert_eq!(ids(&store), vec!["P1", "P2", "P3"]);
        assert_eq!(
            store.find_by_key::<Patient>("P2").unwrap().first_name,
            "Ren\u{FFFD}"
        );
    }

    #[test]
    fn extended_layout_places_columns_by_extended_order() {
        let store = ClinicStore::new();
        let schema = Schema::of(EntityKind::Referral, SchemaVariant::Extended);
        let text = "header\n\
            R1,P1,C1,C2,F1,F2,2025-03-01,Urgent,Suspected angina,\"Chest pain, recurrent\",ECG,Accepted,A9,Call first,2025-03-01,2025-03-02\n";

        let report = load::<Referral, _>(&store, &schema, Cursor::new(text), "referrals.csv").unwrap();

        assert_eq!(report.inserted, 1);
        let referral = store.find_by_key::<Referral>("R1").unwrap();
        assert_eq!(referral.referral_reason, "Suspected angina");
        assert_eq!(referral.clinical_summary, "Chest pain, recurrent");
        assert_eq!(referral.requested_investigations, "ECG");
        assert_eq!(referral.status, "Accepted");
        assert_eq!(referral.appointment_id, "A9");
        assert_eq!(referral.last_updated, "2025-03-02");
    }

    #[test]
    fn extended_layout_rejects_basic_length_rows() {
        let store = ClinicStore::new();
        let schema = Schema::of(EntityKind::Appointment, SchemaVariant::Extended);
        let text = "header\n\
            A1,P1,C1,F1,2025-09-20,09:00,Scheduled,Checkup,\n\
            A2,P1,C1,F1,2025-09-21,10:00,15,Routine,Scheduled,Checkup,,2025-09-01,2025-09-01\n";

        let report =
            load::<Appointment, _>(&store, &schema, Cursor::new(text), "appointments.csv").unwrap();

        assert_eq!(report.rejected_lines, vec![2]);
        assert_eq!(report.inserted, 1);
        let appt = store.find_by_key::<Appointment>("A2").unwrap();
        assert_eq!(appt.duration_minutes, "15");
        assert_eq!(appt.appointment_type, "Routine");
        assert_eq!(appt.status, "Scheduled");
    }

    #[test]
    fn bundled_sample_data_loads_cleanly_with_the_default_layout() {
        let data_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data");
        let cfg = CoreConfig::new(data_dir, SchemaVariant::default()).unwrap();
        let store = ClinicStore::new();

        for (kind, result) in IngestService::new(Arc::new(cfg)).load_all(&store) {
            let report = result.unwrap_or_else(|e| panic!("{kind}: {e}"));
            assert!(report.inserted > 0, "{kind}");
            assert!(report.rejected_lines.is_empty(), "{kind}: {:?}", report.rejected_lines);
        }

        let referral = store.find_by_key::<Referral>("R001").unwrap();
        assert_eq!(referral.urgency, "Urgent");
        assert_eq!(
            referral.clinical_summary,
            "Intermittent chest tightness on exertion, 3 weeks"
        );
    }

    /// Yields its data, then fails instead of reporting end of input.
    struct FailingReader(Cursor<Vec<u8>>);

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.read(buf)? {
                0 => Err(io::Error::other("device went away")),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn read_failure_part_way_leaves_repository_unchanged() {
        let store = ClinicStore::new();
        store.add(Patient {
            patient_id: "P0".into(),
            ..Default::default()
        });
        let text = format!("{PATIENT_HEADER}\n{}\n", patient_row("P1", "John", "Doe"));
        let reader = BufReader::new(FailingReader(Cursor::new(text.into_bytes())));

        let err = load::<Patient, _>(&store, &patient_schema(), reader, "flaky.csv")
            .expect_err("read error surfaces");

        match err {
            ClinicError::SourceUnavailable { source_name, .. } => {
                assert_eq!(source_name, "flaky.csv")
            }
            other => panic!("expected SourceUnavailable, got {other:?}"),
        }
        assert_eq!(ids(&store), vec!["P0"]);
    }

    #[test]
    fn runtime_kind_loader_uses_the_schema_kind() {
        let store = ClinicStore::new();
        let schema = Schema::of(EntityKind::Referral, SchemaVariant::Basic);
        let text = "header\nR1,P1,C1,C2,F1,F2,2025-03-01,Urgent,\"Chest pain, recurrent\",Pending\n";

        let report =
            load_kind_from_reader(&store, &schema, Cursor::new(text), "referrals.csv").unwrap();

        assert_eq!(report.kind, EntityKind::Referral);
        let referral = store.find_by_key::<Referral>("R1").unwrap();
        assert_eq!(referral.clinical_summary, "Chest pain, recurrent");
        assert_eq!(referral.status, "Pending");
    }

    #[test]
    fn missing_file_fails_only_that_kind() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("patients.csv"),
            format!("{PATIENT_HEADER}\n{}\n", patient_row("P1", "John", "Doe")),
        )
        .unwrap();
        fs::write(
            dir.path().join("staff.csv"),
            "Staff ID,First Name,Last Name,Role,Facility ID,Email,Phone\nS1,Amy,Lee,Nurse,F1,a@x.org,0100\n",
        )
        .unwrap();

        let cfg = CoreConfig::new(dir.path().to_path_buf(), SchemaVariant::Basic).unwrap();
        let service = IngestService::new(Arc::new(cfg));
        let store = ClinicStore::new();

        let results = service.load_all(&store);

        assert_eq!(results.len(), 7);
        for (kind, result) in &results {
            match kind {
                EntityKind::Patient | EntityKind::Staff => {
                    assert_eq!(result.as_ref().unwrap().inserted, 1, "{kind}")
                }
                _ => assert!(
                    matches!(result, Err(ClinicError::SourceUnavailable { .. })),
                    "{kind}"
                ),
            }
        }
        assert_eq!(store.count(EntityKind::Patient), 1);
        assert_eq!(store.count(EntityKind::Staff), 1);
    }

    #[test]
    fn load_path_reports_open_failure() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.csv");
        let store = ClinicStore::new();

        let err = load_path::<Patient>(&store, &patient_schema(), &missing).expect_err("missing");

        assert!(matches!(err, ClinicError::SourceUnavailable { .. }));
        assert!(err.to_string().contains("nope.csv"));
    }
}
