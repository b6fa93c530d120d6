use clap::{Parser, Subcommand};
use clinic_core::letter::{default_letter_file_name, write_referral_letter};
use clinic_core::{
    schema_variant_from_env_value, ClinicStore, CoreConfig, EntityKind, IngestService, Referral,
    DEFAULT_DATA_DIR,
};
use clinic_types::RecordId;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Clinic records CLI")]
struct Cli {
    /// Directory holding the source files (patients.csv, clinicians.csv, ...)
    #[arg(long, env = "CLINIC_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,
    /// Column layout of the source files: basic or extended
    #[arg(long, env = "CLINIC_SCHEMA_VARIANT")]
    schema_variant: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every source file and report what was accepted
    Load,
    /// List all records of a kind
    List {
        /// Entity kind (patient, clinician, facility, appointment, prescription, referral, staff)
        kind: EntityKind,
    },
    /// Show the first record of a kind with the given ID
    Find {
        /// Entity kind
        kind: EntityKind,
        /// Primary identifier
        id: RecordId,
    },
    /// Write a referral letter
    ReferralLetter {
        /// Referral ID
        id: RecordId,
        /// Output path (defaults to referral_<id>.txt)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(command) = cli.command else {
        println!("Use 'clinic --help' for commands");
        return Ok(());
    };

    let variant = schema_variant_from_env_value(cli.schema_variant)?;
    let cfg = Arc::new(CoreConfig::new(cli.data_dir, variant)?);
    let store = ClinicStore::new();
    let results = IngestService::new(Arc::clone(&cfg)).load_all(&store);

    match command {
        Commands::Load => {
            for (kind, result) in results {
                match result {
                    Ok(report) if report.rejected_lines.is_empty() => {
                        println!("{}: {} loaded", kind.plural(), report.inserted)
                    }
                    Ok(report) => println!(
                        "{}: {} loaded, rejected lines {:?}",
                        kind.plural(),
                        report.inserted,
                        report.rejected_lines
                    ),
                    Err(e) => println!("{}: not loaded ({})", kind.plural(), e),
                }
            }
        }
        Commands::List { kind } => {
            let schema = cfg.schema(kind);
            let records = store.all_records(kind);
            if records.is_empty() {
                println!("No {} found.", kind.plural());
            }
            for record in records {
                let line = record
                    .labelled_fields(&schema)
                    .into_iter()
                    .map(|(label, value)| format!("{label}: {value}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("{line}");
            }
        }
        Commands::Find { kind, id } => match store.find_record(kind, id.as_str()) {
            Some(record) => {
                for (label, value) in record.labelled_fields(&cfg.schema(kind)) {
                    println!("{label}: {value}");
                }
            }
            None => println!("No {kind} with id {id}."),
        },
        Commands::ReferralLetter { id, output } => {
            match store.find_by_key::<Referral>(id.as_str()) {
                Some(referral) => {
                    let path =
                        output.unwrap_or_else(|| PathBuf::from(default_letter_file_name(&referral)));
                    match write_referral_letter(&referral, &path) {
                        Ok(()) => println!("Wrote referral letter to {}", path.display()),
                        Err(e) => eprintln!("Error writing referral letter: {}", e),
                    }
                }
                None => println!("No {} with id {id}.", EntityKind::Referral),
            }
        }
    }

    Ok(())
}
