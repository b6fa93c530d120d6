use crate::schema::EntityKind;

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("source unavailable ({source_name}): {source}")]
    SourceUnavailable {
        source_name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown entity kind: {0}")]
    UnknownEntityKind(String),
    #[error("unknown schema variant: {0}")]
    UnknownSchemaVariant(String),
    #[error("invalid {kind} record: {message}")]
    EntityShape { kind: EntityKind, message: String },
    #[error("failed to write referral letter: {0}")]
    LetterWrite(std::io::Error),
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;

/// Why a data line was not turned into an entity.
///
/// Rejections are recovered per line by the ingestion pipeline and never
/// abort a load.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectedRow {
    #[error("row has {found} fields, at least {required} required")]
    TooFewFields { found: usize, required: usize },
    #[error("row could not be mapped onto the entity: {0}")]
    Shape(String),
}
