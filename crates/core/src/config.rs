//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core
//! services. The core never reads environment variables itself; binaries do
//! that and hand the raw values to the helpers here.

use crate::error::{ClinicError, ClinicResult};
use crate::schema::{EntityKind, Schema, SchemaVariant};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    schema_variant: SchemaVariant,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// The data directory is not required to exist yet; missing source files
    /// are reported per kind when loading.
    pub fn new(data_dir: PathBuf, schema_variant: SchemaVariant) -> ClinicResult<Self> {
        if data_dir.as_os_str().is_empty() {
            return Err(ClinicError::InvalidInput(
                "data directory cannot be empty".into(),
            ));
        }

        Ok(Self {
            data_dir,
            schema_variant,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn schema_variant(&self) -> SchemaVariant {
        self.schema_variant
    }

    /// Path of the source file for `kind`.
    pub fn source_path(&self, kind: EntityKind) -> PathBuf {
        self.data_dir.join(kind.file_name())
    }

    /// Schema for `kind` under the configured variant.
    pub fn schema(&self, kind: EntityKind) -> Schema {
        Schema::of(kind, self.schema_variant)
    }
}

/// Parse the schema variant from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default (extended) variant.
pub fn schema_variant_from_env_value(value: Option<String>) -> ClinicResult<SchemaVariant> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value.map(|v| v.parse::<SchemaVariant>()).transpose()?;

    Ok(parsed.unwrap_or_default())
}
