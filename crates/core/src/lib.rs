//! # Clinic Core
//!
//! Record ingestion and repository engine for the clinic management tools.
//!
//! This crate contains pure data operations:
//! - Quote-aware tokenizing of comma-delimited lines
//! - A schema registry describing each entity kind's column layout
//! - A generic decoder from tokenized rows to typed entities
//! - An in-memory store with one ordered repository per entity kind
//! - Ingestion of source files into the store, with per-line rejection
//! - Plain-text referral letter export
//!
//! **No presentation concerns**: command line parsing and HTTP routing belong in
//! `clinic-cli` and `clinic-run`, which call the store's query surface.

pub mod config;
pub mod constants;
pub mod decoder;
pub mod entities;
pub mod error;
pub mod ingest;
pub mod letter;
pub mod repository;
pub mod schema;
pub mod store;
pub mod tokenizer;

pub use clinic_types::{RecordId, TextError};
pub use config::{schema_variant_from_env_value, CoreConfig};
pub use constants::DEFAULT_DATA_DIR;
pub use entities::{
    AnyEntity, Appointment, Clinician, Entity, Facility, Patient, Prescription, Referral, Staff,
};
pub use error::{ClinicError, ClinicResult, RejectedRow};
pub use ingest::{IngestService, LoadReport};
pub use repository::Repository;
pub use schema::{EntityKind, FieldSpec, Schema, SchemaVariant};
pub use store::ClinicStore;
