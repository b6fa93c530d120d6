//! Entity value types, one per record category.
//!
//! Entities are immutable once constructed: the store hands out clones and an
//! update is a delete followed by an insert. Every attribute is opaque text;
//! dates, phone numbers and status codes are never interpreted.
//!
//! Each struct carries the union of the basic and extended column layouts.
//! Attributes a layout does not provide stay empty.

use crate::error::{ClinicError, ClinicResult};
use crate::schema::{EntityKind, Schema};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A record type held by the store.
pub trait Entity:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: EntityKind;

    /// The identifier used by find-by-key and delete-by-key.
    fn primary_id(&self) -> &str;
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Patient {
    pub patient_id: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub nhs_number: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub gp_surgery: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Clinician {
    pub clinician_id: String,
    pub first_name: String,
    pub last_name: String,
    pub qualification: String,
    pub specialty: String,
    pub workplace: String,
    pub email: String,
    pub phone: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Facility {
    pub facility_id: String,
    pub name: String,
    pub facility_type: String,
    pub address: String,
    pub postcode: String,
    pub phone: String,
    pub email: String,
    pub opening_hours: String,
    pub manager: String,
    pub services: String,
    pub capacity: String,
}

/// A booked appointment.
///
/// `patient_id`, `clinician_id` and `facility_id` are copied verbatim from the
/// source and are not checked against the other repositories.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Appointment {
    pub appointment_id: String,
    pub patient_id: String,
    pub clinician_id: String,
    pub facility_id: String,
    pub date: String,
    pub time: String,
    pub duration_minutes: String,
    pub appointment_type: String,
    pub status: String,
    pub reason: String,
    pub notes: String,
    pub created_date: String,
    pub last_modified: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Prescription {
    pub prescription_id: String,
    pub patient_id: String,
    pub clinician_id: String,
    pub appointment_id: String,
    pub medication: String,
    pub dosage: String,
    pub frequency: String,
    pub duration_days: String,
    pub quantity: String,
    pub pharmacy: String,
    pub date_prescribed: String,
    pub issue_date: String,
    pub collection_date: String,
    pub collection_status: String,
    pub notes: String,
}

/// A referral from one clinician/facility to another.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Referral {
    pub referral_id: String,
    pub patient_id: String,
    pub referring_clinician_id: String,
    pub receiving_clinician_id: String,
    pub referring_facility_id: String,
    pub receiving_facility_id: String,
    pub date: String,
    pub urgency: String,
    pub referral_reason: String,
    pub clinical_summary: String,
    pub requested_investigations: String,
    pub status: String,
    pub appointment_id: String,
    pub notes: String,
    pub created_date: String,
    pub last_updated: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Staff {
    pub staff_id: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub department: String,
    pub facility_id: String,
    pub email: String,
    pub phone: String,
    pub employment_status: String,
    pub start_date: String,
    pub line_manager: String,
    pub access_level: String,
}

/// An entity of any kind, for callers that pick the kind at runtime.
///
/// Serialises as the wrapped entity's plain object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AnyEntity {
    Patient(Patient),
    Clinician(Clinician),
    Facility(Facility),
    Appointment(Appointment),
    Prescription(Prescription),
    Referral(Referral),
    Staff(Staff),
}

macro_rules! entity_kinds {
    ($($variant:ident => $id:ident),* $(,)?) => {
        $(
            impl Entity for $variant {
                const KIND: EntityKind = EntityKind::$variant;

                fn primary_id(&self) -> &str {
                    &self.$id
                }
            }

            impl From<$variant> for AnyEntity {
                fn from(entity: $variant) -> Self {
                    AnyEntity::$variant(entity)
                }
            }
        )*

        impl AnyEntity {
            pub fn kind(&self) -> EntityKind {
                match self {
                    $(AnyEntity::$variant(_) => EntityKind::$variant,)*
                }
            }

            pub fn primary_id(&self) -> &str {
                match self {
                    $(AnyEntity::$variant(e) => e.primary_id(),)*
                }
            }

            /// Builds an entity of `kind` from a JSON object keyed by field name.
            ///
            /// Missing fields default to `""`; unknown fields and non-string
            /// values are rejected.
            pub fn from_json(kind: EntityKind, value: serde_json::Value) -> ClinicResult<Self> {
                match kind {
                    $(EntityKind::$variant => serde_json::from_value::<$variant>(value)
                        .map(AnyEntity::$variant)
                        .map_err(|e| ClinicError::EntityShape {
                            kind,
                            message: e.to_string(),
                        }),)*
                }
            }
        }
    };
}

entity_kinds! {
    Patient => patient_id,
    Clinician => clinician_id,
    Facility => facility_id,
    Appointment => appointment_id,
    Prescription => prescription_id,
    Referral => referral_id,
    Staff => staff_id,
}

/// Runs `$body` with `$ty` aliased to the entity type for `$kind`.
macro_rules! with_kind {
    ($kind:expr, $ty:ident => $body:expr) => {
        match $kind {
            $crate::schema::EntityKind::Patient => {
                type $ty = $crate::entities::Patient;
                $body
            }
            $crate::schema::EntityKind::Clinician => {
                type $ty = $crate::entities::Clinician;
                $body
            }
            $crate::schema::EntityKind::Facility => {
                type $ty = $crate::entities::Facility;
                $body
            }
            $crate::schema::EntityKind::Appointment => {
                type $ty = $crate::entities::Appointment;
                $body
            }
            $crate::schema::EntityKind::Prescription => {
                type $ty = $crate::entities::Prescription;
                $body
            }
            $crate::schema::EntityKind::Referral => {
                type $ty = $crate::entities::Referral;
                $body
            }
            $crate::schema::EntityKind::Staff => {
                type $ty = $crate::entities::Staff;
                $body
            }
        }
    };
}

pub(crate) use with_kind;

impl AnyEntity {
    /// Pairs each column label of `schema` with this entity's value for it.
    pub fn labelled_fields(&self, schema: &Schema) -> Vec<(&'static str, String)> {
        let object = match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };

        schema
            .fields
            .iter()
            .map(|f| {
                let value = object
                    .get(f.key)
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_owned();
                (f.label, value)
            })
            .collect()
    }
}
