//! Process-wide store holding one repository per entity kind.
//!
//! Each repository sits behind its own `RwLock`. Mutations take the write
//! lock; point lookups and snapshots take the read lock. Snapshots are owned
//! copies and do not follow later mutations.

use crate::entities::{
    with_kind, AnyEntity, Appointment, Clinician, Entity, Facility, Patient, Prescription,
    Referral, Staff,
};
use crate::repository::Repository;
use crate::schema::EntityKind;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Access to the repository slot for entity type `E`.
pub trait RepositoryFor<E: Entity> {
    fn slot(&self) -> &RwLock<Repository<E>>;
}

#[derive(Debug, Default)]
pub struct ClinicStore {
    patients: RwLock<Repository<Patient>>,
    clinicians: RwLock<Repository<Clinician>>,
    facilities: RwLock<Repository<Facility>>,
    appointments: RwLock<Repository<Appointment>>,
    prescriptions: RwLock<Repository<Prescription>>,
    referrals: RwLock<Repository<Referral>>,
    staff: RwLock<Repository<Staff>>,
}

macro_rules! slots {
    ($($ty:ident => $field:ident),* $(,)?) => {
        $(
            impl RepositoryFor<$ty> for ClinicStore {
                fn slot(&self) -> &RwLock<Repository<$ty>> {
                    &self.$field
                }
            }
        )*
    };
}

slots! {
    Patient => patients,
    Clinician => clinicians,
    Facility => facilities,
    Appointment => appointments,
    Prescription => prescriptions,
    Referral => referrals,
    Staff => staff,
}

// Poison is ignored: every mutation is a single Vec operation on plain values.
fn read<E: Entity>(lock: &RwLock<Repository<E>>) -> RwLockReadGuard<'_, Repository<E>> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<E: Entity>(lock: &RwLock<Repository<E>>) -> RwLockWriteGuard<'_, Repository<E>> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl ClinicStore {
    /// Creates a store with every repository empty.
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // TYPED SURFACE
    // ========================================================================

    /// Snapshot of every `E`, in insertion order.
    pub fn all<E: Entity>(&self) -> Vec<E>
    where
        Self: RepositoryFor<E>,
    {
        read(RepositoryFor::<E>::slot(self)).all().to_vec()
    }

    pub fn add<E: Entity>(&self, entity: E)
    where
        Self: RepositoryFor<E>,
    {
        write(RepositoryFor::<E>::slot(self)).insert(entity);
    }

    /// Appends all `entities` under one write lock.
    pub fn extend<E: Entity>(&self, entities: impl IntoIterator<Item = E>)
    where
        Self: RepositoryFor<E>,
    {
        write(RepositoryFor::<E>::slot(self)).extend(entities);
    }

    /// Removes every `E` with primary identifier `id`; `true` if any were removed.
    pub fn delete_by_key<E: Entity>(&self, id: &str) -> bool
    where
        Self: RepositoryFor<E>,
    {
        write(RepositoryFor::<E>::slot(self)).delete_by_key(id) > 0
    }

    /// First `E` with primary identifier `id`.
    pub fn find_by_key<E: Entity>(&self, id: &str) -> Option<E>
    where
        Self: RepositoryFor<E>,
    {
        read(RepositoryFor::<E>::slot(self)).find_by_key(id).cloned()
    }

    /// Replaces every `E` keyed `id` with `entity`, appended at the end.
    ///
    /// The delete and insert happen under one write lock. `entity` is inserted
    /// even when nothing matched; the return value reports whether anything
    /// was replaced.
    pub fn update<E: Entity>(&self, id: &str, entity: E) -> bool
    where
        Self: RepositoryFor<E>,
    {
        let mut repo = write(RepositoryFor::<E>::slot(self));
        let removed = repo.delete_by_key(id);
        repo.insert(entity);
        removed > 0
    }

    pub fn len<E: Entity>(&self) -> usize
    where
        Self: RepositoryFor<E>,
    {
        read(RepositoryFor::<E>::slot(self)).len()
    }

    // ========================================================================
    // RUNTIME-KIND SURFACE
    // ========================================================================

    pub fn all_records(&self, kind: EntityKind) -> Vec<AnyEntity> {
        with_kind!(kind, E => self.all::<E>().into_iter().map(AnyEntity::from).collect())
    }

    pub fn add_record(&self, entity: AnyEntity) {
        match entity {
            AnyEntity::Patient(e) => self.add(e),
            AnyEntity::Clinician(e) => self.add(e),
            AnyEntity::Facility(e) => self.add(e),
            AnyEntity::Appointment(e) => self.add(e),
            AnyEntity::Prescription(e) => self.add(e),
            AnyEntity::Referral(e) => self.add(e),
            AnyEntity::Staff(e) => self.add(e),
        }
    }

    pub fn delete_record(&self, kind: EntityKind, id: &str) -> bool {
        with_kind!(kind, E => self.delete_by_key::<E>(id))
    }

    pub fn find_record(&self, kind: EntityKind, id: &str) -> Option<AnyEntity> {
        with_kind!(kind, E => self.find_by_key::<E>(id).map(AnyEntity::from))
    }

    /// Runtime-kind form of [`ClinicStore::update`]; the replacement's kind
    /// selects the repository.
    pub fn update_record(&self, id: &str, entity: AnyEntity) -> bool {
        match entity {
            AnyEntity::Patient(e) => self.update(id, e),
            AnyEntity::Clinician(e) => self.update(id, e),
            AnyEntity::Facility(e) => self.update(id, e),
            AnyEntity::Appointment(e) => self.update(id, e),
            AnyEntity::Prescription(e) => self.update(id, e),
            AnyEntity::Referral(e) => self.update(id, e),
            AnyEntity::Staff(e) => self.update(id, e),
        }
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        with_kind!(kind, E => self.len::<E>())
    }
}
