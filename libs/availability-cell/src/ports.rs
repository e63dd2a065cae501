// libs/availability-cell/src/ports.rs
//
// Storage ports for the availability cell. A backend exposes one store type
// that implements `TxManager` plus the repository traits with the same `Tx`
// associated type, so a single transaction can span every repository call.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::Slot;

/// Errors a storage backend can surface. Callers match on the variant, never
/// on the message text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("slot not found: {0}")]
    SlotNotFound(String),
    #[error("appointment already exists for slot {0}")]
    DuplicateAppointmentForSlot(String),
    #[error("payment already exists for appointment {0}")]
    DuplicatePaymentForAppointment(String),
    #[error("storage failure: {0}")]
    Backend(String),
}

/// A unit of work. Dropping a transaction without committing discards its
/// writes and releases any row locks it holds.
#[async_trait]
pub trait Transaction: Send {
    async fn commit(self) -> Result<(), StoreError>;
    async fn rollback(self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait TxManager: Send + Sync {
    type Tx: Transaction;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// Row-locked slot access used by the booking flow. `slot_for_update` blocks
/// until the slot row is exclusively held by this transaction.
#[async_trait]
pub trait SlotLockRepository: Send + Sync {
    type Tx: Transaction;

    async fn slot_for_update(&self, tx: &mut Self::Tx, id: &str) -> Result<Slot, StoreError>;

    async fn update_slot(&self, tx: &mut Self::Tx, slot: &Slot) -> Result<(), StoreError>;
}

#[async_trait]
pub trait SlotWriteRepository: Send + Sync {
    type Tx: Transaction;

    /// Insert the given slots, skipping any whose id already exists. Returns
    /// how many were actually inserted.
    async fn create_slots(&self, tx: &mut Self::Tx, slots: &[Slot]) -> Result<usize, StoreError>;
}

#[async_trait]
pub trait SlotReadRepository: Send + Sync {
    type Tx: Transaction;

    /// Available slots for a doctor whose window lies fully inside
    /// `[from, to]`, ordered by start time, at most `limit` entries.
    async fn list_available_by_doctor(
        &self,
        tx: &mut Self::Tx,
        doctor_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Slot>, StoreError>;
}

/// Everything the availability services need from a backend, sharing one
/// transaction type.
pub trait SlotStore:
    TxManager
    + SlotWriteRepository<Tx = <Self as TxManager>::Tx>
    + SlotReadRepository<Tx = <Self as TxManager>::Tx>
{
}

impl<S> SlotStore for S where
    S: TxManager
        + SlotWriteRepository<Tx = <S as TxManager>::Tx>
        + SlotReadRepository<Tx = <S as TxManager>::Tx>
{
}
