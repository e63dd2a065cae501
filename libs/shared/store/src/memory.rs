// libs/shared/store/src/memory.rs
//
// In-memory backend implementing the availability and booking storage ports.
// Committed rows live behind a std mutex that is only held for short
// synchronous sections. Row-level slot locks are tokio mutexes so a booking
// transaction can block on a contended slot without holding the state lock.
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use availability_cell::models::{Slot, SlotStatus};
use availability_cell::ports::{
    SlotLockRepository, SlotReadRepository, SlotWriteRepository, StoreError, Transaction,
    TxManager,
};
use booking_cell::models::{Appointment, Payment};
use booking_cell::ports::{AppointmentRepository, PatientDirectory, PaymentRepository};

#[derive(Debug, Clone)]
struct PatientRecord {
    active: bool,
}

#[derive(Default)]
struct State {
    patients: HashMap<String, PatientRecord>,
    slots: HashMap<String, Slot>,
    appointments: HashMap<String, Appointment>,
    payments: HashMap<String, Payment>,
    // Uniqueness indexes mirroring the unique constraints a relational
    // backend would enforce.
    appointment_slots: HashSet<String>,
    payment_appointments: HashSet<String>,
    // Slot ids staged by transactions that have not committed yet. Reserving
    // at staging time keeps the created count returned by `create_slots`
    // equal to the rows the commit actually inserts.
    pending_slot_ids: HashSet<String>,
}

struct Inner {
    state: Mutex<State>,
    slot_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot_lock(&self, id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .slot_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            locks
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        )
    }
}

#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                slot_locks: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Seed a patient record outside any transaction.
    pub fn insert_patient(&self, id: &str, active: bool) {
        self.inner
            .state()
            .patients
            .insert(id.to_string(), PatientRecord { active });
    }

    /// Seed or overwrite a slot outside any transaction.
    pub fn insert_slot(&self, slot: Slot) {
        self.inner
            .state()
            .slots
            .insert(slot.id().to_string(), slot);
    }

    pub fn slot(&self, id: &str) -> Option<Slot> {
        self.inner.state().slots.get(id).cloned()
    }

    pub fn appointment(&self, id: &str) -> Option<Appointment> {
        self.inner.state().appointments.get(id).cloned()
    }

    pub fn payment(&self, id: &str) -> Option<Payment> {
        self.inner.state().payments.get(id).cloned()
    }

    pub fn appointment_count(&self) -> usize {
        self.inner.state().appointments.len()
    }

    pub fn payment_count(&self) -> usize {
        self.inner.state().payments.len()
    }

    pub fn slot_count(&self) -> usize {
        self.inner.state().slots.len()
    }
}

/// Buffered writes for one unit of work. Nothing is visible to other
/// transactions until `commit`; dropping the value releases any slot locks
/// and discards the buffer.
pub struct MemoryTx {
    inner: Arc<Inner>,
    updated_slots: HashMap<String, Slot>,
    new_slots: Vec<Slot>,
    new_appointments: Vec<Appointment>,
    new_payments: Vec<Payment>,
    // Ids this transaction holds in `State::pending_slot_ids`. Released on
    // drop, whether the transaction commits or is abandoned.
    reserved_slot_ids: Vec<String>,
    // Held row locks. Freed on drop, so an abandoned transaction cannot
    // wedge a slot.
    slot_guards: Vec<OwnedMutexGuard<()>>,
}

impl MemoryTx {
    fn staged_slot(&self, id: &str) -> Option<&Slot> {
        self.updated_slots
            .get(id)
            .or_else(|| self.new_slots.iter().find(|s| s.id() == id))
    }

    fn has_slot_id(&self, id: &str) -> bool {
        self.staged_slot(id).is_some()
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        if !self.reserved_slot_ids.is_empty() {
            let mut state = self.inner.state();
            for id in self.reserved_slot_ids.drain(..) {
                state.pending_slot_ids.remove(&id);
            }
        }
    }
}

#[async_trait]
impl Transaction for MemoryTx {
    async fn commit(mut self) -> Result<(), StoreError> {
        {
            let mut state = self.inner.state();

            // Re-check uniqueness before merging. The slot row lock already
            // serializes bookings of the same slot, so hitting these is the
            // in-memory equivalent of a unique constraint violation.
            for appointment in &self.new_appointments {
                if state.appointment_slots.contains(appointment.slot_id()) {
                    return Err(StoreError::DuplicateAppointmentForSlot(
                        appointment.slot_id().to_string(),
                    ));
                }
            }
            for payment in &self.new_payments {
                if state.payment_appointments.contains(payment.appointment_id()) {
                    return Err(StoreError::DuplicatePaymentForAppointment(
                        payment.appointment_id().to_string(),
                    ));
                }
            }

            for (id, slot) in self.updated_slots.drain() {
                state.slots.insert(id, slot);
            }
            for slot in self.new_slots.drain(..) {
                // Staging reserved these ids, so no concurrent transaction
                // can have inserted them in the meantime.
                state.slots.insert(slot.id().to_string(), slot);
            }
            for appointment in self.new_appointments.drain(..) {
                state
                    .appointment_slots
                    .insert(appointment.slot_id().to_string());
                state
                    .appointments
                    .insert(appointment.id().to_string(), appointment);
            }
            for payment in self.new_payments.drain(..) {
                state
                    .payment_appointments
                    .insert(payment.appointment_id().to_string());
                state.payments.insert(payment.id().to_string(), payment);
            }
        }

        self.slot_guards.clear();
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        // Dropping self discards the buffers and releases the guards.
        Ok(())
    }
}

#[async_trait]
impl TxManager for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, StoreError> {
        Ok(MemoryTx {
            inner: Arc::clone(&self.inner),
            updated_slots: HashMap::new(),
            new_slots: Vec::new(),
            new_appointments: Vec::new(),
            new_payments: Vec::new(),
            reserved_slot_ids: Vec::new(),
            slot_guards: Vec::new(),
        })
    }
}

#[async_trait]
impl SlotLockRepository for MemoryStore {
    type Tx = MemoryTx;

    async fn slot_for_update(&self, tx: &mut MemoryTx, id: &str) -> Result<Slot, StoreError> {
        // Take the row lock before reading so the returned snapshot cannot
        // go stale under this transaction. Re-locking the same slot within
        // one transaction is not supported.
        let lock = self.inner.slot_lock(id);
        let guard = lock.lock_owned().await;
        tx.slot_guards.push(guard);
        debug!(slot_id = %id, "slot row locked");

        if let Some(slot) = tx.staged_slot(id) {
            return Ok(slot.clone());
        }
        self.inner
            .state()
            .slots
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::SlotNotFound(id.to_string()))
    }

    async fn update_slot(&self, tx: &mut MemoryTx, slot: &Slot) -> Result<(), StoreError> {
        let exists = tx.has_slot_id(slot.id()) || self.inner.state().slots.contains_key(slot.id());
        if !exists {
            return Err(StoreError::SlotNotFound(slot.id().to_string()));
        }
        tx.updated_slots.insert(slot.id().to_string(), slot.clone());
        Ok(())
    }
}

#[async_trait]
impl SlotWriteRepository for MemoryStore {
    type Tx = MemoryTx;

    async fn create_slots(&self, tx: &mut MemoryTx, slots: &[Slot]) -> Result<usize, StoreError> {
        let mut created = 0;
        {
            let mut state = self.inner.state();
            for slot in slots {
                if state.slots.contains_key(slot.id())
                    || state.pending_slot_ids.contains(slot.id())
                    || tx.has_slot_id(slot.id())
                {
                    continue;
                }
                state.pending_slot_ids.insert(slot.id().to_string());
                tx.reserved_slot_ids.push(slot.id().to_string());
                tx.new_slots.push(slot.clone());
                created += 1;
            }
        }
        Ok(created)
    }
}

#[async_trait]
impl SlotReadRepository for MemoryStore {
    type Tx = MemoryTx;

    async fn list_available_by_doctor(
        &self,
        tx: &mut MemoryTx,
        doctor_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Slot>, StoreError> {
        let mut slots: Vec<Slot> = {
            let state = self.inner.state();
            state
                .slots
                .values()
                .filter(|slot| tx.updated_slots.get(slot.id()).is_none())
                .chain(tx.updated_slots.values())
                .chain(tx.new_slots.iter())
                .filter(|slot| {
                    slot.doctor_id() == doctor_id
                        && slot.status() == SlotStatus::Available
                        && slot.started_at() >= from
                        && slot.ended_at() <= to
                })
                .cloned()
                .collect()
        };

        slots.sort_by_key(|slot| slot.started_at());
        slots.truncate(limit);
        Ok(slots)
    }
}

#[async_trait]
impl PatientDirectory for MemoryStore {
    type Tx = MemoryTx;

    async fn patient_exists(&self, _tx: &mut MemoryTx, id: &str) -> Result<bool, StoreError> {
        Ok(self
            .inner
            .state()
            .patients
            .get(id)
            .map(|p| p.active)
            .unwrap_or(false))
    }
}

#[async_trait]
impl AppointmentRepository for MemoryStore {
    type Tx = MemoryTx;

    async fn create_appointment(
        &self,
        tx: &mut MemoryTx,
        appointment: &Appointment,
    ) -> Result<(), StoreError> {
        let taken = self
            .inner
            .state()
            .appointment_slots
            .contains(appointment.slot_id())
            || tx
                .new_appointments
                .iter()
                .any(|a| a.slot_id() == appointment.slot_id());
        if taken {
            return Err(StoreError::DuplicateAppointmentForSlot(
                appointment.slot_id().to_string(),
            ));
        }
        tx.new_appointments.push(appointment.clone());
        Ok(())
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    type Tx = MemoryTx;

    async fn create_payment(&self, tx: &mut MemoryTx, payment: &Payment) -> Result<(), StoreError> {
        let taken = self
            .inner
            .state()
            .payment_appointments
            .contains(payment.appointment_id())
            || tx
                .new_payments
                .iter()
                .any(|p| p.appointment_id() == payment.appointment_id());
        if taken {
            return Err(StoreError::DuplicatePaymentForAppointment(
                payment.appointment_id().to_string(),
            ));
        }
        tx.new_payments.push(payment.clone());
        Ok(())
    }
}
