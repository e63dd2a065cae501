// libs/booking-cell/src/ports.rs
//
// Storage ports the booking flow needs on top of the availability cell's
// slot ports. One backend type implements all of them with a shared `Tx`.
use async_trait::async_trait;

pub use availability_cell::ports::{
    SlotLockRepository, StoreError, Transaction, TxManager,
};

use crate::models::{Appointment, Payment};

#[async_trait]
pub trait PatientDirectory: Send + Sync {
    type Tx: Transaction;

    /// Whether an active patient with this id exists.
    async fn patient_exists(&self, tx: &mut Self::Tx, id: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    type Tx: Transaction;

    /// Fails with `DuplicateAppointmentForSlot` when the slot is already
    /// taken by another appointment.
    async fn create_appointment(
        &self,
        tx: &mut Self::Tx,
        appointment: &Appointment,
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    type Tx: Transaction;

    /// Fails with `DuplicatePaymentForAppointment` when the appointment
    /// already carries a payment.
    async fn create_payment(&self, tx: &mut Self::Tx, payment: &Payment) -> Result<(), StoreError>;
}

/// Everything the booking service needs from a backend, sharing one
/// transaction type.
pub trait BookingStore:
    TxManager
    + PatientDirectory<Tx = <Self as TxManager>::Tx>
    + SlotLockRepository<Tx = <Self as TxManager>::Tx>
    + AppointmentRepository<Tx = <Self as TxManager>::Tx>
    + PaymentRepository<Tx = <Self as TxManager>::Tx>
{
}

impl<S> BookingStore for S where
    S: TxManager
        + PatientDirectory<Tx = <S as TxManager>::Tx>
        + SlotLockRepository<Tx = <S as TxManager>::Tx>
        + AppointmentRepository<Tx = <S as TxManager>::Tx>
        + PaymentRepository<Tx = <S as TxManager>::Tx>
{
}
