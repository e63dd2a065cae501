// libs/booking-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use shared_utils::Clock;

use crate::models::{
    Appointment, AppointmentStatus, BookAppointmentInput, BookingConfirmation, BookingError,
    Payment, PaymentProvider, PaymentStatus,
};
use crate::ports::{
    AppointmentRepository, BookingStore, PatientDirectory, PaymentRepository, SlotLockRepository,
    Transaction, TxManager,
};

/// Books a slot atomically: the slot flips to BOOKED, the appointment is
/// created with the price frozen, and a PENDING payment is attached, all in
/// one transaction. Any failure rolls the whole thing back.
pub struct BookingService<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S> BookingService<S>
where
    S: BookingStore,
{
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn book(
        &self,
        input: BookAppointmentInput,
    ) -> Result<BookingConfirmation, BookingError> {
        let input = normalize(input)?;
        let provider: PaymentProvider = input
            .payment_provider
            .parse()
            .map_err(|_| BookingError::InvalidPaymentProvider(input.payment_provider.clone()))?;
        let now = self.clock.now();

        debug!(
            slot_id = %input.slot_id,
            patient_id = %input.patient_id,
            doctor_id = %input.doctor_id,
            "booking appointment"
        );

        let mut tx = self.store.begin().await?;
        match self.book_in_tx(&mut tx, &input, provider, now).await {
            Ok(confirmation) => {
                tx.commit().await?;
                info!(
                    appointment_id = %confirmation.appointment_id,
                    payment_id = %confirmation.payment_id,
                    slot_id = %input.slot_id,
                    "appointment booked"
                );
                Ok(confirmation)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("rollback failed after booking error: {}", rollback_err);
                }
                Err(err)
            }
        }
    }

    async fn book_in_tx(
        &self,
        tx: &mut <S as TxManager>::Tx,
        input: &BookAppointmentInput,
        provider: PaymentProvider,
        now: DateTime<Utc>,
    ) -> Result<BookingConfirmation, BookingError> {
        if !self.store.patient_exists(tx, &input.patient_id).await? {
            return Err(BookingError::PatientNotFound(input.patient_id.clone()));
        }

        let mut slot = self.store.slot_for_update(tx, &input.slot_id).await?;
        if slot.doctor_id() != input.doctor_id {
            return Err(BookingError::SlotDoctorMismatch);
        }

        slot.mark_booked(now)?;
        self.store.update_slot(tx, &slot).await?;

        let appointment = Appointment::create(
            input.appointment_id.clone(),
            input.patient_id.clone(),
            slot.doctor_id(),
            input.slot_id.clone(),
            input.price_cents,
            AppointmentStatus::Scheduled,
            now,
        )?;
        self.store.create_appointment(tx, &appointment).await?;

        let payment = Payment::create(
            input.payment_id.clone(),
            appointment.id(),
            provider,
            input.price_cents,
            PaymentStatus::Pending,
            input.external_ref.clone(),
            now,
        )?;
        self.store.create_payment(tx, &payment).await?;

        Ok(BookingConfirmation {
            appointment_id: appointment.id().to_string(),
            payment_id: payment.id().to_string(),
            status: appointment.status(),
        })
    }
}

/// Trims every id and rejects empty required fields before any storage work.
fn normalize(mut input: BookAppointmentInput) -> Result<BookAppointmentInput, BookingError> {
    input.appointment_id = input.appointment_id.trim().to_string();
    input.payment_id = input.payment_id.trim().to_string();
    input.slot_id = input.slot_id.trim().to_string();
    input.doctor_id = input.doctor_id.trim().to_string();
    input.patient_id = input.patient_id.trim().to_string();
    input.payment_provider = input.payment_provider.trim().to_string();
    input.external_ref = input.external_ref.trim().to_string();

    if input.appointment_id.is_empty() {
        return Err(BookingError::AppointmentIdRequired);
    }
    if input.patient_id.is_empty() {
        return Err(BookingError::PatientIdRequired);
    }
    if input.slot_id.is_empty() {
        return Err(BookingError::SlotIdRequired);
    }
    if input.doctor_id.is_empty() {
        return Err(BookingError::DoctorIdRequired);
    }
    if input.payment_id.is_empty() {
        return Err(BookingError::PaymentIdRequired);
    }
    if input.price_cents < 0 {
        return Err(BookingError::PriceInvalid);
    }

    Ok(input)
}
