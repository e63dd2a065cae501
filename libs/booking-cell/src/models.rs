// libs/booking-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use availability_cell::models::SlotError;
use availability_cell::ports::StoreError;
use shared_models::AppError;

// ==============================================================================
// APPOINTMENT ENTITY
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Paid,
    Canceled,
    Completed,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppointmentStatus::Scheduled => "SCHEDULED",
            AppointmentStatus::Paid => "PAID",
            AppointmentStatus::Canceled => "CANCELED",
            AppointmentStatus::Completed => "COMPLETED",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SCHEDULED" => Ok(AppointmentStatus::Scheduled),
            "PAID" => Ok(AppointmentStatus::Paid),
            "CANCELED" => Ok(AppointmentStatus::Canceled),
            "COMPLETED" => Ok(AppointmentStatus::Completed),
            _ => Err(AppointmentError::InvalidStatus),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AppointmentError {
    #[error("appointment id is required")]
    IdRequired,
    #[error("appointment doctor_id is required")]
    DoctorRequired,
    #[error("appointment patient_id is required")]
    PatientRequired,
    #[error("appointment slot_id is required")]
    SlotRequired,
    #[error("appointment price_cents must be >= 0")]
    PriceInvalid,
    #[error("invalid appointment status")]
    InvalidStatus,
    #[error("appointment updated_at cannot be before created_at")]
    UpdatedBeforeCreated,
    #[error("only scheduled appointments can be paid")]
    NotScheduled,
    #[error("appointment cannot be canceled in its current status")]
    CannotCancel,
    #[error("only paid appointments can be completed")]
    OnlyPaidCanComplete,
}

/// A confirmed consultation tying a patient, a doctor and the slot it
/// occupies. The price is frozen at booking time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appointment {
    id: String,
    patient_id: String,
    doctor_id: String,
    slot_id: String,
    price_cents: i64,
    status: AppointmentStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn create(
        id: impl Into<String>,
        patient_id: impl Into<String>,
        doctor_id: impl Into<String>,
        slot_id: impl Into<String>,
        price_cents: i64,
        status: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> Result<Self, AppointmentError> {
        Self::rebuild(id, patient_id, doctor_id, slot_id, price_cents, status, now, now)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn rebuild(
        id: impl Into<String>,
        patient_id: impl Into<String>,
        doctor_id: impl Into<String>,
        slot_id: impl Into<String>,
        price_cents: i64,
        status: AppointmentStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, AppointmentError> {
        let id = id.into().trim().to_string();
        let patient_id = patient_id.into().trim().to_string();
        let doctor_id = doctor_id.into().trim().to_string();
        let slot_id = slot_id.into().trim().to_string();

        if id.is_empty() {
            return Err(AppointmentError::IdRequired);
        }
        if doctor_id.is_empty() {
            return Err(AppointmentError::DoctorRequired);
        }
        if patient_id.is_empty() {
            return Err(AppointmentError::PatientRequired);
        }
        if slot_id.is_empty() {
            return Err(AppointmentError::SlotRequired);
        }
        if price_cents < 0 {
            return Err(AppointmentError::PriceInvalid);
        }
        if updated_at < created_at {
            return Err(AppointmentError::UpdatedBeforeCreated);
        }

        Ok(Self {
            id,
            patient_id,
            doctor_id,
            slot_id,
            price_cents,
            status,
            created_at,
            updated_at,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn doctor_id(&self) -> &str {
        &self.doctor_id
    }

    pub fn slot_id(&self) -> &str {
        &self.slot_id
    }

    pub fn price_cents(&self) -> i64 {
        self.price_cents
    }

    pub fn status(&self) -> AppointmentStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// SCHEDULED -> PAID.
    pub fn mark_paid(&mut self, now: DateTime<Utc>) -> Result<(), AppointmentError> {
        if self.status != AppointmentStatus::Scheduled {
            return Err(AppointmentError::NotScheduled);
        }
        self.status = AppointmentStatus::Paid;
        self.touch(now);
        Ok(())
    }

    /// Any non-terminal status -> CANCELED.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), AppointmentError> {
        if self.status == AppointmentStatus::Canceled || self.status == AppointmentStatus::Completed
        {
            return Err(AppointmentError::CannotCancel);
        }
        self.status = AppointmentStatus::Canceled;
        self.touch(now);
        Ok(())
    }

    /// PAID -> COMPLETED.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), AppointmentError> {
        if self.status != AppointmentStatus::Paid {
            return Err(AppointmentError::OnlyPaidCanComplete);
        }
        self.status = AppointmentStatus::Completed;
        self.touch(now);
        Ok(())
    }

    /// Stamps `updated_at` with `now`. The timestamp only moves forward; an
    /// older caller instant leaves it untouched.
    fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

// ==============================================================================
// PAYMENT ENTITY
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
    Refunded,
    Cancelled,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Approved => "APPROVED",
            PaymentStatus::Rejected => "REJECTED",
            PaymentStatus::Refunded => "REFUNDED",
            PaymentStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentProvider {
    #[serde(rename = "STRIPE")]
    Stripe,
    #[serde(rename = "MERCADOPAGO")]
    MercadoPago,
    #[serde(rename = "MANUAL")]
    Manual,
}

impl fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentProvider::Stripe => "STRIPE",
            PaymentProvider::MercadoPago => "MERCADOPAGO",
            PaymentProvider::Manual => "MANUAL",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PaymentProvider {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STRIPE" => Ok(PaymentProvider::Stripe),
            "MERCADOPAGO" => Ok(PaymentProvider::MercadoPago),
            "MANUAL" => Ok(PaymentProvider::Manual),
            _ => Err(PaymentError::InvalidProvider),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("payment id is required")]
    IdRequired,
    #[error("payment appointment_id is required")]
    AppointmentRequired,
    #[error("payment amount_cents must be >= 0")]
    AmountInvalid,
    #[error("invalid payment provider")]
    InvalidProvider,
    #[error("invalid payment status")]
    InvalidStatus,
    #[error("payment updated_at cannot be before created_at")]
    UpdatedBeforeCreated,
    #[error("payment is not pending")]
    NotPending,
    #[error("payment is not approved")]
    NotApproved,
}

/// Charge attached to an appointment. Created PENDING inside the booking
/// transaction and settled later by the provider callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    id: String,
    appointment_id: String,
    provider: PaymentProvider,
    amount_cents: i64,
    status: PaymentStatus,
    external_ref: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn create(
        id: impl Into<String>,
        appointment_id: impl Into<String>,
        provider: PaymentProvider,
        amount_cents: i64,
        status: PaymentStatus,
        external_ref: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, PaymentError> {
        Self::rebuild(
            id,
            appointment_id,
            provider,
            amount_cents,
            status,
            external_ref,
            now,
            now,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn rebuild(
        id: impl Into<String>,
        appointment_id: impl Into<String>,
        provider: PaymentProvider,
        amount_cents: i64,
        status: PaymentStatus,
        external_ref: impl Into<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, PaymentError> {
        let id = id.into().trim().to_string();
        let appointment_id = appointment_id.into().trim().to_string();

        if id.is_empty() {
            return Err(PaymentError::IdRequired);
        }
        if appointment_id.is_empty() {
            return Err(PaymentError::AppointmentRequired);
        }
        if amount_cents < 0 {
            return Err(PaymentError::AmountInvalid);
        }
        if updated_at < created_at {
            return Err(PaymentError::UpdatedBeforeCreated);
        }

        Ok(Self {
            id,
            appointment_id,
            provider,
            amount_cents,
            status,
            external_ref: external_ref.into(),
            created_at,
            updated_at,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn appointment_id(&self) -> &str {
        &self.appointment_id
    }

    pub fn provider(&self) -> PaymentProvider {
        self.provider
    }

    pub fn amount_cents(&self) -> i64 {
        self.amount_cents
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn external_ref(&self) -> &str {
        &self.external_ref
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// PENDING -> APPROVED.
    pub fn approve(&mut self, now: DateTime<Utc>) -> Result<(), PaymentError> {
        if self.status != PaymentStatus::Pending {
            return Err(PaymentError::NotPending);
        }
        self.status = PaymentStatus::Approved;
        self.touch(now);
        Ok(())
    }

    /// PENDING -> REJECTED.
    pub fn reject(&mut self, now: DateTime<Utc>) -> Result<(), PaymentError> {
        if self.status != PaymentStatus::Pending {
            return Err(PaymentError::NotPending);
        }
        self.status = PaymentStatus::Rejected;
        self.touch(now);
        Ok(())
    }

    /// PENDING -> CANCELLED.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), PaymentError> {
        if self.status != PaymentStatus::Pending {
            return Err(PaymentError::NotPending);
        }
        self.status = PaymentStatus::Cancelled;
        self.touch(now);
        Ok(())
    }

    /// APPROVED -> REFUNDED.
    pub fn refund(&mut self, now: DateTime<Utc>) -> Result<(), PaymentError> {
        if self.status != PaymentStatus::Approved {
            return Err(PaymentError::NotApproved);
        }
        self.status = PaymentStatus::Refunded;
        self.touch(now);
        Ok(())
    }

    /// Stamps `updated_at` with `now`. The timestamp only moves forward; an
    /// older caller instant leaves it untouched.
    fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

// ==============================================================================
// SERVICE INPUT / OUTPUT
// ==============================================================================

#[derive(Debug, Clone)]
pub struct BookAppointmentInput {
    pub appointment_id: String,
    pub payment_id: String,
    pub slot_id: String,
    pub doctor_id: String,
    pub patient_id: String,
    pub price_cents: i64,
    pub payment_provider: String,
    pub external_ref: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingConfirmation {
    pub appointment_id: String,
    pub payment_id: String,
    pub status: AppointmentStatus,
}

// ==============================================================================
// HTTP REQUEST MODELS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct BookAppointmentRequest {
    #[serde(default)]
    pub appointment_id: Option<String>,
    #[serde(default)]
    pub payment_id: Option<String>,
    pub slot_id: String,
    pub doctor_id: String,
    pub patient_id: String,
    pub price_cents: i64,
    pub payment_provider: String,
    #[serde(default)]
    pub external_ref: Option<String>,
}

// ==============================================================================
// CELL ERRORS
// ==============================================================================

/// Broad failure classes the HTTP layer maps to status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    DomainInvariant,
    Infrastructure,
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("appointment_id is required")]
    AppointmentIdRequired,
    #[error("payment_id is required")]
    PaymentIdRequired,
    #[error("slot_id is required")]
    SlotIdRequired,
    #[error("doctor_id is required")]
    DoctorIdRequired,
    #[error("patient_id is required")]
    PatientIdRequired,
    #[error("price_cents must be >= 0")]
    PriceInvalid,
    #[error("invalid payment provider: {0}")]
    InvalidPaymentProvider(String),
    #[error("patient not found: {0}")]
    PatientNotFound(String),
    #[error("slot not found: {0}")]
    SlotNotFound(String),
    #[error("slot does not belong to the requested doctor")]
    SlotDoctorMismatch,
    #[error(transparent)]
    Slot(#[from] SlotError),
    #[error(transparent)]
    Appointment(#[from] AppointmentError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
    #[error("appointment already exists for slot {0}")]
    AppointmentAlreadyExists(String),
    #[error("payment already exists for appointment {0}")]
    PaymentAlreadyExists(String),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SlotNotFound(id) => BookingError::SlotNotFound(id),
            StoreError::DuplicateAppointmentForSlot(slot_id) => {
                BookingError::AppointmentAlreadyExists(slot_id)
            }
            StoreError::DuplicatePaymentForAppointment(appointment_id) => {
                BookingError::PaymentAlreadyExists(appointment_id)
            }
            other => BookingError::Store(other),
        }
    }
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::AppointmentIdRequired
            | BookingError::PaymentIdRequired
            | BookingError::SlotIdRequired
            | BookingError::DoctorIdRequired
            | BookingError::PatientIdRequired
            | BookingError::PriceInvalid
            | BookingError::InvalidPaymentProvider(_) => ErrorKind::Validation,

            BookingError::PatientNotFound(_) | BookingError::SlotNotFound(_) => ErrorKind::NotFound,

            BookingError::Slot(SlotError::CannotBook)
            | BookingError::AppointmentAlreadyExists(_)
            | BookingError::PaymentAlreadyExists(_) => ErrorKind::Conflict,

            BookingError::SlotDoctorMismatch
            | BookingError::Slot(_)
            | BookingError::Appointment(_)
            | BookingError::Payment(_) => ErrorKind::DomainInvariant,

            BookingError::Store(_) => ErrorKind::Infrastructure,
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        let msg = err.to_string();
        match err.kind() {
            ErrorKind::Validation => AppError::BadRequest(msg),
            ErrorKind::NotFound => AppError::NotFound(msg),
            ErrorKind::Conflict => AppError::Conflict(msg),
            ErrorKind::DomainInvariant => AppError::Unprocessable(msg),
            ErrorKind::Infrastructure => AppError::Internal(msg),
        }
    }
}
