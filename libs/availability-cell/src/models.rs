// libs/availability-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use shared_models::AppError;

use crate::ports::StoreError;

// ==============================================================================
// SLOT ENTITY
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatus {
    Available,
    Booked,
    Blocked,
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SlotStatus::Available => "AVAILABLE",
            SlotStatus::Booked => "BOOKED",
            SlotStatus::Blocked => "BLOCKED",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for SlotStatus {
    type Err = SlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(SlotStatus::Available),
            "BOOKED" => Ok(SlotStatus::Booked),
            "BLOCKED" => Ok(SlotStatus::Blocked),
            _ => Err(SlotError::InvalidStatus),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("slot id is required")]
    IdRequired,
    #[error("slot doctor_id is required")]
    DoctorRequired,
    #[error("slot end must be after start")]
    TimeInvalid,
    #[error("slot updated_at cannot be before created_at")]
    UpdatedBeforeCreated,
    #[error("invalid slot status")]
    InvalidStatus,
    #[error("can only book an available slot")]
    CannotBook,
    #[error("can only block an available slot")]
    CannotBlock,
    #[error("can only unblock a blocked slot")]
    CannotUnblock,
}

/// A bookable unit of a doctor's agenda. Fields are private so every state
/// change goes through the transition methods and keeps `updated_at` moving
/// forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    id: String,
    doctor_id: String,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    status: SlotStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Slot {
    /// New slot with `created_at == updated_at == now`. Ids are trimmed before
    /// validation.
    pub fn create(
        id: impl Into<String>,
        doctor_id: impl Into<String>,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        status: SlotStatus,
        now: DateTime<Utc>,
    ) -> Result<Self, SlotError> {
        Self::rebuild(id, doctor_id, started_at, ended_at, status, now, now)
    }

    /// Rehydrate a slot from stored fields, re-running all invariant checks.
    pub fn rebuild(
        id: impl Into<String>,
        doctor_id: impl Into<String>,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        status: SlotStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, SlotError> {
        let id = id.into().trim().to_string();
        let doctor_id = doctor_id.into().trim().to_string();

        if id.is_empty() {
            return Err(SlotError::IdRequired);
        }
        if doctor_id.is_empty() {
            return Err(SlotError::DoctorRequired);
        }
        if ended_at <= started_at {
            return Err(SlotError::TimeInvalid);
        }
        if updated_at < created_at {
            return Err(SlotError::UpdatedBeforeCreated);
        }

        Ok(Self {
            id,
            doctor_id,
            started_at,
            ended_at,
            status,
            created_at,
            updated_at,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn doctor_id(&self) -> &str {
        &self.doctor_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> DateTime<Utc> {
        self.ended_at
    }

    pub fn status(&self) -> SlotStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// AVAILABLE -> BOOKED. Any other starting status is rejected.
    pub fn mark_booked(&mut self, now: DateTime<Utc>) -> Result<(), SlotError> {
        if self.status != SlotStatus::Available {
            return Err(SlotError::CannotBook);
        }
        self.status = SlotStatus::Booked;
        self.touch(now);
        Ok(())
    }

    /// AVAILABLE -> BLOCKED.
    pub fn block(&mut self, now: DateTime<Utc>) -> Result<(), SlotError> {
        if self.status != SlotStatus::Available {
            return Err(SlotError::CannotBlock);
        }
        self.status = SlotStatus::Blocked;
        self.touch(now);
        Ok(())
    }

    /// BLOCKED -> AVAILABLE.
    pub fn unblock(&mut self, now: DateTime<Utc>) -> Result<(), SlotError> {
        if self.status != SlotStatus::Blocked {
            return Err(SlotError::CannotUnblock);
        }
        self.status = SlotStatus::Available;
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
pub struct GenerateSlotsInput<Tz: chrono::TimeZone> {
    pub doctor_id: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub session_minutes: i64,
    pub work_start_hour: u32,
    /// Exclusive upper bound. 24 means the working day runs to midnight.
    pub work_end_hour: u32,
    pub timezone: Tz,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateSlotsOutput {
    pub created: usize,
}

#[derive(Debug, Clone)]
pub struct ListAvailableSlotsInput {
    pub doctor_id: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotItem {
    pub id: String,
    pub doctor_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub status: SlotStatus,
}

impl From<&Slot> for SlotItem {
    fn from(slot: &Slot) -> Self {
        Self {
            id: slot.id().to_string(),
            doctor_id: slot.doctor_id().to_string(),
            started_at: slot.started_at(),
            ended_at: slot.ended_at(),
            status: slot.status(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListAvailableSlotsOutput {
    pub doctor_id: String,
    pub slots: Vec<SlotItem>,
}

// ==============================================================================
// HTTP REQUEST MODELS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateSlotsRequest {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub session_minutes: i64,
    pub work_start_hour: u32,
    pub work_end_hour: u32,
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListSlotsQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    #[serde(default)]
    pub limit: Option<usize>,
}

// ==============================================================================
// CELL ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum AvailabilityError {
    #[error("doctor_id is required")]
    DoctorIdRequired,
    #[error("'to' must be after 'from'")]
    InvalidDateRange,
    #[error("session_minutes must be positive")]
    InvalidSessionLength,
    #[error("working hours must satisfy 0 <= start < end <= 24")]
    InvalidWorkHours,
    #[error("limit must be positive")]
    InvalidLimit,
    #[error(transparent)]
    Slot(#[from] SlotError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        let msg = err.to_string();
        match err {
            AvailabilityError::DoctorIdRequired
            | AvailabilityError::InvalidDateRange
            | AvailabilityError::InvalidSessionLength
            | AvailabilityError::InvalidWorkHours
            | AvailabilityError::InvalidLimit => AppError::BadRequest(msg),
            AvailabilityError::Slot(_) => AppError::Unprocessable(msg),
            AvailabilityError::Store(StoreError::SlotNotFound(_)) => AppError::NotFound(msg),
            AvailabilityError::Store(_) => AppError::Internal(msg),
        }
    }
}
