// libs/availability-cell/src/services/generator.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, LocalResult, NaiveDate, TimeZone, Utc};
use tracing::{debug, info, warn};

use shared_utils::ids;
use shared_utils::Clock;

use crate::models::{AvailabilityError, GenerateSlotsInput, GenerateSlotsOutput, Slot, SlotStatus};
use crate::ports::{SlotStore, SlotWriteRepository, Transaction, TxManager};

/// Tiles a doctor's working hours into fixed-length sessions and inserts them
/// as AVAILABLE slots. Slot ids are deterministic, so re-running the same
/// request inserts nothing new.
pub struct SlotGeneratorService<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S> SlotGeneratorService<S>
where
    S: SlotStore,
{
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn generate<Tz>(
        &self,
        input: GenerateSlotsInput<Tz>,
    ) -> Result<GenerateSlotsOutput, AvailabilityError>
    where
        Tz: TimeZone + Send + Sync,
        Tz::Offset: Send,
    {
        let doctor_id = input.doctor_id.trim().to_string();
        if doctor_id.is_empty() {
            return Err(AvailabilityError::DoctorIdRequired);
        }
        if input.to <= input.from {
            return Err(AvailabilityError::InvalidDateRange);
        }
        if input.session_minutes <= 0 {
            return Err(AvailabilityError::InvalidSessionLength);
        }
        if input.work_start_hour >= input.work_end_hour || input.work_end_hour > 24 {
            return Err(AvailabilityError::InvalidWorkHours);
        }

        let windows = session_windows(
            input.from,
            input.to,
            input.session_minutes,
            input.work_start_hour,
            input.work_end_hour,
            &input.timezone,
        );
        debug!(
            doctor_id = %doctor_id,
            windows = windows.len(),
            "tiled working hours into candidate sessions"
        );

        let now = self.clock.now();
        let mut slots = Vec::with_capacity(windows.len());
        for (started_at, ended_at) in windows {
            let slot = Slot::create(
                ids::slot_id(&doctor_id, started_at),
                doctor_id.clone(),
                started_at,
                ended_at,
                SlotStatus::Available,
                now,
            )?;
            slots.push(slot);
        }

        let mut tx = self.store.begin().await?;
        let created = match self.store.create_slots(&mut tx, &slots).await {
            Ok(created) => created,
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("rollback failed after slot generation error: {}", rollback_err);
                }
                return Err(err.into());
            }
        };
        tx.commit().await?;

        info!(doctor_id = %doctor_id, created, "generated availability slots");
        Ok(GenerateSlotsOutput { created })
    }
}

/// Splits `[from, to]` into `session_minutes`-long windows inside the working
/// hours of each local day. Only sessions that fit entirely within both the
/// working hours and the requested range are produced; range boundaries count
/// as fitting.
///
/// Local times that do not exist (DST spring-forward) skip that day's working
/// hours; ambiguous local times resolve to the earlier instant. Returned
/// windows are in UTC.
pub fn session_windows<Tz: TimeZone>(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    session_minutes: i64,
    work_start_hour: u32,
    work_end_hour: u32,
    tz: &Tz,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let step = Duration::minutes(session_minutes);
    let from_local = from.with_timezone(tz);
    let to_local = to.with_timezone(tz);

    let mut windows = Vec::new();
    let mut day = from_local.date_naive();
    let last_day = to_local.date_naive();

    while day <= last_day {
        if let (Some(work_start), Some(work_end)) = (
            local_hour(tz, day, work_start_hour),
            local_hour(tz, day, work_end_hour),
        ) {
            let start = std::cmp::max(work_start, from_local.clone());
            let end = std::cmp::min(work_end, to_local.clone());

            let mut cursor = start;
            while cursor.clone() + step <= end {
                let next = cursor.clone() + step;
                windows.push((cursor.with_timezone(&Utc), next.with_timezone(&Utc)));
                cursor = next;
            }
        }

        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    windows
}

/// Local wall-clock instant for `hour:00` on `day`. Hour 24 maps to midnight
/// of the next day.
fn local_hour<Tz: TimeZone>(tz: &Tz, day: NaiveDate, hour: u32) -> Option<DateTime<Tz>> {
    let (day, hour) = if hour == 24 {
        (day.succ_opt()?, 0)
    } else {
        (day, hour)
    };
    let naive = day.and_hms_opt(hour, 0, 0)?;
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => None,
    }
}
