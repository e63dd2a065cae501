use chrono::{Duration, Timelike, Utc};
use tracing::info;

use availability_cell::models::{Slot, SlotStatus};
use shared_store::MemoryStore;
use shared_utils::ids;

/// Demo rows for local development: one patient and a small agenda for one
/// doctor, starting at the next full hour.
pub fn demo_data(store: &MemoryStore) {
    store.insert_patient("pat_demo", true);

    let doctor_id = "doc_demo";
    let now = Utc::now();
    let next_hour = now + Duration::hours(1);
    let first_start = next_hour
        .date_naive()
        .and_hms_opt(next_hour.hour(), 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(next_hour);

    let mut seeded = 0;
    for i in 0..8 {
        let started_at = first_start + Duration::minutes(30 * i);
        let ended_at = started_at + Duration::minutes(30);
        if let Ok(slot) = Slot::create(
            ids::slot_id(doctor_id, started_at),
            doctor_id,
            started_at,
            ended_at,
            SlotStatus::Available,
            now,
        ) {
            store.insert_slot(slot);
            seeded += 1;
        }
    }

    info!(doctor_id, slots = seeded, "seeded demo data");
}
