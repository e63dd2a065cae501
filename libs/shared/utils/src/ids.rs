use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Random identifier with a readable prefix, e.g. `apt_6f9c...`.
pub fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

/// Deterministic slot identifier derived from the doctor and the UTC start
/// instant. Regenerating the same schedule yields the same ids, which is what
/// makes batch slot generation idempotent.
pub fn slot_id(doctor_id: &str, started_at: DateTime<Utc>) -> String {
    format!("slot_{}_{}", doctor_id, started_at.format("%Y%m%dT%H%M%SZ"))
}
