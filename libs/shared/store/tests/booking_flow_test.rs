// End-to-end flow over the in-memory backend: generate a doctor's agenda,
// list it, book a slot, and race two bookings for the same slot.
use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{DateTime, TimeZone, Utc};

use availability_cell::models::{GenerateSlotsInput, ListAvailableSlotsInput, SlotStatus};
use availability_cell::services::{AvailableSlotsService, SlotGeneratorService};
use booking_cell::models::{
    AppointmentStatus, BookAppointmentInput, BookingError, ErrorKind, PaymentStatus,
};
use booking_cell::services::BookingService;
use shared_store::MemoryStore;
use shared_utils::{Clock, FixedClock};

fn clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
    ))
}

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

fn generate_input(doctor_id: &str) -> GenerateSlotsInput<Utc> {
    // Mon 23:00 .. Wed 00:00, 30-minute sessions, working 23:00..24:00.
    GenerateSlotsInput {
        doctor_id: doctor_id.to_string(),
        from: utc(2025, 3, 10, 23, 0),
        to: utc(2025, 3, 12, 0, 0),
        session_minutes: 30,
        work_start_hour: 23,
        work_end_hour: 24,
        timezone: Utc,
    }
}

fn book_input(slot_id: &str, appointment_id: &str, payment_id: &str) -> BookAppointmentInput {
    BookAppointmentInput {
        appointment_id: appointment_id.to_string(),
        payment_id: payment_id.to_string(),
        slot_id: slot_id.to_string(),
        doctor_id: "doc-1".to_string(),
        patient_id: "pat-1".to_string(),
        price_cents: 20_000,
        payment_provider: "MERCADOPAGO".to_string(),
        external_ref: String::new(),
    }
}

#[tokio::test]
async fn generate_list_book_flow() {
    let store = MemoryStore::new();
    store.insert_patient("pat-1", true);

    let generator = SlotGeneratorService::new(store.clone(), clock());
    let listing = AvailableSlotsService::new(store.clone());
    let booking = BookingService::new(store.clone(), clock());

    // Two working hours tile into four half-hour slots.
    let generated = generator.generate(generate_input("doc-1")).await.unwrap();
    assert_eq!(generated.created, 4);

    // Regeneration of the same agenda inserts nothing.
    let regenerated = generator.generate(generate_input("doc-1")).await.unwrap();
    assert_eq!(regenerated.created, 0);
    assert_eq!(store.slot_count(), 4);

    let listed = listing
        .list(ListAvailableSlotsInput {
            doctor_id: "doc-1".to_string(),
            from: utc(2025, 3, 10, 0, 0),
            to: utc(2025, 3, 13, 0, 0),
            limit: 50,
        })
        .await
        .unwrap();
    assert_eq!(listed.slots.len(), 4);
    assert!(listed
        .slots
        .windows(2)
        .all(|pair| pair[0].started_at <= pair[1].started_at));

    let slot_id = listed.slots[0].id.clone();
    let confirmation = booking
        .book(book_input(&slot_id, "apt-1", "pay-1"))
        .await
        .unwrap();
    assert_eq!(confirmation.status, AppointmentStatus::Scheduled);

    assert_eq!(store.slot(&slot_id).unwrap().status(), SlotStatus::Booked);
    let appointment = store.appointment("apt-1").unwrap();
    assert_eq!(appointment.slot_id(), slot_id);
    assert_eq!(appointment.price_cents(), 20_000);
    let payment = store.payment("pay-1").unwrap();
    assert_eq!(payment.appointment_id(), "apt-1");
    assert_eq!(payment.status(), PaymentStatus::Pending);

    // The booked slot drops out of the listing.
    let listed = listing
        .list(ListAvailableSlotsInput {
            doctor_id: "doc-1".to_string(),
            from: utc(2025, 3, 10, 0, 0),
            to: utc(2025, 3, 13, 0, 0),
            limit: 50,
        })
        .await
        .unwrap();
    assert_eq!(listed.slots.len(), 3);
    assert!(listed.slots.iter().all(|s| s.id != slot_id));

    // Booking the same slot again is a conflict and leaves no partial rows.
    let err = booking
        .book(book_input(&slot_id, "apt-2", "pay-2"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(store.appointment("apt-2").is_none());
    assert!(store.payment("pay-2").is_none());
    assert_eq!(store.appointment_count(), 1);
}

#[tokio::test]
async fn concurrent_bookings_of_one_slot_yield_exactly_one_appointment() {
    let store = MemoryStore::new();
    store.insert_patient("pat-1", true);

    let generator = SlotGeneratorService::new(store.clone(), clock());
    generator.generate(generate_input("doc-1")).await.unwrap();

    let listing = AvailableSlotsService::new(store.clone());
    let slot_id = listing
        .list(ListAvailableSlotsInput {
            doctor_id: "doc-1".to_string(),
            from: utc(2025, 3, 10, 0, 0),
            to: utc(2025, 3, 13, 0, 0),
            limit: 1,
        })
        .await
        .unwrap()
        .slots[0]
        .id
        .clone();

    let booking = Arc::new(BookingService::new(store.clone(), clock()));

    let mut handles = Vec::new();
    for i in 0..2 {
        let booking = Arc::clone(&booking);
        let slot_id = slot_id.clone();
        handles.push(tokio::spawn(async move {
            booking
                .book(book_input(
                    &slot_id,
                    &format!("apt-{}", i),
                    &format!("pay-{}", i),
                ))
                .await
        }));
    }

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }

    let winners = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one booking must win the slot");

    let loser = outcomes
        .into_iter()
        .find(|r| r.is_err())
        .unwrap()
        .unwrap_err();
    assert_eq!(loser.kind(), ErrorKind::Conflict);
    assert_matches!(loser, BookingError::Slot(_) | BookingError::AppointmentAlreadyExists(_));

    assert_eq!(store.slot(&slot_id).unwrap().status(), SlotStatus::Booked);
    assert_eq!(store.appointment_count(), 1);
    assert_eq!(store.payment_count(), 1);
}

#[tokio::test]
async fn generator_with_offset_timezone_places_working_hours_correctly() {
    let store = MemoryStore::new();
    let generator = SlotGeneratorService::new(store.clone(), clock());

    // UTC+3, working 09:00..10:00 local is 06:00..07:00 UTC.
    let tz = chrono::FixedOffset::east_opt(3 * 3600).unwrap();
    let generated = generator
        .generate(GenerateSlotsInput {
            doctor_id: "doc-1".to_string(),
            from: utc(2025, 3, 10, 0, 0),
            to: utc(2025, 3, 10, 12, 0),
            session_minutes: 60,
            work_start_hour: 9,
            work_end_hour: 10,
            timezone: tz,
        })
        .await
        .unwrap();
    assert_eq!(generated.created, 1);

    let listing = AvailableSlotsService::new(store.clone());
    let listed = listing
        .list(ListAvailableSlotsInput {
            doctor_id: "doc-1".to_string(),
            from: utc(2025, 3, 10, 0, 0),
            to: utc(2025, 3, 10, 12, 0),
            limit: 10,
        })
        .await
        .unwrap();
    assert_eq!(listed.slots.len(), 1);
    assert_eq!(listed.slots[0].started_at, utc(2025, 3, 10, 6, 0));
    assert_eq!(listed.slots[0].ended_at, utc(2025, 3, 10, 7, 0));
}
