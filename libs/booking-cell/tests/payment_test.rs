use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};

use booking_cell::models::{Payment, PaymentError, PaymentProvider, PaymentStatus};

fn t0() -> chrono::DateTime<chrono::Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
}

fn pending() -> Payment {
    Payment::create(
        "pay-1",
        "apt-1",
        PaymentProvider::Stripe,
        15_000,
        PaymentStatus::Pending,
        "",
        t0(),
    )
    .unwrap()
}

#[test]
fn create_validates_required_fields() {
    assert_matches!(
        Payment::create("", "apt-1", PaymentProvider::Stripe, 100, PaymentStatus::Pending, "", t0()),
        Err(PaymentError::IdRequired)
    );
    assert_matches!(
        Payment::create("pay-1", "  ", PaymentProvider::Stripe, 100, PaymentStatus::Pending, "", t0()),
        Err(PaymentError::AppointmentRequired)
    );
    assert_matches!(
        Payment::create("pay-1", "apt-1", PaymentProvider::Stripe, -1, PaymentStatus::Pending, "", t0()),
        Err(PaymentError::AmountInvalid)
    );
}

#[test]
fn rebuild_rejects_updated_before_created() {
    let result = Payment::rebuild(
        "pay-1",
        "apt-1",
        PaymentProvider::Manual,
        100,
        PaymentStatus::Approved,
        "ext-1",
        t0(),
        t0() - Duration::seconds(1),
    );
    assert_matches!(result, Err(PaymentError::UpdatedBeforeCreated));
}

#[test]
fn provider_parses_case_insensitively() {
    assert_eq!("stripe".parse::<PaymentProvider>().unwrap(), PaymentProvider::Stripe);
    assert_eq!("MERCADOPAGO".parse::<PaymentProvider>().unwrap(), PaymentProvider::MercadoPago);
    assert_eq!(" Manual ".parse::<PaymentProvider>().unwrap(), PaymentProvider::Manual);
    assert_matches!(
        "paypal".parse::<PaymentProvider>(),
        Err(PaymentError::InvalidProvider)
    );
}

#[test]
fn approve_reject_cancel_require_pending() {
    let mut payment = pending();
    payment.approve(t0() + Duration::minutes(1)).unwrap();
    assert_eq!(payment.status(), PaymentStatus::Approved);

    assert_matches!(
        payment.approve(t0() + Duration::minutes(2)),
        Err(PaymentError::NotPending)
    );
    assert_matches!(
        payment.reject(t0() + Duration::minutes(2)),
        Err(PaymentError::NotPending)
    );
    assert_matches!(
        payment.cancel(t0() + Duration::minutes(2)),
        Err(PaymentError::NotPending)
    );
}

#[test]
fn reject_and_cancel_from_pending() {
    let mut rejected = pending();
    rejected.reject(t0() + Duration::minutes(1)).unwrap();
    assert_eq!(rejected.status(), PaymentStatus::Rejected);

    let mut cancelled = pending();
    cancelled.cancel(t0() + Duration::minutes(1)).unwrap();
    assert_eq!(cancelled.status(), PaymentStatus::Cancelled);
}

#[test]
fn transitions_never_move_updated_at_backwards() {
    let mut payment = pending();
    payment.approve(t0() + Duration::minutes(10)).unwrap();

    // A transition handed an older clock reading keeps the newer timestamp.
    payment.refund(t0() + Duration::minutes(5)).unwrap();
    assert_eq!(payment.updated_at(), t0() + Duration::minutes(10));
}

#[test]
fn refund_requires_approved() {
    let mut payment = pending();
    assert_matches!(
        payment.refund(t0() + Duration::minutes(1)),
        Err(PaymentError::NotApproved)
    );

    payment.approve(t0() + Duration::minutes(1)).unwrap();
    payment.refund(t0() + Duration::minutes(2)).unwrap();
    assert_eq!(payment.status(), PaymentStatus::Refunded);

    assert_matches!(
        payment.refund(t0() + Duration::minutes(3)),
        Err(PaymentError::NotApproved)
    );
}
