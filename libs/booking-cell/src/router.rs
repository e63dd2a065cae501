// libs/booking-cell/src/router.rs
use std::sync::Arc;

use axum::{routing::post, Router};

use crate::handlers;
use crate::ports::BookingStore;
use crate::services::BookingService;

pub fn appointment_routes<S>(service: Arc<BookingService<S>>) -> Router
where
    S: BookingStore + 'static,
{
    Router::new()
        .route("/book", post(handlers::book_appointment::<S>))
        .with_state(service)
}
