use std::sync::Arc;

use axum::{routing::get, Router};

use availability_cell::router::{slot_routes, AvailabilityState};
use availability_cell::services::{AvailableSlotsService, SlotGeneratorService};
use booking_cell::router::appointment_routes;
use booking_cell::services::BookingService;
use shared_store::MemoryStore;
use shared_utils::Clock;

pub fn create_router(store: MemoryStore, clock: Arc<dyn Clock>) -> Router {
    let booking = Arc::new(BookingService::new(store.clone(), Arc::clone(&clock)));
    let availability = Arc::new(AvailabilityState {
        generator: SlotGeneratorService::new(store.clone(), Arc::clone(&clock)),
        listing: AvailableSlotsService::new(store),
    });

    Router::new()
        .route("/", get(|| async { "Agenda API is running!" }))
        .nest("/appointments", appointment_routes(booking))
        .nest("/doctors", slot_routes(availability))
}
