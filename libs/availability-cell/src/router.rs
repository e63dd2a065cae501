// libs/availability-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::ports::SlotStore;
use crate::services::{AvailableSlotsService, SlotGeneratorService};

/// Shared state for the slot routes.
pub struct AvailabilityState<S> {
    pub generator: SlotGeneratorService<S>,
    pub listing: AvailableSlotsService<S>,
}

pub fn slot_routes<S>(state: Arc<AvailabilityState<S>>) -> Router
where
    S: SlotStore + 'static,
{
    Router::new()
        .route("/{doctor_id}/slots", get(handlers::list_available_slots::<S>))
        .route(
            "/{doctor_id}/slots/generate",
            post(handlers::generate_slots::<S>),
        )
        .with_state(state)
}
