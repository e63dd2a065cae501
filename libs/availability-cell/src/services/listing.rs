// libs/availability-cell/src/services/listing.rs
use tracing::{debug, warn};

use crate::models::{
    AvailabilityError, ListAvailableSlotsInput, ListAvailableSlotsOutput, SlotItem,
};
use crate::ports::{SlotReadRepository, SlotStore, Transaction, TxManager};

/// Read side of the agenda: the open slots a patient can still book.
pub struct AvailableSlotsService<S> {
    store: S,
}

impl<S> AvailableSlotsService<S>
where
    S: SlotStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        input: ListAvailableSlotsInput,
    ) -> Result<ListAvailableSlotsOutput, AvailabilityError> {
        let doctor_id = input.doctor_id.trim().to_string();
        if doctor_id.is_empty() {
            return Err(AvailabilityError::DoctorIdRequired);
        }
        if input.to <= input.from {
            return Err(AvailabilityError::InvalidDateRange);
        }
        if input.limit == 0 {
            return Err(AvailabilityError::InvalidLimit);
        }

        let mut tx = self.store.begin().await?;
        let slots = match self
            .store
            .list_available_by_doctor(&mut tx, &doctor_id, input.from, input.to, input.limit)
            .await
        {
            Ok(slots) => slots,
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("rollback failed after slot listing error: {}", rollback_err);
                }
                return Err(err.into());
            }
        };
        tx.commit().await?;

        debug!(doctor_id = %doctor_id, count = slots.len(), "listed available slots");
        Ok(ListAvailableSlotsOutput {
            doctor_id,
            slots: slots.iter().map(SlotItem::from).collect(),
        })
    }
}
