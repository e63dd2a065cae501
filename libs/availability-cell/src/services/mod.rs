pub mod generator;
pub mod listing;

pub use generator::{session_windows, SlotGeneratorService};
pub use listing::AvailableSlotsService;
