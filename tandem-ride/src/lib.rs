pub mod inventory;
pub mod ride;

pub use inventory::InventoryError;
pub use ride::{Location, Ride, RideError, RideStatus, MAX_SEATS_PER_RIDE};
