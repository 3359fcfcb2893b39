pub mod lifecycle;
pub mod models;
pub mod settlement;

pub use lifecycle::{Actor, LifecycleError};
pub use models::{Booking, BookingStatus, CancelledBy, PaymentStatus};
pub use settlement::CompletionEffects;
