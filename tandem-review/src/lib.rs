pub mod ledger;
pub mod models;
pub mod rating;

pub use ledger::ReviewError;
pub use models::{AspectRatings, Review, ReviewType};
