pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod driver_repo;
pub mod mailer;
pub mod review_repo;
pub mod ride_repo;

mod rows;

pub use booking_repo::StoreBookingRepository;
pub use database::DbClient;
pub use driver_repo::StoreDriverRepository;
pub use mailer::SmtpNotifier;
pub use review_repo::StoreReviewRepository;
pub use ride_repo::StoreRideRepository;
