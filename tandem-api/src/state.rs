use std::sync::Arc;

use tandem_core::notifier::Notifier;
use tandem_core::repository::{
    BookingRepository, DriverProfileRepository, ReviewRepository, RideRepository,
};
use tandem_store::app_config::BusinessRules;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub rides: Arc<dyn RideRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub drivers: Arc<dyn DriverProfileRepository>,
    pub notifier: Arc<dyn Notifier>,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
}
