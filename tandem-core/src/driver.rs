use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The driver-profile collaborator surface the engine reads and writes:
/// approval gates ride creation, the running totals are incremented exactly
/// once per completed booking, and `rating` is the derived cache maintained
/// by the rating aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverProfile {
    pub driver_id: String,
    pub contact_email: Option<String>,
    pub is_approved: bool,
    pub total_rides: i64,
    pub total_earnings: i64,
    pub rating: Option<f64>,
    pub rating_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
