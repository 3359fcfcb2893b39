use async_trait::async_trait;

use tandem_shared::events::{
    BookingCompletedEvent, BookingDecisionEvent, BookingRequestedEvent, RideCancelledEvent,
};

pub type NotifyResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Best-effort notification sink. Callers log and swallow failures: a state
/// change that already committed is authoritative regardless of whether the
/// message about it went out.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn booking_requested(&self, event: &BookingRequestedEvent) -> NotifyResult;

    async fn booking_decided(&self, event: &BookingDecisionEvent) -> NotifyResult;

    async fn booking_completed(&self, event: &BookingCompletedEvent) -> NotifyResult;

    async fn ride_cancelled(&self, event: &RideCancelledEvent) -> NotifyResult;
}

/// Sink used when no mail transport is configured; events only reach the
/// logs.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn booking_requested(&self, event: &BookingRequestedEvent) -> NotifyResult {
        tracing::debug!(booking_id = %event.booking_id, "notification skipped: booking requested");
        Ok(())
    }

    async fn booking_decided(&self, event: &BookingDecisionEvent) -> NotifyResult {
        tracing::debug!(booking_id = %event.booking_id, accepted = event.accepted, "notification skipped: booking decided");
        Ok(())
    }

    async fn booking_completed(&self, event: &BookingCompletedEvent) -> NotifyResult {
        tracing::debug!(booking_id = %event.booking_id, "notification skipped: booking completed");
        Ok(())
    }

    async fn ride_cancelled(&self, event: &RideCancelledEvent) -> NotifyResult {
        tracing::debug!(ride_id = %event.ride_id, "notification skipped: ride cancelled");
        Ok(())
    }
}
