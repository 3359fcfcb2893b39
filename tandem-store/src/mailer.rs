//! SMTP-backed implementation of the notification sink. Delivery is a side
//! channel: the booking/ride mutation that produced an event has already
//! committed by the time we get here, so callers log failures and move on.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use tandem_core::notifier::{Notifier, NotifyResult};
use tandem_shared::events::{
    BookingCompletedEvent, BookingDecisionEvent, BookingRequestedEvent, RideCancelledEvent,
};

use crate::app_config::SmtpConfig;

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    /// Build the transport from config, or `None` when mail is disabled.
    pub fn from_config(
        config: &SmtpConfig,
    ) -> Result<Option<Self>, Box<dyn std::error::Error + Send + Sync>> {
        if !config.enabled {
            return Ok(None);
        }

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?.port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_address).parse()?;

        Ok(Some(Self {
            transport: builder.build(),
            from,
        }))
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> NotifyResult {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse::<Mailbox>()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        self.transport.send(message).await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn booking_requested(&self, event: &BookingRequestedEvent) -> NotifyResult {
        let Some(to) = &event.driver_email else {
            tracing::debug!(booking_id = %event.booking_id, "driver has no contact email on file");
            return Ok(());
        };
        self.send(
            to,
            "New booking request",
            format!(
                "A passenger requested {} seat(s) on your {} to {} trip. \
                 Open the app to confirm or reject the request.",
                event.seats_booked, event.origin_city, event.destination_city
            ),
        )
        .await
    }

    async fn booking_decided(&self, event: &BookingDecisionEvent) -> NotifyResult {
        let Some(to) = &event.passenger_email else {
            tracing::debug!(booking_id = %event.booking_id, "passenger has no contact email on file");
            return Ok(());
        };
        let subject = if event.accepted {
            "Your booking is confirmed"
        } else {
            "Your booking was not accepted"
        };
        let body = if event.accepted {
            "The driver confirmed your seat. See the app for pickup details.".to_string()
        } else {
            "The driver could not accept your request. Your seats have been released \
             and no payment is due."
                .to_string()
        };
        self.send(to, subject, body).await
    }

    async fn booking_completed(&self, event: &BookingCompletedEvent) -> NotifyResult {
        let Some(to) = &event.passenger_email else {
            tracing::debug!(booking_id = %event.booking_id, "passenger has no contact email on file");
            return Ok(());
        };
        self.send(
            to,
            "Trip completed",
            format!(
                "Thanks for riding with us. Your fare was {} {} (minor units). \
                 You can now review your driver.",
                event.total_fare, event.currency
            ),
        )
        .await
    }

    async fn ride_cancelled(&self, event: &RideCancelledEvent) -> NotifyResult {
        for to in &event.passenger_emails {
            if let Err(err) = self
                .send(
                    to,
                    "Your ride was cancelled",
                    "The driver cancelled this trip. Your booking is void and no payment is due."
                        .to_string(),
                )
                .await
            {
                // Keep going; one bad address should not starve the rest.
                tracing::warn!(ride_id = %event.ride_id, error = %err, "cancellation email failed");
            }
        }
        Ok(())
    }
}
