use std::net::SocketAddr;
use std::sync::Arc;

use tandem_api::{app, state::AuthConfig, AppState};
use tandem_core::notifier::{Notifier, NullNotifier};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tandem_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = tandem_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Tandem API on port {}", config.server.port);

    // Database connection + migrations
    let db = tandem_store::DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    // Notification sink: SMTP when configured, logs otherwise
    let notifier: Arc<dyn Notifier> =
        match tandem_store::SmtpNotifier::from_config(&config.smtp) {
            Ok(Some(mailer)) => Arc::new(mailer),
            Ok(None) => {
                tracing::info!("SMTP disabled, notifications go to logs only");
                Arc::new(NullNotifier)
            }
            Err(err) => {
                tracing::warn!("SMTP setup failed ({}), notifications go to logs only", err);
                Arc::new(NullNotifier)
            }
        };

    let app_state = AppState {
        rides: Arc::new(tandem_store::StoreRideRepository::new(db.pool.clone())),
        bookings: Arc::new(tandem_store::StoreBookingRepository::new(db.pool.clone())),
        reviews: Arc::new(tandem_store::StoreReviewRepository::new(
            db.pool.clone(),
            config.business_rules.review_edit_window_hours,
        )),
        drivers: Arc::new(tandem_store::StoreDriverRepository::new(db.pool.clone())),
        notifier,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
        business_rules: config.business_rules.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
