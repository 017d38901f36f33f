use std::sync::{Arc, Mutex};

use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use calendry::config::AppConfig;
use calendry::db;
use calendry::handlers;
use calendry::services::auth::ConfigAuthProvider;
use calendry::services::messaging::twilio::TwilioWhatsAppProvider;
use calendry::services::reminder::{
    FixedOffsetClock, ReminderAnchor, ReminderPolicy, ReminderScheduler,
};
use calendry::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let db = Arc::new(Mutex::new(conn));

    if config.twilio_account_sid.is_empty() || config.twilio_auth_token.is_empty() {
        tracing::warn!("Twilio credentials not configured, WhatsApp sends will fail");
    }
    let messaging = Arc::new(TwilioWhatsAppProvider::new(
        config.twilio_account_sid.clone(),
        config.twilio_auth_token.clone(),
        config.twilio_whatsapp_number.clone(),
    ));
    let auth = Arc::new(ConfigAuthProvider::from_config(&config));

    let anchor = match config.reminder_anchor.as_str() {
        "daily" => ReminderAnchor::FixedHourDaily {
            run_hour: config.reminder_run_hour,
        },
        _ => ReminderAnchor::RollingWindow {
            lead_min_minutes: config.reminder_lead_min_minutes,
            lead_max_minutes: config.reminder_lead_max_minutes,
        },
    };
    let scheduler = ReminderScheduler::new(
        Arc::clone(&db),
        messaging.clone(),
        Arc::new(FixedOffsetClock::new(config.utc_offset_minutes)),
        ReminderPolicy {
            anchor,
            tick_interval_minutes: config.reminder_tick_minutes,
        },
        config.country_code.clone(),
        config.national_number_len,
    );
    tokio::spawn(scheduler.run());

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        messaging,
        auth,
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/bookings",
            get(handlers::bookings::list_bookings).post(handlers::bookings::create_booking),
        )
        .route(
            "/api/bookings/:id",
            patch(handlers::bookings::update_booking).delete(handlers::bookings::delete_booking),
        )
        .route("/api/bookings/:id/move", post(handlers::bookings::move_booking))
        .route(
            "/api/staff",
            get(handlers::staff::list_staff).post(handlers::staff::create_staff),
        )
        .route("/api/staff/:id", delete(handlers::staff::delete_staff))
        .route(
            "/api/clients",
            get(handlers::clients::list_clients).post(handlers::clients::create_client),
        )
        .route(
            "/api/clients/:id",
            put(handlers::clients::update_client).delete(handlers::clients::delete_client),
        )
        .route("/api/availability", get(handlers::planning::get_availability))
        .route("/api/planning/day", get(handlers::planning::get_planning_day))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
