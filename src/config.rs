use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,

    pub admin_email: String,
    pub admin_password: String,
    pub superadmin_email: String,
    pub superadmin_password: String,
    pub api_token: String,

    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_whatsapp_number: String,

    pub country_code: String,
    pub national_number_len: usize,

    pub open_hour: u32,
    pub close_hour: u32,
    pub slot_step_minutes: u32,

    pub reminder_anchor: String,
    pub reminder_lead_min_minutes: i64,
    pub reminder_lead_max_minutes: i64,
    pub reminder_run_hour: u32,
    pub reminder_tick_minutes: u64,
    pub utc_offset_minutes: i32,
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: parsed("PORT", 3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "calendry.db".to_string()),
            admin_email: env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@salon".to_string()),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_default(),
            superadmin_email: env::var("SUPERADMIN_EMAIL").unwrap_or_default(),
            superadmin_password: env::var("SUPERADMIN_PASSWORD").unwrap_or_default(),
            api_token: env::var("API_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID").unwrap_or_default(),
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN").unwrap_or_default(),
            twilio_whatsapp_number: env::var("TWILIO_WHATSAPP_NUMBER")
                .unwrap_or_else(|_| "whatsapp:+14155238886".to_string()),
            country_code: env::var("PHONE_COUNTRY_CODE").unwrap_or_else(|_| "212".to_string()),
            national_number_len: parsed("PHONE_NATIONAL_LEN", 9),
            open_hour: parsed("OPEN_HOUR", 9),
            close_hour: parsed("CLOSE_HOUR", 20),
            slot_step_minutes: parsed("SLOT_STEP_MINUTES", 30),
            reminder_anchor: env::var("REMINDER_ANCHOR").unwrap_or_else(|_| "rolling".to_string()),
            reminder_lead_min_minutes: parsed("REMINDER_LEAD_MIN_MINUTES", 105),
            reminder_lead_max_minutes: parsed("REMINDER_LEAD_MAX_MINUTES", 125),
            reminder_run_hour: parsed("REMINDER_RUN_HOUR", 9),
            reminder_tick_minutes: parsed("REMINDER_TICK_MINUTES", 5),
            utc_offset_minutes: parsed("UTC_OFFSET_MINUTES", 60),
        }
    }
}
