use std::env;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_WINDOW_START: &str = "10:00";
pub const DEFAULT_WINDOW_END: &str = "21:00";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub slot_window_start: NaiveTime,
    pub slot_window_end: NaiveTime,
    /// Offset of the clinic's wall clock from UTC, used to decide what "today" is.
    pub clinic_utc_offset_minutes: i32,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_service_role_key: String::new(),
            slot_window_start: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default(),
            slot_window_end: NaiveTime::from_hms_opt(21, 0, 0).unwrap_or_default(),
            clinic_utc_offset_minutes: 0,
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, every bearer token will be rejected");
                    String::new()
                }),
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using in-memory store");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, falling back to anon key");
                    String::new()
                }),
            slot_window_start: env_time("SLOT_WINDOW_START", DEFAULT_WINDOW_START)
                .unwrap_or(defaults.slot_window_start),
            slot_window_end: env_time("SLOT_WINDOW_END", DEFAULT_WINDOW_END)
                .unwrap_or(defaults.slot_window_end),
            clinic_utc_offset_minutes: env::var("CLINIC_UTC_OFFSET_MINUTES")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or_else(|| {
                    warn!("CLINIC_UTC_OFFSET_MINUTES not set or invalid, using UTC");
                    defaults.clinic_utc_offset_minutes
                }),
            port: env::var("PORT")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(defaults.port),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty() && self.slot_window_start < self.slot_window_end
    }

    pub fn is_supabase_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    /// Key sent as the bearer credential to PostgREST.
    pub fn supabase_api_key(&self) -> &str {
        if self.supabase_service_role_key.is_empty() {
            &self.supabase_anon_key
        } else {
            &self.supabase_service_role_key
        }
    }
}

fn env_time(name: &str, fallback: &str) -> Option<NaiveTime> {
    let raw = env::var(name).unwrap_or_else(|_| fallback.to_string());
    let parsed = parse_clock_time(&raw);
    if parsed.is_none() {
        warn!("{} has invalid value {:?}, using default", name, raw);
    }
    parsed
}

/// Parses `HH:MM` (24h) as used by the window variables.
pub fn parse_clock_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}
