use std::sync::Arc;

use chrono::{FixedOffset, NaiveDateTime, Offset, Utc};
use tracing::warn;

use shared_config::AppConfig;
use shared_database::Database;
use shared_models::slot::{SlotTime, WorkingWindow};

/// State shared by every cell router.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Database,
}

impl AppState {
    pub fn new(config: AppConfig, db: Database) -> Self {
        Self {
            config: Arc::new(config),
            db,
        }
    }

    pub fn from_config(config: AppConfig) -> Self {
        let db = Database::from_config(&config);
        Self::new(config, db)
    }

    /// Current wall-clock time at the clinic.
    pub fn clinic_now(&self) -> NaiveDateTime {
        let offset = FixedOffset::east_opt(self.config.clinic_utc_offset_minutes * 60)
            .unwrap_or_else(|| {
                warn!(
                    "Clinic UTC offset {} minutes out of range, using UTC",
                    self.config.clinic_utc_offset_minutes
                );
                Utc.fix()
            });
        Utc::now().with_timezone(&offset).naive_local()
    }

    /// Working window given to newly created doctors.
    pub fn default_working_window(&self) -> WorkingWindow {
        WorkingWindow::new(
            SlotTime::new(self.config.slot_window_start),
            SlotTime::new(self.config.slot_window_end),
        )
        .unwrap_or_else(|e| {
            warn!("{}; using the default working window", e);
            WorkingWindow::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn test_default_working_window_from_config() {
        let config = AppConfig {
            slot_window_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            slot_window_end: NaiveTime::from_hms_opt(17, 30, 0).unwrap(),
            ..AppConfig::default()
        };
        let state = AppState::new(config, Database::in_memory());
        let window = state.default_working_window();
        assert_eq!(window.start().to_string(), "09:00 AM");
        assert_eq!(window.end().to_string(), "05:30 PM");
    }

    #[test]
    fn test_invalid_window_falls_back() {
        let config = AppConfig {
            slot_window_start: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            slot_window_end: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            ..AppConfig::default()
        };
        let state = AppState::new(config, Database::in_memory());
        assert_eq!(state.default_working_window(), WorkingWindow::default());
    }

    #[test]
    fn test_clinic_now_applies_offset() {
        let config = AppConfig {
            clinic_utc_offset_minutes: 120,
            ..AppConfig::default()
        };
        let state = AppState::new(config, Database::in_memory());
        let drift = state.clinic_now() - Utc::now().naive_utc();
        assert!((drift.num_minutes() - 120).abs() <= 1);
    }
}
