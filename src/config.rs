//! Runtime configuration gathered from flags, env and `.env`

use chrono::{Local, NaiveDate};

use crate::loader::{validate_identifier, Identifier, LoadError, PlanSource};
use crate::selection::GroupPolicy;

pub const DEFAULT_DB_PATH: &str = "my-workout.db";

/// Mouse drag distance (in terminal columns) that counts as a swipe
pub const DEFAULT_SWIPE_COLUMNS: i32 = 10;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Raw `workout` value, validated lazily so a bad one can be shown in the UI
    pub workout: Option<String>,
    pub source: PlanSource,
    pub db_path: String,
    pub policy: GroupPolicy,
    /// Fixed "today" instead of the local clock
    pub today: Option<NaiveDate>,
    pub swipe_threshold: i32,
}

impl AppConfig {
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn identifier(&self) -> Result<Identifier, LoadError> {
        validate_identifier(self.workout.as_deref())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workout: None,
            source: PlanSource::from_base(crate::loader::DEFAULT_BASE),
            db_path: DEFAULT_DB_PATH.to_string(),
            policy: GroupPolicy::default(),
            today: None,
            swipe_threshold: DEFAULT_SWIPE_COLUMNS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_today_wins() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let config = AppConfig { today: Some(day), ..AppConfig::default() };
        assert_eq!(config.today(), day);
    }

    #[test]
    fn test_missing_workout_is_error() {
        let config = AppConfig::default();
        assert!(matches!(config.identifier(), Err(LoadError::MissingIdentifier)));
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.policy, GroupPolicy::LeastCompleted);
        assert_eq!(config.source, PlanSource::Dir("/my-workout".into()));
    }
}
