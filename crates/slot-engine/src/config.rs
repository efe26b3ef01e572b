//! Engine configuration.
//!
//! Every field has a default matching the institute's policy, so an empty
//! JSON object is a complete configuration.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::codec::{Shifts, DEFAULT_BLOCK_MINUTES};
use crate::error::ScheduleError;
use crate::planner::{parse_timezone, PlanOptions, DEFAULT_SLOT_MINUTES};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// IANA name of the institute's timezone.
    pub timezone: String,
    pub slot_minutes: i64,
    pub block_minutes: i64,
    pub shifts: Shifts,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            slot_minutes: DEFAULT_SLOT_MINUTES,
            block_minutes: DEFAULT_BLOCK_MINUTES,
            shifts: Shifts::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// ```
    /// use slot_engine::config::EngineConfig;
    ///
    /// let json = r#"{"timezone":"Europe/Rome","slot_minutes":15}"#;
    /// let config = EngineConfig::from_json(json).unwrap();
    /// assert_eq!(config.slot_minutes, 15);
    /// assert_eq!(config.block_minutes, 30);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ScheduleError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ScheduleError::Config(format!("configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the timezone, slot length, and block size against the shifts.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        self.plan_options()?;
        self.shifts.check_block_size(self.block_minutes)?;
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz, ScheduleError> {
        parse_timezone(&self.timezone)
    }

    /// Planner options derived from this configuration.
    pub fn plan_options(&self) -> Result<PlanOptions, ScheduleError> {
        PlanOptions::new(self.slot_minutes, &self.timezone)
    }
}
