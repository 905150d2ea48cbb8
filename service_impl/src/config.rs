use std::sync::Arc;

use async_trait::async_trait;
use service::config::{AbsenceConflictPolicy, Config, ConfigService, VacationCarryoverPolicy};
use service::ServiceError;

pub struct ConfigServiceImpl {
    config: Config,
}

impl ConfigServiceImpl {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Reads `TIMEZONE`, `VACATION_CARRYOVER_POLICY` and
    /// `ABSENCE_CONFLICT_POLICY` from the environment, with the German
    /// defaults when unset.
    pub fn from_env() -> Self {
        let timezone: Arc<str> = std::env::var("TIMEZONE")
            .unwrap_or_else(|_| "Europe/Berlin".to_string())
            .into();
        let vacation_carryover_policy = match std::env::var("VACATION_CARRYOVER_POLICY").as_deref()
        {
            Ok("unlimited") => VacationCarryoverPolicy::Unlimited,
            _ => VacationCarryoverPolicy::Capped5,
        };
        let absence_conflict_policy = match std::env::var("ABSENCE_CONFLICT_POLICY").as_deref() {
            Ok("reject_approval") => AbsenceConflictPolicy::RejectApproval,
            _ => AbsenceConflictPolicy::DeleteTimeEntries,
        };
        Self::new(Config {
            timezone,
            vacation_carryover_policy,
            absence_conflict_policy,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[async_trait]
impl ConfigService for ConfigServiceImpl {
    async fn get_config(&self) -> Result<Config, ServiceError> {
        Ok(self.config.clone())
    }
}
