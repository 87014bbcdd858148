use serde::{Deserialize, Serialize};

use crate::capabilities::{UsersEndpoint, ValidatedUrl};
use crate::{
    SyncError, DEFAULT_API_BASE_URL, DEFAULT_NOTIFICATION_DURATION_MS,
    MAX_NOTIFICATION_DURATION_MS, MIN_NOTIFICATION_DURATION_MS,
};

/// Settings the shell hands to the core at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub notification_duration_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            notification_duration_ms: DEFAULT_NOTIFICATION_DURATION_MS,
        }
    }
}

impl ClientConfig {
    /// Checks every setting and returns the endpoint the base URL resolves to.
    pub fn validate(&self) -> Result<UsersEndpoint, SyncError> {
        let endpoint = self.endpoint()?;
        if !(MIN_NOTIFICATION_DURATION_MS..=MAX_NOTIFICATION_DURATION_MS)
            .contains(&self.notification_duration_ms)
        {
            return Err(SyncError::InvalidConfig(format!(
                "notification_duration_ms must be within {MIN_NOTIFICATION_DURATION_MS}..={MAX_NOTIFICATION_DURATION_MS}"
            )));
        }
        Ok(endpoint)
    }

    fn endpoint(&self) -> Result<UsersEndpoint, SyncError> {
        let base = ValidatedUrl::new(self.api_base_url.as_str())
            .map_err(|e| SyncError::InvalidConfig(e.to_string()))?;
        Ok(UsersEndpoint::new(&base))
    }
}
