use std::env;
use std::time::Duration;

pub const DEFAULT_XAPI_VERSION: &str = "1.0.3";
pub const DEFAULT_REGISTRATION_PARAM: &str = "registration";

/// Settings for the HTTP activity state store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateStoreConfig {
    /// Sent as `X-Experience-API-Version`.
    pub xapi_version: String,
    pub request_timeout: Option<Duration>,
    /// Query parameter carrying the registration id.
    pub registration_param: String,
}

impl Default for StateStoreConfig {
    fn default() -> Self {
        Self {
            xapi_version: DEFAULT_XAPI_VERSION.to_owned(),
            request_timeout: None,
            registration_param: DEFAULT_REGISTRATION_PARAM.to_owned(),
        }
    }
}

impl StateStoreConfig {
    /// Read overrides from `COURSE_XAPI_VERSION`, `COURSE_STATE_TIMEOUT_SECS`
    /// and `COURSE_STATE_REGISTRATION_PARAM`, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let xapi_version = non_empty("COURSE_XAPI_VERSION").unwrap_or(defaults.xapi_version);
        let request_timeout = non_empty("COURSE_STATE_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        let registration_param =
            non_empty("COURSE_STATE_REGISTRATION_PARAM").unwrap_or(defaults.registration_param);

        Self {
            xapi_version,
            request_timeout,
            registration_param,
        }
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}
