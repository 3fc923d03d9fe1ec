use crate::errors::ConfigError;
use std::{env, str::FromStr, time::Duration};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// What to do when an action fires while a request of the same kind is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    #[default]
    Allow,
    CancelPrevious,
    IgnoreNew,
}

impl FromStr for DuplicatePolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(DuplicatePolicy::Allow),
            "cancel-previous" | "cancel_previous" => Ok(DuplicatePolicy::CancelPrevious),
            "ignore-new" | "ignore_new" => Ok(DuplicatePolicy::IgnoreNew),
            _ => Err(ConfigError::invalid("LABOR_BOARD_DUPLICATES", value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout: Option<Duration>,
    pub reload_after_assignment: bool,
    pub duplicate_policy: DuplicatePolicy,
    pub honor_body_status: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: None,
            reload_after_assignment: false,
            duplicate_policy: DuplicatePolicy::Allow,
            honor_body_status: false,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("LABOR_BOARD_URL").filter(|v| !v.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }

        if let Some(raw) = lookup("LABOR_BOARD_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::invalid("LABOR_BOARD_TIMEOUT_SECS", &raw))?;
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(raw) = lookup("LABOR_BOARD_RELOAD_AFTER_ASSIGN") {
            config.reload_after_assignment = parse_flag("LABOR_BOARD_RELOAD_AFTER_ASSIGN", &raw)?;
        }

        if let Some(raw) = lookup("LABOR_BOARD_DUPLICATES") {
            config.duplicate_policy = raw.parse()?;
        }

        if let Some(raw) = lookup("LABOR_BOARD_HONOR_BODY_STATUS") {
            config.honor_body_status = parse_flag("LABOR_BOARD_HONOR_BODY_STATUS", &raw)?;
        }

        Ok(config)
    }
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::invalid(name, raw)),
    }
}
