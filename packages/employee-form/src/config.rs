use std::env;
use std::time::Duration;

use dotenvy::dotenv;

use crate::error::{ConfigError, ConfigResult};
use crate::validation::ValidationRules;

/// Departments offered when `DEPARTMENTS` is not set.
pub const DEFAULT_DEPARTMENTS: [&str; 4] = ["HR", "Engineering", "Marketing", "Finance"];

/// Quiet period before an identity field counts as settled.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(1000);

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Which identity fields must be non-empty before a duplicate check is sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckPolicy {
    /// At least one of employee ID or email.
    #[default]
    Either,
    /// Both employee ID and email.
    Both,
}

impl CheckPolicy {
    pub fn permits(&self, employee_id: &str, email: &str) -> bool {
        let has_id = !employee_id.trim().is_empty();
        let has_email = !email.trim().is_empty();
        match self {
            CheckPolicy::Either => has_id || has_email,
            CheckPolicy::Both => has_id && has_email,
        }
    }
}

/// Form configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct FormConfig {
    pub api_url: String,
    pub duplicate_check: bool,
    pub check_policy: CheckPolicy,
    pub quiet_period: Duration,
    pub corporate_domain: Option<String>,
    pub departments: Vec<String>,
    pub request_timeout: Option<Duration>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            duplicate_check: true,
            check_policy: CheckPolicy::default(),
            quiet_period: DEFAULT_QUIET_PERIOD,
            corporate_domain: None,
            departments: DEFAULT_DEPARTMENTS.iter().map(|d| d.to_string()).collect(),
            request_timeout: None,
        }
    }
}

impl FormConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = match lookup("EMPLOYEE_API_URL") {
            Some(url) if url.trim().is_empty() => {
                return Err(ConfigError::Empty {
                    var: "EMPLOYEE_API_URL",
                })
            }
            Some(url) => url.trim().trim_end_matches('/').to_string(),
            None => defaults.api_url,
        };

        let duplicate_check = match lookup("DUPLICATE_CHECK_ENABLED") {
            Some(value) => parse_bool("DUPLICATE_CHECK_ENABLED", &value)?,
            None => defaults.duplicate_check,
        };

        let check_policy = match lookup("DUPLICATE_CHECK_POLICY") {
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "either" => CheckPolicy::Either,
                "both" => CheckPolicy::Both,
                _ => {
                    return Err(ConfigError::InvalidPolicy {
                        var: "DUPLICATE_CHECK_POLICY",
                        value,
                    })
                }
            },
            None => defaults.check_policy,
        };

        let quiet_period = match lookup("DUPLICATE_CHECK_DEBOUNCE_MS") {
            Some(value) => parse_millis("DUPLICATE_CHECK_DEBOUNCE_MS", &value)?,
            None => defaults.quiet_period,
        };

        let corporate_domain = lookup("CORPORATE_EMAIL_DOMAIN")
            .map(|domain| domain.trim().trim_start_matches('@').to_string())
            .filter(|domain| !domain.is_empty());

        let departments = match lookup("DEPARTMENTS") {
            Some(value) => {
                let departments: Vec<String> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(String::from)
                    .collect();
                if departments.is_empty() {
                    return Err(ConfigError::Empty { var: "DEPARTMENTS" });
                }
                departments
            }
            None => defaults.departments,
        };

        let request_timeout = lookup("REQUEST_TIMEOUT_MS")
            .map(|value| parse_millis("REQUEST_TIMEOUT_MS", &value))
            .transpose()?;

        Ok(Self {
            api_url,
            duplicate_check,
            check_policy,
            quiet_period,
            corporate_domain,
            departments,
            request_timeout,
        })
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_duplicate_check(mut self, enabled: bool) -> Self {
        self.duplicate_check = enabled;
        self
    }

    pub fn with_check_policy(mut self, policy: CheckPolicy) -> Self {
        self.check_policy = policy;
        self
    }

    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }

    pub fn with_corporate_domain(mut self, domain: impl Into<String>) -> Self {
        self.corporate_domain = Some(domain.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Policy for duplicate checks, or `None` for the plain form.
    pub fn duplicate_policy(&self) -> Option<CheckPolicy> {
        self.duplicate_check.then_some(self.check_policy)
    }

    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules::new(self.departments.clone(), self.corporate_domain.clone())
    }
}

fn parse_bool(var: &'static str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            value: value.to_string(),
        }),
    }
}

fn parse_millis(var: &'static str, value: &str) -> ConfigResult<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::InvalidNumber {
            var,
            value: value.to_string(),
        })
}
