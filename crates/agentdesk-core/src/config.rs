// Console configuration
//
// Loaded from environment variables; the CLI overrides individual values
// with its flags.

use std::env;
use std::num::NonZeroUsize;
use std::time::Duration;
use tracing::warn;

use crate::notify::DEFAULT_NOTIFICATION_DURATION;
use crate::query::DEFAULT_PAGE_SIZE;

/// Agent-management endpoint used when none is configured
pub const DEFAULT_API_URL: &str = "https://hackaton.sdilab.es/api/v1/models/";

/// Configuration for a console session
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleConfig {
    /// Base URL of the agent-management API
    pub api_url: String,

    /// Bearer token, passed through unmodified
    pub api_key: String,

    /// Agents per page in the listing
    pub page_size: NonZeroUsize,

    /// How long notifications stay visible
    pub notification_duration: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            page_size: DEFAULT_PAGE_SIZE,
            notification_duration: DEFAULT_NOTIFICATION_DURATION,
        }
    }
}

impl ConsoleConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `AGENTDESK_API_URL`: API base URL (default: the hosted models endpoint)
    /// - `AGENTDESK_API_KEY`: bearer token (default: empty)
    /// - `AGENTDESK_PAGE_SIZE`: agents per page (default: 6)
    /// - `AGENTDESK_NOTIFICATION_MS`: notification lifetime in ms (default: 4000)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; invalid numbers fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let page_size = match lookup("AGENTDESK_PAGE_SIZE") {
            Some(raw) => raw.trim().parse::<NonZeroUsize>().unwrap_or_else(|_| {
                warn!(value = %raw, "invalid AGENTDESK_PAGE_SIZE, using default");
                defaults.page_size
            }),
            None => defaults.page_size,
        };

        let notification_duration = match lookup("AGENTDESK_NOTIFICATION_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .unwrap_or_else(|_| {
                    warn!(value = %raw, "invalid AGENTDESK_NOTIFICATION_MS, using default");
                    defaults.notification_duration
                }),
            None => defaults.notification_duration,
        };

        Self {
            api_url: lookup("AGENTDESK_API_URL")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.api_url),
            api_key: lookup("AGENTDESK_API_KEY").unwrap_or(defaults.api_key),
            page_size,
            notification_duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ConsoleConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ConsoleConfig::default());
        assert_eq!(config.page_size.get(), 6);
        assert_eq!(config.notification_duration, Duration::from_millis(4000));
    }

    #[test]
    fn test_overrides() {
        let config = ConsoleConfig::from_lookup(lookup(&[
            ("AGENTDESK_API_URL", "http://localhost:8080/api/v1/models/"),
            ("AGENTDESK_API_KEY", "sk-test"),
            ("AGENTDESK_PAGE_SIZE", "10"),
            ("AGENTDESK_NOTIFICATION_MS", "0"),
        ]));
        assert_eq!(config.api_url, "http://localhost:8080/api/v1/models/");
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.page_size.get(), 10);
        assert!(config.notification_duration.is_zero());
    }

    #[test]
    fn test_invalid_page_size_falls_back() {
        let zero = ConsoleConfig::from_lookup(lookup(&[("AGENTDESK_PAGE_SIZE", "0")]));
        let junk = ConsoleConfig::from_lookup(lookup(&[("AGENTDESK_PAGE_SIZE", "many")]));
        assert_eq!(zero.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(junk.page_size, DEFAULT_PAGE_SIZE);
    }
}
