// ABOUTME: Immutable session configuration with builder-style setters and validation
// ABOUTME: Holds bind credentials, timeouts, keep-alive, rebind policy and segment capacities

use crate::client::keepalive::KeepAliveConfig;
use crate::client::segmenter::{MAX_SEGMENT_OCTETS, SegmentCapacities};
use crate::datatypes::bind_transceiver::{PASSWORD_LEN, SYSTEM_ID_LEN, SYSTEM_TYPE_LEN};
use std::time::Duration;
use thiserror::Error;

/// Credentials sent in bind_transceiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindCredentials {
    /// System identifier for authentication
    pub system_id: String,
    /// Password for authentication
    pub password: String,
    /// System type, empty by default
    pub system_type: String,
}

impl BindCredentials {
    pub fn new(system_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            system_id: system_id.into(),
            password: password.into(),
            system_type: String::new(),
        }
    }

    /// Set system type
    pub fn with_system_type(mut self, system_type: impl Into<String>) -> Self {
        self.system_type = system_type.into();
        self
    }
}

/// How hard the session tries to get back to Bound after losing the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebindPolicy {
    /// Bind attempts per link loss before the session fails (default: 3)
    pub max_attempts: u32,
    /// Pause before each attempt (default: 2 seconds)
    pub delay: Duration,
}

impl Default for RebindPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl RebindPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Fail on the first link loss
    pub fn never() -> Self {
        Self {
            max_attempts: 0,
            ..Default::default()
        }
    }
}

/// What `submit` does while the session is rebinding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RebindingSubmissions {
    /// Fail immediately with `SessionRebinding`
    #[default]
    Reject,
    /// Wait, up to the submission timeout, for the session to be bound again
    Queue,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("remote address is empty")]
    EmptyAddress,

    #[error("{field} is {actual} octets, at most {max} allowed")]
    FieldTooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("read timeout {read_timeout:?} must exceed the keep-alive interval {keepalive_interval:?}")]
    ReadTimeoutTooShort {
        read_timeout: Duration,
        keepalive_interval: Duration,
    },

    #[error("keep-alive failure ceiling must be at least 1")]
    ZeroFailureCeiling,

    #[error("segment capacity of {octets} octets does not fit one submit_sm (at most {max})")]
    SegmentCapacityTooLarge { octets: usize, max: usize },
}

/// Everything a session needs to know, fixed for the session's lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// `host:port` of the SMSC
    pub address: String,
    pub credentials: BindCredentials,
    pub keepalive: KeepAliveConfig,
    /// Longest silence on the link before it is considered lost (default: 75s)
    pub read_timeout: Duration,
    /// Limit for connect plus bind handshake (default: 10s)
    pub bind_timeout: Duration,
    /// Limit for a whole submission to be answered (default: 30s)
    pub submit_timeout: Duration,
    /// How long stop waits for in-flight submissions (default: 5s)
    pub close_timeout: Duration,
    pub rebind: RebindPolicy,
    pub rebinding_submissions: RebindingSubmissions,
    pub capacities: SegmentCapacities,
}

impl SessionConfig {
    pub fn new(address: impl Into<String>, credentials: BindCredentials) -> Self {
        Self {
            address: address.into(),
            credentials,
            keepalive: KeepAliveConfig::default(),
            read_timeout: Duration::from_secs(75),
            bind_timeout: Duration::from_secs(10),
            submit_timeout: Duration::from_secs(30),
            close_timeout: Duration::from_secs(5),
            rebind: RebindPolicy::default(),
            rebinding_submissions: RebindingSubmissions::default(),
            capacities: SegmentCapacities::default(),
        }
    }

    pub fn with_keepalive(mut self, keepalive: KeepAliveConfig) -> Self {
        self.keepalive = keepalive;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_bind_timeout(mut self, timeout: Duration) -> Self {
        self.bind_timeout = timeout;
        self
    }

    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    pub fn with_rebind_policy(mut self, rebind: RebindPolicy) -> Self {
        self.rebind = rebind;
        self
    }

    pub fn with_rebinding_submissions(mut self, policy: RebindingSubmissions) -> Self {
        self.rebinding_submissions = policy;
        self
    }

    pub fn with_segment_capacities(mut self, capacities: SegmentCapacities) -> Self {
        self.capacities = capacities;
        self
    }

    /// Check the configuration before any I/O happens
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address.trim().is_empty() {
            return Err(ConfigError::EmptyAddress);
        }

        let fields = [
            ("system_id", &self.credentials.system_id, SYSTEM_ID_LEN),
            ("password", &self.credentials.password, PASSWORD_LEN),
            ("system_type", &self.credentials.system_type, SYSTEM_TYPE_LEN),
        ];
        for (field, value, width) in fields {
            if value.len() >= width {
                return Err(ConfigError::FieldTooLong {
                    field,
                    max: width - 1,
                    actual: value.len(),
                });
            }
        }

        let durations = [
            ("read_timeout", self.read_timeout),
            ("bind_timeout", self.bind_timeout),
            ("submit_timeout", self.submit_timeout),
        ];
        for (field, duration) in durations {
            if duration.is_zero() {
                return Err(ConfigError::ZeroDuration(field));
            }
        }

        let octets = self.capacities.largest_segment_octets();
        if octets > MAX_SEGMENT_OCTETS {
            return Err(ConfigError::SegmentCapacityTooLarge {
                octets,
                max: MAX_SEGMENT_OCTETS,
            });
        }

        if self.keepalive.enabled {
            if self.keepalive.interval.is_zero() {
                return Err(ConfigError::ZeroDuration("keepalive.interval"));
            }
            if self.keepalive.timeout.is_zero() {
                return Err(ConfigError::ZeroDuration("keepalive.timeout"));
            }
            if self.keepalive.max_failures == 0 {
                return Err(ConfigError::ZeroFailureCeiling);
            }
            if self.read_timeout <= self.keepalive.interval {
                return Err(ConfigError::ReadTimeoutTooShort {
                    read_timeout: self.read_timeout,
                    keepalive_interval: self.keepalive.interval,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SessionConfig {
        SessionConfig::new("localhost:2775", BindCredentials::new("system_id", "secret"))
    }

    #[test]
    fn defaults_are_valid() {
        let config = config();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.rebinding_submissions, RebindingSubmissions::Reject);
        assert_eq!(config.rebind.max_attempts, 3);
    }

    #[test]
    fn rejects_long_credentials() {
        let config = SessionConfig::new(
            "localhost:2775",
            BindCredentials::new("system_id", "password1"),
        );
        assert_eq!(
            config.validate(),
            Err(ConfigError::FieldTooLong {
                field: "password",
                max: 8,
                actual: 9
            })
        );
    }

    #[test]
    fn rejects_empty_address_and_zero_timeouts() {
        let empty = SessionConfig::new(" ", BindCredentials::new("id", "pw"));
        assert_eq!(empty.validate(), Err(ConfigError::EmptyAddress));

        let zero = config().with_submit_timeout(Duration::ZERO);
        assert_eq!(zero.validate(), Err(ConfigError::ZeroDuration("submit_timeout")));
    }

    #[test]
    fn read_timeout_must_cover_keepalive() {
        let config = config()
            .with_keepalive(KeepAliveConfig::new(Duration::from_secs(60)))
            .with_read_timeout(Duration::from_secs(30));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ReadTimeoutTooShort { .. })
        ));

        // no keep-alive, no constraint
        let config = config.with_keepalive(KeepAliveConfig::disabled());
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn segment_capacity_must_fit_one_pdu() {
        let oversized = config().with_segment_capacities(SegmentCapacities::new(160, 70_000, 70));
        assert_eq!(
            oversized.validate(),
            Err(ConfigError::SegmentCapacityTooLarge {
                octets: 70_000,
                max: MAX_SEGMENT_OCTETS
            })
        );

        // UCS-2 units are two octets each
        let wide = config().with_segment_capacities(SegmentCapacities::new(160, 140, 40_000));
        assert!(matches!(
            wide.validate(),
            Err(ConfigError::SegmentCapacityTooLarge { octets: 80_000, .. })
        ));

        let largest = config()
            .with_segment_capacities(SegmentCapacities::new(160, MAX_SEGMENT_OCTETS, 70));
        assert_eq!(largest.validate(), Ok(()));
    }

    #[test]
    fn zero_failure_ceiling_is_rejected() {
        let config = config().with_keepalive(KeepAliveConfig::default().with_max_failures(0));
        assert_eq!(config.validate(), Err(ConfigError::ZeroFailureCeiling));
    }
}
