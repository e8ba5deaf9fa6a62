// ABOUTME: enquire_link keep-alive accounting shared by the keep-alive task and the dispatcher
// ABOUTME: Counts misses across rebinds and wakes the keep-alive task when a response arrives

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Configuration for SMPP keep-alive functionality
///
/// Controls the periodic enquire_link PDUs a bound session sends to verify
/// the link. A response must arrive within `timeout`; each miss forces a
/// rebind, and `max_failures` consecutive misses fail the session.
///
/// # Example
///
/// ```rust
/// use smpp_session::client::KeepAliveConfig;
/// use std::time::Duration;
///
/// // Default configuration (30s interval, 10s timeout, 3 max failures)
/// let config = KeepAliveConfig::default();
///
/// // Custom configuration
/// let config = KeepAliveConfig::new(Duration::from_secs(60))
///     .with_timeout(Duration::from_secs(15))
///     .with_max_failures(5);
///
/// // Disabled keep-alive
/// let config = KeepAliveConfig::disabled();
/// assert!(!config.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepAliveConfig {
    /// Interval between enquire_link PDUs (default: 30 seconds)
    pub interval: Duration,

    /// Timeout for enquire_link responses (default: 10 seconds)
    ///
    /// Should be significantly less than the interval.
    pub timeout: Duration,

    /// Consecutive misses before the session is failed (default: 3)
    ///
    /// Misses are counted across rebinds and only an enquire_link_resp
    /// resets the count.
    pub max_failures: u32,

    /// Whether keep-alive is enabled (default: true)
    pub enabled: bool,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(10),
            max_failures: 3,
            enabled: true,
        }
    }
}

impl KeepAliveConfig {
    /// Create a new keep-alive configuration with custom interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Set the timeout for enquire_link responses
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the consecutive misses tolerated before the session fails
    pub fn with_max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = max_failures;
        self
    }

    /// No enquire_link PDUs are sent; link loss is detected by the read
    /// timeout alone
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Snapshot of keep-alive health
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAliveStatus {
    /// True if keep-alive is enabled
    pub running: bool,

    /// enquire_link PDUs in a row that got no response. Reset to 0 by the
    /// next response.
    pub consecutive_failures: u32,

    /// Total enquire_link PDUs sent
    pub total_pings: u32,

    /// Total enquire_link_resp PDUs received. The success rate is
    /// `total_pongs / total_pings`.
    pub total_pongs: u32,
}

/// Ping and failure bookkeeping
#[derive(Debug)]
pub struct KeepAliveManager {
    config: KeepAliveConfig,
    consecutive_failures: u32,
    total_pings: u32,
    total_pongs: u32,
}

impl KeepAliveManager {
    pub fn new(config: KeepAliveConfig) -> Self {
        Self {
            config,
            consecutive_failures: 0,
            total_pings: 0,
            total_pongs: 0,
        }
    }

    /// Record that an enquire_link was sent
    pub fn on_ping_sent(&mut self) {
        self.total_pings += 1;
        debug!("Enquire_link sent (total: {})", self.total_pings);
    }

    /// Record an enquire_link_resp. Clears the failure count.
    pub fn on_ping_success(&mut self) {
        self.consecutive_failures = 0;
        self.total_pongs += 1;
        debug!("Enquire_link successful (total: {})", self.total_pongs);
    }

    /// Record an enquire_link that got no response in time
    pub fn on_ping_failure(&mut self) {
        self.consecutive_failures += 1;
        warn!(
            "Enquire_link failed (consecutive failures: {})",
            self.consecutive_failures
        );
    }

    /// True once the consecutive failures reach the configured maximum
    pub fn is_connection_failed(&self) -> bool {
        self.consecutive_failures >= self.config.max_failures
    }

    pub fn status(&self) -> KeepAliveStatus {
        KeepAliveStatus {
            running: self.config.enabled,
            consecutive_failures: self.consecutive_failures,
            total_pings: self.total_pings,
            total_pongs: self.total_pongs,
        }
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }
}

/// What a missed response means for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MissVerdict {
    Rebind,
    Fail,
}

/// `KeepAliveManager` shared between the keep-alive task, which sends pings
/// and waits, and the reader task, which sees the responses.
///
/// Outlives individual links so the failure count survives rebinds.
#[derive(Debug)]
pub(crate) struct KeepAliveMonitor {
    manager: Mutex<KeepAliveManager>,
    pongs: watch::Sender<u64>,
}

impl KeepAliveMonitor {
    pub(crate) fn new(config: KeepAliveConfig) -> Self {
        let (pongs, _) = watch::channel(0);
        Self {
            manager: Mutex::new(KeepAliveManager::new(config)),
            pongs,
        }
    }

    fn manager(&self) -> MutexGuard<'_, KeepAliveManager> {
        self.manager.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Receiver that changes on every recorded pong
    pub(crate) fn subscribe(&self) -> watch::Receiver<u64> {
        self.pongs.subscribe()
    }

    pub(crate) fn record_ping(&self) {
        self.manager().on_ping_sent();
    }

    pub(crate) fn record_pong(&self) {
        self.manager().on_ping_success();
        self.pongs.send_modify(|count| *count += 1);
    }

    pub(crate) fn record_miss(&self) -> MissVerdict {
        let mut manager = self.manager();
        manager.on_ping_failure();
        if manager.is_connection_failed() {
            MissVerdict::Fail
        } else {
            MissVerdict::Rebind
        }
    }

    pub(crate) fn status(&self) -> KeepAliveStatus {
        self.manager().status()
    }

    pub(crate) fn interval(&self) -> Duration {
        self.manager().interval()
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.manager().timeout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_alive_config_defaults() {
        let config = KeepAliveConfig::default();
        assert_eq!(config.interval, Duration::from_secs(30));
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_failures, 3);
        assert!(config.enabled);
    }

    #[test]
    fn test_keep_alive_config_builder() {
        let config = KeepAliveConfig::new(Duration::from_secs(60))
            .with_timeout(Duration::from_secs(5))
            .with_max_failures(5);

        assert_eq!(config.interval, Duration::from_secs(60));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_failures, 5);
        assert!(config.enabled);
    }

    #[test]
    fn test_keep_alive_failure_tracking() {
        let config = KeepAliveConfig::default().with_max_failures(3);
        let mut manager = KeepAliveManager::new(config);
        assert!(!manager.is_connection_failed());

        manager.on_ping_failure();
        manager.on_ping_failure();
        assert!(!manager.is_connection_failed());

        manager.on_ping_failure();
        assert!(manager.is_connection_failed());

        manager.on_ping_success();
        assert!(!manager.is_connection_failed());
    }

    #[test]
    fn test_keep_alive_statistics() {
        let mut manager = KeepAliveManager::new(KeepAliveConfig::default());

        let status = manager.status();
        assert_eq!(status.total_pings, 0);
        assert_eq!(status.total_pongs, 0);
        assert_eq!(status.consecutive_failures, 0);

        manager.on_ping_sent();
        manager.on_ping_success();
        manager.on_ping_failure();
        let status = manager.status();
        assert_eq!(status.total_pings, 1);
        assert_eq!(status.total_pongs, 1);
        assert_eq!(status.consecutive_failures, 1);
    }

    #[test]
    fn monitor_verdicts_and_pong_feed() {
        let monitor = KeepAliveMonitor::new(KeepAliveConfig::default().with_max_failures(2));
        let mut pongs = monitor.subscribe();

        assert_eq!(monitor.record_miss(), MissVerdict::Rebind);
        monitor.record_pong();
        assert!(pongs.has_changed().unwrap());
        assert_eq!(*pongs.borrow_and_update(), 1);

        // the pong cleared the earlier miss
        assert_eq!(monitor.record_miss(), MissVerdict::Rebind);
        assert_eq!(monitor.record_miss(), MissVerdict::Fail);
        assert_eq!(monitor.status().consecutive_failures, 2);
    }
}
