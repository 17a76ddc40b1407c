use std::time::Duration;

use crate::policy::Backoff;

/// Configuration for reconnection behavior.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum number of reconnect attempts before giving up.
    /// None means unlimited attempts.
    pub(crate) max_attempts: Option<u32>,

    /// Base delay between attempts; attempt `k` waits `k × delay`.
    pub(crate) delay: Duration,

    /// Upper bound on the computed backoff delay.
    pub(crate) delay_max: Duration,

    /// Per-attempt connect timeout. None disables the watchdog.
    pub(crate) timeout: Option<Duration>,

    /// Whether closes trigger automatic reconnection at all.
    pub(crate) reconnection: bool,
}

impl ReconnectConfig {
    /// Creates a new builder for configuring reconnection behavior.
    pub fn builder() -> ReconnectConfigBuilder {
        ReconnectConfigBuilder::default()
    }

    /// Returns the maximum number of reconnect attempts, if bounded.
    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Returns the base delay between attempts.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns the cap on the computed backoff delay.
    pub fn delay_max(&self) -> Duration {
        self.delay_max
    }

    /// Returns the per-attempt connect timeout, if enabled.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns whether automatic reconnection is enabled.
    pub fn reconnection(&self) -> bool {
        self.reconnection
    }

    pub(crate) fn backoff(&self) -> Backoff {
        Backoff::linear(self.delay, self.delay_max)
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            delay: Duration::from_millis(1000),
            delay_max: Duration::from_millis(5000),
            timeout: Some(Duration::from_millis(10_000)),
            reconnection: true,
        }
    }
}

/// Builder for constructing a [`ReconnectConfig`].
#[derive(Debug)]
pub struct ReconnectConfigBuilder {
    max_attempts: Option<u32>,
    delay: Duration,
    delay_max: Duration,
    timeout: Option<Duration>,
    reconnection: bool,
}

impl ReconnectConfigBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of reconnect attempts.
    ///
    /// # Examples
    ///
    /// ```
    /// use transport_reconnect::ReconnectConfig;
    ///
    /// let config = ReconnectConfig::builder()
    ///     .max_attempts(5)
    ///     .build();
    /// assert_eq!(config.max_attempts(), Some(5));
    /// ```
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Sets unlimited reconnect attempts. This is the default.
    pub fn unlimited_attempts(mut self) -> Self {
        self.max_attempts = None;
        self
    }

    /// Sets the base delay between attempts.
    ///
    /// Attempt `k` waits `k × delay`, capped at
    /// [`delay_max`](ReconnectConfigBuilder::delay_max).
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use transport_reconnect::ReconnectConfig;
    ///
    /// let config = ReconnectConfig::builder()
    ///     .delay(Duration::from_millis(250))
    ///     .build();
    /// assert_eq!(config.delay(), Duration::from_millis(250));
    /// ```
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the cap on the computed backoff delay.
    pub fn delay_max(mut self, delay_max: Duration) -> Self {
        self.delay_max = delay_max;
        self
    }

    /// Sets the per-attempt connect timeout.
    ///
    /// If an attempt's open resolves with neither an open nor an error event
    /// within this window, the attempt is force-closed and a
    /// `reconnect_timeout` event is emitted.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disables the per-attempt connect timeout.
    ///
    /// # Examples
    ///
    /// ```
    /// use transport_reconnect::ReconnectConfig;
    ///
    /// let config = ReconnectConfig::builder()
    ///     .no_timeout()
    ///     .build();
    /// assert!(config.timeout().is_none());
    /// ```
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Sets whether closes trigger automatic reconnection.
    ///
    /// Default is `true`. When disabled, a transport close cancels all
    /// timers and the controller goes idle.
    pub fn reconnection(mut self, reconnection: bool) -> Self {
        self.reconnection = reconnection;
        self
    }

    /// Builds the [`ReconnectConfig`].
    pub fn build(self) -> ReconnectConfig {
        ReconnectConfig {
            max_attempts: self.max_attempts,
            delay: self.delay,
            delay_max: self.delay_max,
            timeout: self.timeout,
            reconnection: self.reconnection,
        }
    }
}

impl Default for ReconnectConfigBuilder {
    fn default() -> Self {
        let defaults = ReconnectConfig::default();
        Self {
            max_attempts: defaults.max_attempts,
            delay: defaults.delay,
            delay_max: defaults.delay_max,
            timeout: defaults.timeout,
            reconnection: defaults.reconnection,
        }
    }
}
