use std::time::Duration;

/// Well-known port for the handshake channel and discovery listener.
pub const DEFAULT_PORT: u16 = 5684;

/// The 3-byte hello probe new nodes send to the discovery port.
pub const HELLO_PROBE: [u8; 3] = [0x50, 0x03, 0x00];

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct Config {
    discovery_port: u16,
    probe: [u8; 3],
    record_margin: usize,
    probe_poll: Duration,
}

impl Config {
    /// Create a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            discovery_port: DEFAULT_PORT,
            probe: HELLO_PROBE,
            record_margin: 23,
            probe_poll: Duration::from_millis(250),
        }
    }

    /// UDP port the discovery listener binds.
    #[inline(always)]
    pub fn discovery_port(&self) -> u16 {
        self.discovery_port
    }

    /// Probe pattern that triggers a handshake attempt.
    #[inline(always)]
    pub fn probe(&self) -> [u8; 3] {
        self.probe
    }

    /// Worst-case record header overhead added to receive buffers.
    #[inline(always)]
    pub fn record_margin(&self) -> usize {
        self.record_margin
    }

    /// How often the discovery listener wakes up to check for shutdown.
    #[inline(always)]
    pub fn probe_poll(&self) -> Duration {
        self.probe_poll
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::builder().build()
    }
}

/// Builder for the engine configuration.
pub struct ConfigBuilder {
    discovery_port: u16,
    probe: [u8; 3],
    record_margin: usize,
    probe_poll: Duration,
}

impl ConfigBuilder {
    /// Set the discovery listener port.
    ///
    /// Defaults to 5684. Changing it breaks discovery with stock peers.
    pub fn discovery_port(mut self, port: u16) -> Self {
        self.discovery_port = port;
        self
    }

    /// Set the probe pattern the discovery listener reacts to.
    ///
    /// Defaults to `50 03 00`.
    pub fn probe(mut self, probe: [u8; 3]) -> Self {
        self.probe = probe;
        self
    }

    /// Set the receive buffer margin for record header overhead.
    ///
    /// Defaults to 23 bytes, the worst case of this record layer.
    pub fn record_margin(mut self, margin: usize) -> Self {
        self.record_margin = margin;
        self
    }

    /// Set the discovery listener's shutdown poll interval.
    ///
    /// Defaults to 250 ms.
    pub fn probe_poll(mut self, poll: Duration) -> Self {
        self.probe_poll = poll;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Config {
        Config {
            discovery_port: self.discovery_port,
            probe: self.probe,
            record_margin: self.record_margin,
            probe_poll: self.probe_poll,
        }
    }
}
