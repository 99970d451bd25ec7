//! Constants for NetworkManager D-Bus codes, timeouts, and frequency bands.
//!
//! The numeric codes correspond to the values used by NetworkManager's
//! D-Bus API; the timeouts are the engine-wide default bounds.

/// NetworkManager device type constants.
pub mod device_type {
    pub const WIFI: u32 = 2;
}

/// Timeout and delay constants.
pub mod timeouts {
    use std::time::Duration;

    pub const SCAN_TIMEOUT_SECS: u64 = 5;
    pub const CONNECT_TIMEOUT_SECS: u64 = 30;
    /// Default grace period after issuing a bus connect before re-checking
    /// the current connection. Tunable through the `connect_grace_ms`
    /// config key.
    pub const CONNECT_GRACE_MS: u64 = 1000;
    /// Interval between `try_wait` polls of an external process.
    pub const PROCESS_POLL_MS: u64 = 50;
    /// Settle delay between registering a platform profile and connecting.
    pub const PROFILE_SETTLE_MS: u64 = 500;
    /// Simulated connect latency of the mock backend.
    pub const MOCK_CONNECT_MS: u64 = 300;

    pub fn scan_timeout() -> Duration {
        Duration::from_secs(SCAN_TIMEOUT_SECS)
    }

    pub fn connect_timeout() -> Duration {
        Duration::from_secs(CONNECT_TIMEOUT_SECS)
    }

    pub fn process_poll_interval() -> Duration {
        Duration::from_millis(PROCESS_POLL_MS)
    }

    pub fn profile_settle() -> Duration {
        Duration::from_millis(PROFILE_SETTLE_MS)
    }

    pub fn mock_connect_delay() -> Duration {
        Duration::from_millis(MOCK_CONNECT_MS)
    }
}

/// WiFi frequency constants (MHz).
pub mod frequency {
    pub const BAND_2_4_START: u32 = 2412;
    pub const BAND_2_4_CH14: u32 = 2484;
    pub const BAND_5_START: u32 = 5000;
    pub const CHANNEL_SPACING: u32 = 5;
    /// Representative frequencies used when a CLI tool reports no
    /// frequency at all.
    pub const REPRESENTATIVE_2_4: u32 = 2437;
    pub const REPRESENTATIVE_5: u32 = 5180;
}

/// Parser defaults.
pub mod defaults {
    /// Signal strength assumed when a tabular field fails to parse.
    pub const UNPARSED_SIGNAL: i64 = 50;
}
