use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;

use crate::constants::frequency;

/// Radio band a network operates on, derived from its frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Band {
    /// 2.4GHz band (channels 1-14).
    Band2_4GHz,
    /// 5GHz band.
    Band5GHz,
}

impl Band {
    /// Derives the band from an operating frequency in MHz.
    ///
    /// Anything at or above the 5GHz band start counts as 5GHz;
    /// everything else (including an unknown frequency of 0) is 2.4GHz.
    pub fn from_mhz(mhz: u32) -> Self {
        if mhz >= frequency::BAND_5_START {
            Band::Band5GHz
        } else {
            Band::Band2_4GHz
        }
    }
}

impl Display for Band {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Band::Band2_4GHz => write!(f, "2.4GHz"),
            Band::Band5GHz => write!(f, "5GHz"),
        }
    }
}

/// A Wi-Fi network sighted during a scan.
///
/// One record per network after dedup; raw parser output may contain
/// several records with the same SSID (one per access point).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkRecord {
    pub ssid: String,
    /// Signal strength as a percentage, always within 0-100.
    pub strength: u8,
    pub frequency_mhz: u32,
    pub band: Band,
    pub secured: bool,
    /// True for at most one record per scan result: the one whose SSID
    /// matches the tracker's current network.
    pub connected: bool,
}

impl NetworkRecord {
    /// Builds a record, clamping strength to 0-100 and deriving the band
    /// from the frequency.
    pub fn new(ssid: impl Into<String>, strength: i64, frequency_mhz: u32) -> Self {
        let strength = strength.clamp(0, 100) as u8;
        Self {
            ssid: ssid.into(),
            strength,
            frequency_mhz,
            band: Band::from_mhz(frequency_mhz),
            secured: false,
            connected: false,
        }
    }

    pub fn secured(mut self, secured: bool) -> Self {
        self.secured = secured;
        self
    }

    pub fn connected(mut self, connected: bool) -> Self {
        self.connected = connected;
        self
    }
}

/// Ordered scan output; insertion order is ranking order.
pub type ScanResult = Vec<NetworkRecord>;

/// Errors that can occur during engine operations.
///
/// Adapters convert every lower-level failure (D-Bus errors, process
/// failures, unparseable output) into one of these variants at the
/// adapter boundary; nothing below the orchestrator panics or leaks a
/// substrate-specific error type to callers.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The backend session or tool is absent.
    #[error("backend unavailable")]
    BackendUnavailable,

    /// A call exceeded its timeout bound.
    #[error("operation timed out")]
    Timeout,

    /// External output was unrecognized; treated as "no networks".
    #[error("unparseable output")]
    ParseFailure,

    /// An external call returned a failure code or response.
    #[error("operation failed: {0}")]
    OperationFailed(String),

    /// The operation was abandoned because the bridge is shutting down.
    #[error("operation cancelled")]
    Cancelled,
}

impl From<zbus::Error> for EngineError {
    fn from(e: zbus::Error) -> Self {
        EngineError::OperationFailed(e.to_string())
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::OperationFailed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_from_mhz() {
        assert_eq!(Band::from_mhz(2412), Band::Band2_4GHz);
        assert_eq!(Band::from_mhz(2484), Band::Band2_4GHz);
        assert_eq!(Band::from_mhz(5180), Band::Band5GHz);
        assert_eq!(Band::from_mhz(5745), Band::Band5GHz);
        assert_eq!(Band::from_mhz(0), Band::Band2_4GHz);
    }

    #[test]
    fn band_display() {
        assert_eq!(format!("{}", Band::Band2_4GHz), "2.4GHz");
        assert_eq!(format!("{}", Band::Band5GHz), "5GHz");
    }

    #[test]
    fn record_clamps_strength() {
        assert_eq!(NetworkRecord::new("a", 150, 2412).strength, 100);
        assert_eq!(NetworkRecord::new("a", -20, 2412).strength, 0);
        assert_eq!(NetworkRecord::new("a", 67, 2412).strength, 67);
    }

    #[test]
    fn record_derives_band() {
        assert_eq!(NetworkRecord::new("a", 50, 5180).band, Band::Band5GHz);
        assert_eq!(NetworkRecord::new("a", 50, 2437).band, Band::Band2_4GHz);
    }

    #[test]
    fn zbus_errors_map_to_operation_failed() {
        let err: EngineError = zbus::Error::InvalidReply.into();
        assert!(matches!(err, EngineError::OperationFailed(_)));
    }
}
