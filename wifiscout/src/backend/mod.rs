//! Backend abstraction over the ways a host can manage Wi-Fi.
//!
//! Each adapter wraps one substrate (the NetworkManager bus, a platform
//! CLI tool, or canned mock data) behind the same synchronous trait. The
//! engine owns an ordered chain of these and falls through on failure.

use std::time::Duration;

use crate::models::NetworkRecord;
use crate::Result;

mod airport;
mod mock;
mod netsh;
mod nm_bus;
mod nmcli;

pub(crate) use airport::AirportBackend;
pub use mock::MockBackend;
pub(crate) use netsh::NetshBackend;
pub(crate) use nm_bus::NmBusBackend;
pub(crate) use nmcli::NmcliBackend;

/// A Wi-Fi management substrate.
///
/// All methods are synchronous and bounded: an adapter either answers
/// within the given timeout or fails. Adapters never panic on bad input
/// from their substrate.
pub trait Backend: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Lists visible networks. Raw records; dedup is the engine's job.
    /// An `Ok` but empty result means "this substrate saw nothing" and
    /// the engine falls through to the next adapter.
    fn scan(&self, timeout: Duration) -> Result<Vec<NetworkRecord>>;

    /// Connects to a network. `Ok(true)` means the substrate reports the
    /// connection established; `Ok(false)` means the attempt completed
    /// but did not stick.
    fn connect(&self, ssid: &str, password: Option<&str>, timeout: Duration) -> Result<bool>;

    /// Drops the current connection. `Ok(true)` if something was
    /// disconnected.
    fn disconnect(&self) -> Result<bool>;

    /// SSID of the currently connected network, if the substrate can
    /// tell.
    fn current_connection(&self) -> Option<String>;

    /// SSIDs of profiles the substrate has saved.
    fn saved_profiles(&self) -> Result<Vec<String>>;

    /// Deletes saved profiles for an SSID. `Ok(true)` if any existed.
    fn forget(&self, ssid: &str) -> Result<bool>;
}

/// Ordered CLI adapters for the running platform.
///
/// All adapters compile everywhere; only the selection is
/// platform-dependent.
pub(crate) fn platform_cli_backends() -> Vec<Box<dyn Backend>> {
    match std::env::consts::OS {
        "linux" => vec![Box::new(NmcliBackend::new())],
        "macos" => vec![Box::new(AirportBackend::new())],
        "windows" => vec![Box::new(NetshBackend::new())],
        _ => Vec::new(),
    }
}
