//! NetworkManager D-Bus adapter.
//!
//! Thin synchronous shim: every call is an async bus operation submitted
//! through the bridge. Preferred over the CLI adapters whenever the
//! system bus is reachable.

use std::sync::Arc;
use std::time::Duration;

use crate::bridge::AsyncBridge;
use crate::bus_ops;
use crate::constants::timeouts;
use crate::models::{EngineError, NetworkRecord};
use crate::Result;

pub(crate) struct NmBusBackend {
    bridge: Arc<AsyncBridge>,
    grace: Duration,
}

impl NmBusBackend {
    pub(crate) fn new(bridge: Arc<AsyncBridge>, grace: Duration) -> Self {
        Self { bridge, grace }
    }
}

impl super::Backend for NmBusBackend {
    fn name(&self) -> &'static str {
        "nm-bus"
    }

    fn scan(&self, timeout: Duration) -> Result<Vec<NetworkRecord>> {
        if !self.bridge.available() {
            return Err(EngineError::BackendUnavailable);
        }
        self.bridge.submit(timeout, |conn| async move {
            let _ = bus_ops::request_scan(&conn).await;
            bus_ops::list_networks(&conn).await
        })
    }

    fn connect(&self, ssid: &str, password: Option<&str>, timeout: Duration) -> Result<bool> {
        let ssid = ssid.to_string();
        let password = password.map(str::to_string);
        let grace = self.grace;
        self.bridge.submit(timeout, move |conn| async move {
            bus_ops::connect_network(&conn, &ssid, password.as_deref(), grace).await
        })
    }

    fn disconnect(&self) -> Result<bool> {
        self.bridge
            .submit(timeouts::scan_timeout(), |conn| async move {
                bus_ops::disconnect_all(&conn).await
            })
    }

    fn current_connection(&self) -> Option<String> {
        self.bridge
            .submit(timeouts::scan_timeout(), |conn| async move {
                Ok(bus_ops::current_ssid(&conn).await)
            })
            .ok()
            .flatten()
    }

    fn saved_profiles(&self) -> Result<Vec<String>> {
        self.bridge
            .submit(timeouts::scan_timeout(), |conn| async move {
                bus_ops::saved_profile_ssids(&conn).await
            })
    }

    fn forget(&self, ssid: &str) -> Result<bool> {
        let ssid = ssid.to_string();
        self.bridge
            .submit(timeouts::scan_timeout(), move |conn| async move {
                bus_ops::forget_profiles(&conn, &ssid).await
            })
    }
}
