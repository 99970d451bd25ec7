//! Mock adapter with canned networks.
//!
//! Terminal fallback in the adapter chain and the standard test double.
//! Scans always succeed with a fixed neighborhood; connects always
//! succeed after a short simulated delay and are remembered in-process.

use std::sync::Mutex;
use std::time::Duration;

use crate::constants::timeouts;
use crate::models::{EngineError, NetworkRecord};
use crate::Result;

pub struct MockBackend {
    current: Mutex<Option<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }

    /// The fixed neighborhood every mock scan reports.
    pub fn sample_networks() -> Vec<NetworkRecord> {
        vec![
            NetworkRecord::new("Home_WiFi_5G", 92, 5180).secured(true),
            NetworkRecord::new("Home_WiFi_2.4G", 85, 2412).secured(true),
            NetworkRecord::new("CoffeeShop_Guest", 67, 2437),
            NetworkRecord::new("Office_Network", 58, 5180).secured(true),
        ]
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl super::Backend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn scan(&self, _timeout: Duration) -> Result<Vec<NetworkRecord>> {
        let current = self.current_connection();
        Ok(Self::sample_networks()
            .into_iter()
            .map(|r| {
                let connected = current.as_deref() == Some(r.ssid.as_str());
                r.connected(connected)
            })
            .collect())
    }

    fn connect(&self, ssid: &str, _password: Option<&str>, _timeout: Duration) -> Result<bool> {
        std::thread::sleep(timeouts::mock_connect_delay());
        if let Ok(mut current) = self.current.lock() {
            *current = Some(ssid.to_string());
        }
        Ok(true)
    }

    fn disconnect(&self) -> Result<bool> {
        let mut current = self
            .current
            .lock()
            .map_err(|_| EngineError::OperationFailed("mock state poisoned".into()))?;
        Ok(current.take().is_some())
    }

    fn current_connection(&self) -> Option<String> {
        self.current.lock().ok()?.clone()
    }

    fn saved_profiles(&self) -> Result<Vec<String>> {
        // No native profile store; the engine falls back to its config.
        Err(EngineError::OperationFailed(
            "mock backend keeps no profiles".into(),
        ))
    }

    fn forget(&self, _ssid: &str) -> Result<bool> {
        Ok(false)
    }
}
