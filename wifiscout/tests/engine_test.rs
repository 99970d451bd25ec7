//! Engine behavior over controlled backend chains.
//!
//! These tests drive the engine through explicit backends (the mock plus
//! purpose-built failing doubles), so no D-Bus session or CLI tool is
//! required.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use wifiscout::{
    Backend, ConfigStore, EngineError, MockBackend, NetworkRecord, Result, WifiEngine,
};

fn temp_config() -> Arc<ConfigStore> {
    let path = std::env::temp_dir()
        .join(format!("wifiscout-engine-test-{}", uuid::Uuid::new_v4()))
        .join("config.json");
    Arc::new(ConfigStore::at_path(path))
}

/// A backend whose every operation fails.
struct FailingBackend;

impl Backend for FailingBackend {
    fn name(&self) -> &'static str {
        "failing"
    }
    fn scan(&self, _timeout: Duration) -> Result<Vec<NetworkRecord>> {
        Err(EngineError::BackendUnavailable)
    }
    fn connect(&self, _ssid: &str, _pw: Option<&str>, _timeout: Duration) -> Result<bool> {
        Err(EngineError::BackendUnavailable)
    }
    fn disconnect(&self) -> Result<bool> {
        Err(EngineError::BackendUnavailable)
    }
    fn current_connection(&self) -> Option<String> {
        None
    }
    fn saved_profiles(&self) -> Result<Vec<String>> {
        Err(EngineError::BackendUnavailable)
    }
    fn forget(&self, _ssid: &str) -> Result<bool> {
        Err(EngineError::BackendUnavailable)
    }
}

/// A backend that scans fine but whose connects time out.
struct TimeoutConnectBackend;

impl Backend for TimeoutConnectBackend {
    fn name(&self) -> &'static str {
        "timeout-connect"
    }
    fn scan(&self, timeout: Duration) -> Result<Vec<NetworkRecord>> {
        MockBackend::new().scan(timeout)
    }
    fn connect(&self, _ssid: &str, _pw: Option<&str>, _timeout: Duration) -> Result<bool> {
        Err(EngineError::Timeout)
    }
    fn disconnect(&self) -> Result<bool> {
        Ok(false)
    }
    fn current_connection(&self) -> Option<String> {
        None
    }
    fn saved_profiles(&self) -> Result<Vec<String>> {
        Err(EngineError::OperationFailed("no store".into()))
    }
    fn forget(&self, _ssid: &str) -> Result<bool> {
        Ok(false)
    }
}

#[test]
fn scan_falls_through_failing_backends_to_mock() {
    let engine = WifiEngine::with_backends(
        temp_config(),
        vec![Box::new(FailingBackend), Box::new(MockBackend::new())],
    );

    let events = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&events);
    engine.on_network_list_changed(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let networks = engine.scan().unwrap();
    assert!(!networks.is_empty(), "mock fallback must produce networks");
    assert_eq!(events.load(Ordering::SeqCst), 1, "one event per scan");
}

#[test]
fn after_an_all_failed_scan_follow_up_calls_use_the_fallback() {
    let engine = WifiEngine::with_backends(temp_config(), vec![Box::new(FailingBackend)]);

    let networks = engine.scan().unwrap();
    assert!(!networks.is_empty());

    // The chained backend would error; the fallback that served the scan
    // handles the connect instead.
    assert!(engine.connect("Home_WiFi_5G", None).unwrap());
    assert_eq!(engine.current_connection(), Some("Home_WiFi_5G".to_string()));
    assert!(engine.disconnect().unwrap());
}

#[test]
fn empty_backend_chain_degrades_to_the_fallback() {
    let engine = WifiEngine::with_backends(temp_config(), Vec::new());

    assert!(!engine.scan().unwrap().is_empty());
    assert!(engine.connect("CoffeeShop_Guest", None).unwrap());
    assert!(engine.saved_networks().is_empty());
    assert!(engine.disconnect().unwrap());
}

#[test]
fn scan_result_is_deduped_and_ranked() {
    let engine = WifiEngine::with_backends(temp_config(), vec![Box::new(MockBackend::new())]);
    let networks = engine.scan().unwrap();

    let mut ssids: Vec<_> = networks.iter().map(|n| n.ssid.clone()).collect();
    let before = ssids.len();
    ssids.sort_unstable();
    ssids.dedup();
    assert_eq!(ssids.len(), before, "no duplicate SSIDs after a scan");

    assert!(
        networks.windows(2).all(|w| w[0].strength >= w[1].strength),
        "no connected network, so ordering is strength alone"
    );
    assert_eq!(engine.last_scan().len(), networks.len());
}

#[test]
fn connect_success_updates_tracker_and_fires_event() {
    let engine = WifiEngine::with_backends(temp_config(), vec![Box::new(MockBackend::new())]);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine.on_connection_changed(move |ssid| {
        sink.lock().unwrap().push(ssid.map(str::to_string));
    });

    assert!(engine.connect("Home_WiFi_5G", None).unwrap());
    assert_eq!(engine.current_connection(), Some("Home_WiFi_5G".to_string()));
    assert_eq!(
        *seen.lock().unwrap(),
        vec![Some("Home_WiFi_5G".to_string())]
    );

    // The connected network ranks first on the next scan.
    let networks = engine.scan().unwrap();
    assert_eq!(networks[0].ssid, "Home_WiFi_5G");
    assert!(networks[0].connected);
}

#[test]
fn connect_with_password_saves_the_network() {
    let config = temp_config();
    let engine =
        WifiEngine::with_backends(Arc::clone(&config), vec![Box::new(MockBackend::new())]);

    assert!(engine.connect("Office_Network", Some("hunter2")).unwrap());
    assert_eq!(
        config.saved_password("Office_Network"),
        Some("hunter2".to_string())
    );
}

#[test]
fn failed_connect_reports_false_and_stays_disconnected() {
    let engine =
        WifiEngine::with_backends(temp_config(), vec![Box::new(TimeoutConnectBackend)]);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine.on_connection_changed(move |ssid| {
        sink.lock().unwrap().push(ssid.map(str::to_string));
    });

    assert!(!engine.connect("Home_WiFi_5G", None).unwrap());
    assert_eq!(engine.current_connection(), None);
    assert!(
        seen.lock().unwrap().is_empty(),
        "no visible change, no event"
    );
}

#[test]
fn disconnect_clears_the_current_connection() {
    let engine = WifiEngine::with_backends(temp_config(), vec![Box::new(MockBackend::new())]);
    engine.connect("CoffeeShop_Guest", None).unwrap();

    assert!(engine.disconnect().unwrap());
    assert_eq!(engine.current_connection(), None);
    assert!(!engine.disconnect().unwrap(), "second disconnect is a no-op");
}

#[test]
fn forget_removes_config_entry_even_when_substrate_has_none() {
    let config = temp_config();
    let engine =
        WifiEngine::with_backends(Arc::clone(&config), vec![Box::new(MockBackend::new())]);

    engine.connect("Home_WiFi_2.4G", Some("secret")).unwrap();
    assert!(config.saved_password("Home_WiFi_2.4G").is_some());

    // The mock's native forget reports false; the config entry still goes.
    assert!(engine.forget_network("Home_WiFi_2.4G"));
    assert_eq!(config.saved_password("Home_WiFi_2.4G"), None);
    assert!(!engine.forget_network("Home_WiFi_2.4G"));
}

#[test]
fn saved_networks_fall_back_to_config() {
    let config = temp_config();
    let engine =
        WifiEngine::with_backends(Arc::clone(&config), vec![Box::new(MockBackend::new())]);

    config.save_network("Remembered", None);
    assert_eq!(engine.saved_networks(), vec!["Remembered"]);
}

#[test]
fn mock_config_flag_builds_a_working_engine() {
    let config = temp_config();
    config.set("use_mock_data", serde_json::json!(true));

    let engine = WifiEngine::new(config);
    let networks = engine.scan().unwrap();
    assert_eq!(networks.len(), 4);
    assert!(engine.connect("CoffeeShop_Guest", None).unwrap());
    assert_eq!(
        engine.current_connection(),
        Some("CoffeeShop_Guest".to_string())
    );
}
