//! The orchestration engine tying backends, tracker, config, and events
//! together.
//!
//! The engine owns an ordered chain of backends and walks it on every
//! scan: the NetworkManager bus first, then the platform CLI tools, with
//! the mock adapter as the terminal fallback so a scan always yields
//! something displayable. The backend that last produced a scan handles
//! subsequent connect and disconnect calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::backend::{platform_cli_backends, Backend, MockBackend, NmBusBackend};
use crate::bridge::{AsyncBridge, BusEvent};
use crate::config::ConfigStore;
use crate::constants::timeouts;
use crate::dedup::dedup_and_rank;
use crate::events::EventBus;
use crate::models::{NetworkRecord, ScanResult};
use crate::tracker::ConnectionTracker;
use crate::Result;

pub struct WifiEngine {
    config: Arc<ConfigStore>,
    events: Arc<EventBus>,
    tracker: Arc<ConnectionTracker>,
    bridge: Option<Arc<AsyncBridge>>,
    backends: Vec<Box<dyn Backend>>,
    /// Terminal fallback when every chained backend fails; also serves
    /// follow-up calls after such a scan.
    fallback: MockBackend,
    /// Index of the backend that served the last successful scan; out of
    /// range means the fallback did.
    active: AtomicUsize,
}

impl WifiEngine {
    /// Builds the engine with the default backend chain for this host.
    ///
    /// With `use_mock_data` set in the config the chain is the mock
    /// adapter alone and no bus connection is attempted.
    pub fn new(config: Arc<ConfigStore>) -> Self {
        let events = Arc::new(EventBus::new());
        let tracker = Arc::new(ConnectionTracker::new(Arc::clone(&events)));

        if config.use_mock_data() {
            info!("mock data enabled, skipping system backends");
            return Self {
                config,
                events,
                tracker,
                bridge: None,
                backends: vec![Box::new(MockBackend::new())],
                fallback: MockBackend::new(),
                active: AtomicUsize::new(0),
            };
        }

        let bridge = {
            let tracker = Arc::clone(&tracker);
            let events = Arc::clone(&events);
            AsyncBridge::start(Arc::new(move |event| match event {
                BusEvent::Connection(ssid) => tracker.observe(ssid),
                BusEvent::NetworkList(list) => {
                    tracker.set_last_scan(list.clone());
                    events.emit_network_list(&list);
                }
            }))
        };

        let mut backends: Vec<Box<dyn Backend>> = vec![Box::new(NmBusBackend::new(
            Arc::clone(&bridge),
            config.connect_grace(),
        ))];
        backends.extend(platform_cli_backends());
        backends.push(Box::new(MockBackend::new()));

        Self {
            config,
            events,
            tracker,
            bridge: Some(bridge),
            backends,
            fallback: MockBackend::new(),
            active: AtomicUsize::new(0),
        }
    }

    /// Builds the engine over an explicit backend chain. Intended for
    /// tests; no bus connection is made. An empty chain degrades to the
    /// mock fallback.
    pub fn with_backends(config: Arc<ConfigStore>, backends: Vec<Box<dyn Backend>>) -> Self {
        let events = Arc::new(EventBus::new());
        let tracker = Arc::new(ConnectionTracker::new(Arc::clone(&events)));
        Self {
            config,
            events,
            tracker,
            bridge: None,
            backends,
            fallback: MockBackend::new(),
            active: AtomicUsize::new(0),
        }
    }

    /// Scans for networks, walking the backend chain until one substrate
    /// produces a non-empty list.
    ///
    /// The result is deduped, ranked, cached as the last scan, and
    /// emitted to network-list subscribers exactly once.
    pub fn scan(&self) -> Result<ScanResult> {
        let timeout = timeouts::scan_timeout();

        for (i, backend) in self.backends.iter().enumerate() {
            match backend.scan(timeout) {
                Ok(records) if !records.is_empty() => {
                    debug!("scan served by {} ({} raw records)", backend.name(), records.len());
                    self.active.store(i, Ordering::SeqCst);
                    return Ok(self.finish_scan(backend.as_ref(), records));
                }
                Ok(_) => debug!("{} saw no networks, falling through", backend.name()),
                Err(e) => debug!("{} scan failed ({e}), falling through", backend.name()),
            }
        }

        // Chains built by callers may lack the terminal mock; a scan still
        // never comes back empty-handed. Follow-up calls go to the
        // fallback too, not the backend that last failed.
        warn!("all backends failed, serving mock data");
        self.active.store(usize::MAX, Ordering::SeqCst);
        let records = self.fallback.scan(timeout)?;
        Ok(self.finish_scan(&self.fallback, records))
    }

    fn finish_scan(&self, backend: &dyn Backend, records: Vec<NetworkRecord>) -> ScanResult {
        let observed = backend.current_connection().or_else(|| {
            records
                .iter()
                .find(|r| r.connected)
                .map(|r| r.ssid.clone())
        });
        self.tracker.observe(observed.clone());

        let ranked = dedup_and_rank(records, observed.as_deref());
        self.tracker.set_last_scan(ranked.clone());
        self.events.emit_network_list(&ranked);
        ranked
    }

    /// Connects to a network through the active backend.
    ///
    /// A password given here wins; otherwise the saved password for the
    /// SSID (if any) is used. Backend failures resolve to `false` rather
    /// than an error: the caller asked "are we on this network now".
    pub fn connect(&self, ssid: &str, password: Option<&str>) -> Result<bool> {
        let stored;
        let pw = match password {
            Some(pw) => Some(pw),
            None => {
                stored = self.config.saved_password(ssid);
                stored.as_deref()
            }
        };

        self.tracker.begin_connecting(ssid);
        let backend = self.active_backend();
        info!("connecting to '{ssid}' via {}", backend.name());

        let ok = match backend.connect(ssid, pw, timeouts::connect_timeout()) {
            Ok(ok) => ok,
            Err(e) => {
                warn!("connect to '{ssid}' failed: {e}");
                false
            }
        };

        self.tracker.finish_connect(ssid, ok);

        if ok && password.is_some() {
            self.config.save_network(ssid, password);
        }

        Ok(ok)
    }

    /// Disconnects from the current network. `Ok(true)` if a connection
    /// was dropped.
    pub fn disconnect(&self) -> Result<bool> {
        let backend = self.active_backend();
        let dropped = backend.disconnect()?;
        if dropped {
            self.tracker.set_disconnected();
        }
        Ok(dropped)
    }

    /// SSID of the network we are currently on, if any.
    pub fn current_connection(&self) -> Option<String> {
        self.tracker.current_ssid()
    }

    /// The most recent scan result, without rescanning.
    pub fn last_scan(&self) -> ScanResult {
        self.tracker.last_scan()
    }

    /// Saved networks: the substrate's profile store when it has one,
    /// the engine's own config store otherwise.
    pub fn saved_networks(&self) -> Vec<String> {
        match self.active_backend().saved_profiles() {
            Ok(list) => list,
            Err(e) => {
                debug!("no native profile store ({e}), using config");
                self.config.saved_network_ssids()
            }
        }
    }

    /// Forgets a network everywhere: native profiles and the config
    /// store. The returned flag reflects the config store, which is the
    /// engine's own source of truth for saved networks.
    pub fn forget_network(&self, ssid: &str) -> bool {
        match self.active_backend().forget(ssid) {
            Ok(native) => debug!("native forget of '{ssid}': {native}"),
            Err(e) => warn!("native forget of '{ssid}' failed: {e}"),
        }
        self.config.forget_network(ssid)
    }

    /// Registers a callback for ranked network-list updates (scans and
    /// unsolicited bus changes alike).
    pub fn on_network_list_changed<F>(&self, callback: F)
    where
        F: Fn(&[NetworkRecord]) + Send + Sync + 'static,
    {
        self.events.subscribe_network_list(callback);
    }

    /// Registers a callback for connection changes. Fired once per
    /// visible change; in-flight connect attempts are not visible.
    pub fn on_connection_changed<F>(&self, callback: F)
    where
        F: Fn(Option<&str>) + Send + Sync + 'static,
    {
        self.events.subscribe_connection(callback);
    }

    /// Access to the engine's config store.
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Stops the bus worker. Further bus-backed calls fail fast; CLI and
    /// mock backends keep working.
    pub fn shutdown(&self) {
        if let Some(bridge) = &self.bridge {
            bridge.shutdown();
        }
    }

    fn active_backend(&self) -> &dyn Backend {
        self.backends
            .get(self.active.load(Ordering::SeqCst))
            .map(|b| b.as_ref())
            .unwrap_or(&self.fallback)
    }
}

impl Drop for WifiEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
