//! Connection-state tracking and change notification.
//!
//! The tracker is the single source of truth for "what network are we
//! on". Backends report observations into it; it decides whether the
//! externally visible SSID changed and notifies subscribers exactly once
//! per visible change.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use log::debug;

use crate::events::EventBus;
use crate::models::NetworkRecord;

/// Link state as the tracker sees it.
///
/// `Connecting` is internal bookkeeping: while a connect attempt is in
/// flight the externally visible SSID stays whatever it was before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LinkState {
    Disconnected,
    Connecting(String),
    Connected(String),
}

impl LinkState {
    fn visible_ssid(&self) -> Option<&str> {
        match self {
            LinkState::Connected(ssid) => Some(ssid),
            _ => None,
        }
    }
}

struct TrackerInner {
    state: LinkState,
    last_scan: Vec<NetworkRecord>,
    last_changed_at: Instant,
}

pub(crate) struct ConnectionTracker {
    inner: Mutex<TrackerInner>,
    events: Arc<EventBus>,
}

impl ConnectionTracker {
    pub(crate) fn new(events: Arc<EventBus>) -> Self {
        Self {
            inner: Mutex::new(TrackerInner {
                state: LinkState::Disconnected,
                last_scan: Vec::new(),
                last_changed_at: Instant::now(),
            }),
            events,
        }
    }

    /// SSID of the network we are connected to, if any. In-flight connect
    /// attempts do not count.
    pub(crate) fn current_ssid(&self) -> Option<String> {
        let inner = self.inner.lock().ok()?;
        inner.state.visible_ssid().map(str::to_string)
    }

    /// Marks a connect attempt as started. The visible SSID is unchanged.
    pub(crate) fn begin_connecting(&self, ssid: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            debug!("connecting to {ssid}");
            inner.state = LinkState::Connecting(ssid.to_string());
        }
    }

    /// Resolves a connect attempt. On success the tracker moves to
    /// `Connected` and subscribers hear about it; on failure it falls back
    /// to `Disconnected`.
    pub(crate) fn finish_connect(&self, ssid: &str, ok: bool) {
        let next = if ok {
            LinkState::Connected(ssid.to_string())
        } else {
            LinkState::Disconnected
        };
        self.transition(next);
    }

    pub(crate) fn set_disconnected(&self) {
        self.transition(LinkState::Disconnected);
    }

    /// Feeds an externally observed connection state (from a scan or a bus
    /// signal) into the tracker. Observations are applied unconditionally:
    /// the substrate outranks any in-flight bookkeeping.
    pub(crate) fn observe(&self, ssid: Option<String>) {
        let next = match ssid {
            Some(ssid) => LinkState::Connected(ssid),
            None => LinkState::Disconnected,
        };
        self.transition(next);
    }

    fn transition(&self, next: LinkState) {
        let changed = {
            let Ok(mut inner) = self.inner.lock() else {
                return;
            };
            let was = inner.state.visible_ssid().map(str::to_string);
            let now = next.visible_ssid().map(str::to_string);
            inner.state = next;
            if was != now {
                let since_last = inner.last_changed_at.elapsed();
                inner.last_changed_at = Instant::now();
                debug!("connection changed to {:?} after {:?}", now, since_last);
                Some(now)
            } else {
                None
            }
        };
        // Emit outside the tracker lock.
        if let Some(now) = changed {
            self.events.emit_connection(now.as_deref());
        }
    }

    pub(crate) fn set_last_scan(&self, networks: Vec<NetworkRecord>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.last_scan = networks;
        }
    }

    pub(crate) fn last_scan(&self) -> Vec<NetworkRecord> {
        self.inner
            .lock()
            .map(|inner| inner.last_scan.clone())
            .unwrap_or_default()
    }
}
