//! Subscriber registry for scan-result and connection-change events.

use std::sync::Mutex;

use crate::models::NetworkRecord;

type NetworkListCallback = Box<dyn Fn(&[NetworkRecord]) + Send + Sync>;
type ConnectionCallback = Box<dyn Fn(Option<&str>) + Send + Sync>;

/// Holds registered callbacks and dispatches events to them.
///
/// Callbacks for one event kind are invoked in registration order, while
/// the registry lock is held. Callbacks must therefore not subscribe
/// re-entrantly from inside a notification.
#[derive(Default)]
pub(crate) struct EventBus {
    network_list: Mutex<Vec<NetworkListCallback>>,
    connection: Mutex<Vec<ConnectionCallback>>,
}

impl EventBus {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn subscribe_network_list<F>(&self, callback: F)
    where
        F: Fn(&[NetworkRecord]) + Send + Sync + 'static,
    {
        if let Ok(mut subs) = self.network_list.lock() {
            subs.push(Box::new(callback));
        }
    }

    pub(crate) fn subscribe_connection<F>(&self, callback: F)
    where
        F: Fn(Option<&str>) + Send + Sync + 'static,
    {
        if let Ok(mut subs) = self.connection.lock() {
            subs.push(Box::new(callback));
        }
    }

    pub(crate) fn emit_network_list(&self, networks: &[NetworkRecord]) {
        if let Ok(subs) = self.network_list.lock() {
            for cb in subs.iter() {
                cb(networks);
            }
        }
    }

    pub(crate) fn emit_connection(&self, ssid: Option<&str>) {
        if let Ok(subs) = self.connection.lock() {
            for cb in subs.iter() {
                cb(ssid);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NetworkRecord;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn network_list_callbacks_fire_in_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in 0..3 {
            let order = Arc::clone(&order);
            bus.subscribe_network_list(move |_| order.lock().unwrap().push(tag));
        }

        bus.emit_network_list(&[NetworkRecord::new("A", 50, 2412)]);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn connection_callbacks_receive_the_ssid() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = Arc::clone(&seen);
        bus.subscribe_connection(move |ssid| {
            seen2.lock().unwrap().push(ssid.map(str::to_string));
        });

        bus.emit_connection(Some("Home"));
        bus.emit_connection(None);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Some("Home".to_string()), None]
        );
    }

    #[test]
    fn emit_without_subscribers_is_a_no_op() {
        let bus = EventBus::new();
        bus.emit_network_list(&[]);
        bus.emit_connection(None);
    }

    #[test]
    fn every_subscriber_sees_every_event() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let count = Arc::clone(&count);
            bus.subscribe_network_list(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        bus.emit_network_list(&[]);
        bus.emit_network_list(&[]);
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }
}
