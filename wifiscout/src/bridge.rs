//! Dedicated-thread bridge between the synchronous API and the D-Bus
//! session.
//!
//! One background thread owns a single-threaded runtime, the system-bus
//! connection, and a signal watcher. Synchronous callers submit an async
//! operation and block on a rendezvous channel with a timeout; operations
//! run serially in submission order, so no two bus operations ever
//! interleave. If the system bus cannot be reached the bridge marks
//! itself unavailable and every submission fails fast.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::stream::{Stream, StreamExt};
use log::{debug, warn};
use zbus::Connection;

use crate::bus_ops;
use crate::dedup::dedup_and_rank;
use crate::models::{EngineError, NetworkRecord};
use crate::Result;

/// A change observed on the bus, pushed to the engine without a request.
pub(crate) enum BusEvent {
    /// The visible network list changed. Records are already deduped and
    /// ranked against the current connection.
    NetworkList(Vec<NetworkRecord>),
    /// The active connection changed (or dropped).
    Connection(Option<String>),
}

pub(crate) type Observer = Arc<dyn Fn(BusEvent) + Send + Sync>;

type Job = Box<dyn FnOnce(Connection) -> Pin<Box<dyn Future<Output = ()>>> + Send>;

const STARTING: u8 = 0;
const READY: u8 = 1;
const UNAVAILABLE: u8 = 2;

pub(crate) struct AsyncBridge {
    jobs: Mutex<Option<tokio::sync::mpsc::UnboundedSender<Job>>>,
    state: AtomicU8,
    worker: Mutex<Option<std::thread::JoinHandle<()>>>,
}

impl AsyncBridge {
    /// Spawns the worker thread and starts watching bus signals. The
    /// observer is invoked from the worker thread on every unsolicited
    /// change.
    pub(crate) fn start(observer: Observer) -> Arc<Self> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Job>();

        let bridge = Arc::new(Self {
            jobs: Mutex::new(Some(tx)),
            state: AtomicU8::new(STARTING),
            worker: Mutex::new(None),
        });

        let handle = {
            let bridge = Arc::clone(&bridge);
            std::thread::Builder::new()
                .name("wifiscout-bus".into())
                .spawn(move || worker_main(bridge, rx, observer))
        };

        match handle {
            Ok(handle) => {
                if let Ok(mut worker) = bridge.worker.lock() {
                    *worker = Some(handle);
                }
            }
            Err(e) => {
                warn!("could not spawn bus worker: {e}");
                bridge.state.store(UNAVAILABLE, Ordering::SeqCst);
            }
        }

        bridge
    }

    pub(crate) fn available(&self) -> bool {
        self.state.load(Ordering::SeqCst) != UNAVAILABLE
    }

    /// Runs an async bus operation on the worker thread and blocks until
    /// it finishes or the timeout passes. The operation itself keeps
    /// running to completion on the worker even after a timeout; only the
    /// caller gives up waiting.
    pub(crate) fn submit<T, F, Fut>(&self, timeout: Duration, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Connection) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + 'static,
    {
        if self.state.load(Ordering::SeqCst) == UNAVAILABLE {
            return Err(EngineError::BackendUnavailable);
        }

        let (result_tx, result_rx) = std::sync::mpsc::sync_channel::<Result<T>>(1);

        let job: Job = Box::new(move |conn| {
            Box::pin(async move {
                let result = op(conn).await;
                // The caller may already have timed out.
                let _ = result_tx.send(result);
            })
        });

        let sent = self
            .jobs
            .lock()
            .ok()
            .and_then(|sender| sender.as_ref().map(|tx| tx.send(job).is_ok()))
            .unwrap_or(false);
        if !sent {
            return Err(EngineError::Cancelled);
        }

        match result_rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(EngineError::Timeout),
            Err(RecvTimeoutError::Disconnected) => {
                if self.state.load(Ordering::SeqCst) == UNAVAILABLE {
                    Err(EngineError::BackendUnavailable)
                } else {
                    Err(EngineError::Cancelled)
                }
            }
        }
    }

    /// Stops the worker. Pending submissions fail with `Cancelled`.
    pub(crate) fn shutdown(&self) {
        if let Ok(mut sender) = self.jobs.lock() {
            sender.take();
        }
        let handle = self.worker.lock().ok().and_then(|mut w| w.take());
        if let Some(handle) = handle {
            let _ = handle.join();
        }
        self.state.store(UNAVAILABLE, Ordering::SeqCst);
    }
}

impl Drop for AsyncBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_main(
    bridge: Arc<AsyncBridge>,
    mut rx: tokio::sync::mpsc::UnboundedReceiver<Job>,
    observer: Observer,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            warn!("could not build bus runtime: {e}");
            bridge.state.store(UNAVAILABLE, Ordering::SeqCst);
            return;
        }
    };

    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, async {
        let conn = match Connection::system().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("system bus unreachable: {e}");
                bridge.state.store(UNAVAILABLE, Ordering::SeqCst);
                return;
            }
        };
        bridge.state.store(READY, Ordering::SeqCst);
        debug!("bus worker connected");

        {
            let conn = conn.clone();
            let observer = Arc::clone(&observer);
            tokio::task::spawn_local(async move {
                if let Err(e) = watch_bus_signals(&conn, &observer).await {
                    warn!("signal watcher stopped: {e}");
                }
            });
        }

        refresh(&conn, &observer).await;

        while let Some(job) = rx.recv().await {
            job(conn.clone()).await;
        }
        debug!("bus worker shutting down");
    });
}

/// Subscribes to every bus signal that can invalidate our view and
/// refreshes state on each one.
///
/// Refreshing never issues a scan request: a scan would raise the very
/// signals being watched and the loop would feed itself.
async fn watch_bus_signals(conn: &Connection, observer: &Observer) -> Result<()> {
    let nm = crate::proxies::NMProxy::new(conn).await?;

    let mut streams: Vec<Pin<Box<dyn Stream<Item = ()>>>> = Vec::new();
    streams.push(Box::pin(nm.receive_state_changed().await?.map(|_| ())));

    for dev_path in bus_ops::wifi_device_paths(conn).await? {
        let wifi = crate::proxies::NMWirelessProxy::builder(conn)
            .path(dev_path.clone())?
            .build()
            .await?;
        streams.push(Box::pin(wifi.receive_access_point_added().await?.map(|_| ())));
        streams.push(Box::pin(wifi.receive_access_point_removed().await?.map(|_| ())));
        streams.push(Box::pin(
            wifi.receive_active_access_point_changed().await.map(|_| ()),
        ));
        debug!("watching signals on {dev_path}");
    }

    let mut merged = futures::stream::select_all(streams);
    while merged.next().await.is_some() {
        debug!("bus change detected");
        refresh(conn, observer).await;
    }

    warn!("signal streams ended");
    Ok(())
}

/// Re-reads the network list and current connection and pushes both to
/// the observer.
async fn refresh(conn: &Connection, observer: &Observer) {
    let current = bus_ops::current_ssid(conn).await;
    let raw = bus_ops::list_networks(conn).await.unwrap_or_default();
    let ranked = dedup_and_rank(raw, current.as_deref());

    observer(BusEvent::Connection(current));
    observer(BusEvent::NetworkList(ranked));
}
