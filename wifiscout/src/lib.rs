//! Wi-Fi discovery and connection orchestration.
//!
//! This crate abstracts "how this host manages Wi-Fi" behind one
//! synchronous engine:
//!
//! - Scanning for visible networks, deduped and ranked
//! - Connecting to open and WPA-PSK networks
//! - Tracking the current connection and notifying on changes
//! - Managing saved networks and their passwords
//!
//! The engine prefers the NetworkManager D-Bus API, falls back to the
//! platform CLI tools (`nmcli`/`iwlist`, `airport`/`networksetup`,
//! `netsh`), and finally serves canned mock data so a scan always
//! produces something displayable.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wifiscout::{ConfigStore, WifiEngine};
//!
//! let engine = WifiEngine::new(Arc::new(ConfigStore::new()));
//!
//! for net in engine.scan()? {
//!     println!("{} ({}%, {})", net.ssid, net.strength, net.band);
//! }
//!
//! if engine.connect("MyNetwork", Some("password123"))? {
//!     println!("connected to {:?}", engine.current_connection());
//! }
//! # Ok::<(), wifiscout::EngineError>(())
//! ```
//!
//! # Concurrency
//!
//! The D-Bus session lives on a dedicated background thread; engine
//! calls submit work to it and block with a timeout, so the public API
//! needs no async runtime on the caller's side. Bus signals (access
//! points appearing, the connection changing) are watched continuously
//! and surface through the same callbacks as explicit scans.
//!
//! # Logging
//!
//! This crate uses the [`log`](https://docs.rs/log) facade. Add an
//! implementation like `env_logger` to see output.

mod backend;
mod bridge;
mod bus_ops;
mod config;
mod constants;
mod dedup;
mod engine;
mod events;
mod models;
mod parsers;
mod process;
mod proxies;
mod tracker;
mod utils;

pub use backend::{Backend, MockBackend};
pub use config::ConfigStore;
pub use engine::WifiEngine;
pub use models::{Band, EngineError, NetworkRecord, ScanResult};

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, EngineError>;
