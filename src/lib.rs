//! WiFi Scout: nearby-network discovery and current-connection tracking
//! across hosts with uneven scan capabilities.
//!
//! Some hosts can actively scan and report signal strength, channel,
//! frequency, and security metadata for every visible network. Others can
//! only name the single network they are joined to. This library
//! normalizes the two behind one asynchronous contract: uniform result
//! shapes, uniform absent-vs-error semantics, bounded waits that never
//! hang, and graceful degradation instead of failure wherever a
//! capability is missing.
//!
//! # Modules
//!
//! - [`backend`] - the per-platform adapter trait and capability tag
//! - [`channel`] - frequency <-> channel conversion for both bands
//! - [`config`] - saved network profiles on disk
//! - [`error`] - the error taxonomy
//! - [`gate`] - permission/availability checks guarding every operation
//! - [`interface`] - wireless interface enumeration and IP lookup
//! - [`network`] - records, fingerprints, and option types
//! - [`nmcli`] - full-scan adapter driving NetworkManager
//! - [`scan`] - the scan orchestrator state machine
//! - [`server`] - HTTP status surface
//! - [`session`] - the caller-facing operation set
//! - [`station`] - connection-only adapter for scan-less hosts
//! - [`store`] - the per-session cache of scanned records
//!
//! # Example
//!
//! ```no_run
//! use wifi_scout::backend::PlatformBackend;
//! use wifi_scout::gate::SystemPermissions;
//! use wifi_scout::network::ScanOptions;
//! use wifi_scout::session::WifiSession;
//!
//! # async fn example() {
//! let backend = PlatformBackend::detect("wlan0").await;
//! let session = WifiSession::new(backend, SystemPermissions);
//!
//! let fingerprint = session.scan(ScanOptions::default()).await;
//! for network in &fingerprint.networks {
//!     println!("{} ({:?} dBm)", network.ssid, network.signal_dbm);
//! }
//! # }
//! ```

pub mod backend;
pub mod channel;
pub mod config;
pub mod error;
pub mod gate;
pub mod interface;
pub mod network;
pub mod nmcli;
pub mod scan;
pub mod server;
pub mod session;
pub mod station;
pub mod store;

// Re-export the types most callers touch.
pub use backend::{Capability, PlatformBackend, RawNetwork, WifiBackend};
pub use error::WifiScoutError;
pub use network::{
    ChannelInfo, ConnectionOptions, CurrentConnection, Fingerprint, NetworkRecord, ScanOptions,
};
pub use scan::{ScanConfig, ScanOrchestrator, ScanState};
pub use session::WifiSession;
pub use store::NetworkStore;
