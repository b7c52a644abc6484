//! Platform backend abstraction.
//!
//! One capability set (scan, current connection, connect, disconnect)
//! with two production adapters behind it: [`crate::nmcli::NmcliBackend`]
//! for hosts that can actively scan with full metadata, and
//! [`crate::station::StationBackend`] for hosts that can only report the
//! network they are joined to. Callers never branch on which adapter is
//! present, only on the [`Capability`] tag and the gate's decisions.

use trait_variant::make;

use crate::error::WifiScoutError;
use crate::network::{ConnectionOptions, CurrentConnection};

/// What a backend can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Active scan with signal, frequency, channel, and security metadata.
    FullScan,
    /// Only the currently joined network; no scan, no radio metadata.
    ConnectionOnly,
}

/// A network as the platform reported it, before codec-derived fields
/// (channel, secure flag, observation time) are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNetwork {
    pub ssid: String,
    pub bssid: String,
    pub signal_dbm: Option<i32>,
    pub frequency_mhz: Option<u32>,
    pub capabilities: Option<String>,
}

/// Production dispatch over the two adapters. Which variant gets built
/// is decided once, at construction; nothing downstream re-detects.
pub enum PlatformBackend {
    Full(crate::nmcli::NmcliBackend),
    ConnectionOnly(crate::station::StationBackend),
}

impl PlatformBackend {
    /// Probes whether this host can actively scan (a cache read through
    /// nmcli succeeds) and picks the adapter accordingly.
    pub async fn detect(interface: &str) -> Self {
        let probe = tokio::process::Command::new("nmcli")
            .args([
                "-t", "-f", "SSID", "device", "wifi", "list", "ifname", interface, "--rescan",
                "no",
            ])
            .output()
            .await;

        match probe {
            Ok(output) if output.status.success() => {
                PlatformBackend::Full(crate::nmcli::NmcliBackend::new(interface))
            }
            _ => PlatformBackend::ConnectionOnly(crate::station::StationBackend::new(interface)),
        }
    }
}

impl WifiBackend for PlatformBackend {
    fn capability(&self) -> Capability {
        match self {
            PlatformBackend::Full(b) => b.capability(),
            PlatformBackend::ConnectionOnly(b) => b.capability(),
        }
    }

    async fn is_radio_enabled(&self) -> bool {
        match self {
            PlatformBackend::Full(b) => b.is_radio_enabled().await,
            PlatformBackend::ConnectionOnly(b) => b.is_radio_enabled().await,
        }
    }

    async fn trigger_scan(&self) -> Result<(), WifiScoutError> {
        match self {
            PlatformBackend::Full(b) => b.trigger_scan().await,
            PlatformBackend::ConnectionOnly(b) => b.trigger_scan().await,
        }
    }

    async fn poll_scan_results(&self) -> Result<Vec<RawNetwork>, WifiScoutError> {
        match self {
            PlatformBackend::Full(b) => b.poll_scan_results().await,
            PlatformBackend::ConnectionOnly(b) => b.poll_scan_results().await,
        }
    }

    async fn current_connection(&self) -> Result<Option<CurrentConnection>, WifiScoutError> {
        match self {
            PlatformBackend::Full(b) => b.current_connection().await,
            PlatformBackend::ConnectionOnly(b) => b.current_connection().await,
        }
    }

    async fn connect(&self, options: &ConnectionOptions) -> Result<(), WifiScoutError> {
        match self {
            PlatformBackend::Full(b) => b.connect(options).await,
            PlatformBackend::ConnectionOnly(b) => b.connect(options).await,
        }
    }

    async fn disconnect(&self) -> Result<(), WifiScoutError> {
        match self {
            PlatformBackend::Full(b) => b.disconnect().await,
            PlatformBackend::ConnectionOnly(b) => b.disconnect().await,
        }
    }
}

/// Per-platform translation of the capability set into native calls.
///
/// Scan delivery is split into `trigger_scan` and `poll_scan_results`
/// because the full-scan platform has no blocking "wait for scan
/// complete" primitive; the orchestrator polls until results appear or
/// its deadline passes. Connection-only adapters answer both with
/// [`WifiScoutError::UnsupportedOnPlatform`] and are never polled.
#[make(Send)]
pub trait WifiBackend: Sync + 'static {
    fn capability(&self) -> Capability;

    /// Whether the radio is powered on. False on any uncertainty.
    async fn is_radio_enabled(&self) -> bool;

    /// Kick off a fresh scan. Does not wait for results.
    async fn trigger_scan(&self) -> Result<(), WifiScoutError>;

    /// Read whatever results the platform currently holds. May be empty
    /// while a triggered scan is still in flight.
    async fn poll_scan_results(&self) -> Result<Vec<RawNetwork>, WifiScoutError>;

    /// The currently joined network, or `None` when disconnected.
    async fn current_connection(&self) -> Result<Option<CurrentConnection>, WifiScoutError>;

    async fn connect(&self, options: &ConnectionOptions) -> Result<(), WifiScoutError>;

    /// Best-effort disconnect. On connection-only hosts this removes the
    /// saved profile and does not force an active disassociation.
    async fn disconnect(&self) -> Result<(), WifiScoutError>;
}
