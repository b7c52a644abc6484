//! Data model for discovered networks, the current connection, and
//! fingerprint snapshots.
//!
//! Every optional field on [`NetworkRecord`] is independently nullable
//! because a connection-only host cannot supply signal strength, channel,
//! or frequency. A record never asserts security information the platform
//! that produced it could not derive.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A single network observed during a scan.
///
/// Identity is `ssid` plus `bssid`; the BSSID is the true unique key when
/// present, since SSIDs are neither unique nor required to be non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkRecord {
    /// Network display name. May be empty for hidden networks.
    pub ssid: String,

    /// Hardware address of the access point radio. Empty when the
    /// platform withholds it.
    pub bssid: String,

    /// Received signal strength in dBm (negative, closer to 0 = stronger).
    pub signal_dbm: Option<i32>,

    /// Center frequency in MHz.
    pub frequency_mhz: Option<u32>,

    /// Channel number derived from the frequency.
    pub channel: Option<u32>,

    /// Opaque security descriptor as reported by the platform
    /// (e.g. "WPA2 WPA3" or "[WPA2-PSK-CCMP][ESS]").
    pub capabilities: Option<String>,

    /// Whether the network requires authentication, derived from
    /// `capabilities`. Absent when no descriptor was available.
    pub is_secure: Option<bool>,

    /// Capture time in milliseconds since the Unix epoch.
    pub observed_at_ms: Option<u64>,
}

impl NetworkRecord {
    /// The deduplication key: BSSID when present, otherwise the SSID.
    pub fn identity(&self) -> &str {
        if self.bssid.is_empty() {
            &self.ssid
        } else {
            &self.bssid
        }
    }
}

/// Derives the secure flag from a platform capabilities descriptor.
pub fn is_secure_capabilities(capabilities: &str) -> bool {
    capabilities.contains("WPA") || capabilities.contains("WEP") || capabilities.contains("EAP")
}

/// The network the device is currently joined to.
///
/// Distinct from [`NetworkRecord`]: a live connection can carry IP-layer
/// configuration that a scan result never has.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConnection {
    pub ssid: String,
    pub bssid: String,
    pub ip_address: Option<String>,
    pub subnet_mask: Option<String>,
    pub gateway: Option<String>,
    #[serde(default)]
    pub dns_servers: Vec<String>,
}

/// Channel and frequency of one network, answered together because
/// either both are known or neither is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub channel: u32,
    pub frequency_mhz: u32,
}

/// Optional location hint attached to a fingerprint by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationHint {
    pub latitude: f64,
    pub longitude: f64,
}

/// An immutable snapshot of every network visible at one point in time.
///
/// Records are deduplicated by identity. A new scan produces a new
/// fingerprint; an existing one is never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub networks: Vec<NetworkRecord>,
    /// Capture time in milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    pub location: Option<LocationHint>,
}

impl Fingerprint {
    /// A fingerprint with no records, stamped with the current time.
    /// This is the degraded result for denied, timed-out, or unsupported
    /// scans; degradation is never an error for read operations.
    pub fn empty() -> Self {
        Fingerprint {
            networks: Vec::new(),
            timestamp_ms: now_ms(),
            location: None,
        }
    }
}

/// Options controlling a single scan attempt.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Upper bound on returned records. `None` means all.
    pub max_results: Option<usize>,
    /// Upper bound on the wait, clamped to the 10 s hard ceiling for
    /// active scans. `None` means the default (the ceiling itself).
    pub timeout_ms: Option<u64>,
    /// Caller-supplied capture location, attached verbatim to the
    /// resulting fingerprint.
    pub location: Option<LocationHint>,
}

/// Hard ceiling on an active scan's wait, in milliseconds.
pub const MAX_SCAN_TIMEOUT_MS: u64 = 10_000;

impl ScanOptions {
    /// Effective deadline for an active scan: requested timeout clamped
    /// to the hard ceiling, or the ceiling when unspecified.
    pub fn effective_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(MAX_SCAN_TIMEOUT_MS).min(MAX_SCAN_TIMEOUT_MS))
    }
}

/// Options for a connection attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionOptions {
    pub ssid: String,
    pub password: Option<String>,
    /// Legacy WEP cipher flag.
    #[serde(default)]
    pub is_wep: bool,
}

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
