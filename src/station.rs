//! Connection-only backend for hosts that cannot actively scan.
//!
//! Some hosts never grant on-demand scan authorization; the only network
//! they can describe is the one they are joined to. This adapter answers
//! `current_connection` from passive sources (`iw dev <if> link`, the
//! kernel routing table, resolv.conf) and reports scanning as
//! categorically unavailable. Signal strength, channel, and frequency are
//! never supplied.
//!
//! Connect and disconnect go through the saved network-profile store:
//! connecting writes a profile, disconnecting removes it. Neither forces
//! an immediate radio association or disassociation; the platform applies
//! saved configuration on its own schedule.

use std::path::PathBuf;

use tokio::process::Command;
use tracing::warn;

use crate::backend::{Capability, RawNetwork, WifiBackend};
use crate::config::{Profiles, SavedNetwork};
use crate::error::WifiScoutError;
use crate::interface;
use crate::network::{ConnectionOptions, CurrentConnection};

#[derive(Debug, Clone)]
pub struct StationBackend {
    interface: String,
    /// Saved-profile file; `None` uses the default config path.
    profiles_path: Option<PathBuf>,
}

impl StationBackend {
    pub fn new(interface: impl Into<String>) -> Self {
        StationBackend {
            interface: interface.into(),
            profiles_path: None,
        }
    }

    pub fn with_profiles_path(interface: impl Into<String>, path: PathBuf) -> Self {
        StationBackend {
            interface: interface.into(),
            profiles_path: Some(path),
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    fn load_profiles(&self) -> anyhow::Result<Profiles> {
        match &self.profiles_path {
            Some(path) => Profiles::load_from(path),
            None => Profiles::load(),
        }
    }

    fn save_profiles(&self, profiles: &Profiles) -> anyhow::Result<()> {
        match &self.profiles_path {
            Some(path) => profiles.save_to(path),
            None => profiles.save(),
        }
    }
}

impl WifiBackend for StationBackend {
    fn capability(&self) -> Capability {
        Capability::ConnectionOnly
    }

    async fn is_radio_enabled(&self) -> bool {
        rfkill_wlan_enabled().unwrap_or(false)
    }

    async fn trigger_scan(&self) -> Result<(), WifiScoutError> {
        Err(WifiScoutError::UnsupportedOnPlatform("scan"))
    }

    async fn poll_scan_results(&self) -> Result<Vec<RawNetwork>, WifiScoutError> {
        Err(WifiScoutError::UnsupportedOnPlatform("scan"))
    }

    async fn current_connection(&self) -> Result<Option<CurrentConnection>, WifiScoutError> {
        let output = Command::new("iw")
            .args(["dev", &self.interface, "link"])
            .output()
            .await
            .map_err(|e| WifiScoutError::PlatformCommand(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WifiScoutError::PlatformCommand(stderr.trim().to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let Some((ssid, bssid)) = parse_iw_link(&stdout) else {
            return Ok(None);
        };

        // IP-layer details come from passive sources and are each
        // independently optional.
        let ip_address = interface::local_ipv4(&self.interface);
        let gateway = std::fs::read_to_string("/proc/net/route")
            .ok()
            .and_then(|routes| parse_default_gateway(&routes, &self.interface));
        let dns_servers = std::fs::read_to_string("/etc/resolv.conf")
            .map(|conf| parse_nameservers(&conf))
            .unwrap_or_default();

        Ok(Some(CurrentConnection {
            ssid,
            bssid,
            ip_address,
            subnet_mask: None,
            gateway,
            dns_servers,
        }))
    }

    async fn connect(&self, options: &ConnectionOptions) -> Result<(), WifiScoutError> {
        // Apply a saved profile; the platform associates on its own
        // schedule, so success here is not "joined now".
        let mut profiles = self
            .load_profiles()
            .map_err(|e| WifiScoutError::PlatformRejected(e.to_string()))?;
        profiles.add_network(SavedNetwork {
            ssid: options.ssid.clone(),
            password: options.password.clone(),
            is_wep: options.is_wep,
        });
        self.save_profiles(&profiles)
            .map_err(|e| WifiScoutError::PlatformRejected(e.to_string()))?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), WifiScoutError> {
        // Removing the saved profile is all this platform offers; the
        // active association, if any, is left to lapse.
        let ssid = match self.current_connection().await {
            Ok(Some(connection)) => connection.ssid,
            Ok(None) => return Ok(()),
            Err(e) => {
                warn!(interface = %self.interface, error = %e, "could not resolve current network for disconnect");
                return Ok(());
            }
        };

        let mut profiles = self
            .load_profiles()
            .map_err(|e| WifiScoutError::PlatformCommand(e.to_string()))?;
        if profiles.remove_network(&ssid) {
            self.save_profiles(&profiles)
                .map_err(|e| WifiScoutError::PlatformCommand(e.to_string()))?;
        }
        Ok(())
    }
}

/// Whether any wlan rfkill switch is unblocked. `None` when rfkill state
/// cannot be read at all.
fn rfkill_wlan_enabled() -> Option<bool> {
    let entries = std::fs::read_dir("/sys/class/rfkill").ok()?;
    let mut saw_wlan = false;
    for entry in entries.flatten() {
        let path = entry.path();
        let kind = std::fs::read_to_string(path.join("type")).ok()?;
        if kind.trim() != "wlan" {
            continue;
        }
        saw_wlan = true;
        let soft = std::fs::read_to_string(path.join("soft")).ok()?;
        let hard = std::fs::read_to_string(path.join("hard")).ok()?;
        if soft.trim() == "0" && hard.trim() == "0" {
            return Some(true);
        }
    }
    if saw_wlan { Some(false) } else { None }
}

/// Parses `iw dev <if> link` output into (ssid, bssid), or `None` when
/// the interface is not associated ("Not connected.").
fn parse_iw_link(stdout: &str) -> Option<(String, String)> {
    let mut bssid = None;
    let mut ssid = None;

    for line in stdout.lines() {
        let line = line.trim();
        if line.starts_with("Not connected") {
            return None;
        }
        if let Some(rest) = line.strip_prefix("Connected to ") {
            bssid = rest.split_whitespace().next().map(|s| s.to_uppercase());
        } else if let Some(rest) = line.strip_prefix("SSID: ") {
            ssid = Some(rest.to_string());
        }
    }

    Some((ssid?, bssid.unwrap_or_default()))
}

/// Finds the default route's gateway for `interface` in /proc/net/route.
///
/// Fields are tab-separated; addresses are little-endian hex.
fn parse_default_gateway(routes: &str, interface: &str) -> Option<String> {
    for line in routes.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 || fields[0] != interface {
            continue;
        }
        // Destination 00000000 marks the default route.
        if fields[1] != "00000000" {
            continue;
        }
        let raw = u32::from_str_radix(fields[2], 16).ok()?;
        let octets = raw.to_le_bytes();
        return Some(format!(
            "{}.{}.{}.{}",
            octets[0], octets[1], octets[2], octets[3]
        ));
    }
    None
}

/// Nameserver entries from resolv.conf, in file order.
fn parse_nameservers(conf: &str) -> Vec<String> {
    conf.lines()
        .filter_map(|line| {
            let line = line.trim();
            line.strip_prefix("nameserver")
                .map(|rest| rest.trim().to_string())
        })
        .filter(|s| !s.is_empty())
        .collect()
}
