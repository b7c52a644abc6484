//! The caller-facing surface: one asynchronous contract over whichever
//! backend is present.
//!
//! Every read or query operation resolves to an absent or empty value on
//! failure: denied permission, powered-off radio, timeout, platform gap,
//! unknown SSID all look the same at this boundary. The single exception
//! is [`WifiSession::connect`], where the caller must be able to tell
//! "nothing found" from "attempted and refused"; it returns the error
//! taxonomy directly.
//!
//! Point queries (`get_signal_strength`, `get_address`, ...) read the
//! record store, so they reflect the most recent scan rather than
//! triggering a new one.

use std::sync::Arc;

use tokio::time::timeout;
use tracing::warn;

use crate::backend::{Capability, WifiBackend};
use crate::error::WifiScoutError;
use crate::gate::{CapabilityGate, Decision, DenyReason, Operation, PermissionProvider};
use crate::interface;
use crate::network::{
    ChannelInfo, ConnectionOptions, CurrentConnection, Fingerprint, NetworkRecord, ScanOptions,
    now_ms,
};
use crate::scan::{CompletionHook, ScanConfig, ScanOrchestrator, ScanState};
use crate::store::NetworkStore;

pub struct WifiSession<B: WifiBackend> {
    backend: Arc<B>,
    gate: Arc<CapabilityGate>,
    store: Arc<NetworkStore>,
    orchestrator: Arc<ScanOrchestrator<B>>,
    config: ScanConfig,
}

impl<B: WifiBackend> WifiSession<B> {
    pub fn new(backend: B, permissions: impl PermissionProvider + 'static) -> Self {
        Self::with_config(backend, permissions, ScanConfig::default())
    }

    pub fn with_config(
        backend: B,
        permissions: impl PermissionProvider + 'static,
        config: ScanConfig,
    ) -> Self {
        let backend = Arc::new(backend);
        let gate = Arc::new(CapabilityGate::new(permissions));
        let store = Arc::new(NetworkStore::new());
        let orchestrator = Arc::new(ScanOrchestrator::new(
            Arc::clone(&backend),
            Arc::clone(&gate),
            Arc::clone(&store),
            config,
        ));
        WifiSession {
            backend,
            gate,
            store,
            orchestrator,
            config,
        }
    }

    pub fn capability(&self) -> Capability {
        self.backend.capability()
    }

    /// Outcome of the most recent scan attempt; lets callers who care
    /// distinguish "denied" from "nothing visible" even though the
    /// fingerprints look identical.
    pub fn last_scan_state(&self) -> ScanState {
        self.orchestrator.state()
    }

    /// Registers the completion hook an event layer attaches to.
    pub fn set_completion_hook(&self, hook: CompletionHook) {
        self.orchestrator.set_completion_hook(hook);
    }

    /// Whether the radio is powered on; false on any uncertainty.
    pub async fn is_radio_enabled(&self) -> bool {
        self.backend.is_radio_enabled().await
    }

    /// Whether the scan authorization is granted right now.
    pub fn has_required_permission(&self) -> bool {
        self.gate.check_or_request_permission()
    }

    /// Runs one scan to completion and returns its fingerprint. Degraded
    /// paths return an empty fingerprint, never an error.
    pub async fn scan(&self, options: ScanOptions) -> Fingerprint {
        self.orchestrator.run_scan(options).await
    }

    /// Fire-and-forget scan; read the store afterwards to observe it.
    pub fn start_scan(&self, options: ScanOptions)
    where
        B: Send,
    {
        self.orchestrator.start_scan(options);
    }

    pub fn stop_scan(&self) {
        self.orchestrator.stop_scan();
    }

    /// SSIDs seen in the last scan, deduplicated, discovery order.
    pub fn list_known_ssids(&self) -> Vec<String> {
        self.store.known_ssids()
    }

    /// Snapshot of the cached records with a fresh timestamp. Empty
    /// record set when nothing has been scanned yet.
    pub fn get_fingerprint(&self) -> Fingerprint {
        Fingerprint {
            networks: self.store.all(),
            timestamp_ms: now_ms(),
            location: None,
        }
    }

    /// Signal strength in dBm for `ssid`, or `None` when the network is
    /// unknown or this platform/permission cannot supply signal data.
    pub fn get_signal_strength(&self, ssid: &str) -> Option<i32> {
        if !self.metadata_readable() {
            return None;
        }
        self.store.lookup_by_ssid(ssid)?.signal_dbm
    }

    /// BSSID for `ssid`, or `None` when not found.
    pub fn get_address(&self, ssid: &str) -> Option<String> {
        let record = self.store.lookup_by_ssid(ssid)?;
        if record.bssid.is_empty() {
            None
        } else {
            Some(record.bssid)
        }
    }

    /// Channel and frequency for `ssid`; `None` when not found or when
    /// the platform never supplies channel data.
    pub fn get_channel_info(&self, ssid: &str) -> Option<ChannelInfo> {
        if !self.metadata_readable() {
            return None;
        }
        let record = self.store.lookup_by_ssid(ssid)?;
        Some(ChannelInfo {
            channel: record.channel?,
            frequency_mhz: record.frequency_mhz?,
        })
    }

    /// Everything known about `ssid` from the last scan.
    pub fn get_network_detail(&self, ssid: &str) -> Option<NetworkRecord> {
        self.store.lookup_by_ssid(ssid)
    }

    /// The currently joined network, or `None` when disconnected or the
    /// query fails or times out. Bounded; never hangs.
    pub async fn get_current_connection(&self) -> Option<CurrentConnection> {
        match timeout(
            self.config.connection_query_timeout,
            self.backend.current_connection(),
        )
        .await
        {
            Ok(Ok(connection)) => connection,
            Ok(Err(e)) => {
                warn!(error = %e, "current-connection query failed");
                None
            }
            Err(_) => {
                warn!("current-connection query timed out");
                None
            }
        }
    }

    /// Attempts to join a network. The one operation whose failures are
    /// reported rather than degraded: the caller needs the reason.
    pub async fn connect(&self, options: ConnectionOptions) -> Result<(), WifiScoutError> {
        let radio_on = self.backend.is_radio_enabled().await;
        match self
            .gate
            .evaluate(Operation::Connect, self.backend.capability(), radio_on)
        {
            Decision::Proceed => {}
            Decision::Deny(DenyReason::PermissionDenied) => {
                return Err(WifiScoutError::PermissionDenied);
            }
            _ => return Err(WifiScoutError::RadioUnavailable),
        }

        match timeout(self.config.connect_timeout, self.backend.connect(&options)).await {
            Ok(result) => result,
            Err(_) => Err(WifiScoutError::Timeout(
                self.config.connect_timeout.as_millis() as u64,
            )),
        }
    }

    /// Best-effort disconnect. On connection-only hosts this only removes
    /// the saved profile; an active association may outlive the call.
    pub async fn disconnect(&self) -> Result<(), WifiScoutError> {
        let radio_on = self.backend.is_radio_enabled().await;
        match self
            .gate
            .evaluate(Operation::Disconnect, self.backend.capability(), radio_on)
        {
            Decision::Proceed => self.backend.disconnect().await,
            Decision::Deny(DenyReason::PermissionDenied) => Err(WifiScoutError::PermissionDenied),
            _ => Err(WifiScoutError::RadioUnavailable),
        }
    }

    /// IPv4 address of the WiFi connection, or `None` when disconnected.
    /// Hosts without a direct connection-info API fall back to local
    /// interface enumeration.
    pub async fn get_local_ip_address(&self) -> Option<String> {
        match self
            .gate
            .evaluate(Operation::ReadIpInfo, self.backend.capability(), true)
        {
            Decision::Proceed => {}
            _ => return None,
        }
        if let Some(connection) = self.get_current_connection().await {
            if connection.ip_address.is_some() {
                return connection.ip_address;
            }
        }
        let wireless = interface::find_wireless_interface().ok()?;
        interface::local_ipv4(&wireless.name)
    }

    /// Metadata reads degrade silently: permission may have been revoked
    /// since the last scan, and connection-only hosts never have metadata.
    fn metadata_readable(&self) -> bool {
        matches!(
            self.gate
                .evaluate(Operation::ReadMetadata, self.backend.capability(), true),
            Decision::Proceed
        )
    }
}
