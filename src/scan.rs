//! Scan orchestration: drives one scan attempt to completion, timeout,
//! or cancellation, uniformly across backends.
//!
//! The full-scan platform delivers results asynchronously with no "scan
//! complete" event, so a triggered scan is polled at a fixed interval
//! until results appear or the deadline passes. The connection-only
//! platform has no scan at all; its "scan" is a single bounded fetch of
//! the currently joined network. Both paths resolve within their bound,
//! never hang, and land their records in the [`NetworkStore`] wholesale.
//!
//! # State machine
//!
//! ```text
//! Idle -> Scanning -> {Completed, TimedOut, PermissionDenied, RadioOff, Cancelled}
//! ```
//!
//! Terminal states transition straight back to a startable condition;
//! there is no queueing. A new scan while one is in flight abandons the
//! older attempt rather than waiting behind it. [`ScanOrchestrator::state`]
//! reports `Scanning` while active and otherwise the outcome of the most
//! recent attempt.
//!
//! # Cancellation
//!
//! Cooperative: [`ScanOrchestrator::cancel`] is observed at the next poll
//! tick, after which no further native call is issued. An already
//! in-flight native call is not interrupted.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, warn};

use crate::backend::{RawNetwork, WifiBackend};
use crate::channel::frequency_to_channel;
use crate::gate::{CapabilityGate, Decision, DenyReason, Operation};
use crate::network::{Fingerprint, NetworkRecord, ScanOptions, is_secure_capabilities, now_ms};
use crate::store::NetworkStore;

/// Timing knobs for scan attempts. The defaults mirror the platform
/// behavior: 100 ms between polls, a 5 s bound on the connection-only
/// fetch, and a 30 s bound on connect attempts.
#[derive(Debug, Clone, Copy)]
pub struct ScanConfig {
    pub poll_interval: Duration,
    pub connection_query_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            poll_interval: Duration::from_millis(100),
            connection_query_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// Where the most recent scan attempt stands or ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
    Completed,
    TimedOut,
    PermissionDenied,
    RadioOff,
    Cancelled,
}

/// Called once per completed scan with the new fingerprint. This is the
/// seam an event-publishing layer attaches to.
pub type CompletionHook = Box<dyn Fn(&Fingerprint) + Send + Sync>;

/// Drives scan attempts against one backend.
///
/// One logical scan at a time: a second start while `Scanning` bumps the
/// attempt counter, which the older attempt's loop observes at its next
/// check point and exits without touching shared state.
pub struct ScanOrchestrator<B: WifiBackend> {
    backend: Arc<B>,
    gate: Arc<CapabilityGate>,
    store: Arc<NetworkStore>,
    config: ScanConfig,
    state: Mutex<ScanState>,
    attempt: AtomicU64,
    cancel_requested: AtomicBool,
    on_complete: Mutex<Option<CompletionHook>>,
}

impl<B: WifiBackend> ScanOrchestrator<B> {
    pub fn new(
        backend: Arc<B>,
        gate: Arc<CapabilityGate>,
        store: Arc<NetworkStore>,
        config: ScanConfig,
    ) -> Self {
        ScanOrchestrator {
            backend,
            gate,
            store,
            config,
            state: Mutex::new(ScanState::Idle),
            attempt: AtomicU64::new(0),
            cancel_requested: AtomicBool::new(false),
            on_complete: Mutex::new(None),
        }
    }

    /// `Scanning` while an attempt is active, otherwise the most recent
    /// attempt's outcome (`Idle` before the first scan).
    pub fn state(&self) -> ScanState {
        *self.state.lock().expect("state lock poisoned")
    }

    /// Registers the completion hook, replacing any previous one.
    pub fn set_completion_hook(&self, hook: CompletionHook) {
        *self.on_complete.lock().expect("hook lock poisoned") = Some(hook);
    }

    /// Requests cancellation of the in-flight attempt. Observed at the
    /// next poll tick; a no-op when nothing is scanning.
    pub fn cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
    }

    /// Runs one scan attempt to its end and returns the resulting
    /// fingerprint. Every degraded path (denied permission, radio off,
    /// timeout, cancellation) returns an empty fingerprint stamped at
    /// call time; scanning never raises.
    pub async fn run_scan(&self, options: ScanOptions) -> Fingerprint {
        let attempt = self.attempt.fetch_add(1, Ordering::SeqCst) + 1;
        self.cancel_requested.store(false, Ordering::SeqCst);
        self.set_state(attempt, ScanState::Scanning);

        let radio_on = self.backend.is_radio_enabled().await;
        match self
            .gate
            .evaluate(Operation::ActiveScan, self.backend.capability(), radio_on)
        {
            Decision::Proceed => self.poll_until_results(options, attempt).await,
            Decision::ConnectionFallback => self.fetch_current_connection(options, attempt).await,
            Decision::Deny(reason) => {
                let state = match reason {
                    DenyReason::PermissionDenied => ScanState::PermissionDenied,
                    DenyReason::RadioOff => ScanState::RadioOff,
                    // ActiveScan is never categorically denied; it falls
                    // back instead.
                    DenyReason::Unsupported => ScanState::Completed,
                };
                warn!(?reason, "scan gated, returning empty fingerprint");
                self.set_state(attempt, state);
                Fingerprint::empty()
            }
        }
    }

    /// Fire-and-forget scan. Completion is observable only by querying
    /// the store afterwards; the fingerprint is delivered to the
    /// completion hook, not returned.
    pub fn start_scan(self: &Arc<Self>, options: ScanOptions)
    where
        B: Send,
    {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            let _ = orchestrator.run_scan(options).await;
        });
    }

    /// Stops a fire-and-forget scan; alias for [`Self::cancel`].
    pub fn stop_scan(&self) {
        self.cancel();
    }

    /// Full-scan path: trigger, then poll the platform's result cache
    /// every `poll_interval` until results appear, the deadline passes,
    /// cancellation is observed, or a newer attempt supersedes this one.
    async fn poll_until_results(&self, options: ScanOptions, attempt: u64) -> Fingerprint {
        if let Err(e) = self.backend.trigger_scan().await {
            // Polling may still serve previously cached results.
            warn!(error = %e, "scan trigger failed, polling cache anyway");
        }

        let deadline = Instant::now() + options.effective_timeout();
        loop {
            if self.superseded(attempt) {
                debug!(attempt, "scan attempt superseded by a restart");
                return Fingerprint::empty();
            }
            if self.cancel_requested.load(Ordering::SeqCst) {
                debug!(attempt, "scan cancelled");
                self.set_state(attempt, ScanState::Cancelled);
                return Fingerprint::empty();
            }

            match self.backend.poll_scan_results().await {
                Ok(raw) if !raw.is_empty() => {
                    return self.complete(raw, options, attempt);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "scan result poll failed");
                }
            }

            if Instant::now() >= deadline {
                warn!(attempt, "scan timed out with no results");
                self.set_state(attempt, ScanState::TimedOut);
                return Fingerprint::empty();
            }

            sleep(self.config.poll_interval).await;
        }
    }

    /// Connection-only path: one bounded fetch of the joined network.
    /// No connection is an empty fingerprint, not an error.
    async fn fetch_current_connection(&self, options: ScanOptions, attempt: u64) -> Fingerprint {
        let fetched = timeout(
            self.config.connection_query_timeout,
            self.backend.current_connection(),
        )
        .await;

        if self.superseded(attempt) {
            return Fingerprint::empty();
        }
        if self.cancel_requested.load(Ordering::SeqCst) {
            self.set_state(attempt, ScanState::Cancelled);
            return Fingerprint::empty();
        }

        let raw = match fetched {
            Err(_) => {
                warn!(attempt, "current-connection query timed out");
                self.set_state(attempt, ScanState::TimedOut);
                return Fingerprint::empty();
            }
            Ok(Err(e)) => {
                warn!(error = %e, "current-connection query failed");
                Vec::new()
            }
            Ok(Ok(None)) => Vec::new(),
            Ok(Ok(Some(connection))) => vec![RawNetwork {
                ssid: connection.ssid,
                bssid: connection.bssid,
                // This platform cannot see radio parameters at all.
                signal_dbm: None,
                frequency_mhz: None,
                capabilities: None,
            }],
        };

        self.complete(raw, options, attempt)
    }

    /// Converts raw results, replaces the store wholesale, truncates the
    /// returned fingerprint to `max_results` as a stable prefix of the
    /// platform's discovery order, and fires the completion hook.
    fn complete(&self, raw: Vec<RawNetwork>, options: ScanOptions, attempt: u64) -> Fingerprint {
        // The last poll awaited, so a restart may have landed in the
        // meantime. Results for an abandoned attempt must not reach the
        // store or the hook, even when they arrive after the newer
        // attempt already finished.
        if self.superseded(attempt) {
            debug!(attempt, "scan attempt superseded while results were in flight");
            return Fingerprint::empty();
        }

        let observed_at = now_ms();
        let records: Vec<NetworkRecord> =
            raw.into_iter().map(|r| convert(r, observed_at)).collect();

        self.store.replace_all(records);

        let mut networks = self.store.all();
        if let Some(max) = options.max_results {
            networks.truncate(max);
        }

        let fingerprint = Fingerprint {
            networks,
            timestamp_ms: now_ms(),
            location: options.location,
        };

        self.set_state(attempt, ScanState::Completed);
        debug!(
            attempt,
            networks = fingerprint.networks.len(),
            "scan completed"
        );

        if let Some(hook) = self.on_complete.lock().expect("hook lock poisoned").as_ref() {
            hook(&fingerprint);
        }

        fingerprint
    }

    /// A later attempt owns the state once it has started; this one must
    /// not write over it.
    fn superseded(&self, attempt: u64) -> bool {
        self.attempt.load(Ordering::SeqCst) != attempt
    }

    fn set_state(&self, attempt: u64, state: ScanState) {
        if !self.superseded(attempt) {
            *self.state.lock().expect("state lock poisoned") = state;
        }
    }
}

/// Attaches codec-derived fields to a raw platform record. The channel is
/// always derived from the frequency, so the two can never disagree.
fn convert(raw: RawNetwork, observed_at_ms: u64) -> NetworkRecord {
    let channel = raw.frequency_mhz.map(frequency_to_channel);
    let is_secure = raw.capabilities.as_deref().map(is_secure_capabilities);

    NetworkRecord {
        ssid: raw.ssid,
        bssid: raw.bssid,
        signal_dbm: raw.signal_dbm,
        frequency_mhz: raw.frequency_mhz,
        channel,
        capabilities: raw.capabilities,
        is_secure,
        observed_at_ms: Some(observed_at_ms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Capability;
    use crate::channel::UNKNOWN_CHANNEL;
    use crate::gate::{FixedPermissions, PermissionState};
    use crate::network::{CurrentConnection, LocationHint};
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    /// Scripted in-memory backend: each poll pops the next canned result
    /// set; the last entry repeats once the script is exhausted.
    struct MockBackend {
        capability: Capability,
        radio_on: bool,
        polls: Mutex<Vec<Vec<RawNetwork>>>,
        connection: Option<CurrentConnection>,
        trigger_count: AtomicUsize,
        poll_count: AtomicUsize,
        never_resolve_connection: bool,
        /// When set, the first poll parks until the notify fires.
        park_first_poll: Option<Arc<Notify>>,
    }

    impl MockBackend {
        fn full_scan(polls: Vec<Vec<RawNetwork>>) -> Self {
            MockBackend {
                capability: Capability::FullScan,
                radio_on: true,
                polls: Mutex::new(polls),
                connection: None,
                trigger_count: AtomicUsize::new(0),
                poll_count: AtomicUsize::new(0),
                never_resolve_connection: false,
                park_first_poll: None,
            }
        }

        fn connection_only(connection: Option<CurrentConnection>) -> Self {
            MockBackend {
                capability: Capability::ConnectionOnly,
                radio_on: true,
                polls: Mutex::new(Vec::new()),
                connection,
                trigger_count: AtomicUsize::new(0),
                poll_count: AtomicUsize::new(0),
                never_resolve_connection: false,
                park_first_poll: None,
            }
        }
    }

    impl WifiBackend for MockBackend {
        fn capability(&self) -> Capability {
            self.capability
        }

        async fn is_radio_enabled(&self) -> bool {
            self.radio_on
        }

        async fn trigger_scan(&self) -> Result<(), crate::error::WifiScoutError> {
            self.trigger_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn poll_scan_results(
            &self,
        ) -> Result<Vec<RawNetwork>, crate::error::WifiScoutError> {
            let n = self.poll_count.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                if let Some(gate) = &self.park_first_poll {
                    gate.notified().await;
                }
            }
            let mut polls = self.polls.lock().unwrap();
            if polls.len() > 1 {
                Ok(polls.remove(0))
            } else {
                Ok(polls.first().cloned().unwrap_or_default())
            }
        }

        async fn current_connection(
            &self,
        ) -> Result<Option<CurrentConnection>, crate::error::WifiScoutError> {
            if self.never_resolve_connection {
                std::future::pending::<()>().await;
            }
            Ok(self.connection.clone())
        }

        async fn connect(
            &self,
            _options: &crate::network::ConnectionOptions,
        ) -> Result<(), crate::error::WifiScoutError> {
            Ok(())
        }

        async fn disconnect(&self) -> Result<(), crate::error::WifiScoutError> {
            Ok(())
        }
    }

    fn raw(ssid: &str, bssid: &str, freq: u32, signal: i32) -> RawNetwork {
        RawNetwork {
            ssid: ssid.to_string(),
            bssid: bssid.to_string(),
            signal_dbm: Some(signal),
            frequency_mhz: Some(freq),
            capabilities: Some("WPA2".to_string()),
        }
    }

    fn orchestrator(
        backend: MockBackend,
        permission: PermissionState,
    ) -> (Arc<ScanOrchestrator<MockBackend>>, Arc<NetworkStore>) {
        let store = Arc::new(NetworkStore::new());
        let orchestrator = Arc::new(ScanOrchestrator::new(
            Arc::new(backend),
            Arc::new(CapabilityGate::new(FixedPermissions(permission))),
            Arc::clone(&store),
            ScanConfig::default(),
        ));
        (orchestrator, store)
    }

    #[tokio::test(start_paused = true)]
    async fn scan_converts_and_caches_discovered_networks() {
        let backend = MockBackend::full_scan(vec![vec![
            raw("Cafe", "AA:BB", 2437, -48),
            raw("Cafe", "CC:DD", 5180, -60),
        ]]);
        let (orch, store) = orchestrator(backend, PermissionState::Granted);

        let fingerprint = orch.run_scan(ScanOptions::default()).await;

        assert_eq!(fingerprint.networks.len(), 2);
        assert_eq!(fingerprint.networks[0].channel, Some(6));
        assert_eq!(fingerprint.networks[1].channel, Some(44));
        assert_eq!(fingerprint.networks[0].is_secure, Some(true));
        assert!(fingerprint.networks[0].observed_at_ms.is_some());
        assert_eq!(store.known_ssids(), vec!["Cafe".to_string()]);
        assert_eq!(orch.state(), ScanState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn denied_permission_yields_empty_fingerprint_not_error() {
        let backend = MockBackend::full_scan(vec![vec![raw("Cafe", "AA:BB", 2437, -48)]]);
        let (orch, store) = orchestrator(backend, PermissionState::Denied);

        let fingerprint = orch.run_scan(ScanOptions::default()).await;

        assert!(fingerprint.networks.is_empty());
        assert!(fingerprint.timestamp_ms > 0);
        assert!(store.is_empty());
        assert_eq!(orch.state(), ScanState::PermissionDenied);
    }

    #[tokio::test(start_paused = true)]
    async fn radio_off_yields_empty_fingerprint() {
        let mut backend = MockBackend::full_scan(vec![vec![raw("Cafe", "AA:BB", 2437, -48)]]);
        backend.radio_on = false;
        let (orch, _) = orchestrator(backend, PermissionState::Granted);

        let fingerprint = orch.run_scan(ScanOptions::default()).await;
        assert!(fingerprint.networks.is_empty());
        assert_eq!(orch.state(), ScanState::RadioOff);
    }

    #[tokio::test(start_paused = true)]
    async fn max_results_is_a_stable_prefix() {
        let backend = MockBackend::full_scan(vec![vec![
            raw("A", "00:01", 2412, -80),
            raw("B", "00:02", 2417, -30),
            raw("C", "00:03", 2422, -50),
            raw("D", "00:04", 2427, -40),
            raw("E", "00:05", 2432, -90),
        ]]);
        let (orch, store) = orchestrator(backend, PermissionState::Granted);

        let fingerprint = orch
            .run_scan(ScanOptions {
                max_results: Some(2),
                timeout_ms: None,
                location: None,
            })
            .await;

        // Discovery order preserved, not re-sorted by signal.
        assert_eq!(fingerprint.networks.len(), 2);
        assert_eq!(fingerprint.networks[0].ssid, "A");
        assert_eq!(fingerprint.networks[1].ssid, "B");
        // The store keeps the full set; only the fingerprint is truncated.
        assert_eq!(store.all().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_polls_resolve_as_timeout_within_the_bound() {
        let backend = MockBackend::full_scan(vec![]);
        let (orch, _) = orchestrator(backend, PermissionState::Granted);

        let started = Instant::now();
        let fingerprint = orch
            .run_scan(ScanOptions {
                max_results: None,
                timeout_ms: Some(50),
                location: None,
            })
            .await;
        let elapsed = started.elapsed();

        assert!(fingerprint.networks.is_empty());
        assert_eq!(orch.state(), ScanState::TimedOut);
        // Resolves within one polling granularity of the 50 ms deadline.
        assert!(elapsed <= Duration::from_millis(150), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn results_on_a_later_poll_complete_the_scan() {
        let backend = MockBackend::full_scan(vec![
            vec![],
            vec![],
            vec![raw("Late", "AA:BB", 2412, -55)],
        ]);
        let (orch, _) = orchestrator(backend, PermissionState::Granted);

        let fingerprint = orch.run_scan(ScanOptions::default()).await;
        assert_eq!(fingerprint.networks.len(), 1);
        assert_eq!(fingerprint.networks[0].ssid, "Late");
        assert_eq!(orch.state(), ScanState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_observed_at_the_next_tick() {
        let backend = MockBackend::full_scan(vec![]);
        let (orch, _) = orchestrator(backend, PermissionState::Granted);

        let handle = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.run_scan(ScanOptions::default()).await })
        };
        tokio::task::yield_now().await;
        assert_eq!(orch.state(), ScanState::Scanning);

        orch.cancel();
        let fingerprint = handle.await.unwrap();

        assert!(fingerprint.networks.is_empty());
        assert_eq!(orch.state(), ScanState::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_supersedes_the_inflight_attempt() {
        let backend = MockBackend::full_scan(vec![
            vec![],
            vec![],
            vec![],
            vec![],
            vec![raw("Fresh", "AA:BB", 2437, -50)],
        ]);
        let (orch, store) = orchestrator(backend, PermissionState::Granted);

        let first = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.run_scan(ScanOptions::default()).await })
        };
        tokio::task::yield_now().await;
        assert_eq!(orch.state(), ScanState::Scanning);

        // Restart while the first attempt sleeps between polls.
        let second = orch.run_scan(ScanOptions::default()).await;

        let first = first.await.unwrap();
        assert!(first.networks.is_empty(), "superseded attempt must yield nothing");
        assert_eq!(second.networks.len(), 1);
        assert_eq!(store.all().len(), 1);
        assert_eq!(orch.state(), ScanState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn late_results_from_a_superseded_attempt_are_discarded() {
        // The first attempt parks inside its poll; a restart completes
        // while those results are still in flight. When the old poll
        // finally resolves, its records must not replace the newer scan's,
        // and the hook must not fire for the abandoned attempt.
        let release = Arc::new(Notify::new());
        let mut backend = MockBackend::full_scan(vec![
            vec![raw("Fresh", "AA:BB", 2437, -50)],
            vec![raw("Stale", "CC:DD", 2412, -70)],
        ]);
        backend.park_first_poll = Some(Arc::clone(&release));
        let (orch, store) = orchestrator(backend, PermissionState::Granted);

        let hook_calls = Arc::new(AtomicUsize::new(0));
        {
            let hook_calls = Arc::clone(&hook_calls);
            orch.set_completion_hook(Box::new(move |_| {
                hook_calls.fetch_add(1, Ordering::SeqCst);
            }));
        }

        let first = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.run_scan(ScanOptions::default()).await })
        };
        tokio::task::yield_now().await;

        let second = orch.run_scan(ScanOptions::default()).await;
        assert_eq!(second.networks[0].ssid, "Fresh");

        release.notify_one();
        let first = first.await.unwrap();

        assert!(first.networks.is_empty(), "superseded attempt must yield nothing");
        assert_eq!(store.all().len(), 1);
        assert_eq!(store.all()[0].ssid, "Fresh");
        assert_eq!(hook_calls.load(Ordering::SeqCst), 1);
        assert_eq!(orch.state(), ScanState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn connection_only_scan_yields_at_most_one_bare_record() {
        let backend = MockBackend::connection_only(Some(CurrentConnection {
            ssid: "HomeNet".into(),
            bssid: "AA:BB".into(),
            ip_address: Some("192.168.4.2".into()),
            subnet_mask: None,
            gateway: None,
            dns_servers: vec![],
        }));
        let (orch, store) = orchestrator(backend, PermissionState::Granted);

        let fingerprint = orch
            .run_scan(ScanOptions {
                max_results: Some(50),
                timeout_ms: None,
                location: None,
            })
            .await;

        assert_eq!(fingerprint.networks.len(), 1);
        let record = &fingerprint.networks[0];
        assert_eq!(record.ssid, "HomeNet");
        assert_eq!(record.signal_dbm, None);
        assert_eq!(record.frequency_mhz, None);
        assert_eq!(record.channel, None);
        assert_eq!(record.is_secure, None);
        assert_eq!(store.known_ssids(), vec!["HomeNet".to_string()]);
        assert_eq!(orch.state(), ScanState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn connection_only_disconnected_is_empty_not_error() {
        let backend = MockBackend::connection_only(None);
        let (orch, store) = orchestrator(backend, PermissionState::Granted);

        let fingerprint = orch.run_scan(ScanOptions::default()).await;
        assert!(fingerprint.networks.is_empty());
        assert!(store.is_empty());
        assert_eq!(orch.state(), ScanState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn connection_only_fetch_is_bounded() {
        let mut backend = MockBackend::connection_only(None);
        backend.never_resolve_connection = true;
        let (orch, _) = orchestrator(backend, PermissionState::Granted);

        let fingerprint = orch.run_scan(ScanOptions::default()).await;
        assert!(fingerprint.networks.is_empty());
        assert_eq!(orch.state(), ScanState::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_hook_fires_once_per_completed_scan() {
        let backend = MockBackend::full_scan(vec![vec![raw("Cafe", "AA:BB", 2437, -48)]]);
        let (orch, _) = orchestrator(backend, PermissionState::Granted);

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let calls = Arc::clone(&calls);
            let seen = Arc::clone(&seen);
            orch.set_completion_hook(Box::new(move |fingerprint| {
                calls.fetch_add(1, Ordering::SeqCst);
                seen.lock().unwrap().push(fingerprint.networks.len());
            }));
        }

        orch.run_scan(ScanOptions::default()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock().unwrap(), vec![1]);

        orch.run_scan(ScanOptions::default()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn caller_supplied_location_rides_on_the_fingerprint() {
        let backend = MockBackend::full_scan(vec![vec![raw("Cafe", "AA:BB", 2437, -48)]]);
        let (orch, _) = orchestrator(backend, PermissionState::Granted);

        let hint = LocationHint {
            latitude: 51.5007,
            longitude: -0.1246,
        };
        let fingerprint = orch
            .run_scan(ScanOptions {
                max_results: None,
                timeout_ms: None,
                location: Some(hint),
            })
            .await;
        assert_eq!(fingerprint.location, Some(hint));

        // No hint supplied, none attached.
        let fingerprint = orch.run_scan(ScanOptions::default()).await;
        assert_eq!(fingerprint.location, None);
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_band_frequency_lands_as_channel_zero() {
        let backend = MockBackend::full_scan(vec![vec![raw("Odd", "AA:BB", 3000, -50)]]);
        let (orch, _) = orchestrator(backend, PermissionState::Granted);

        let fingerprint = orch.run_scan(ScanOptions::default()).await;
        assert_eq!(fingerprint.networks[0].channel, Some(UNKNOWN_CHANNEL));
    }
}
