//! Capability gate: the permission/availability precondition check that
//! guards every operation.
//!
//! The gate answers "may this operation proceed, and if not, what is the
//! documented fallback?" from three inputs: the requested operation, the
//! backend's capability tag, and the current permission and radio state.
//! Permission and radio state are read fresh on every evaluation; they
//! can change between calls, so the decision is never cached.
//!
//! The gate itself has no side effects. It never triggers a permission
//! prompt; [`CapabilityGate::check_or_request_permission`] only queries
//! the provider, which on this platform cannot show UI either.

use crate::backend::Capability;

/// The operations the gate distinguishes between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Trigger a fresh scan of nearby networks.
    ActiveScan,
    /// Read signal strength, channel, or frequency metadata.
    ReadMetadata,
    Connect,
    Disconnect,
    /// Read IP-layer details of the current connection.
    ReadIpInfo,
}

/// Current grant state of the scan authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    /// Grant state could not be determined; treated as not granted.
    Undetermined,
}

impl PermissionState {
    pub fn is_granted(self) -> bool {
        self == PermissionState::Granted
    }
}

/// Source of the current permission grant state.
///
/// Implementations query state only; prompting the user for a grant is
/// the responsibility of an external collaborator.
pub trait PermissionProvider: Send + Sync {
    fn current(&self) -> PermissionState;

    /// Re-query after an external grant flow may have run. The default
    /// implementation just reads the current state again.
    fn request(&self) -> PermissionState {
        self.current()
    }
}

/// Fixed grant state, used by tests and by hosts with no authorization
/// framework at all.
#[derive(Debug, Clone, Copy)]
pub struct FixedPermissions(pub PermissionState);

impl PermissionProvider for FixedPermissions {
    fn current(&self) -> PermissionState {
        self.0
    }
}

/// Reads the scan authorization from NetworkManager's polkit table
/// (`nmcli -t general permissions`).
#[derive(Debug, Default)]
pub struct SystemPermissions;

/// Polkit action that authorizes on-demand scanning.
const SCAN_PERMISSION: &str = "org.freedesktop.NetworkManager.wifi.scan";

impl PermissionProvider for SystemPermissions {
    fn current(&self) -> PermissionState {
        let output = match std::process::Command::new("nmcli")
            .args(["-t", "general", "permissions"])
            .output()
        {
            Ok(o) if o.status.success() => o,
            _ => return PermissionState::Undetermined,
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            // Format: PERMISSION:VALUE where VALUE is yes/no/auth/unknown
            let Some((permission, value)) = line.split_once(':') else {
                continue;
            };
            if permission == SCAN_PERMISSION {
                return match value.trim() {
                    "yes" => PermissionState::Granted,
                    "no" => PermissionState::Denied,
                    _ => PermissionState::Undetermined,
                };
            }
        }
        PermissionState::Undetermined
    }
}

/// Why an operation may not proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    PermissionDenied,
    RadioOff,
    /// Categorically unavailable on this platform, independent of any
    /// permission or radio state.
    Unsupported,
}

/// The gate's answer for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    /// Scanning is unavailable here; serve the current connection instead.
    ConnectionFallback,
    Deny(DenyReason),
}

/// Evaluates preconditions for every operation.
pub struct CapabilityGate {
    provider: Box<dyn PermissionProvider>,
}

impl CapabilityGate {
    pub fn new(provider: impl PermissionProvider + 'static) -> Self {
        CapabilityGate {
            provider: Box::new(provider),
        }
    }

    /// Decides whether `operation` may proceed given the backend's
    /// capability and the radio power state observed just before the call.
    pub fn evaluate(&self, operation: Operation, capability: Capability, radio_on: bool) -> Decision {
        match capability {
            Capability::ConnectionOnly => match operation {
                // No active scan exists on this platform, whatever the
                // permission state; the fallback is the joined network.
                Operation::ActiveScan => Decision::ConnectionFallback,
                // Signal, channel, and frequency are categorically absent,
                // not merely permission-gated.
                Operation::ReadMetadata => Decision::Deny(DenyReason::Unsupported),
                Operation::Connect | Operation::Disconnect | Operation::ReadIpInfo => {
                    Decision::Proceed
                }
            },
            Capability::FullScan => match operation {
                Operation::ActiveScan => {
                    if !self.provider.current().is_granted() {
                        Decision::Deny(DenyReason::PermissionDenied)
                    } else if !radio_on {
                        Decision::Deny(DenyReason::RadioOff)
                    } else {
                        Decision::Proceed
                    }
                }
                Operation::ReadMetadata => {
                    if self.provider.current().is_granted() {
                        Decision::Proceed
                    } else {
                        Decision::Deny(DenyReason::PermissionDenied)
                    }
                }
                Operation::Connect | Operation::Disconnect => {
                    if radio_on {
                        Decision::Proceed
                    } else {
                        Decision::Deny(DenyReason::RadioOff)
                    }
                }
                Operation::ReadIpInfo => Decision::Proceed,
            },
        }
    }

    /// Query used by callers before scanning. Returns the grant state
    /// after giving the provider a chance to re-query.
    pub fn check_or_request_permission(&self) -> bool {
        self.provider.request().is_granted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(state: PermissionState) -> CapabilityGate {
        CapabilityGate::new(FixedPermissions(state))
    }

    #[test]
    fn full_scan_requires_permission_then_radio() {
        let denied = gate(PermissionState::Denied);
        assert_eq!(
            denied.evaluate(Operation::ActiveScan, Capability::FullScan, true),
            Decision::Deny(DenyReason::PermissionDenied)
        );

        let granted = gate(PermissionState::Granted);
        assert_eq!(
            granted.evaluate(Operation::ActiveScan, Capability::FullScan, false),
            Decision::Deny(DenyReason::RadioOff)
        );
        assert_eq!(
            granted.evaluate(Operation::ActiveScan, Capability::FullScan, true),
            Decision::Proceed
        );
    }

    #[test]
    fn undetermined_counts_as_not_granted() {
        let g = gate(PermissionState::Undetermined);
        assert_eq!(
            g.evaluate(Operation::ReadMetadata, Capability::FullScan, true),
            Decision::Deny(DenyReason::PermissionDenied)
        );
        assert!(!g.check_or_request_permission());
    }

    #[test]
    fn connection_only_scan_always_falls_back() {
        // Even with every grant in place, there is no scan on this platform.
        let g = gate(PermissionState::Granted);
        assert_eq!(
            g.evaluate(Operation::ActiveScan, Capability::ConnectionOnly, true),
            Decision::ConnectionFallback
        );
        assert_eq!(
            g.evaluate(Operation::ActiveScan, Capability::ConnectionOnly, false),
            Decision::ConnectionFallback
        );
    }

    #[test]
    fn connection_only_metadata_is_categorically_unsupported() {
        let g = gate(PermissionState::Granted);
        assert_eq!(
            g.evaluate(Operation::ReadMetadata, Capability::ConnectionOnly, true),
            Decision::Deny(DenyReason::Unsupported)
        );
    }

    #[test]
    fn mutating_operations_need_radio_on_full_scan_hosts() {
        let g = gate(PermissionState::Denied);
        // Connect does not need the scan permission, only a powered radio.
        assert_eq!(
            g.evaluate(Operation::Connect, Capability::FullScan, true),
            Decision::Proceed
        );
        assert_eq!(
            g.evaluate(Operation::Connect, Capability::FullScan, false),
            Decision::Deny(DenyReason::RadioOff)
        );
    }
}
