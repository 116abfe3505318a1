use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, info};
use uuid::Uuid;
use vigil_core::ExplainReport;

/// Reference decision window before the hold fails open.
pub const DEFAULT_DECISION_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Proceed,
    Abort,
}

/// Holds in-flight transaction intents while an out-of-band decision is
/// collected. Each correlation id owns exactly one single-fire resolution
/// slot; resolving an unknown or already-resolved id is a silent no-op.
///
/// A hold that sees no decision within the window resolves as proceed.
/// Fail-open is a deliberate trade-off: an unresponsive decision surface
/// must not brick normal wallet usage, at the cost of letting an
/// unreviewed transaction through.
pub struct GuardCoordinator {
    pending: DashMap<Uuid, oneshot::Sender<Decision>>,
    reports: DashMap<Uuid, ExplainReport>,
    timeout: Duration,
}

impl GuardCoordinator {
    pub fn new(timeout: Duration) -> Self {
        Self {
            pending: DashMap::new(),
            reports: DashMap::new(),
            timeout,
        }
    }

    /// Mints a correlation id and its single-use resolution slot.
    pub fn register(&self) -> (Uuid, oneshot::Receiver<Decision>) {
        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);
        (id, rx)
    }

    /// Stores the explanation so the decision surface can fetch it by id.
    pub fn publish_report(&self, id: Uuid, report: ExplainReport) {
        self.reports.insert(id, report);
    }

    pub fn report(&self, id: &Uuid) -> Option<ExplainReport> {
        self.reports.get(id).map(|r| r.value().clone())
    }

    /// Delivers a decision event. Returns whether a pending hold consumed
    /// it; stale or duplicate events are ignored.
    pub fn resolve(&self, id: Uuid, decision: Decision) -> bool {
        match self.pending.remove(&id) {
            Some((_, tx)) => {
                let delivered = tx.send(decision).is_ok();
                info!(%id, ?decision, delivered, "decision resolved");
                delivered
            }
            None => {
                debug!(%id, ?decision, "decision for unknown or resolved id ignored");
                false
            }
        }
    }

    /// Suspends the caller until the decision event or the deadline,
    /// whichever fires first, then discards the hold and its cached
    /// explanation. Timeout and dropped-sender paths both fail open.
    /// Cleanup runs on drop, so an abandoned caller (client disconnect
    /// mid-hold) still releases both map entries.
    pub async fn wait(&self, id: Uuid, rx: oneshot::Receiver<Decision>) -> Decision {
        let _reap = HoldReaper {
            coordinator: self,
            id,
        };
        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(decision)) => decision,
            Ok(Err(_)) => Decision::Proceed,
            Err(_) => {
                info!(%id, "decision window elapsed, failing open to proceed");
                Decision::Proceed
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Removes a hold's sender and cached explanation when the wait ends,
/// whether it completed or its future was dropped mid-await.
struct HoldReaper<'a> {
    coordinator: &'a GuardCoordinator,
    id: Uuid,
}

impl Drop for HoldReaper<'_> {
    fn drop(&mut self) {
        self.coordinator.pending.remove(&self.id);
        self.coordinator.reports.remove(&self.id);
    }
}

impl Default for GuardCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_DECISION_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::{BytecodeMeta, ContractIntel, RiskLevel, RiskResult};

    fn empty_report() -> ExplainReport {
        ExplainReport {
            decoded: None,
            bytecode_meta: BytecodeMeta {
                byte_length: 0,
                has_delegatecall: false,
                has_selfdestruct: false,
                is_proxy: false,
                verified: false,
            },
            risk: RiskResult {
                score: 0,
                level: RiskLevel::Low,
                reasons: Vec::new(),
            },
            explanation: "Action: Unknown action. Risk level low (score 0).".to_string(),
            intel: ContractIntel::empty(None),
            target_address: None,
            chain_id: 1,
        }
    }

    #[tokio::test]
    async fn explicit_abort_resolves_the_hold() {
        let coordinator = std::sync::Arc::new(GuardCoordinator::new(Duration::from_secs(5)));
        let (id, rx) = coordinator.register();

        let resolver = std::sync::Arc::clone(&coordinator);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert!(resolver.resolve(id, Decision::Abort));
        });

        assert_eq!(coordinator.wait(id, rx).await, Decision::Abort);
    }

    #[tokio::test]
    async fn timeout_fails_open_to_proceed() {
        let coordinator = GuardCoordinator::new(Duration::from_millis(20));
        let (id, rx) = coordinator.register();
        assert_eq!(coordinator.wait(id, rx).await, Decision::Proceed);
    }

    #[tokio::test]
    async fn late_decision_is_a_silent_no_op() {
        let coordinator = GuardCoordinator::new(Duration::from_millis(20));
        let (id, rx) = coordinator.register();
        assert_eq!(coordinator.wait(id, rx).await, Decision::Proceed);

        // The hold already timed out; a late abort has no observable effect.
        assert!(!coordinator.resolve(id, Decision::Abort));
        assert!(!coordinator.resolve(id, Decision::Abort));
    }

    #[tokio::test]
    async fn decisions_are_single_use() {
        let coordinator = GuardCoordinator::new(Duration::from_secs(5));
        let (id, rx) = coordinator.register();

        assert!(coordinator.resolve(id, Decision::Proceed));
        assert!(!coordinator.resolve(id, Decision::Abort));
        assert_eq!(coordinator.wait(id, rx).await, Decision::Proceed);
    }

    #[tokio::test]
    async fn abandoned_wait_releases_the_hold() {
        let coordinator = std::sync::Arc::new(GuardCoordinator::new(Duration::from_secs(60)));
        let (id, rx) = coordinator.register();
        coordinator.publish_report(id, empty_report());
        assert!(coordinator.report(&id).is_some());

        // A disconnecting client drops the handler future mid-await. The
        // hold and its report must not survive the abandoned wait.
        let waiter = std::sync::Arc::clone(&coordinator);
        let handle = tokio::spawn(async move { waiter.wait(id, rx).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.abort();
        let _ = handle.await;

        assert!(coordinator.report(&id).is_none());
        assert!(!coordinator.resolve(id, Decision::Abort));
    }

    #[tokio::test]
    async fn unknown_id_is_ignored() {
        let coordinator = GuardCoordinator::default();
        assert!(!coordinator.resolve(Uuid::new_v4(), Decision::Abort));
    }
}
