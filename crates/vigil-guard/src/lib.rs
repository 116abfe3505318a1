pub mod coordinator;
pub mod explain;
pub mod surface;
pub mod trust;

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;
use vigil_core::{ExplainReport, TransactionIntent, VigilResult};

pub use coordinator::{Decision, GuardCoordinator, DEFAULT_DECISION_TIMEOUT};
pub use explain::ExplainPipeline;
pub use surface::{DecisionSurface, NullSurface, WebhookSurface};
pub use trust::TrustStore;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardVerdict {
    pub id: Uuid,
    pub decision: Decision,
    pub trusted: bool,
    pub report: Option<ExplainReport>,
}

/// Wraps the point where a transaction is about to be submitted: trusted
/// targets pass straight through; everything else is explained, published
/// to the decision surface, and held until a decision or the fail-open
/// deadline.
pub struct Guard {
    pipeline: ExplainPipeline,
    coordinator: GuardCoordinator,
    trust: TrustStore,
    surface: Arc<dyn DecisionSurface>,
}

impl Guard {
    pub fn new(
        pipeline: ExplainPipeline,
        coordinator: GuardCoordinator,
        trust: TrustStore,
        surface: Arc<dyn DecisionSurface>,
    ) -> Self {
        Self {
            pipeline,
            coordinator,
            trust,
            surface,
        }
    }

    pub async fn intercept(&self, intent: &TransactionIntent) -> VigilResult<GuardVerdict> {
        if let Some(to) = intent.to.as_deref() {
            if self.trust.is_trusted(to)? {
                info!(address = %to, "target trusted, proceeding without review");
                return Ok(GuardVerdict {
                    id: Uuid::new_v4(),
                    decision: Decision::Proceed,
                    trusted: true,
                    report: None,
                });
            }
        }

        let report = self.pipeline.explain(intent).await;
        let (id, rx) = self.coordinator.register();
        self.coordinator.publish_report(id, report.clone());
        info!(
            %id,
            chain_id = intent.chain_id,
            score = report.risk.score,
            level = %report.risk.level,
            "holding transaction for decision"
        );

        let surface = Arc::clone(&self.surface);
        let published = report.clone();
        tokio::spawn(async move {
            surface.present(id, &published).await;
        });

        let decision = self.coordinator.wait(id, rx).await;
        Ok(GuardVerdict {
            id,
            decision,
            trusted: false,
            report: Some(report),
        })
    }

    pub fn pipeline(&self) -> &ExplainPipeline {
        &self.pipeline
    }

    pub fn coordinator(&self) -> &GuardCoordinator {
        &self.coordinator
    }

    pub fn trust(&self) -> &TrustStore {
        &self.trust
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_chain::RpcEndpoints;

    #[tokio::test]
    async fn trusted_target_short_circuits_without_explaining() {
        let trust = TrustStore::open_in_memory().unwrap();
        trust
            .mark_trusted("0xABCD000000000000000000000000000000000001")
            .unwrap();

        let guard = Guard::new(
            ExplainPipeline::new("", RpcEndpoints::default()),
            GuardCoordinator::default(),
            trust,
            Arc::new(NullSurface),
        );

        let intent = TransactionIntent {
            chain_id: 424242,
            from: None,
            to: Some("0xabcd000000000000000000000000000000000001".to_string()),
            data: "0x".to_string(),
            value: None,
        };

        let verdict = guard.intercept(&intent).await.unwrap();
        assert_eq!(verdict.decision, Decision::Proceed);
        assert!(verdict.trusted);
        assert!(verdict.report.is_none());
    }
}
