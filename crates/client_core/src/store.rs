use anyhow::Result;
use async_trait::async_trait;
use shared::domain::EvaluationResult;
use tracing::debug;

/// Device-local history of completed evaluations.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn save(&self, evaluation: &EvaluationResult) -> Result<()>;
    async fn load(&self) -> Result<Vec<EvaluationResult>>;
}

/// Store used until device persistence exists: saves are dropped and reads
/// are always empty.
pub struct NoopHistoryStore;

#[async_trait]
impl HistoryStore for NoopHistoryStore {
    async fn save(&self, evaluation: &EvaluationResult) -> Result<()> {
        debug!(
            evaluation_id = %evaluation.evaluation_id,
            "local history store is not persistent; dropping evaluation"
        );
        Ok(())
    }

    async fn load(&self) -> Result<Vec<EvaluationResult>> {
        Ok(Vec::new())
    }
}
