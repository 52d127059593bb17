//! Running saturation from async code

use crate::engine::{ClassExpressionSaturation, SaturationOutcome};
use crate::SaturationError;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tracing::warn;

/// Saturate on the blocking pool, interrupting the workers once `limit`
/// elapses. A timed out run returns `Ok(SaturationOutcome::Interrupted)` and
/// can be resumed after clearing the engine's interrupter.
pub async fn saturate_with_timeout(
    engine: Arc<ClassExpressionSaturation>,
    limit: Duration,
) -> Result<SaturationOutcome, SaturationError> {
    let worker = Arc::clone(&engine);
    let mut handle = tokio::task::spawn_blocking(move || worker.saturate());

    match tokio::time::timeout(limit, &mut handle).await {
        Ok(joined) => joined.map_err(join_error)?,
        Err(_) => {
            warn!(
                limit_ms = limit.as_millis() as u64,
                "Saturation timed out, interrupting workers"
            );
            engine.interrupter().interrupt();
            handle.await.map_err(join_error)?
        }
    }
}

fn join_error(error: JoinError) -> SaturationError {
    SaturationError::WorkerPanicked(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SaturationConfig;
    use fukurow_el_index::{index_ontology, Axiom, ClassExpression, Ontology};

    #[tokio::test]
    async fn test_saturation_finishes_within_limit() {
        let mut ontology = Ontology::new();
        ontology.add_axiom(Axiom::SubClassOf(
            ClassExpression::class("http://example.org/A"),
            ClassExpression::class("http://example.org/B"),
        ));
        let index = Arc::new(index_ontology(&ontology).unwrap());
        let config = SaturationConfig::with_workers(2);
        let engine = Arc::new(ClassExpressionSaturation::new(index, config));
        engine.submit_all_classes().unwrap();

        let outcome = saturate_with_timeout(Arc::clone(&engine), Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(outcome, SaturationOutcome::Complete);
        assert!(engine.is_saturated());
    }
}
