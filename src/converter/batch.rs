use super::converter::Converter;
use super::models::{ConversionAttempt, InputKind};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::info;

/// Aggregate counts over one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub urls_processed: usize,
    pub searches_processed: usize,
}

impl BatchSummary {
    pub fn from_attempts(attempts: &[ConversionAttempt]) -> Self {
        let successful = attempts.iter().filter(|a| a.is_success()).count();
        let urls_processed = attempts
            .iter()
            .filter(|a| a.requested_as == InputKind::Direct)
            .count();
        Self {
            total: attempts.len(),
            successful,
            failed: attempts.len() - successful,
            urls_processed,
            searches_processed: attempts.len() - urls_processed,
        }
    }
}

/// Converts all direct references, then all search terms.
///
/// Up to `concurrency` items run at once; results come back in submission
/// order and one item's failure never stops the others.
pub async fn convert_batch(
    converter: &Converter,
    direct_refs: &[String],
    search_terms: &[String],
    concurrency: usize,
) -> Vec<ConversionAttempt> {
    // Owned items keep the stream's futures free of borrowed inputs
    let items: Vec<(String, InputKind)> = direct_refs
        .iter()
        .map(|input| (input.clone(), InputKind::Direct))
        .chain(
            search_terms
                .iter()
                .map(|input| (input.clone(), InputKind::Search)),
        )
        .collect();

    let attempts: Vec<ConversionAttempt> = stream::iter(items)
        .map(|(input, kind)| async move { converter.convert(&input, kind).await })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let summary = BatchSummary::from_attempts(&attempts);
    info!(
        "Batch done: {} items, {} successful, {} failed",
        summary.total, summary.successful, summary.failed
    );
    attempts
}
