use std::sync::Arc;

use crate::orchestrator::{Batch, BatchOrchestrator, BatchReport};
use crate::utils::error::Result;
use crate::webhook::ResultForwarder;

/// Runs a batch end to end: scrape, aggregate, then hand the prices downstream.
#[derive(Clone)]
pub struct PricingService {
    orchestrator: BatchOrchestrator,
    forwarder: Arc<dyn ResultForwarder>,
}

impl PricingService {
    pub fn new(orchestrator: BatchOrchestrator, forwarder: Arc<dyn ResultForwarder>) -> Self {
        Self { orchestrator, forwarder }
    }

    /// Price the batch without forwarding anything.
    pub async fn price(&self, batch: &Batch) -> BatchReport {
        self.orchestrator.run(batch).await
    }

    /// Price the batch and forward the result map, even when it came out empty.
    pub async fn process(&self, batch: &Batch) -> Result<BatchReport> {
        let report = self.price(batch).await;
        self.forwarder.forward(&report.results).await?;
        tracing::info!(batch_id = %report.batch_id, priced = report.results.len(), "Batch forwarded");
        Ok(report)
    }
}
