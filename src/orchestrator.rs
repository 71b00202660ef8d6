use futures::stream::{self, StreamExt};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

use crate::aggregator::{aggregate, Strategy};
use crate::browser::SessionFactory;
use crate::config::{ScraperConfig, SiteConfig};
use crate::extractor::extract_prices;
use crate::listing::resolve_listing;
use crate::utils::error::JobError;

/// Caller-supplied product identifier. Accepted as a JSON string or integer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => ProductId(text),
            RawId::Number(number) => ProductId(number.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRequest {
    pub id: ProductId,
    pub name: String,
}

/// Product id to aggregated price. Failed products are simply missing.
pub type ResultMap = BTreeMap<ProductId, u64>;

#[derive(Debug, Clone)]
pub struct Batch {
    pub products: Vec<ProductRequest>,
    pub strategy: Strategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Pending,
    Resolving,
    Extracting,
    Aggregating,
    Done,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStage::Pending => "pending",
            JobStage::Resolving => "resolving",
            JobStage::Extracting => "extracting",
            JobStage::Aggregating => "aggregating",
            JobStage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct JobFailure {
    pub stage: JobStage,
    pub error: JobError,
}

#[derive(Debug)]
pub struct JobOutcome {
    pub product: ProductRequest,
    pub result: Result<u64, JobFailure>,
}

#[derive(Debug)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub results: ResultMap,
    pub failures: Vec<(ProductRequest, JobFailure)>,
}

impl BatchReport {
    /// Keep the successes and set the failures aside.
    pub fn from_outcomes(batch_id: Uuid, outcomes: Vec<JobOutcome>) -> Self {
        let mut results = ResultMap::new();
        let mut failures = Vec::new();

        for outcome in outcomes {
            match outcome.result {
                Ok(price) => {
                    results.insert(outcome.product.id, price);
                }
                Err(failure) => failures.push((outcome.product, failure)),
            }
        }

        Self { batch_id, results, failures }
    }
}

/// Fans product jobs out over a bounded pool of blocking workers.
#[derive(Clone)]
pub struct BatchOrchestrator {
    sessions: Arc<dyn SessionFactory>,
    site: Arc<SiteConfig>,
    max_concurrent_jobs: usize,
    wait_timeout: Duration,
}

impl BatchOrchestrator {
    pub fn new(sessions: Arc<dyn SessionFactory>, scraper: &ScraperConfig, site: SiteConfig) -> Self {
        Self {
            sessions,
            site: Arc::new(site),
            max_concurrent_jobs: scraper.max_concurrent_jobs.max(1),
            wait_timeout: scraper.wait_timeout(),
        }
    }

    pub async fn run(&self, batch: &Batch) -> BatchReport {
        let batch_id = Uuid::new_v4();
        let span = tracing::info_span!("batch", %batch_id, strategy = %batch.strategy);

        async move {
            let started = Instant::now();
            tracing::info!(products = batch.products.len(), "Starting price batch");

            let outcomes: Vec<JobOutcome> = stream::iter(batch.products.iter().cloned())
                .map(|product| self.spawn_job(product, batch.strategy))
                .buffer_unordered(self.max_concurrent_jobs)
                .collect()
                .await;

            let report = BatchReport::from_outcomes(batch_id, outcomes);
            tracing::info!(
                priced = report.results.len(),
                failed = report.failures.len(),
                duration_ms = started.elapsed().as_millis() as u64,
                "Price batch finished"
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn spawn_job(&self, product: ProductRequest, strategy: Strategy) -> JobOutcome {
        let job = PriceJob {
            sessions: Arc::clone(&self.sessions),
            site: Arc::clone(&self.site),
            wait_timeout: self.wait_timeout,
            strategy,
        };
        let span = tracing::Span::current();
        let started = Instant::now();
        let task_product = product.clone();
        let stage = StageCell::default();
        let task_stage = stage.clone();

        let result = match tokio::task::spawn_blocking(move || {
            span.in_scope(|| job.run(&task_product, &task_stage))
        })
        .await
        {
            Ok(result) => result,
            // A panic keeps the stage the job had reached when it went down.
            Err(e) => Err(JobFailure {
                stage: stage.get(),
                error: JobError::Aborted(e.to_string()),
            }),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(price) => tracing::info!(
                product_id = %product.id,
                product_name = %product.name,
                price,
                elapsed_ms,
                "Product priced"
            ),
            Err(failure) => tracing::warn!(
                product_id = %product.id,
                product_name = %product.name,
                stage = %failure.stage,
                error = %failure.error,
                elapsed_ms,
                "Product skipped"
            ),
        }

        JobOutcome { product, result }
    }
}

/// Last stage a job entered, readable from the async side after the worker thread is gone.
#[derive(Clone)]
struct StageCell(Arc<Mutex<JobStage>>);

impl Default for StageCell {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(JobStage::Pending)))
    }
}

impl StageCell {
    fn enter(&self, stage: JobStage) {
        *self.guard() = stage;
        tracing::trace!(%stage, "Job stage");
    }

    fn get(&self) -> JobStage {
        *self.guard()
    }

    fn guard(&self) -> MutexGuard<'_, JobStage> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One product's trip through the pipeline, run on a blocking thread.
struct PriceJob {
    sessions: Arc<dyn SessionFactory>,
    site: Arc<SiteConfig>,
    wait_timeout: Duration,
    strategy: Strategy,
}

impl PriceJob {
    fn run(&self, product: &ProductRequest, stage: &StageCell) -> Result<u64, JobFailure> {
        let fail = |error: JobError| JobFailure { stage: stage.get(), error };

        // Dropping the session at the end of this scope releases the browser.
        let prices = {
            let session = self.sessions.open().map_err(JobError::from).map_err(fail)?;

            stage.enter(JobStage::Resolving);
            resolve_listing(session.as_ref(), &self.site, &product.name, self.wait_timeout)
                .map_err(JobError::from)
                .map_err(fail)?;

            stage.enter(JobStage::Extracting);
            extract_prices(session.as_ref(), &self.site, self.wait_timeout)
                .map_err(JobError::from)
                .map_err(fail)?
        };
        tracing::debug!(product_id = %product.id, count = prices.len(), "Extracted prices");

        stage.enter(JobStage::Aggregating);
        let price = aggregate(&prices, self.strategy)
            .map_err(JobError::from)
            .map_err(fail)?;

        stage.enter(JobStage::Done);
        Ok(price)
    }
}
