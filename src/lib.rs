pub mod aggregator;
pub mod browser;
pub mod config;
pub mod digits;
pub mod extractor;
pub mod listing;
pub mod orchestrator;
pub mod request;
pub mod service;
pub mod utils;
pub mod web;
pub mod webhook;

// Re-export commonly used types
pub use aggregator::{aggregate, Strategy};
pub use browser::{BrowserSession, ChromeSessionFactory, SessionFactory};
pub use config::AppConfig;
pub use orchestrator::{Batch, BatchOrchestrator, BatchReport, ProductId, ProductRequest, ResultMap};
pub use request::UploadRequest;
pub use service::PricingService;
pub use utils::error::{AggregateError, AppError, JobError, ScrapeError};
pub use webhook::{HttpWebhook, ResultForwarder};

pub type Result<T> = std::result::Result<T, AppError>;
