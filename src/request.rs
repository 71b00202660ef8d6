use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregator::Strategy;
use crate::orchestrator::{Batch, ProductRequest};
use crate::utils::error::{AppError, Result};

/// Body of an upload call.
///
/// `strategy` is a plain tag. The older `[{"strategy": "<tag>"}]` shape is
/// still accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadRequest {
    #[serde(rename = "productInfo", alias = "products")]
    pub product_info: Option<BTreeMap<String, ProductRequest>>,
    pub strategy: Option<StrategyField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StrategyField {
    Tag(String),
    Legacy(Vec<LegacyStrategy>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyStrategy {
    pub strategy: Option<String>,
}

impl StrategyField {
    pub fn tag(&self) -> Option<&str> {
        match self {
            StrategyField::Tag(tag) => Some(tag.as_str()),
            StrategyField::Legacy(entries) => entries.first().and_then(|e| e.strategy.as_deref()),
        }
    }
}

impl UploadRequest {
    /// Check the request shape and turn it into a runnable batch.
    ///
    /// Missing products, a missing strategy or an unknown strategy tag all
    /// reject the whole request before any product is looked at.
    pub fn into_batch(self) -> Result<Batch> {
        let products = self
            .product_info
            .filter(|products| !products.is_empty())
            .ok_or_else(|| AppError::InvalidInput("productInfo is required and must not be empty".into()))?;

        let tag = self
            .strategy
            .as_ref()
            .and_then(StrategyField::tag)
            .filter(|tag| !tag.trim().is_empty())
            .ok_or_else(|| AppError::InvalidInput("strategy is required".into()))?;
        let strategy: Strategy = tag.parse()?;

        Ok(Batch {
            products: products.into_values().collect(),
            strategy,
        })
    }
}
