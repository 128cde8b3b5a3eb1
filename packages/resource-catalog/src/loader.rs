//! Catalog loader: runs the acquisition strategies as a fallback chain.
//!
//! Strategies are tried cheapest first. The first one that yields rows wins.
//! An empty answer ends the chain only when the strategy says it is
//! authoritative; a failure moves on to the next strategy, except for
//! configuration problems which abort the load.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::error::{CatalogError, Result, SourceError};
use crate::retry::{retry_rate_limited, Retried, RetryPolicy};
use crate::strategies::standard_chain;
use crate::traits::backend::StorageBackend;
use crate::traits::strategy::{AcquisitionStrategy, StrategyKind};
use crate::types::config::{LoaderConfig, StorageConfig};
use crate::types::entry::RawStorageEntry;

/// What one strategy produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StrategyOutcome {
    Loaded { rows: usize },
    Empty,
    Failed { error: String },
}

/// One strategy's turn in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyAttempt {
    pub strategy: StrategyKind,
    #[serde(flatten)]
    pub outcome: StrategyOutcome,
    /// Calls made, counting rate-limit retries
    pub tries: u32,
}

/// Result of a load: the rows plus how they were obtained.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub entries: Vec<RawStorageEntry>,
    /// Strategy whose answer was used (`None` when no strategy ran)
    pub source: Option<StrategyKind>,
    pub attempts: Vec<StrategyAttempt>,
}

impl LoadReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any strategy failed before the answer was found.
    pub fn had_failures(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| matches!(a.outcome, StrategyOutcome::Failed { .. }))
    }
}

/// Runs a chain of acquisition strategies.
pub struct CatalogLoader {
    strategies: Vec<Box<dyn AcquisitionStrategy>>,
    retry: RetryPolicy,
    timeout: Option<Duration>,
}

impl CatalogLoader {
    /// Standard chain (catalog, procedure, traversal) over one backend.
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        storage: &StorageConfig,
        config: &LoaderConfig,
    ) -> Self {
        Self::with_strategies(standard_chain(backend, storage, config), config)
    }

    /// Custom chain, tried in the given order.
    pub fn with_strategies(
        strategies: Vec<Box<dyn AcquisitionStrategy>>,
        config: &LoaderConfig,
    ) -> Self {
        Self {
            strategies,
            retry: config.retry,
            timeout: config.timeout,
        }
    }

    pub fn strategy_kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    /// Load every raw entry, falling back through the chain.
    ///
    /// # Errors
    ///
    /// - `Configuration` as soon as a strategy reports missing configuration
    /// - `RateLimited` / `Transport` when every strategy failed and none
    ///   returned an empty success first
    /// - `Timeout` when the configured whole-load timeout elapses
    pub async fn load(&self) -> Result<LoadReport> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run_chain())
                .await
                .map_err(|_| {
                    warn!(timeout_ms = limit.as_millis() as u64, "Catalog load timed out");
                    CatalogError::Timeout(limit)
                })?,
            None => self.run_chain().await,
        }
    }

    async fn run_chain(&self) -> Result<LoadReport> {
        let mut attempts = Vec::with_capacity(self.strategies.len());
        let mut empty_success: Option<StrategyKind> = None;
        let mut last_error: Option<(SourceError, u32)> = None;

        for strategy in &self.strategies {
            let kind = strategy.kind();
            info!(strategy = %kind, "Trying acquisition strategy");

            let Retried { result, attempts: tries } =
                retry_rate_limited(&self.retry, kind.as_str(), || strategy.acquire()).await;

            match result {
                Ok(entries) if entries.is_empty() => {
                    attempts.push(StrategyAttempt {
                        strategy: kind,
                        outcome: StrategyOutcome::Empty,
                        tries,
                    });

                    if strategy.empty_is_final() {
                        info!(strategy = %kind, "Strategy returned no rows; treating as final");
                        return Ok(LoadReport {
                            entries,
                            source: Some(kind),
                            attempts,
                        });
                    }

                    info!(strategy = %kind, "Strategy returned no rows; falling through");
                    empty_success.get_or_insert(kind);
                }
                Ok(entries) => {
                    info!(strategy = %kind, rows = entries.len(), "Strategy loaded rows");
                    attempts.push(StrategyAttempt {
                        strategy: kind,
                        outcome: StrategyOutcome::Loaded {
                            rows: entries.len(),
                        },
                        tries,
                    });
                    return Ok(LoadReport {
                        entries,
                        source: Some(kind),
                        attempts,
                    });
                }
                Err(SourceError::Configuration(message)) => {
                    error!(strategy = %kind, error = %message, "Configuration error, aborting load");
                    return Err(CatalogError::Configuration(message));
                }
                Err(e) => {
                    warn!(strategy = %kind, tries, error = %e, "Strategy failed, falling back");
                    attempts.push(StrategyAttempt {
                        strategy: kind,
                        outcome: StrategyOutcome::Failed {
                            error: e.to_string(),
                        },
                        tries,
                    });
                    last_error = Some((e, tries));
                }
            }
        }

        if let Some(kind) = empty_success {
            info!(strategy = %kind, "Later strategies failed; keeping empty result");
            return Ok(LoadReport {
                entries: Vec::new(),
                source: Some(kind),
                attempts,
            });
        }

        match last_error {
            Some((SourceError::RateLimited { .. }, tries)) => {
                Err(CatalogError::RateLimited { attempts: tries })
            }
            Some((e, _)) => Err(CatalogError::Transport(e)),
            None => Ok(LoadReport {
                entries: Vec::new(),
                source: None,
                attempts,
            }),
        }
    }
}
