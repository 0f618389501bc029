//! Business logic services.

pub mod aggregator;
pub mod batch;
pub mod global_insights;
pub mod ingestion;
pub mod library;
pub mod normalizer;
pub mod patterns;
pub mod provider;
pub mod scheduler;

pub use provider::{AnalysisProvider, AnalysisRequest, ProviderError};
pub use scheduler::{start_batch_task, start_insight_task, start_stale_recovery_task};
