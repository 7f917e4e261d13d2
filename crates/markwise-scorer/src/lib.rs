//! markwise-scorer: Semantic scorer implementations.
//!
//! Implements the `SemanticScorer` trait over HTTP for a remote scoring
//! server, plus a deterministic mock, and loads scorer configuration.

pub mod config;
pub mod mock;
pub mod remote;

pub use config::{
    create_scorer, load_config, load_config_from, MarkwiseConfig, ScorerConfig, ScorerKind,
};
pub use markwise_core::error::ScorerError;
pub use mock::MockScorer;
pub use remote::RemoteScorer;
