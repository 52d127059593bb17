//! # Fukurow EL
//!
//! Concurrent consequence-based saturation for the OWL EL profile.
//!
//! An indexed ontology from `fukurow-el-index` is saturated by a pool of
//! worker threads. Each class expression that gets referenced receives a
//! [`Context`]; conclusions travel between contexts through their to-do
//! queues until no context is active any more.
//!
//! ```no_run
//! use fukurow_el::{ElReasoner, SaturationConfig};
//! use fukurow_el_index::{Axiom, ClassExpression, Ontology};
//!
//! let mut ontology = Ontology::new();
//! ontology.add_axiom(Axiom::SubClassOf(
//!     ClassExpression::class("http://example.org/Dog"),
//!     ClassExpression::class("http://example.org/Animal"),
//! ));
//!
//! let reasoner = ElReasoner::with_config(SaturationConfig::with_workers(4));
//! let result = reasoner.classify(&ontology).unwrap();
//! assert!(result.is_subsumed_by(
//!     &"http://example.org/Dog".into(),
//!     &"http://example.org/Animal".into(),
//! ));
//! ```

pub mod conclusion;
pub mod config;
pub mod context;
pub mod engine;
pub mod reasoner;
pub mod rules;
pub mod runtime;
pub mod scheduler;
pub mod statistics;

pub use conclusion::{Conclusion, ConclusionKind};
pub use config::SaturationConfig;
pub use context::Context;
pub use engine::{ClassExpressionSaturation, RunState, SaturationOutcome};
pub use reasoner::{ElReasoner, SaturationResult};
pub use rules::{rules_for, RuleKind};
pub use runtime::saturate_with_timeout;
pub use scheduler::Interrupter;
pub use statistics::{ConclusionCounter, RuleCounter, SaturationStatistics};

use fukurow_el_index::{ClassId, IndexError, OwlIri};
use thiserror::Error;

/// Saturation errors
#[derive(Error, Debug)]
pub enum SaturationError {
    #[error("Unknown root class expression: {0}")]
    UnknownRoot(ClassId),

    #[error("Unknown class: {0}")]
    UnknownClass(OwlIri),

    #[error("Reached {kind} #{id}, which is not in the index")]
    MissingNode { kind: &'static str, id: u32 },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Worker panicked: {0}")]
    WorkerPanicked(String),

    #[error("Saturation failed in an earlier run and cannot be resumed")]
    Poisoned,

    #[error("Saturation was interrupted before reaching a fixed point")]
    Interrupted,

    #[error("Indexing error: {0}")]
    Index(#[from] IndexError),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}
