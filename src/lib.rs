// src/lib.rs
// Public library surface for integration tests (and the serving layer that
// consumes the engine).

pub mod classifier;
pub mod engine;
pub mod signals;
pub mod verdict;

// ---- Re-exports for stable public API ----
pub use crate::classifier::{
    Distribution, DynTextClassifier, FailingClassifier, FixedClassifier, RemoteClassifier,
    TextClassifier,
};
pub use crate::engine::{route, DecisionEngine, Route};
pub use crate::signals::{SignalCatalog, SignalExtractor, SignalMatches};
pub use crate::verdict::{Label, RiskLevel, Verdict};
