//! Risk evaluation for external consumers.
//!
//! Pure functions over already-fetched registry state: three component
//! scores (owner, entity, transaction) combine 40/40/20 into a composite
//! score on a 0..=1000 scale, which maps to a risk category and an
//! approve/reject recommendation. No storage access happens here; the RPC
//! layer assembles the input from the registry.

pub mod report;
pub mod score;

pub use report::{evaluate, EvaluationInput, EvaluationReport, Recommendation, RiskCategory};
pub use score::{composite_score, entity_score, owner_score, transaction_score};
