//! Issuance flow orchestrator — connects challenge issuance, code
//! verification, and registry commits into end-to-end flows, one per
//! contact channel.

pub mod error;
pub mod notifier;
pub mod orchestrator;

pub use error::FlowError;
pub use notifier::{LogNotifier, Notifier};
pub use orchestrator::{
    FlowEvent, FlowOrchestrator, FlowPhase, FlowSnapshot, FlowType, StartedFlow,
};
