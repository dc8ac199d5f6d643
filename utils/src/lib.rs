//! Shared utilities for the praman issuance core.

pub mod logging;
pub mod mask;

pub use logging::init_tracing;
pub use mask::{mask_channel_value, mask_identifier};
