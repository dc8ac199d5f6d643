//! Fundamental types for the praman issuance core.
//!
//! This crate defines the types shared across every other crate in the
//! workspace: identifiers, channel keys, timestamps, core parameters, and
//! status enums.

pub mod channel;
pub mod id;
pub mod params;
pub mod state;
pub mod time;

pub use channel::{ChannelKey, ChannelType};
pub use id::{EntityId, IdentityId, TaxId};
pub use params::CoreParams;
pub use state::{EntityType, InvoiceStatus, VerificationStatus};
pub use time::Timestamp;
