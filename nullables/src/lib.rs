//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies (clock, code delivery) sit behind seams; this
//! crate provides implementations that return deterministic values, can be
//! controlled programmatically, and never touch the network.
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod notifier;

pub use clock::NullClock;
pub use notifier::NullNotifier;
