//! Contact-channel types — the target of one-time verification codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of contact channel a challenge is delivered over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelType {
    Phone,
    Email,
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelType::Phone => write!(f, "PHONE"),
            ChannelType::Email => write!(f, "EMAIL"),
        }
    }
}

/// A (channel type, channel value) pair — the key under which challenges
/// are issued and flow instances are looked up.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelKey {
    pub channel_type: ChannelType,
    pub value: String,
}

impl ChannelKey {
    pub fn new(channel_type: ChannelType, value: impl Into<String>) -> Self {
        Self {
            channel_type,
            value: value.into(),
        }
    }

    pub fn phone(value: impl Into<String>) -> Self {
        Self::new(ChannelType::Phone, value)
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel_type, self.value)
    }
}
