//! Whole-core snapshot persistence.
//!
//! One file holds the registry tables, in-flight challenges, and flow
//! states, so a restart resumes mid-flow verifications instead of
//! invalidating them.

use anyhow::Context;
use praman_challenge::ChallengeSnapshot;
use praman_orchestrator::FlowSnapshot;
use praman_store_memory::StoreSnapshot;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Default, Serialize, Deserialize)]
pub struct CoreSnapshot {
    pub store: StoreSnapshot,
    pub challenges: ChallengeSnapshot,
    pub flows: FlowSnapshot,
}

impl CoreSnapshot {
    /// Write atomically: temp file, then rename.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let bytes = bincode::serialize(self).context("serializing snapshot")?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, bytes).with_context(|| format!("writing {}", tmp.display()))?;
        std::fs::rename(&tmp, path).with_context(|| format!("renaming to {}", path.display()))?;
        Ok(())
    }

    /// Load a snapshot if one exists; a fresh deployment has none.
    pub fn load_if_present(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let bytes =
            std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let snapshot = bincode::deserialize(&bytes).context("deserializing snapshot")?;
        Ok(Some(snapshot))
    }
}
