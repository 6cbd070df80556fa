use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::db::Store;

/// Seed-time failures are fatal: the process must not serve requests over
/// an absent or half-loaded dataset.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed fixture {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse seed fixture {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to load seed data into the database: {0}")]
    Database(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedHacker {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Empty string means "no badge assigned yet".
    pub badge_code: String,
    #[serde(default)]
    pub scans: Vec<SeedScan>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedScan {
    pub activity_name: String,
    pub activity_category: String,
    pub scanned_at: DateTime<Utc>,
}

pub fn load_fixture(path: &Path) -> Result<Vec<SeedHacker>, SeedError> {
    let raw = std::fs::read_to_string(path).map_err(|source| SeedError::Read {
        path: path.display().to_string(),
        source,
    })?;

    serde_json::from_str(&raw).map_err(|source| SeedError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Read the fixture and atomically replace all storage content with it.
pub async fn apply(store: &Store, path: &Path) -> Result<(), SeedError> {
    let hackers = load_fixture(path)?;
    info!(
        "Loaded seed fixture {} ({} hackers)",
        path.display(),
        hackers.len()
    );

    store.replace_all(&hackers).await?;
    Ok(())
}
