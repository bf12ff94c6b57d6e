use anyhow::{anyhow, Result};
use std::path::PathBuf;

/// Process-level settings for a normalization run. The mapping tables
/// themselves live in [`crate::taxonomy::Taxonomy`].
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub taxonomy_path: Option<PathBuf>,
    pub dataset_dir: Option<PathBuf>,
    pub workers: usize,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        let taxonomy_path = std::env::var("TAXONOMY_PATH").ok().map(PathBuf::from);
        let dataset_dir = std::env::var("DATASET_PATH").ok().map(PathBuf::from);

        let workers = match std::env::var("XBRL_WORKERS") {
            Ok(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| anyhow!("XBRL_WORKERS must be a positive integer, got {:?}", raw))?,
            Err(_) => default_workers(),
        };

        Ok(Self {
            taxonomy_path,
            dataset_dir,
            workers,
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            taxonomy_path: None,
            dataset_dir: None,
            workers: default_workers(),
        }
    }
}

pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
