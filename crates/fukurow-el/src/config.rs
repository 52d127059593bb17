//! 飽和エンジン設定

use crate::SaturationError;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::time::Duration;

/// Worker pool and scheduling settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaturationConfig {
    /// ワーカースレッド数
    pub workers: usize,
    /// Longest an idle worker sleeps before rechecking for work or interruption
    pub idle_wait_ms: u64,
    /// Context creations a worker batches before publishing them
    pub context_count_flush_interval: usize,
}

impl Default for SaturationConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            idle_wait_ms: 10,
            context_count_flush_interval: 32,
        }
    }
}

impl SaturationConfig {
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, SaturationError> {
        Ok(serde_json::from_str(json)?)
    }

    pub(crate) fn worker_count(&self) -> usize {
        self.workers.max(1)
    }

    pub(crate) fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms.max(1))
    }

    pub(crate) fn flush_interval(&self) -> u64 {
        self.context_count_flush_interval.max(1) as u64
    }
}
