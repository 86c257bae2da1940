use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::models::ContentHash;
use crate::services::{ContentLedger, VaultEngine};

const SWEEP_BATCH: i64 = 256;
const STALE_STAGING_AGE: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub examined: usize,
    pub reaped: usize,
    pub failed: usize,
    pub staging_purged: usize,
}

/// Background sweep for content left at zero references by an interrupted
/// revoke, and for staging files left by an interrupted upload.
pub struct Reconciler {
    engine: VaultEngine,
}

impl Reconciler {
    pub fn new(engine: VaultEngine) -> Self {
        Self { engine }
    }

    /// Run one pass. Safe to repeat and to run alongside live traffic.
    ///
    /// A record that cannot be reaped is counted in `failed` and left for
    /// the next pass; the rest of the pass carries on past it.
    pub async fn sweep(&self) -> Result<SweepReport> {
        let mut report = SweepReport::default();
        let mut cursor: Option<ContentHash> = None;

        loop {
            let hashes = ContentLedger::list_unreferenced(
                self.engine.db().pool(),
                cursor.as_ref(),
                SWEEP_BATCH,
            )
            .await?;
            let batch_len = hashes.len();

            for hash in hashes {
                report.examined += 1;
                match self.engine.reap(&hash).await {
                    Ok(true) => report.reaped += 1,
                    Ok(false) => {}
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!("Failed to reap content {}: {}", hash, e);
                    }
                }
                cursor = Some(hash);
            }

            if batch_len < SWEEP_BATCH as usize {
                break;
            }
        }

        match self.engine.staging().purge_older_than(STALE_STAGING_AGE).await {
            Ok(purged) => report.staging_purged = purged,
            Err(e) => tracing::warn!("Failed to purge staging area: {}", e),
        }

        if report.examined > 0 || report.staging_purged > 0 {
            tracing::info!(
                "Sweep examined {} unreferenced records, reaped {} blobs, {} failed, purged {} staging files",
                report.examined,
                report.reaped,
                report.failed,
                report.staging_purged
            );
        }
        Ok(report)
    }

    /// Sweep every `interval` until the runtime shuts down
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            loop {
                ticker.tick().await;
                if let Err(e) = self.sweep().await {
                    tracing::error!("Orphan sweep failed: {}", e);
                }
            }
        })
    }
}
