use crate::similarity::SimilarityEngine;
use danmaku_protocol::{MergeRequest, MergeResponse};
use once_cell::sync::OnceCell;
use tokio::sync::{mpsc, oneshot};

static GLOBAL_WORKER: OnceCell<MergeWorker> = OnceCell::new();

struct MergeJob {
    request: MergeRequest,
    reply: oneshot::Sender<MergeResponse>,
}

/// Handle to the long-lived background merge task.
///
/// The task is reused across loads so the engine's work buffer amortizes;
/// the capacity-1 job channel serializes requests, keeping at most one
/// outstanding merge per worker. Every failure path degrades to a `None`
/// response ("pass through unmerged") — the worker can never fail a load.
#[derive(Clone)]
pub struct MergeWorker {
    job_tx: mpsc::Sender<MergeJob>,
}

impl MergeWorker {
    /// Spawn a fresh worker task. Must be called from within a tokio
    /// runtime. Most callers want [`MergeWorker::global`] instead.
    #[must_use]
    pub fn spawn() -> Self {
        let (job_tx, mut job_rx) = mpsc::channel::<MergeJob>(1);

        tokio::spawn(async move {
            let mut engine = SimilarityEngine::new();
            while let Some(MergeJob { request, reply }) = job_rx.recv().await {
                if !request.enabled || request.items.is_empty() {
                    let _ = reply.send(None);
                    continue;
                }

                // Hand the engine to the blocking pool and take it back so
                // the work buffer survives across jobs.
                let worked = tokio::task::spawn_blocking(move || {
                    let mut engine = engine;
                    let edits = engine.merge(
                        &request.items,
                        request.threshold,
                        request.time_window_seconds,
                    );
                    (engine, edits)
                })
                .await;

                match worked {
                    Ok((returned, edits)) => {
                        engine = returned;
                        let _ = reply.send(Some(edits));
                    }
                    Err(err) => {
                        log::warn!("merge task failed ({err}); passing comments through unmerged");
                        engine = SimilarityEngine::new();
                        let _ = reply.send(None);
                    }
                }
            }
        });

        Self { job_tx }
    }

    /// Process-wide worker, spawned on first use and reused across loads.
    pub fn global() -> &'static Self {
        GLOBAL_WORKER.get_or_init(Self::spawn)
    }

    /// Run one merge request. Resolves to `None` (caller keeps its
    /// original comments) when merging is disabled, there is nothing to
    /// merge, or the worker is unavailable.
    pub async fn merge(&self, request: MergeRequest) -> MergeResponse {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job = MergeJob {
            request,
            reply: reply_tx,
        };
        if self.job_tx.send(job).await.is_err() {
            log::warn!("merge worker unavailable; passing comments through unmerged");
            return None;
        }
        match reply_rx.await {
            Ok(response) => response,
            Err(_) => {
                log::warn!("merge worker dropped the reply; passing comments through unmerged");
                None
            }
        }
    }
}
