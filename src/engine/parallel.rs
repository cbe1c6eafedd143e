// src/engine/parallel.rs

use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, info};

use crate::dag::RequestGraph;
use crate::engine::runner::NodeCompletion;
use crate::engine::{NodeResult, default_max_workers};
use crate::errors::Result;
use crate::exec::DriverResolver;
use crate::types::NodeStatus;

impl RequestGraph {
    /// Execute the graph layer by layer on a pool of `max_workers` threads.
    ///
    /// Each layer of [`RequestGraph::parallel_groups`] is submitted in full,
    /// then awaited before the next one starts. A node whose direct
    /// dependency failed critically or was skipped is skipped instead of
    /// submitted. `max_workers` defaults to [`default_max_workers`] and is
    /// clamped to at least 1.
    ///
    /// Results come back in execution order regardless of completion order.
    pub async fn execute_parallel(
        &mut self,
        resolver: &dyn DriverResolver,
        max_workers: Option<usize>,
    ) -> Result<Vec<NodeResult>> {
        let order = self.begin_execution()?;
        let groups = self.parallel_groups()?;
        let workers = max_workers.unwrap_or_else(default_max_workers).max(1);
        let pool = Arc::new(Semaphore::new(workers));

        info!(
            nodes = order.len(),
            layers = groups.len(),
            workers,
            "starting parallel execution"
        );

        for (layer, group) in groups.iter().enumerate() {
            let (tx, mut rx) = mpsc::channel::<NodeCompletion>(group.len().max(1));
            let mut submitted = Vec::with_capacity(group.len());

            for id in group {
                if self.has_failed_dependency(id) {
                    if let Some(node) = self.node_mut(id) {
                        node.transition(NodeStatus::Skipped);
                    }
                    debug!(node = %id, layer, "dependency failed; skipping");
                    continue;
                }

                let permit = Arc::clone(&pool)
                    .acquire_owned()
                    .await
                    .map_err(|err| anyhow!("worker pool closed: {err}"))?;
                let Some(job) = self.prepare(id, resolver) else {
                    continue;
                };

                let tx = tx.clone();
                submitted.push(id.clone());
                tokio::task::spawn_blocking(move || {
                    let completion = job.run();
                    drop(permit);
                    // The coordinator holds the receiver until the layer drains.
                    let _ = tx.blocking_send(completion);
                });
            }
            drop(tx);

            debug!(layer, submitted = submitted.len(), "waiting for layer");
            while let Some(completion) = rx.recv().await {
                self.complete(completion);
            }

            for id in &submitted {
                if self.node(id).is_some_and(|n| n.status() == NodeStatus::Running) {
                    self.fail_unreported(id, "worker exited without reporting a result");
                }
            }
        }

        let results = self.collect_results(&order);
        info!(nodes = results.len(), "parallel execution finished");
        Ok(results)
    }
}
