// src/engine/sequential.rs

use tracing::info;

use crate::dag::{RequestGraph, RequestNode};
use crate::engine::NodeResult;
use crate::errors::Result;
use crate::exec::DriverResolver;

impl RequestGraph {
    /// Execute every node one at a time in [`RequestGraph::execution_order`].
    ///
    /// A cycle or a dangling edge fails the call before anything runs. Node
    /// failures never fail the call: a node that fails without
    /// `allow_failure` gets all its transitive dependents skipped, and the
    /// remaining independent nodes still run.
    ///
    /// Results come back in execution order, one per node.
    pub async fn execute_sequential(
        &mut self,
        resolver: &dyn DriverResolver,
    ) -> Result<Vec<NodeResult>> {
        let order = self.begin_execution()?;
        info!(nodes = order.len(), "starting sequential execution");

        for id in &order {
            let Some(job) = self.prepare(id, resolver) else {
                continue;
            };

            match tokio::task::spawn_blocking(move || job.run()).await {
                Ok(completion) => {
                    self.complete(completion);
                }
                Err(err) => self.fail_unreported(id, format!("worker task failed: {err}")),
            }

            if self.node(id).is_some_and(RequestNode::is_critical_failure) {
                self.mark_dependents_skipped(id);
            }
        }

        let results = self.collect_results(&order);
        info!(nodes = results.len(), "sequential execution finished");
        Ok(results)
    }
}
