// src/engine/runner.rs

//! Guarded execution of a single request on a worker thread.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use tracing::{debug, error};

use crate::dag::NodeId;
use crate::exec::{Driver, OperationResult, Request};

/// A node's request detached from the graph, ready to run.
#[derive(Debug)]
pub(crate) struct NodeJob {
    pub id: NodeId,
    pub request: Box<dyn Request>,
    pub driver: Driver,
}

/// What a worker hands back to the coordinator.
#[derive(Debug)]
pub(crate) struct NodeCompletion {
    pub id: NodeId,
    pub request: Box<dyn Request>,
    pub result: OperationResult,
}

impl NodeJob {
    /// Execute the request. Blocking; call from a blocking-capable thread.
    pub fn run(self) -> NodeCompletion {
        let NodeJob {
            id,
            request,
            driver,
        } = self;

        let result = run_guarded(&id, request.as_ref(), &driver);
        NodeCompletion {
            id,
            request,
            result,
        }
    }
}

/// Call `execute`, turning a panic into a failed result.
///
/// The step-start log runs under the same guard. Fills in `elapsed` and
/// `operation_type` when the request left them empty.
pub(crate) fn run_guarded(id: &str, request: &dyn Request, driver: &Driver) -> OperationResult {
    let started = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        debug!(
            node = %id,
            request_type = request.request_type(),
            operation = %request.operation_type(),
            allow_failure = request.allow_failure(),
            name = request.name().unwrap_or(""),
            request = ?request,
            "step start"
        );
        request.execute(driver)
    }));

    let mut result = match outcome {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(node = %id, error = %message, "request panicked during execution");
            let trace = Backtrace::force_capture();
            OperationResult::failure(format!("{message}\n\nBacktrace:\n{trace}"))
        }
    };

    if result.elapsed.is_none() {
        result.elapsed = Some(started.elapsed());
    }
    if result.operation_type.is_none() {
        result.operation_type =
            panic::catch_unwind(AssertUnwindSafe(|| request.operation_type())).ok();
    }
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "request panicked with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OperationType;

    #[derive(Debug)]
    struct Boom;

    impl Request for Boom {
        fn execute(&self, _driver: &Driver) -> OperationResult {
            panic!("kaboom");
        }

        fn operation_type(&self) -> OperationType {
            OperationType::Python
        }
    }

    #[test]
    fn panic_becomes_failed_result_with_trace() {
        let result = run_guarded("x", &Boom, &Driver::none());
        assert!(!result.success);
        let msg = result.error_message.unwrap_or_default();
        assert!(msg.starts_with("kaboom"));
        assert!(msg.contains("Backtrace:"));
        assert_eq!(result.operation_type, Some(OperationType::Python));
        assert!(result.elapsed.is_some());
    }

    #[derive(Debug)]
    struct BadName;

    impl Request for BadName {
        fn execute(&self, _driver: &Driver) -> OperationResult {
            OperationResult::success()
        }

        fn operation_type(&self) -> OperationType {
            OperationType::Shell
        }

        fn name(&self) -> Option<&str> {
            panic!("no name")
        }
    }

    #[test]
    fn panic_while_logging_step_start_is_contained() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();

        let completion = tracing::subscriber::with_default(subscriber, || {
            NodeJob {
                id: "n".to_string(),
                request: Box::new(BadName),
                driver: Driver::none(),
            }
            .run()
        });

        assert_eq!(completion.id, "n");
        assert!(!completion.result.success);
        let msg = completion.result.error_message.unwrap_or_default();
        assert!(msg.starts_with("no name"));
        assert_eq!(completion.result.operation_type, Some(OperationType::Shell));
    }
}
