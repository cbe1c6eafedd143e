use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stepdag::exec::{Driver, OperationResult, Request};
use stepdag::types::OperationType;

/// What a [`ScriptedRequest`] does when executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Succeed,
    Fail,
    Panic,
}

/// Shared record of what scripted requests did.
///
/// - execution order (by request id)
/// - the `cmd` each request saw at execution time
/// - the highest number of requests running at once
#[derive(Debug, Default)]
pub struct ExecutionLog {
    order: Mutex<Vec<String>>,
    cmds: Mutex<HashMap<String, Vec<String>>>,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl ExecutionLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn executed(&self) -> Vec<String> {
        self.order.lock().unwrap().clone()
    }

    pub fn was_executed(&self, id: &str) -> bool {
        self.order.lock().unwrap().iter().any(|n| n == id)
    }

    pub fn cmd_seen_by(&self, id: &str) -> Option<Vec<String>> {
        self.cmds.lock().unwrap().get(id).cloned()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn enter(&self, id: &str, cmd: &[String]) {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.order.lock().unwrap().push(id.to_string());
        self.cmds
            .lock()
            .unwrap()
            .insert(id.to_string(), cmd.to_vec());
    }

    fn leave(&self) {
        self.running.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A request whose behaviour is fixed up front.
#[derive(Debug, Clone)]
pub struct ScriptedRequest {
    id: String,
    script: Script,
    stdout: String,
    delay: Option<Duration>,
    allow_failure: bool,
    op: OperationType,
    /// Substitutable argument vector, recorded in the log when executed.
    pub cmd: Vec<String>,
    log: Arc<ExecutionLog>,
}

impl ScriptedRequest {
    fn new(id: &str, script: Script, log: &Arc<ExecutionLog>) -> Self {
        Self {
            id: id.to_string(),
            script,
            stdout: String::new(),
            delay: None,
            allow_failure: false,
            op: OperationType::Python,
            cmd: Vec::new(),
            log: Arc::clone(log),
        }
    }

    pub fn succeed(id: &str, log: &Arc<ExecutionLog>) -> Self {
        Self::new(id, Script::Succeed, log)
    }

    pub fn fail(id: &str, log: &Arc<ExecutionLog>) -> Self {
        Self::new(id, Script::Fail, log)
    }

    pub fn panic(id: &str, log: &Arc<ExecutionLog>) -> Self {
        Self::new(id, Script::Panic, log)
    }

    pub fn with_stdout(mut self, stdout: &str) -> Self {
        self.stdout = stdout.to_string();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn allow_failure(mut self, val: bool) -> Self {
        self.allow_failure = val;
        self
    }

    pub fn with_operation_type(mut self, op: OperationType) -> Self {
        self.op = op;
        self
    }

    pub fn with_cmd(mut self, cmd: &[&str]) -> Self {
        self.cmd = cmd.iter().map(|s| s.to_string()).collect();
        self
    }
}

impl Request for ScriptedRequest {
    fn execute(&self, _driver: &Driver) -> OperationResult {
        self.log.enter(&self.id, &self.cmd);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.log.leave();

        match self.script {
            Script::Succeed => {
                let mut result = OperationResult::success().with_stdout(self.stdout.clone());
                result.cmd = Some(self.cmd.join(" "));
                result
            }
            Script::Fail => OperationResult::failure(format!("{} failed on purpose", self.id)),
            Script::Panic => panic!("{} panicked on purpose", self.id),
        }
    }

    fn operation_type(&self) -> OperationType {
        self.op
    }

    fn allow_failure(&self) -> bool {
        self.allow_failure
    }

    fn name(&self) -> Option<&str> {
        Some(&self.id)
    }

    fn substitution_fields(&mut self) -> Vec<&mut String> {
        self.cmd.iter_mut().collect()
    }
}
