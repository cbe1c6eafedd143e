// tests/builtin_requests.rs

mod common;
use crate::common::init_tracing;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use stepdag::cli::{CliArgs, ModeArg};
use stepdag::dag::{DependencyEdge, RequestGraph, RequestNode};
use stepdag::exec::{
    Driver, DriverRegistry, FileDriver, FileOp, FileRequest, Request, ShellDriver, ShellRequest,
};
use stepdag::fs::FileSystem;
use stepdag::fs::mock::{MockEntry, MockFileSystem};
use stepdag::types::{NodeStatus, OperationType};
use tempfile::TempDir;

fn mock_drivers(fs: &MockFileSystem) -> DriverRegistry {
    DriverRegistry::new().register(OperationType::File, FileDriver::new(Arc::new(fs.clone())))
}

#[tokio::test]
async fn file_steps_run_against_the_mock_filesystem() {
    init_tracing();
    let fs = MockFileSystem::new();
    let mut graph = RequestGraph::new();
    graph.add_node(RequestNode::new("mk", FileRequest::mkdir("out")));
    graph.add_node(RequestNode::new("write", FileRequest::write("out/a.txt", "hi")));
    graph.add_node(RequestNode::new(
        "copy",
        FileRequest::copy("{{step_write.path}}", "out/b.txt"),
    ));
    graph.add_node(RequestNode::new(
        "check",
        FileRequest::new(FileOp::Exists, "out/b.txt"),
    ));
    for (from, to) in [("mk", "write"), ("write", "copy"), ("copy", "check")] {
        graph.add_dependency(DependencyEdge::order(from, to));
    }

    let results = graph.execute_sequential(&mock_drivers(&fs)).await.unwrap();

    assert!(results.iter().all(|r| r.status == NodeStatus::Completed));
    assert_eq!(results[1].result.content.as_deref(), Some("hi"));
    assert_eq!(results[3].result.exists, Some(true));
    assert_eq!(results[3].result.operation_type, Some(OperationType::File));
    assert_eq!(fs.read_to_string(Path::new("out/b.txt")).unwrap(), "hi");
    assert!(fs.entries().contains(&(Path::new("out").to_path_buf(), MockEntry::Dir)));
}

#[tokio::test]
async fn move_and_remove_update_the_mock_filesystem() {
    let fs = MockFileSystem::new();
    fs.add_file("in/data.txt", "payload");

    let mut graph = RequestGraph::new();
    graph.add_node(RequestNode::new(
        "mv",
        FileRequest::new(FileOp::Move, "in/data.txt").dst("archive/data.txt"),
    ));
    graph.add_node(RequestNode::new("rm", FileRequest::new(FileOp::Remove, "in")));
    graph.add_dependency(DependencyEdge::order("mv", "rm"));

    let results = graph.execute_sequential(&mock_drivers(&fs)).await.unwrap();

    assert!(results.iter().all(|r| r.status == NodeStatus::Completed));
    assert!(!fs.exists(Path::new("in")));
    assert_eq!(
        fs.read_to_string(Path::new("archive/data.txt")).unwrap(),
        "payload"
    );
}

#[tokio::test]
async fn relative_file_paths_resolve_against_the_driver_root() {
    let fs = MockFileSystem::new();
    fs.add_file("/work/src.txt", "x");
    let drivers = DriverRegistry::new().register(
        OperationType::File,
        FileDriver::new(Arc::new(fs.clone())).with_root("/work"),
    );

    let mut graph = RequestGraph::new();
    graph.add_node(RequestNode::new("mk", FileRequest::mkdir("out")));
    graph.add_node(RequestNode::new("cp", FileRequest::copy("src.txt", "out/dst.txt")));
    graph.add_node(RequestNode::new("abs", FileRequest::write("/elsewhere/a.txt", "a")));
    graph.add_dependency(DependencyEdge::order("mk", "cp"));

    let results = graph.execute_sequential(&drivers).await.unwrap();

    assert!(results.iter().all(|r| r.status == NodeStatus::Completed));
    assert!(fs.is_dir(Path::new("/work/out")));
    assert!(!fs.exists(Path::new("out")));
    assert_eq!(fs.read_to_string(Path::new("/work/out/dst.txt")).unwrap(), "x");
    assert_eq!(fs.read_to_string(Path::new("/elsewhere/a.txt")).unwrap(), "a");
    // The reported path is the one the step declared.
    let cp = results.iter().find(|r| r.node_id == "cp").unwrap();
    assert_eq!(cp.result.path.as_deref(), Some("src.txt"));
}

#[test]
fn relative_shell_cwd_joins_the_default_cwd() {
    let driver = ShellDriver::new().with_default_cwd("/work");
    assert_eq!(driver.resolve_cwd(None), Some(PathBuf::from("/work")));
    assert_eq!(
        driver.resolve_cwd(Some(Path::new("build"))),
        Some(PathBuf::from("/work/build"))
    );
    assert_eq!(
        driver.resolve_cwd(Some(Path::new("/tmp"))),
        Some(PathBuf::from("/tmp"))
    );
    assert_eq!(ShellDriver::new().resolve_cwd(None), None);
}

#[test]
fn failed_file_operations_report_the_error() {
    let fs = MockFileSystem::new();
    let driver = Driver::new(FileDriver::new(Arc::new(fs)));

    let result = FileRequest::copy("missing.txt", "dst.txt").execute(&driver);
    assert!(!result.success);
    assert_eq!(result.path.as_deref(), Some("missing.txt"));
    assert!(result.error_message.is_some());
}

#[test]
fn requests_without_their_driver_fail_cleanly() {
    let result = ShellRequest::new(["true"]).execute(&Driver::none());
    assert!(!result.success);
    assert!(
        result
            .error_message
            .unwrap_or_default()
            .contains("requires a ShellDriver")
    );

    let result = FileRequest::mkdir("x").execute(&Driver::none());
    assert!(!result.success);
}

#[cfg(unix)]
#[tokio::test]
async fn shell_steps_capture_output_and_exit_codes() {
    let drivers = DriverRegistry::new().register(OperationType::Shell, ShellDriver::new());
    let mut graph = RequestGraph::new();
    graph.add_node(RequestNode::new("hello", ShellRequest::new(["echo", "hello"])));
    graph.add_node(RequestNode::new(
        "echo_back",
        ShellRequest::new(["printf", "%s", "{{step_hello.stdout}}"]),
    ));
    graph.add_node(RequestNode::new(
        "exit3",
        ShellRequest::new(["sh", "-c", "exit 3"]).allow_failure(true),
    ));
    graph.add_dependency(DependencyEdge::order("hello", "echo_back"));

    let results = graph.execute_sequential(&drivers).await.unwrap();

    let hello = &results[0].result;
    assert!(hello.success);
    assert_eq!(hello.returncode, Some(0));
    assert_eq!(hello.stdout.as_deref(), Some("hello\n"));
    assert_eq!(hello.cmd.as_deref(), Some("echo hello"));

    let exit3 = results.iter().find(|r| r.node_id == "exit3").unwrap();
    assert_eq!(exit3.status, NodeStatus::Failed);
    assert_eq!(exit3.result.returncode, Some(3));

    let echoed = results.iter().find(|r| r.node_id == "echo_back").unwrap();
    assert_eq!(echoed.result.stdout.as_deref(), Some("hello\n"));
}

fn cli_args(config: &Path, dry_run: bool) -> CliArgs {
    CliArgs {
        config: Some(config.display().to_string()),
        mode: Some(ModeArg::Parallel),
        max_workers: Some(2),
        log_level: None,
        dry_run,
    }
}

#[tokio::test]
async fn run_executes_a_workflow_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let config = dir.path().join("Stepdag.toml");
    std::fs::write(
        &config,
        format!(
            r#"
[step.mk]
kind = "mkdir"
path = "{out}"
creates_dirs = ["{out}"]

[step.note]
kind = "write"
path = "{out}/note.txt"
content = "done"
requires_dirs = ["{out}"]
"#,
            out = out.display()
        ),
    )
    .unwrap();

    stepdag::run(cli_args(&config, true)).await.unwrap();
    assert!(!out.exists());

    stepdag::run(cli_args(&config, false)).await.unwrap();
    assert_eq!(std::fs::read_to_string(out.join("note.txt")).unwrap(), "done");
}

#[tokio::test]
async fn run_fails_when_a_step_fails() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("Stepdag.toml");
    std::fs::write(
        &config,
        format!(
            r#"
[step.copy]
kind = "copy"
path = "{missing}"
dst = "{dst}"
"#,
            missing = dir.path().join("missing.txt").display(),
            dst = dir.path().join("dst.txt").display()
        ),
    )
    .unwrap();

    let err = stepdag::run(cli_args(&config, false)).await.unwrap_err();
    assert!(err.to_string().contains("workflow failed"));
}

#[cfg(unix)]
#[tokio::test]
async fn run_resolves_relative_paths_next_to_the_workflow_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("Stepdag.toml");
    std::fs::write(
        &config,
        r#"
[step.a_mk]
kind = "mkdir"
path = "stepdag_rel_build"

[step.b_note]
kind = "write"
path = "stepdag_rel_build/note.txt"
content = "done"
after = ["a_mk"]

[step.c_check]
kind = "shell"
cmd = ["test", "-f", "note.txt"]
cwd = "stepdag_rel_build"
after = ["b_note"]

[step.d_check_root]
kind = "shell"
cmd = ["test", "-d", "stepdag_rel_build"]
after = ["a_mk"]
"#,
    )
    .unwrap();

    stepdag::run(cli_args(&config, false)).await.unwrap();

    let build = dir.path().join("stepdag_rel_build");
    assert!(build.is_dir());
    assert_eq!(std::fs::read_to_string(build.join("note.txt")).unwrap(), "done");
    assert!(!Path::new("stepdag_rel_build").exists());
}
