// src/exec/mod.rs

//! Request execution layer.
//!
//! - [`request`] defines the [`Request`] contract every graph node wraps and
//!   the [`OperationResult`] it returns.
//! - [`driver`] provides type-erased [`Driver`] handles and the
//!   [`DriverResolver`] the engine consults per operation type.
//! - [`shell`] and [`file`] are the built-in request kinds used by the CLI.

pub mod driver;
pub mod file;
pub mod request;
pub mod shell;

pub use driver::{Driver, DriverRegistry, DriverResolver};
pub use file::{FileDriver, FileOp, FileRequest};
pub use request::{OperationResult, Request, SKIPPED_MESSAGE};
pub use shell::{ShellDriver, ShellRequest};
