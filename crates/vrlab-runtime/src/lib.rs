//! Container runtime backends and config rendering for vrlab nodes.
//!
//! This crate implements the collaborators a node driver delegates to: the
//! pluggable `ContainerRuntime` trait with an in-memory mock and a `docker`
//! CLI backend, the cancellable deadline-bearing `ExecContext` forwarded to
//! every runtime call, the `ConfigRenderer` contract with a placeholder
//! `TemplateRenderer`, and host prerequisite checking.

pub mod backend;
pub mod context;
pub mod docker;
pub mod mock;
pub mod prereq;
pub mod render;

pub use backend::{select_runtime, ContainerHandle, ContainerRuntime, ContainerStatus};
pub use context::{CancelToken, ExecContext};
pub use prereq::{check_host_requirements, check_runtime_prereqs, format_missing, MissingPrereq};
pub use render::{ConfigRenderer, RenderError, TemplateRenderer};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("runtime '{0}' is not available on this system")]
    BackendUnavailable(String),
    #[error("container '{0}' not found")]
    ContainerNotFound(String),
    #[error("container '{0}' already exists")]
    AlreadyExists(String),
    #[error("image not found: {0}")]
    ImageNotFound(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("runtime execution failed: {0}")]
    ExecFailed(String),
}
