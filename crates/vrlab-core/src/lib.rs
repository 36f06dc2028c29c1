//! Node driver lifecycle for vrlab lab nodes.
//!
//! This crate ties the schema and runtime layers together: the `NodeDriver`
//! contract every node kind implements, explicit `NodeOptions` applied once at
//! construction, the lifecycle state machine, startup-config staging, the
//! `NodeRegistry` factory map, the built-in `vr-nxos` kind, and bring-up /
//! tear-down helpers used by the CLI.

pub mod concurrency;
pub mod deploy;
pub mod kinds;
pub mod lifecycle;
pub mod node;
pub mod registry;
pub mod stager;

pub use concurrency::install_signal_handler;
pub use deploy::{bring_up, tear_down, DeployReport};
pub use lifecycle::{validate_transition, NodeState};
pub use node::{NodeConstructor, NodeDriver, NodeOptions, PeerMap, IMAGE_KEY};
pub use registry::{Credentials, NodeRegistry};
pub use stager::{StageReport, StageWarning};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("node file error: {0}")]
    Manifest(#[from] vrlab_schema::ManifestError),
    #[error(transparent)]
    Runtime(#[from] vrlab_runtime::RuntimeError),
    #[error("failed to read startup config {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to generate config for node '{node}': {message}")]
    Render { node: String, message: String },
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
    #[error("missing node option: {0}")]
    MissingOption(&'static str),
    #[error("unknown node kind: {0}")]
    UnknownKind(String),
    #[error("node kind already registered: {0}")]
    DuplicateKind(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
