use crate::context::ExecContext;
use crate::RuntimeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use vrlab_schema::NodeSpec;

/// Opaque identifier a runtime returns for a created container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerHandle(String);

impl ContainerHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    Created,
    Running,
    Exited,
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerStatus::Created => write!(f, "created"),
            ContainerStatus::Running => write!(f, "running"),
            ContainerStatus::Exited => write!(f, "exited"),
        }
    }
}

/// Container lifecycle backend a node driver delegates to.
///
/// Every call receives the caller's context unmodified; honouring its
/// deadline and cancellation is the backend's job.
pub trait ContainerRuntime: Send + Sync {
    fn name(&self) -> &str;

    fn available(&self) -> bool;

    /// Create (but do not start) a container from a fully prepared spec.
    fn create_container(
        &self,
        ctx: &ExecContext,
        spec: &NodeSpec,
    ) -> Result<ContainerHandle, RuntimeError>;

    fn start_container(
        &self,
        ctx: &ExecContext,
        handle: &ContainerHandle,
        spec: &NodeSpec,
    ) -> Result<ContainerStatus, RuntimeError>;

    /// Remove the container with the given name, stopping it first if needed.
    fn delete_container(&self, ctx: &ExecContext, long_name: &str) -> Result<(), RuntimeError>;

    fn status(&self, ctx: &ExecContext, long_name: &str) -> Result<ContainerStatus, RuntimeError>;
}

pub fn select_runtime(name: &str) -> Result<Box<dyn ContainerRuntime>, RuntimeError> {
    match name {
        "docker" => Ok(Box::new(crate::docker::DockerRuntime::new())),
        "mock" => Ok(Box::new(crate::mock::MockRuntime::new())),
        other => Err(RuntimeError::BackendUnavailable(other.to_owned())),
    }
}
