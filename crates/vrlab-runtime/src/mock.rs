use crate::backend::{ContainerHandle, ContainerRuntime, ContainerStatus};
use crate::context::ExecContext;
use crate::RuntimeError;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;
use vrlab_schema::NodeSpec;

/// A runtime call as observed by [`MockRuntime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Create {
        long_name: String,
        image: String,
        cmd: String,
        deadline: Option<Instant>,
    },
    Start {
        handle: ContainerHandle,
        deadline: Option<Instant>,
    },
    Delete {
        long_name: String,
        deadline: Option<Instant>,
    },
}

#[derive(Default)]
struct MockState {
    containers: HashMap<String, ContainerStatus>,
    calls: Vec<MockCall>,
    next_id: u64,
    fail_start: Option<String>,
}

/// In-memory runtime that records every call it receives.
#[derive(Default)]
pub struct MockRuntime {
    state: Mutex<MockState>,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `start_container` fail with `ExecFailed(msg)`.
    #[must_use]
    pub fn with_start_failure(self, msg: &str) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.fail_start = Some(msg.to_owned());
        }
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state
            .lock()
            .map(|s| s.calls.clone())
            .unwrap_or_default()
    }

    pub fn container_count(&self) -> usize {
        self.state.lock().map(|s| s.containers.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MockState>, RuntimeError> {
        self.state
            .lock()
            .map_err(|e| RuntimeError::ExecFailed(format!("mutex poisoned: {e}")))
    }
}

impl ContainerRuntime for MockRuntime {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn available(&self) -> bool {
        true
    }

    fn create_container(
        &self,
        ctx: &ExecContext,
        spec: &NodeSpec,
    ) -> Result<ContainerHandle, RuntimeError> {
        let mut state = self.lock()?;
        state.calls.push(MockCall::Create {
            long_name: spec.long_name.clone(),
            image: spec.image.clone(),
            cmd: spec.cmd.clone(),
            deadline: ctx.deadline(),
        });
        ctx.check()?;
        if state.containers.contains_key(&spec.long_name) {
            return Err(RuntimeError::AlreadyExists(spec.long_name.clone()));
        }
        state.next_id += 1;
        state
            .containers
            .insert(spec.long_name.clone(), ContainerStatus::Created);
        Ok(ContainerHandle::new(format!(
            "mock-{:012x}-{}",
            state.next_id, spec.long_name
        )))
    }

    fn start_container(
        &self,
        ctx: &ExecContext,
        handle: &ContainerHandle,
        spec: &NodeSpec,
    ) -> Result<ContainerStatus, RuntimeError> {
        let mut state = self.lock()?;
        state.calls.push(MockCall::Start {
            handle: handle.clone(),
            deadline: ctx.deadline(),
        });
        ctx.check()?;
        if let Some(msg) = &state.fail_start {
            return Err(RuntimeError::ExecFailed(msg.clone()));
        }
        match state.containers.get_mut(&spec.long_name) {
            Some(status) => {
                *status = ContainerStatus::Running;
                Ok(ContainerStatus::Running)
            }
            None => Err(RuntimeError::ContainerNotFound(spec.long_name.clone())),
        }
    }

    fn delete_container(&self, ctx: &ExecContext, long_name: &str) -> Result<(), RuntimeError> {
        let mut state = self.lock()?;
        state.calls.push(MockCall::Delete {
            long_name: long_name.to_owned(),
            deadline: ctx.deadline(),
        });
        ctx.check()?;
        match state.containers.remove(long_name) {
            Some(_) => Ok(()),
            None => Err(RuntimeError::ContainerNotFound(long_name.to_owned())),
        }
    }

    fn status(&self, ctx: &ExecContext, long_name: &str) -> Result<ContainerStatus, RuntimeError> {
        ctx.check()?;
        let state = self.lock()?;
        state
            .containers
            .get(long_name)
            .copied()
            .ok_or_else(|| RuntimeError::ContainerNotFound(long_name.to_owned()))
    }
}
