use crate::CoreError;
use serde::{Deserialize, Serialize};

/// Lifecycle state of one node driver.
///
/// A driver starts in `Initialized` (its constructor is the init phase) and
/// enters `Deleted` after any successful runtime delete.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum NodeState {
    Initialized,
    PreDeployed,
    Deployed,
    PostDeployed,
    Deleted,
}

impl NodeState {
    /// Whether a container has been created and started for this node.
    pub fn is_deployed(self) -> bool {
        matches!(self, NodeState::Deployed | NodeState::PostDeployed)
    }
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeState::Initialized => write!(f, "initialized"),
            NodeState::PreDeployed => write!(f, "pre-deployed"),
            NodeState::Deployed => write!(f, "deployed"),
            NodeState::PostDeployed => write!(f, "post-deployed"),
            NodeState::Deleted => write!(f, "deleted"),
        }
    }
}

pub fn validate_transition(from: NodeState, to: NodeState) -> Result<(), CoreError> {
    let valid = matches!(
        (from, to),
        (
            NodeState::Initialized | NodeState::PreDeployed,
            NodeState::PreDeployed
        ) | (NodeState::PreDeployed, NodeState::Deployed)
            | (NodeState::Deployed, NodeState::PostDeployed)
    );

    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Config snapshots need a running container.
pub fn ensure_deployed(state: NodeState, operation: &str) -> Result<(), CoreError> {
    if state.is_deployed() {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            from: state.to_string(),
            to: operation.to_owned(),
        })
    }
}
