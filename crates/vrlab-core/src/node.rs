use crate::lifecycle::NodeState;
use crate::stager::StageReport;
use crate::CoreError;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use vrlab_runtime::{ConfigRenderer, ContainerRuntime, ExecContext};
use vrlab_schema::{ManagementNetwork, NodeSpec};

/// Key under which a driver reports its primary container image.
pub const IMAGE_KEY: &str = "image";

/// Specs of the other nodes in the lab, keyed by short name.
pub type PeerMap = BTreeMap<String, NodeSpec>;

/// Builds and initializes a driver for one node.
pub type NodeConstructor = fn(NodeSpec, NodeOptions) -> Result<Box<dyn NodeDriver>, CoreError>;

/// Collaborators and switches handed to a driver once, at construction.
#[derive(Clone, Default)]
pub struct NodeOptions {
    pub mgmt: Option<ManagementNetwork>,
    pub runtime: Option<Arc<dyn ContainerRuntime>>,
    /// Renderer for the startup config. Drivers fall back to a
    /// [`vrlab_runtime::TemplateRenderer`] built from the node spec.
    pub renderer: Option<Arc<dyn ConfigRenderer>>,
    /// Treat a failed startup-config render as fatal instead of a warning.
    pub strict_render: bool,
}

impl NodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_mgmt(mut self, mgmt: ManagementNetwork) -> Self {
        self.mgmt = Some(mgmt);
        self
    }

    #[must_use]
    pub fn with_runtime(mut self, runtime: Arc<dyn ContainerRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn ConfigRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    #[must_use]
    pub fn strict_render(mut self, strict: bool) -> Self {
        self.strict_render = strict;
        self
    }
}

impl fmt::Debug for NodeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeOptions")
            .field("mgmt", &self.mgmt)
            .field("runtime", &self.runtime.as_ref().map(|r| r.name().to_owned()))
            .field("renderer", &self.renderer.is_some())
            .field("strict_render", &self.strict_render)
            .finish()
    }
}

/// Lifecycle contract implemented by every node kind.
///
/// The orchestrator drives one instance sequentially: construction (init),
/// `pre_deploy`, `deploy`, `post_deploy`. `delete` and `save_config` are
/// called independently.
pub trait NodeDriver: Send {
    fn kind(&self) -> &str;

    /// The node spec as prepared by init.
    fn config(&self) -> &NodeSpec;

    fn state(&self) -> NodeState;

    fn runtime(&self) -> &Arc<dyn ContainerRuntime>;

    /// Prepare host-side artifacts. Safe to call more than once.
    fn pre_deploy(&mut self) -> Result<StageReport, CoreError>;

    fn deploy(&mut self, ctx: &ExecContext) -> Result<(), CoreError>;

    /// Runs once links are wired; `peers` holds the rest of the lab.
    fn post_deploy(&mut self, ctx: &ExecContext, peers: &PeerMap) -> Result<(), CoreError>;

    /// Images this node needs, keyed by role.
    fn images(&self) -> BTreeMap<String, String>;

    fn delete(&mut self, ctx: &ExecContext) -> Result<(), CoreError>;

    fn save_config(&mut self, ctx: &ExecContext) -> Result<(), CoreError>;
}
