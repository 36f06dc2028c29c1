//! Cisco NX-OS running as a VM inside a vrnetlab container.

use super::{
    ENV_CONNECTION_MODE, ENV_MGMT_V4, ENV_MGMT_V6, ENV_PASSWORD, ENV_RAM, ENV_USERNAME, ENV_VCPU,
    VR_DEFAULT_CONNECTION_MODE,
};
use crate::lifecycle::{ensure_deployed, validate_transition, NodeState};
use crate::node::{NodeDriver, NodeOptions, PeerMap, IMAGE_KEY};
use crate::registry::NodeRegistry;
use crate::stager::{self, StageReport, CONFIG_DIR_NAME};
use crate::CoreError;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use vrlab_runtime::{ConfigRenderer, ContainerRuntime, ExecContext, TemplateRenderer};
use vrlab_schema::{merge_env, BindMount, ManagementNetwork, NodeSpec};

pub const KIND_NAMES: &[&str] = &["vr-nxos", "vr-cisco_nxos"];

pub const DEFAULT_USER: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "admin";
const DEFAULT_VCPU: &str = "2";
const DEFAULT_RAM_MB: &str = "4096";

pub const STARTUP_CONFIG_FILE: &str = "startup-config.cfg";
/// Where the config directory appears inside the container.
pub const CONFIG_MOUNT_PATH: &str = "/config";

pub fn register(registry: &mut NodeRegistry) -> Result<(), CoreError> {
    registry.register(KIND_NAMES, construct)?;
    registry.set_default_credentials(KIND_NAMES, DEFAULT_USER, DEFAULT_PASSWORD)
}

fn construct(spec: NodeSpec, options: NodeOptions) -> Result<Box<dyn NodeDriver>, CoreError> {
    Ok(Box::new(VrNxos::init(spec, options)?))
}

pub struct VrNxos {
    spec: NodeSpec,
    runtime: Arc<dyn ContainerRuntime>,
    renderer: Option<Arc<dyn ConfigRenderer>>,
    strict_render: bool,
    state: NodeState,
}

impl VrNxos {
    /// Take ownership of `spec` and prepare it for launch.
    ///
    /// Fills in default launch parameters (caller env wins), mounts the
    /// lab's config directory at `/config`, builds the launch command line
    /// and marks the node as needing hardware virtualization.
    pub fn init(mut spec: NodeSpec, options: NodeOptions) -> Result<Self, CoreError> {
        let mgmt = options
            .mgmt
            .ok_or(CoreError::MissingOption("management network"))?;
        let runtime = options.runtime.ok_or(CoreError::MissingOption("runtime"))?;

        spec.env = merge_env(&default_env(&mgmt), &spec.env);
        spec.binds.push(BindMount::read_write(
            spec.lab_dir.join(CONFIG_DIR_NAME),
            CONFIG_MOUNT_PATH,
        ));
        spec.cmd = launch_command(&spec);
        spec.host_requirements.virt_required = true;

        info!("initialized {} node {}", spec.kind, spec.short_name);
        Ok(Self {
            spec,
            runtime,
            renderer: options.renderer,
            strict_render: options.strict_render,
            state: NodeState::Initialized,
        })
    }

    /// Host path of the rendered startup config.
    pub fn startup_config_path(&self) -> PathBuf {
        self.spec
            .lab_dir
            .join(CONFIG_DIR_NAME)
            .join(STARTUP_CONFIG_FILE)
    }
}

fn default_env(mgmt: &ManagementNetwork) -> BTreeMap<String, String> {
    [
        (ENV_USERNAME, DEFAULT_USER),
        (ENV_PASSWORD, DEFAULT_PASSWORD),
        (ENV_CONNECTION_MODE, VR_DEFAULT_CONNECTION_MODE),
        (ENV_VCPU, DEFAULT_VCPU),
        (ENV_RAM, DEFAULT_RAM_MB),
        (ENV_MGMT_V4, mgmt.ipv4_subnet.as_str()),
        (ENV_MGMT_V6, mgmt.ipv6_subnet.as_str()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect()
}

fn launch_command(spec: &NodeSpec) -> String {
    let env = |key: &str| spec.env.get(key).map_or("", String::as_str);
    format!(
        "--username {} --password {} --hostname {} --connection-mode {} --trace",
        env(ENV_USERNAME),
        env(ENV_PASSWORD),
        spec.short_name,
        env(ENV_CONNECTION_MODE)
    )
}

impl NodeDriver for VrNxos {
    fn kind(&self) -> &str {
        &self.spec.kind
    }

    fn config(&self) -> &NodeSpec {
        &self.spec
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn runtime(&self) -> &Arc<dyn ContainerRuntime> {
        &self.runtime
    }

    fn pre_deploy(&mut self) -> Result<StageReport, CoreError> {
        validate_transition(self.state, NodeState::PreDeployed)?;

        stager::ensure_dirs(&self.spec.lab_dir)?;
        let renderer: Arc<dyn ConfigRenderer> = match &self.renderer {
            Some(r) => Arc::clone(r),
            None => Arc::new(TemplateRenderer::for_node(&self.spec)),
        };
        let report = stager::stage_startup_config(
            self.spec.startup_config_source(),
            &self.startup_config_path(),
            renderer.as_ref(),
            &self.spec.short_name,
        )?;

        if self.strict_render {
            if let Some(w) = report.warnings.first() {
                return Err(CoreError::Render {
                    node: w.node.clone(),
                    message: w.message.clone(),
                });
            }
        }

        self.state = NodeState::PreDeployed;
        Ok(report)
    }

    fn deploy(&mut self, ctx: &ExecContext) -> Result<(), CoreError> {
        validate_transition(self.state, NodeState::Deployed)?;

        let handle = self.runtime.create_container(ctx, &self.spec)?;
        debug!("created container {handle} for {}", self.spec.long_name);
        self.runtime.start_container(ctx, &handle, &self.spec)?;

        info!("deployed {} ({})", self.spec.short_name, self.spec.long_name);
        self.state = NodeState::Deployed;
        Ok(())
    }

    fn post_deploy(&mut self, _ctx: &ExecContext, _peers: &PeerMap) -> Result<(), CoreError> {
        validate_transition(self.state, NodeState::PostDeployed)?;
        self.state = NodeState::PostDeployed;
        Ok(())
    }

    fn images(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(IMAGE_KEY.to_owned(), self.spec.image.clone())])
    }

    fn delete(&mut self, ctx: &ExecContext) -> Result<(), CoreError> {
        self.runtime.delete_container(ctx, &self.spec.long_name)?;
        self.state = NodeState::Deleted;
        Ok(())
    }

    fn save_config(&mut self, _ctx: &ExecContext) -> Result<(), CoreError> {
        ensure_deployed(self.state, "save-config")
    }
}
