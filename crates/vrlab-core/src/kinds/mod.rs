//! Built-in node kinds.
//!
//! vrnetlab-packaged devices share one launch contract: `launch.py` inside
//! the container reads its parameters from the environment variables below.

pub mod vr_nxos;

use crate::registry::NodeRegistry;
use crate::CoreError;

pub const ENV_USERNAME: &str = "USERNAME";
pub const ENV_PASSWORD: &str = "PASSWORD";
pub const ENV_CONNECTION_MODE: &str = "CONNECTION_MODE";
pub const ENV_VCPU: &str = "VCPU";
pub const ENV_RAM: &str = "RAM";
pub const ENV_MGMT_V4: &str = "DOCKER_NET_V4_ADDR";
pub const ENV_MGMT_V6: &str = "DOCKER_NET_V6_ADDR";

/// Default datapath connection mode for vrnetlab nodes (tc mirroring).
pub const VR_DEFAULT_CONNECTION_MODE: &str = "tc";

pub fn register_builtin(registry: &mut NodeRegistry) -> Result<(), CoreError> {
    vr_nxos::register(registry)
}
