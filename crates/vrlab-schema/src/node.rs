use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Per-instance configuration of one lab node.
///
/// Built by the orchestrator, moved into a node driver on init, and handed
/// read-only to the container runtime from deploy onward.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeSpec {
    pub kind: String,
    pub image: String,
    /// Name of the node inside the lab, used as the container hostname.
    pub short_name: String,
    /// Globally unique container name.
    pub long_name: String,
    pub lab_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup_config: Option<PathBuf>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub binds: Vec<BindMount>,
    #[serde(default)]
    pub cmd: String,
    #[serde(default)]
    pub host_requirements: HostRequirements,
    /// Name of the management network the container attaches to.
    #[serde(default)]
    pub mgmt_network: String,
}

impl NodeSpec {
    /// Startup-config source, treating an empty path as unset.
    pub fn startup_config_source(&self) -> Option<&Path> {
        self.startup_config
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostRequirements {
    /// Hardware virtualization (KVM) must be available on the host.
    #[serde(default)]
    pub virt_required: bool,
}

/// Out-of-band management addressing shared by every node of a lab.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManagementNetwork {
    pub network: String,
    pub ipv4_subnet: String,
    pub ipv6_subnet: String,
}

impl Default for ManagementNetwork {
    fn default() -> Self {
        Self {
            network: "clab".to_owned(),
            ipv4_subnet: "172.20.20.0/24".to_owned(),
            ipv6_subnet: "2001:172:20:20::/64".to_owned(),
        }
    }
}

/// Host directory mapped into the container, in `source:target[:ro]` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BindMount {
    pub source: PathBuf,
    pub target: PathBuf,
    pub read_only: bool,
}

impl BindMount {
    pub fn read_write(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            read_only: false,
        }
    }
}

impl fmt::Display for BindMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source.display(), self.target.display())?;
        if self.read_only {
            f.write_str(":ro")?;
        }
        Ok(())
    }
}

impl FromStr for BindMount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        let (source, target, read_only) = match parts.as_slice() {
            [source, target] => (*source, *target, false),
            [source, target, "ro"] => (*source, *target, true),
            [source, target, "rw"] => (*source, *target, false),
            _ => return Err(format!("invalid bind '{s}', expected '<host>:<container>[:ro|rw]'")),
        };
        if source.is_empty() || target.is_empty() {
            return Err(format!("invalid bind '{s}', empty path"));
        }
        Ok(Self {
            source: PathBuf::from(source),
            target: PathBuf::from(target),
            read_only,
        })
    }
}

impl TryFrom<String> for BindMount {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BindMount> for String {
    fn from(value: BindMount) -> Self {
        value.to_string()
    }
}
