use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read node file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse node file: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("unsupported node_version: {0}, expected 1")]
    UnsupportedVersion(u32),
    #[error("node.image must not be empty")]
    EmptyImage,
    #[error("node.kind must not be empty")]
    EmptyKind,
    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
    #[error("{0}")]
    InvalidBind(String),
    #[error("invalid {family} subnet '{subnet}'")]
    InvalidSubnet { family: &'static str, subnet: String },
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NodeFileV1 {
    pub node_version: u32,
    pub lab: LabSection,
    pub node: NodeSection,
    #[serde(default)]
    pub mgmt: MgmtSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LabSection {
    pub name: String,
    #[serde(default)]
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NodeSection {
    pub name: String,
    pub kind: String,
    pub image: String,
    #[serde(default)]
    pub startup_config: Option<String>,
    #[serde(default)]
    pub binds: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MgmtSection {
    #[serde(default = "default_network")]
    pub network: String,
    #[serde(default = "default_ipv4_subnet")]
    pub ipv4_subnet: String,
    #[serde(default = "default_ipv6_subnet")]
    pub ipv6_subnet: String,
}

impl Default for MgmtSection {
    fn default() -> Self {
        Self {
            network: default_network(),
            ipv4_subnet: default_ipv4_subnet(),
            ipv6_subnet: default_ipv6_subnet(),
        }
    }
}

fn default_network() -> String {
    "clab".to_owned()
}

fn default_ipv4_subnet() -> String {
    "172.20.20.0/24".to_owned()
}

fn default_ipv6_subnet() -> String {
    "2001:172:20:20::/64".to_owned()
}

pub fn parse_node_str(input: &str) -> Result<NodeFileV1, ManifestError> {
    Ok(toml::from_str(input)?)
}

pub fn parse_node_file(path: impl AsRef<Path>) -> Result<NodeFileV1, ManifestError> {
    let content = fs::read_to_string(path)?;
    parse_node_str(&content)
}
