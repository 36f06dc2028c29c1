use crate::manifest::{ManifestError, NodeFileV1};
use crate::node::{BindMount, HostRequirements, ManagementNetwork, NodeSpec};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};

/// Prefix shared by container names and lab directories.
pub const LAB_PREFIX: &str = "clab";

/// A validated node file: the spec handed to a driver and the management
/// network injected alongside it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedNode {
    pub spec: NodeSpec,
    pub mgmt: ManagementNetwork,
}

impl NodeFileV1 {
    /// Validate the node file and resolve relative paths against `base_dir`.
    pub fn normalize(&self, base_dir: &Path) -> Result<NormalizedNode, ManifestError> {
        if self.node_version != 1 {
            return Err(ManifestError::UnsupportedVersion(self.node_version));
        }

        let lab_name = self.lab.name.trim();
        let short_name = self.node.name.trim();
        validate_node_name(lab_name)?;
        validate_node_name(short_name)?;

        let kind = self.node.kind.trim().to_lowercase();
        if kind.is_empty() {
            return Err(ManifestError::EmptyKind);
        }
        let image = self.node.image.trim().to_owned();
        if image.is_empty() {
            return Err(ManifestError::EmptyImage);
        }

        let lab_dir = match self.lab.dir.as_deref().map(str::trim) {
            Some(dir) if !dir.is_empty() => base_dir.join(dir),
            _ => base_dir
                .join(format!("{LAB_PREFIX}-{lab_name}"))
                .join(short_name),
        };

        let startup_config = self
            .node
            .startup_config
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| base_dir.join(s));

        let mut binds = Vec::with_capacity(self.node.binds.len());
        for raw in &self.node.binds {
            let mut bind: BindMount = raw.parse().map_err(ManifestError::InvalidBind)?;
            if bind.source.is_relative() {
                bind.source = base_dir.join(&bind.source);
            }
            binds.push(bind);
        }

        validate_subnet::<Ipv4Addr>("ipv4", &self.mgmt.ipv4_subnet, 32)?;
        validate_subnet::<Ipv6Addr>("ipv6", &self.mgmt.ipv6_subnet, 128)?;

        let spec = NodeSpec {
            kind,
            image,
            short_name: short_name.to_owned(),
            long_name: format!("{LAB_PREFIX}-{lab_name}-{short_name}"),
            lab_dir,
            startup_config,
            env: self.node.env.clone(),
            binds,
            cmd: String::new(),
            host_requirements: HostRequirements::default(),
            mgmt_network: self.mgmt.network.trim().to_owned(),
        };
        let mgmt = ManagementNetwork {
            network: spec.mgmt_network.clone(),
            ipv4_subnet: self.mgmt.ipv4_subnet.trim().to_owned(),
            ipv6_subnet: self.mgmt.ipv6_subnet.trim().to_owned(),
        };

        Ok(NormalizedNode { spec, mgmt })
    }
}

pub fn validate_node_name(name: &str) -> Result<(), ManifestError> {
    let invalid = |reason: &str| ManifestError::InvalidName {
        name: name.to_owned(),
        reason: reason.to_owned(),
    };
    if name.is_empty() || name.len() > 64 {
        return Err(invalid("must be 1-64 characters"));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.')
    {
        return Err(invalid("must match [a-zA-Z0-9_.-]"));
    }
    Ok(())
}

fn validate_subnet<A: std::str::FromStr>(
    family: &'static str,
    subnet: &str,
    max_prefix: u8,
) -> Result<(), ManifestError> {
    let invalid = || ManifestError::InvalidSubnet {
        family,
        subnet: subnet.to_owned(),
    };
    let (addr, prefix) = subnet.trim().split_once('/').ok_or_else(invalid)?;
    addr.parse::<A>().map_err(|_| invalid())?;
    let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
    if prefix > max_prefix {
        return Err(invalid());
    }
    Ok(())
}

/// Resolve the directory a node file's relative paths are anchored to.
pub fn base_dir_of(node_file: &Path) -> PathBuf {
    match node_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
