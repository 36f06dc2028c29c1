//! Node specification, node file parsing, and environment merging for vrlab.
//!
//! This crate defines the schema layer: the per-instance `NodeSpec` that node
//! drivers mutate and hand to container runtimes, the `ManagementNetwork` used
//! to derive default launch parameters, TOML node file parsing (`NodeFileV1`)
//! and its normalization into a `NodeSpec`, and the environment merge used by
//! every driver.

pub mod env;
pub mod manifest;
pub mod node;
pub mod normalize;

pub use env::merge_env;
pub use manifest::{
    parse_node_file, parse_node_str, LabSection, ManifestError, MgmtSection, NodeFileV1,
    NodeSection,
};
pub use node::{BindMount, HostRequirements, ManagementNetwork, NodeSpec};
pub use normalize::{base_dir_of, validate_node_name, NormalizedNode, LAB_PREFIX};
