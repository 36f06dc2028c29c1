//! Sequential bring-up and tear-down of a single node.

use crate::node::{NodeDriver, PeerMap};
use crate::stager::StageWarning;
use crate::CoreError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;
use vrlab_runtime::ExecContext;

/// What a successful bring-up produced.
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub kind: String,
    pub short_name: String,
    pub long_name: String,
    pub images: BTreeMap<String, String>,
    pub rendered_config: Option<PathBuf>,
    pub warnings: Vec<StageWarning>,
    /// RFC 3339, UTC.
    pub deployed_at: String,
}

/// Run `pre_deploy`, `deploy` and `post_deploy` in order, stopping at the
/// first failure.
///
/// No rollback is attempted: a container created before a failed start is
/// left for the caller to remove with [`tear_down`].
pub fn bring_up(
    driver: &mut dyn NodeDriver,
    ctx: &ExecContext,
    peers: &PeerMap,
) -> Result<DeployReport, CoreError> {
    let stage = driver.pre_deploy()?;
    driver.deploy(ctx)?;
    driver.post_deploy(ctx, peers)?;

    let spec = driver.config();
    info!("node {} is up as {}", spec.short_name, spec.long_name);
    Ok(DeployReport {
        kind: driver.kind().to_owned(),
        short_name: spec.short_name.clone(),
        long_name: spec.long_name.clone(),
        images: driver.images(),
        rendered_config: stage.rendered,
        warnings: stage.warnings,
        deployed_at: chrono::Utc::now().to_rfc3339(),
    })
}

pub fn tear_down(driver: &mut dyn NodeDriver, ctx: &ExecContext) -> Result<(), CoreError> {
    driver.delete(ctx)?;
    info!("node {} removed", driver.config().long_name);
    Ok(())
}
